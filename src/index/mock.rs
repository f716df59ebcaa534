//! Mock study index for testing purposes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

use crate::index::{IndexError, StudyIndex};
use crate::models::StudyRecord;

/// A mock index that returns predefined responses.
///
/// Queries without a configured response resolve to an empty result set.
/// A query can be held with [`MockStudyIndex::hold`]; its fetch then waits
/// until [`MockStudyIndex::release`] is called, which lets tests control the
/// order in which concurrent fetches resolve.
#[derive(Debug, Default)]
pub struct MockStudyIndex {
    terms: Mutex<Option<Result<Vec<String>, IndexError>>>,
    studies: Mutex<HashMap<String, Result<Vec<StudyRecord>, IndexError>>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    terms_gate: Mutex<Option<Arc<Notify>>>,
    calls: Mutex<Vec<String>>,
}

/// Call log entry recorded for every vocabulary request
pub const TERMS_CALL: &str = "<terms>";

impl MockStudyIndex {
    /// Create a new mock index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the vocabulary to return.
    pub fn set_terms<I, S>(&self, terms: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *lock(&self.terms) = Some(Ok(terms.into_iter().map(Into::into).collect()));
    }

    /// Make the vocabulary request fail.
    pub fn fail_terms(&self, error: IndexError) {
        *lock(&self.terms) = Some(Err(error));
    }

    /// Set the results returned for `query`.
    pub fn set_studies(&self, query: &str, records: Vec<StudyRecord>) {
        lock(&self.studies).insert(query.to_string(), Ok(records));
    }

    /// Make the fetch for `query` fail.
    pub fn fail_studies(&self, query: &str, error: IndexError) {
        lock(&self.studies).insert(query.to_string(), Err(error));
    }

    /// Hold fetches for `query` until released.
    pub fn hold(&self, query: &str) {
        lock(&self.gates).insert(query.to_string(), Arc::new(Notify::new()));
    }

    /// Release a held query. Releasing before the fetch starts is remembered.
    pub fn release(&self, query: &str) {
        if let Some(gate) = lock(&self.gates).remove(query) {
            gate.notify_one();
        }
    }

    /// Hold the vocabulary request until [`MockStudyIndex::release_terms`].
    pub fn hold_terms(&self) {
        *lock(&self.terms_gate) = Some(Arc::new(Notify::new()));
    }

    pub fn release_terms(&self) {
        if let Some(gate) = lock(&self.terms_gate).take() {
            gate.notify_one();
        }
    }

    /// Every request made so far, in order. Vocabulary loads are logged as
    /// [`TERMS_CALL`], study fetches by their query string.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    /// Number of study fetches made so far.
    pub fn study_calls(&self) -> usize {
        lock(&self.calls).iter().filter(|c| *c != TERMS_CALL).count()
    }
}

#[async_trait]
impl StudyIndex for MockStudyIndex {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_terms(&self) -> Result<Vec<String>, IndexError> {
        lock(&self.calls).push(TERMS_CALL.to_string());

        let gate = lock(&self.terms_gate).clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        lock(&self.terms).clone().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn fetch_studies(&self, query: &str) -> Result<Vec<StudyRecord>, IndexError> {
        lock(&self.calls).push(query.to_string());

        let gate = lock(&self.gates).get(query).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        lock(&self.studies)
            .get(query)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
