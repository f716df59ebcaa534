//! Term vocabulary loaded once from the study index.
//!
//! The catalog moves through `Idle → Loading → Ready | Errored` exactly once
//! per instance, or ends in `Cancelled` if it is torn down before the
//! response arrives. Filtering is a read-only view over the loaded terms, and
//! picking a term hands it to a [`TermSink`] rather than touching the query.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::index::StudyIndex;
use crate::query::TermSink;

/// Maximum number of terms a filter returns
pub const MAX_FILTER_RESULTS: usize = 500;

/// Load state of a catalog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CatalogState {
    #[default]
    Idle,
    Loading,
    Ready,
    /// Load failed; holds the displayable message
    Errored(String),
    /// Torn down before the vocabulary arrived. Terminal, like `Errored`.
    Cancelled,
}

#[derive(Debug, Default)]
struct CatalogInner {
    state: CatalogState,
    terms: Vec<String>,
}

/// The searchable term vocabulary
#[derive(Debug, Default)]
pub struct TermCatalog {
    inner: Mutex<CatalogInner>,
    shutdown: CancellationToken,
}

impl TermCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the vocabulary from `index`.
    ///
    /// Only the first call issues a request; later calls return the current
    /// state. Failures are kept as a message and never retried. If the
    /// catalog is torn down while the request is pending, the response is
    /// dropped and the catalog ends in [`CatalogState::Cancelled`].
    pub async fn load(&self, index: &dyn StudyIndex) -> CatalogState {
        {
            let mut inner = self.lock();
            if inner.state != CatalogState::Idle {
                debug!(state = ?inner.state, "Term catalog already loaded");
                return inner.state.clone();
            }
            inner.state = CatalogState::Loading;
        }

        debug!(index = index.name(), "Loading term catalog");

        let result = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => {
                debug!("Term catalog load cancelled");
                let mut inner = self.lock();
                inner.state = CatalogState::Cancelled;
                return inner.state.clone();
            }
            result = index.fetch_terms() => result,
        };

        let mut inner = self.lock();
        match result {
            Ok(terms) => {
                inner.terms = dedup_terms(terms);
                inner.state = CatalogState::Ready;
                debug!(count = inner.terms.len(), "Term catalog ready");
            }
            Err(e) => {
                warn!(error = %e, "Failed to load term catalog");
                inner.terms.clear();
                inner.state = CatalogState::Errored(format!("Failed to fetch terms: {}", e));
            }
        }
        inner.state.clone()
    }

    /// Current load state
    pub fn state(&self) -> CatalogState {
        self.lock().state.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().state == CatalogState::Loading
    }

    /// Error message from a failed load
    pub fn error(&self) -> Option<String> {
        match &self.lock().state {
            CatalogState::Errored(message) => Some(message.clone()),
            _ => None,
        }
    }

    /// All loaded terms in service order
    pub fn terms(&self) -> Vec<String> {
        self.lock().terms.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().terms.is_empty()
    }

    /// Terms containing `needle`, case-insensitively
    pub fn filter(&self, needle: &str) -> Vec<String> {
        let inner = self.lock();
        filter_terms(&inner.terms, needle)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Hand `term` to the consumer that owns the query
    pub fn pick(&self, term: &str, sink: &mut dyn TermSink) {
        debug!(term, "Term picked");
        sink.term_picked(term);
    }

    /// Abandon a pending load. Used on teardown.
    pub fn cancel(&self) {
        self.shutdown.cancel();
    }

    fn lock(&self) -> MutexGuard<'_, CatalogInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Case-insensitive substring filter over `terms`.
///
/// The needle is trimmed; an empty needle matches every term. Order is
/// preserved and at most [`MAX_FILTER_RESULTS`] terms are returned.
pub fn filter_terms<'a>(terms: &'a [String], needle: &str) -> Vec<&'a str> {
    let needle = needle.trim().to_lowercase();
    terms
        .iter()
        .map(String::as_str)
        .filter(|t| needle.is_empty() || t.to_lowercase().contains(&needle))
        .take(MAX_FILTER_RESULTS)
        .collect()
}

/// Drop repeated terms, keeping the first occurrence
fn dedup_terms(terms: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(terms.len());
    terms
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}
