//! The container that owns the query and wires the components together.
//!
//! [`Session`] is the only place the query is mutated. Every edit goes through
//! it, and when the text actually changes the [`ResultFetcher`] is told about
//! the new value before the edit returns, so readers never observe a query
//! whose results belong to a different one.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::catalog::{CatalogState, TermCatalog};
use crate::index::StudyIndex;
use crate::query::{Operator, QueryBuilder};
use crate::studies::{FetchHandle, ResultFetcher, StudiesView};

/// One interactive search session
///
/// Dropping the session cancels both the catalog load and any in-flight
/// study fetch.
#[derive(Debug)]
pub struct Session {
    index: Arc<dyn StudyIndex>,
    query: QueryBuilder,
    catalog: Arc<TermCatalog>,
    fetcher: ResultFetcher,
}

impl Session {
    pub fn new(index: Arc<dyn StudyIndex>) -> Self {
        Self {
            fetcher: ResultFetcher::new(index.clone()),
            index,
            query: QueryBuilder::new(),
            catalog: Arc::new(TermCatalog::new()),
        }
    }

    /// Start loading the term catalog in the background
    pub fn mount(&self) -> JoinHandle<CatalogState> {
        let catalog = self.catalog.clone();
        let index = self.index.clone();
        tokio::spawn(async move { catalog.load(index.as_ref()).await })
    }

    /// Current query text
    pub fn query(&self) -> &str {
        self.query.value()
    }

    pub fn catalog(&self) -> &TermCatalog {
        &self.catalog
    }

    /// Snapshot of the results panel
    pub fn studies(&self) -> StudiesView {
        self.fetcher.snapshot()
    }

    /// Receiver that changes whenever the results panel does
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.fetcher.subscribe()
    }

    // The edit operations below return the handle of the fetch they started,
    // or `None` when the query is unchanged or became empty.

    pub fn append(&mut self, op: Operator) -> Option<FetchHandle> {
        let previous = self.query.value().to_string();
        self.query.append(op);
        self.commit(previous)
    }

    /// Append a term picked from the catalog
    pub fn pick_term(&mut self, term: &str) -> Option<FetchHandle> {
        let previous = self.query.value().to_string();
        self.catalog.pick(term, &mut self.query);
        self.commit(previous)
    }

    /// Replace the query with typed text
    pub fn set_full_text(&mut self, text: &str) -> Option<FetchHandle> {
        let previous = self.query.value().to_string();
        self.query.set_full_text(text);
        self.commit(previous)
    }

    pub fn reset(&mut self) -> Option<FetchHandle> {
        let previous = self.query.value().to_string();
        self.query.reset();
        self.commit(previous)
    }

    pub fn set_page(&mut self, n: i64) -> usize {
        self.fetcher.set_page(n)
    }

    pub fn next_page(&mut self) -> usize {
        self.fetcher.next_page()
    }

    pub fn prev_page(&mut self) -> usize {
        self.fetcher.prev_page()
    }

    fn commit(&mut self, previous: String) -> Option<FetchHandle> {
        if self.query.value() == previous {
            debug!("Query unchanged");
            return None;
        }
        debug!(query = self.query.value(), "Query changed");
        self.fetcher.on_query_change(self.query.value())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.catalog.cancel();
    }
}
