//! Result fetching, pagination, and highlighting for study queries.
//!
//! [`ResultFetcher`] keeps at most one authoritative fetch alive. Every query
//! change bumps a request id and cancels the previous fetch's token; a fetch
//! only commits if, under the state lock, its token is still live and its id
//! is still the latest. A response for a superseded query can therefore never
//! overwrite the results of the current one, whichever order they resolve in.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use study_search::index::HttpStudyIndex;
//! use study_search::studies::ResultFetcher;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let index = Arc::new(HttpStudyIndex::new("http://localhost:5000")?);
//! let mut fetcher = ResultFetcher::new(index);
//!
//! if let Some(handle) = fetcher.on_query_change("memory AND recall") {
//!     handle.outcome().await;
//! }
//! let view = fetcher.snapshot();
//! println!("Page {} / {}, Total {} records", view.page, view.total_pages, view.total);
//! # Ok(())
//! # }
//! ```

mod highlight;

pub use highlight::{highlight, keywords, Highlighter, Segment};

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::index::{IndexError, StudyIndex};
use crate::models::{clamp_page, ResultPage, StudyRecord};

/// Status of the current query's fetch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum FetchStatus {
    /// No query, nothing requested
    #[default]
    Idle,
    Loading,
    Loaded,
    /// Fetch failed; holds the displayable message
    Failed(String),
}

/// How a fetch task ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Results were stored
    Committed { count: usize },
    /// An error was stored
    Failed,
    /// The response arrived after a newer request was issued and was dropped
    Superseded,
    /// The request was cancelled before a response arrived
    Cancelled,
}

impl FetchOutcome {
    /// Whether this fetch changed the visible state
    pub fn is_committed(&self) -> bool {
        matches!(self, FetchOutcome::Committed { .. } | FetchOutcome::Failed)
    }
}

/// Handle to a spawned fetch
#[derive(Debug)]
pub struct FetchHandle {
    request_id: u64,
    handle: JoinHandle<FetchOutcome>,
}

impl FetchHandle {
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    /// Wait for the fetch task to finish
    pub async fn outcome(self) -> FetchOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(request_id = self.request_id, error = %e, "Fetch task did not complete");
                FetchOutcome::Cancelled
            }
        }
    }
}

#[derive(Debug, Default)]
struct FetchState {
    request_id: u64,
    query: String,
    status: FetchStatus,
    records: Vec<StudyRecord>,
    page: usize,
}

/// Owned snapshot of what the results panel shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudiesView {
    pub query: String,
    pub status: FetchStatus,
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
    /// Records on the current page only
    pub records: Vec<StudyRecord>,
}

impl StudiesView {
    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            FetchStatus::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// A fetch succeeded and matched nothing
    pub fn is_empty_result(&self) -> bool {
        self.status == FetchStatus::Loaded && self.total == 0
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Highlighter for this view's query
    pub fn highlighter(&self) -> Highlighter {
        Highlighter::new(&self.query)
    }
}

/// Fetches and pages the studies matching the current query
///
/// Must be used from within a tokio runtime: fetches run as spawned tasks.
/// Dropping the fetcher cancels any fetch still in flight.
#[derive(Debug)]
pub struct ResultFetcher {
    index: Arc<dyn StudyIndex>,
    state: Arc<Mutex<FetchState>>,
    current: Option<CancellationToken>,
    revision: Arc<watch::Sender<u64>>,
}

impl ResultFetcher {
    pub fn new(index: Arc<dyn StudyIndex>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            index,
            state: Arc::new(Mutex::new(FetchState {
                page: 1,
                ..Default::default()
            })),
            current: None,
            revision: Arc::new(revision),
        }
    }

    /// React to a new query value.
    ///
    /// Resets to page 1 and cancels any in-flight fetch. An empty query
    /// clears the results and issues no request (returns `None`); otherwise
    /// a fetch is spawned and its handle returned.
    pub fn on_query_change(&mut self, query: &str) -> Option<FetchHandle> {
        self.cancel();

        let request_id = {
            let mut state = lock(&self.state);
            state.request_id += 1;
            state.query = query.to_string();
            state.page = 1;
            state.records.clear();
            state.status = if query.is_empty() {
                FetchStatus::Idle
            } else {
                FetchStatus::Loading
            };
            state.request_id
        };
        bump(&self.revision);

        if query.is_empty() {
            debug!(request_id, "Query cleared, no fetch issued");
            return None;
        }

        let token = CancellationToken::new();
        self.current = Some(token.clone());

        let handle = tokio::spawn(run_fetch(
            self.index.clone(),
            self.state.clone(),
            self.revision.clone(),
            request_id,
            query.to_string(),
            token,
        ));

        Some(FetchHandle { request_id, handle })
    }

    /// Jump to page `n`, clamped into `[1, total_pages]`. Returns the page
    /// actually selected.
    pub fn set_page(&mut self, n: i64) -> usize {
        let (page, changed) = {
            let mut state = lock(&self.state);
            let page = clamp_page(n, state.records.len());
            let changed = page != state.page;
            state.page = page;
            (page, changed)
        };
        if changed {
            bump(&self.revision);
        }
        page
    }

    pub fn next_page(&mut self) -> usize {
        let page = self.page() as i64;
        self.set_page(page.saturating_add(1))
    }

    pub fn prev_page(&mut self) -> usize {
        let page = self.page() as i64;
        self.set_page(page - 1)
    }

    pub fn page(&self) -> usize {
        lock(&self.state).page
    }

    pub fn status(&self) -> FetchStatus {
        lock(&self.state).status.clone()
    }

    /// Query the current results belong to
    pub fn query(&self) -> String {
        lock(&self.state).query.clone()
    }

    /// Copy out the current page and its context
    pub fn snapshot(&self) -> StudiesView {
        let state = lock(&self.state);
        let page = ResultPage::new(&state.records, state.page as i64);
        StudiesView {
            query: state.query.clone(),
            status: state.status.clone(),
            page: page.page,
            total_pages: page.total_pages,
            total: page.total,
            records: page.records.to_vec(),
        }
    }

    /// Receiver that changes whenever the visible state does
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Cancel the in-flight fetch, if any. Its response will be ignored.
    pub fn cancel(&mut self) {
        if let Some(token) = self.current.take() {
            token.cancel();
        }
    }
}

impl Drop for ResultFetcher {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_fetch(
    index: Arc<dyn StudyIndex>,
    state: Arc<Mutex<FetchState>>,
    revision: Arc<watch::Sender<u64>>,
    request_id: u64,
    query: String,
    token: CancellationToken,
) -> FetchOutcome {
    debug!(request_id, query = %query, index = index.name(), "Fetching studies");

    let result = tokio::select! {
        biased;
        _ = token.cancelled() => {
            debug!(request_id, "Fetch cancelled");
            return FetchOutcome::Cancelled;
        }
        result = index.fetch_studies(&query) => result,
    };

    let outcome = commit(&mut lock(&state), request_id, token.is_cancelled(), result);
    if outcome.is_committed() {
        bump(&revision);
    }
    outcome
}

/// Store a fetch result unless the request is no longer the latest one.
///
/// Must be called with the state lock held, so the check and the write
/// happen together.
fn commit(
    state: &mut FetchState,
    request_id: u64,
    cancelled: bool,
    result: Result<Vec<StudyRecord>, IndexError>,
) -> FetchOutcome {
    if cancelled || state.request_id != request_id {
        debug!(request_id, latest = state.request_id, "Discarding stale response");
        return FetchOutcome::Superseded;
    }

    match result {
        Ok(records) => {
            let count = records.len();
            debug!(request_id, count, "Studies loaded");
            state.records = records;
            state.status = FetchStatus::Loaded;
            FetchOutcome::Committed { count }
        }
        Err(e) => {
            warn!(request_id, error = %e, "Failed to fetch studies");
            state.records.clear();
            state.status = FetchStatus::Failed(format!("Failed to fetch studies: {}", e));
            FetchOutcome::Failed
        }
    }
}

fn bump(revision: &watch::Sender<u64>) {
    revision.send_modify(|r| *r = r.wrapping_add(1));
}

fn lock(state: &Mutex<FetchState>) -> MutexGuard<'_, FetchState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
