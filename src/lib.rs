//! # Study Search
//!
//! Build boolean queries over a controlled term vocabulary, run them against
//! a remote study index, and browse the paginated, keyword-highlighted
//! results.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (StudyRecord, ResultPage)
//! - [`index`]: Client seam for the remote study index (HTTP and mock)
//! - [`query`]: The query string and its token-append editing
//! - [`catalog`]: The term vocabulary, loaded once and filtered locally
//! - [`studies`]: Cancellable result fetching, pagination, and highlighting
//! - [`session`]: The container that owns the query and wires it all together
//! - [`ui`]: Terminal rendering
//! - [`config`]: Configuration management
//! - [`utils`]: HTTP client and display helpers

pub mod catalog;
pub mod config;
pub mod index;
pub mod models;
pub mod query;
pub mod session;
pub mod studies;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use index::{HttpStudyIndex, StudyIndex};
pub use models::StudyRecord;
pub use session::Session;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
