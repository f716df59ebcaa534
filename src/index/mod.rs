//! Client seam for the remote study index.
//!
//! The index is an opaque HTTP service exposing two endpoints:
//!
//! - `GET {base}/terms` returns `{ "terms": [string, ...] }`
//! - `GET {base}/query/{percent-encoded query}/studies` returns
//!   `{ "results": [StudyRecord, ...] }`
//!
//! [`HttpStudyIndex`] talks to the real service; [`MockStudyIndex`] returns
//! scripted responses and can hold individual queries back so tests can force
//! responses to arrive out of order.

mod http;
pub mod mock;

pub use http::HttpStudyIndex;
pub use mock::MockStudyIndex;

use async_trait::async_trait;

use crate::models::StudyRecord;

/// The StudyIndex trait defines the interface to the remote study index.
///
/// Implementations must be cancel-safe: dropping a returned future before it
/// resolves abandons the request without side effects.
#[async_trait]
pub trait StudyIndex: Send + Sync + std::fmt::Debug {
    /// Human-readable name of this index, used in logs
    fn name(&self) -> &str;

    /// Fetch the full term vocabulary, in service order
    async fn fetch_terms(&self) -> Result<Vec<String>, IndexError>;

    /// Fetch every study matching a boolean query expression
    async fn fetch_studies(&self, query: &str) -> Result<Vec<StudyRecord>, IndexError>;
}

/// Errors that can occur when talking to the study index
///
/// The `Display` form of each variant is the bare reason; components add
/// their own prefix when they surface it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    /// Non-success HTTP status. `message` is the server-supplied error text,
    /// or `HTTP <status>` when the body carried none.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// Network or transport error
    #[error("{0}")]
    Network(String),

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters (bad base address, etc.)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl IndexError {
    /// Build a status error, falling back to `HTTP <status>` when the server
    /// supplied no message
    pub fn status(status: u16, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("HTTP {}", status));
        IndexError::Status { status, message }
    }
}

impl From<reqwest::Error> for IndexError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            IndexError::Parse(err.to_string())
        } else {
            IndexError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for IndexError {
    fn from(err: serde_json::Error) -> Self {
        IndexError::Parse(format!("JSON: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_prefers_server_message() {
        let err = IndexError::status(400, Some("Unbalanced parentheses".to_string()));
        assert_eq!(err.to_string(), "Unbalanced parentheses");
    }

    #[test]
    fn test_status_error_falls_back_to_code() {
        assert_eq!(IndexError::status(502, None).to_string(), "HTTP 502");
        assert_eq!(
            IndexError::status(500, Some(String::new())).to_string(),
            "HTTP 500"
        );
    }
}
