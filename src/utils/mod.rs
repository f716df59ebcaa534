//! Utility modules shared by the index client and the CLI.
//!
//! - [`HttpClient`]: reqwest client with the crate's defaults
//! - [`truncate_with_ellipsis`]: width-aware truncation for terminal output
//!
//! # HTTP Client
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use study_search::utils::HttpClient;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Default client: no whole-request timeout
//! let client = HttpClient::new()?;
//!
//! // Bounded client
//! let bounded = HttpClient::with_settings("my-agent/1.0", Some(Duration::from_secs(30)))?;
//! # let _ = (client, bounded);
//! # Ok(())
//! # }
//! ```

mod display;
mod http;

pub use display::truncate_with_ellipsis;
pub use http::{HttpClient, DEFAULT_USER_AGENT};
