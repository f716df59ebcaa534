//! HTTP implementation of the study index client.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::index::{IndexError, StudyIndex};
use crate::models::StudyRecord;
use crate::utils::HttpClient;

/// Study index reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpStudyIndex {
    client: HttpClient,
    base_url: String,
}

impl HttpStudyIndex {
    /// Create a client for the index at `base_url` with default HTTP settings
    pub fn new(base_url: &str) -> Result<Self, IndexError> {
        let client = HttpClient::new().map_err(|e| IndexError::InvalidRequest(e.to_string()))?;
        Self::with_client(client, base_url)
    }

    /// Create a client reusing an existing [`HttpClient`]
    pub fn with_client(client: HttpClient, base_url: &str) -> Result<Self, IndexError> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| IndexError::InvalidRequest(format!("{}: {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(IndexError::InvalidRequest(format!(
                "unsupported scheme in base address: {}",
                base_url
            )));
        }

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base address without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of the vocabulary endpoint
    pub fn terms_url(&self) -> String {
        format!("{}/terms", self.base_url)
    }

    /// URL of the studies endpoint; the query travels as one encoded path segment
    pub fn studies_url(&self, query: &str) -> String {
        format!(
            "{}/query/{}/studies",
            self.base_url,
            urlencoding::encode(query)
        )
    }

    /// GET `url` and decode a JSON body, mapping non-success statuses to
    /// [`IndexError::Status`]
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, IndexError> {
        debug!(url, "GET");

        let response = self.client.client().get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            // An unreadable error body still reports the status
            let body = response.bytes().await.unwrap_or_default();
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error);
            return Err(IndexError::status(status.as_u16(), message));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl StudyIndex for HttpStudyIndex {
    fn name(&self) -> &str {
        &self.base_url
    }

    async fn fetch_terms(&self) -> Result<Vec<String>, IndexError> {
        let data: TermsResponse = self.get_json(&self.terms_url()).await?;

        // Anything but an array of strings counts as an empty vocabulary
        let terms = match data.terms {
            serde_json::Value::Array(values) => values
                .into_iter()
                .filter_map(|v| match v {
                    serde_json::Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        Ok(terms)
    }

    async fn fetch_studies(&self, query: &str) -> Result<Vec<StudyRecord>, IndexError> {
        let data: StudiesResponse = self.get_json(&self.studies_url(query)).await?;

        match data.results {
            value @ serde_json::Value::Array(_) => Ok(serde_json::from_value(value)?),
            _ => Ok(Vec::new()),
        }
    }
}

// ===== Index API Types =====

#[derive(Debug, Deserialize)]
struct TermsResponse {
    #[serde(default)]
    terms: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct StudiesResponse {
    #[serde(default)]
    results: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_studies_url_encodes_query_segment() {
        let index = HttpStudyIndex::new("http://localhost:5000/").unwrap();
        assert_eq!(
            index.studies_url("memory AND (recall OR fear)"),
            "http://localhost:5000/query/memory%20AND%20%28recall%20OR%20fear%29/studies"
        );
        assert_eq!(
            index.studies_url("a/b?c"),
            "http://localhost:5000/query/a%2Fb%3Fc/studies"
        );
    }

    #[test]
    fn test_terms_url_strips_trailing_slash() {
        let index = HttpStudyIndex::new("https://index.example.org/api/").unwrap();
        assert_eq!(index.base_url(), "https://index.example.org/api");
        assert_eq!(index.terms_url(), "https://index.example.org/api/terms");
    }

    #[test]
    fn test_rejects_invalid_base() {
        assert!(matches!(
            HttpStudyIndex::new("not a url"),
            Err(IndexError::InvalidRequest(_))
        ));
        assert!(matches!(
            HttpStudyIndex::new("ftp://example.org"),
            Err(IndexError::InvalidRequest(_))
        ));
    }
}
