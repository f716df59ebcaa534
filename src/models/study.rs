//! Study record model representing one hit from the study index.

use serde::{Deserialize, Deserializer, Serialize};

/// Base address of the external record viewer
pub const RECORD_VIEWER_BASE: &str = "https://pubmed.ncbi.nlm.nih.gov";

/// Publication year as sent by the index.
///
/// The service is inconsistent about the JSON type of this field, so both
/// numbers and strings are accepted and rendered as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Year {
    Number(serde_json::Number),
    Text(String),
}

impl std::fmt::Display for Year {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Year::Number(n) => write!(f, "{}", n),
            Year::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Year {
    fn from(year: i64) -> Self {
        Year::Number(year.into())
    }
}

impl From<&str> for Year {
    fn from(year: &str) -> Self {
        Year::Text(year.to_string())
    }
}

/// A single study returned by a query
///
/// Every field is optional on the wire; accessors supply the empty string
/// where the UI needs text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudyRecord {
    /// External identifier (PMID for PubMed-backed indexes)
    #[serde(default, deserialize_with = "lenient_string")]
    pub study_id: Option<String>,

    /// Study title
    #[serde(default)]
    pub title: Option<String>,

    /// Authors as a single display string
    #[serde(default)]
    pub authors: Option<String>,

    /// Publication year
    #[serde(default)]
    pub year: Option<Year>,

    /// Journal name
    #[serde(default)]
    pub journal: Option<String>,

    /// Contrast label the study matched on
    #[serde(default)]
    pub contrast: Option<String>,
}

impl StudyRecord {
    /// Title text, empty when absent
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    /// Link to the record viewer, if the study has an identifier
    pub fn record_url(&self) -> Option<String> {
        self.study_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(|id| format!("{}/{}", RECORD_VIEWER_BASE, id))
    }
}

/// Builder for [`StudyRecord`], used by tests and demos
#[derive(Debug, Default)]
pub struct StudyRecordBuilder {
    record: StudyRecord,
}

impl StudyRecordBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            record: StudyRecord {
                title: Some(title.into()),
                ..Default::default()
            },
        }
    }

    pub fn study_id(mut self, id: impl Into<String>) -> Self {
        self.record.study_id = Some(id.into());
        self
    }

    pub fn authors(mut self, authors: impl Into<String>) -> Self {
        self.record.authors = Some(authors.into());
        self
    }

    pub fn year(mut self, year: impl Into<Year>) -> Self {
        self.record.year = Some(year.into());
        self
    }

    pub fn journal(mut self, journal: impl Into<String>) -> Self {
        self.record.journal = Some(journal.into());
        self
    }

    pub fn contrast(mut self, contrast: impl Into<String>) -> Self {
        self.record.contrast = Some(contrast.into());
        self
    }

    pub fn build(self) -> StudyRecord {
        self.record
    }
}

/// Accept a JSON string, number, or null where an identifier is expected
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_numeric_year_and_id() {
        let record: StudyRecord =
            serde_json::from_str(r#"{"title":"Recall under stress","year":2020,"study_id":123}"#)
                .unwrap();
        assert_eq!(record.title(), "Recall under stress");
        assert_eq!(record.year.unwrap().to_string(), "2020");
        assert_eq!(record.study_id.as_deref(), Some("123"));
    }

    #[test]
    fn test_deserialize_string_year_and_nulls() {
        let record: StudyRecord = serde_json::from_str(
            r#"{"title":null,"year":"2019","journal":null,"authors":"Smith J"}"#,
        )
        .unwrap();
        assert_eq!(record.title(), "");
        assert_eq!(record.year, Some(Year::Text("2019".to_string())));
        assert!(record.journal.is_none());
        assert_eq!(record.authors.as_deref(), Some("Smith J"));
        assert!(record.study_id.is_none());
    }

    #[test]
    fn test_record_url() {
        let record = StudyRecordBuilder::new("x").study_id("31415").build();
        assert_eq!(
            record.record_url().as_deref(),
            Some("https://pubmed.ncbi.nlm.nih.gov/31415")
        );
        assert!(StudyRecordBuilder::new("x").build().record_url().is_none());
    }
}
