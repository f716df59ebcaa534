//! Owned query string with token-append editing.

use super::Operator;

/// Receives terms picked from the catalog
pub trait TermSink {
    fn term_picked(&mut self, term: &str);
}

/// The mutable query value
///
/// Tokens are joined with exactly one space. No structural validation is
/// done; malformed expressions are left for the index to reject.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryBuilder {
    value: String,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current query text
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Append an operator or parenthesis
    pub fn append(&mut self, op: Operator) {
        self.push_token(op.as_str());
    }

    /// Append a vocabulary term
    pub fn append_term(&mut self, term: &str) {
        self.push_token(term);
    }

    /// Replace the whole query
    pub fn set_full_text(&mut self, text: impl Into<String>) {
        self.value = text.into();
    }

    pub fn reset(&mut self) {
        self.value.clear();
    }

    fn push_token(&mut self, token: &str) {
        if !self.value.is_empty() {
            self.value.push(' ');
        }
        self.value.push_str(token);
    }
}

impl TermSink for QueryBuilder {
    fn term_picked(&mut self, term: &str) {
        self.append_term(term);
    }
}

impl std::fmt::Display for QueryBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_on_empty_has_no_leading_space() {
        let mut query = QueryBuilder::new();
        query.append(Operator::OpenParen);
        assert_eq!(query.value(), "(");
    }

    #[test]
    fn test_append_sequence_single_spaced() {
        let mut query = QueryBuilder::new();
        query.append_term("memory");
        query.append(Operator::And);
        query.append(Operator::OpenParen);
        query.append_term("recall");
        query.append(Operator::Or);
        query.append_term("fear");
        query.append(Operator::CloseParen);
        assert_eq!(query.value(), "memory AND ( recall OR fear )");
    }

    #[test]
    fn test_every_token_separated_by_one_space() {
        let mut query = QueryBuilder::new();
        for op in Operator::ALL.iter().cycle().take(12) {
            query.append(*op);
        }
        let value = query.value();
        assert!(!value.starts_with(' '));
        assert!(!value.ends_with(' '));
        assert!(!value.contains("  "));
        assert_eq!(value.split(' ').count(), 12);
    }

    #[test]
    fn test_no_validation_of_structure() {
        let mut query = QueryBuilder::new();
        query.append(Operator::CloseParen);
        query.append(Operator::And);
        query.append(Operator::And);
        assert_eq!(query.value(), ") AND AND");
    }

    #[test]
    fn test_set_full_text_and_reset() {
        let mut query = QueryBuilder::new();
        query.append_term("pain");
        query.set_full_text("fear NOT anxiety");
        assert_eq!(query.value(), "fear NOT anxiety");
        query.append(Operator::Or);
        assert_eq!(query.value(), "fear NOT anxiety OR");
        query.reset();
        assert!(query.is_empty());
        query.append(Operator::Not);
        assert_eq!(query.value(), "NOT");
    }

    #[test]
    fn test_term_sink_appends() {
        let mut query = QueryBuilder::new();
        query.term_picked("memory");
        query.term_picked("recall");
        assert_eq!(query.to_string(), "memory recall");
    }
}
