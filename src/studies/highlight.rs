//! Keyword highlighting for result text.
//!
//! Keywords are the runs of ASCII letters in the query, lower-cased. Operators
//! count as keywords too: a query is never parsed here, only tokenized. Each
//! keyword is matched literally and case-insensitively.

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::warn;

/// A piece of highlighted text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "lowercase")]
pub enum Segment<'a> {
    Plain(&'a str),
    Matched(&'a str),
}

impl<'a> Segment<'a> {
    pub fn text(&self) -> &'a str {
        match self {
            Segment::Plain(s) | Segment::Matched(s) => s,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, Segment::Matched(_))
    }
}

fn word_regex() -> &'static Regex {
    static WORD: OnceLock<Regex> = OnceLock::new();
    WORD.get_or_init(|| Regex::new("[A-Za-z]+").expect("static pattern is valid"))
}

/// Keywords of `query` in order of first appearance, without repeats
pub fn keywords(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    word_regex()
        .find_iter(query)
        .map(|m| m.as_str().to_ascii_lowercase())
        .filter(|k| seen.insert(k.clone()))
        .collect()
}

/// Matcher built once per query and reused for every record on screen
#[derive(Debug, Clone, Default)]
pub struct Highlighter {
    pattern: Option<Regex>,
}

impl Highlighter {
    pub fn new(query: &str) -> Self {
        let mut words = keywords(query);
        if words.is_empty() {
            return Self::default();
        }

        // Longest first so a keyword never loses to its own prefix
        words.sort_by(|a, b| b.len().cmp(&a.len()));
        let alternation = words
            .iter()
            .map(|w| regex::escape(w))
            .collect::<Vec<_>>()
            .join("|");

        let pattern = match RegexBuilder::new(&alternation)
            .case_insensitive(true)
            .build()
        {
            Ok(re) => Some(re),
            Err(e) => {
                warn!(error = %e, "Could not build highlight pattern");
                None
            }
        };

        Self { pattern }
    }

    /// Whether any keyword exists
    pub fn is_active(&self) -> bool {
        self.pattern.is_some()
    }

    /// Split `text` into plain and matched segments covering it exactly
    pub fn segments<'a>(&self, text: &'a str) -> Vec<Segment<'a>> {
        let pattern = match &self.pattern {
            Some(p) if !text.is_empty() => p,
            _ => return vec![Segment::Plain(text)],
        };

        let mut segments = Vec::new();
        let mut last = 0;
        for m in pattern.find_iter(text) {
            if m.start() > last {
                segments.push(Segment::Plain(&text[last..m.start()]));
            }
            segments.push(Segment::Matched(m.as_str()));
            last = m.end();
        }
        if last < text.len() || segments.is_empty() {
            segments.push(Segment::Plain(&text[last..]));
        }
        segments
    }
}

/// Highlight the keywords of `query` inside `text`
pub fn highlight<'a>(text: &'a str, query: &str) -> Vec<Segment<'a>> {
    Highlighter::new(query).segments(text)
}
