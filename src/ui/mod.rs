//! Terminal rendering for the catalog and results panels.
//!
//! Renderers build strings instead of printing so the shell, the one-shot
//! commands, and tests share the same output. Matched keywords are styled
//! with `owo-colors` when color is enabled and bracketed otherwise.

use comfy_table::{presets, Cell, Table};
use owo_colors::OwoColorize;
use std::fmt::Write as _;
use std::io::IsTerminal;
use std::time::Duration;

use crate::catalog::CatalogState;
use crate::models::StudyRecord;
use crate::studies::{Highlighter, Segment, StudiesView};
use crate::utils::truncate_with_ellipsis;

/// Get the current terminal width.
pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(100)
}

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Info,
    Loading,
}

/// Status icons for different states.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Info => "ℹ",
        Status::Loading => "◐",
    }
}

/// Rendering switches
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub color: bool,
    pub width: usize,
}

impl RenderOptions {
    /// Plain output at a fixed width, for pipes and tests
    pub fn plain(width: usize) -> Self {
        Self {
            color: false,
            width,
        }
    }

    /// Detect color and width from the terminal
    pub fn detect() -> Self {
        Self {
            color: is_terminal(),
            width: terminal_width(),
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::plain(100)
    }
}

/// One status line with its icon.
pub fn status_line(status: Status, msg: &str, opts: RenderOptions) -> String {
    let icon = status_icon(status);
    if !opts.color {
        return format!("{} {}", icon, msg);
    }
    match status {
        Status::Success => format!("{} {}", icon.green().bold(), msg),
        Status::Error => format!("{} {}", icon.red().bold(), msg.red()),
        Status::Info => format!("{} {}", icon.cyan().bold(), msg),
        Status::Loading => format!("{} {}", icon.cyan(), msg.dimmed()),
    }
}

/// Join highlighted segments back into display text
pub fn render_segments(segments: &[Segment<'_>], opts: RenderOptions) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Plain(s) => out.push_str(s),
            Segment::Matched(s) if opts.color => {
                let _ = write!(out, "{}", s.black().on_cyan().bold());
            }
            Segment::Matched(s) => {
                let _ = write!(out, "[{}]", s);
            }
        }
    }
    out
}

/// `Page p / n, Total t records`
pub fn page_summary(view: &StudiesView) -> String {
    format!(
        "Page {} / {}, Total {} records",
        view.page, view.total_pages, view.total
    )
}

/// Render a single study card.
pub fn render_card(record: &StudyRecord, highlighter: &Highlighter, opts: RenderOptions) -> String {
    let width = opts.width.clamp(20, 100);
    let mut out = String::new();

    let journal = record.journal.as_deref().unwrap_or("(no journal)");
    let meta = match &record.year {
        Some(year) => format!("{} · {}", year, journal),
        None => journal.to_string(),
    };
    let _ = writeln!(out, "{}", if opts.color { meta.bold().to_string() } else { meta });

    let title = render_segments(&highlighter.segments(record.title()), opts);
    let _ = writeln!(out, "{}", title);

    let authors = record.authors.as_deref().unwrap_or("(no authors)");
    let _ = writeln!(out, "{}", truncate_with_ellipsis(authors, width));

    let mut footer = Vec::new();
    if let Some(id) = record.study_id.as_deref().filter(|id| !id.is_empty()) {
        footer.push(format!("STUDY ID : {}", id));
    }
    if let Some(contrast) = record.contrast.as_deref().filter(|c| !c.is_empty()) {
        footer.push(format!("CONTRAST: {}", contrast));
    }
    if !footer.is_empty() {
        let _ = writeln!(out, "{}", footer.join("   "));
    }
    if let Some(url) = record.record_url() {
        let _ = writeln!(out, "{}", if opts.color { url.dimmed().to_string() } else { url });
    }

    out
}

/// Render the whole results panel.
pub fn render_studies(view: &StudiesView, opts: RenderOptions) -> String {
    let mut out = String::new();
    let rule = "─".repeat(opts.width.clamp(20, 80));

    if view.query.is_empty() {
        let _ = writeln!(out, "Studies");
        let _ = writeln!(
            out,
            "{}",
            status_line(Status::Info, "Build a query to see matching studies.", opts)
        );
        return out;
    }

    let _ = writeln!(out, "Studies    {}", page_summary(view));

    if view.is_loading() {
        let _ = writeln!(out, "{}", status_line(Status::Loading, "Loading studies…", opts));
        return out;
    }

    if let Some(error) = view.error() {
        let _ = writeln!(out, "{}", status_line(Status::Error, error, opts));
        return out;
    }

    if view.records.is_empty() {
        let _ = writeln!(out, "No results found.");
        return out;
    }

    let highlighter = view.highlighter();
    for record in &view.records {
        let _ = writeln!(out, "{}", rule);
        out.push_str(&render_card(record, &highlighter, opts));
    }
    let _ = writeln!(out, "{}", rule);

    if view.total_pages > 1 {
        let previous = if view.has_previous() { "← Previous" } else { "" };
        let next = if view.has_next() { "Next →" } else { "" };
        let _ = writeln!(
            out,
            "{:<12}Page {} / {}{:>12}",
            previous, view.page, view.total_pages, next
        );
    }

    out
}

/// Render the catalog panel for an already-filtered term list.
pub fn render_terms(state: &CatalogState, terms: &[String], opts: RenderOptions) -> String {
    match state {
        CatalogState::Idle | CatalogState::Loading => {
            format!("{}\n", status_line(Status::Loading, "Loading terms…", opts))
        }
        CatalogState::Errored(message) => {
            format!("{}\nNo terms found\n", status_line(Status::Error, message, opts))
        }
        CatalogState::Cancelled => "No terms found\n".to_string(),
        CatalogState::Ready if terms.is_empty() => "No terms found\n".to_string(),
        CatalogState::Ready => {
            let mut table = Table::new();
            table.load_preset(if opts.color {
                presets::UTF8_FULL
            } else {
                presets::ASCII_MARKDOWN
            });
            table.set_header(vec!["#", "Term"]);
            for (i, term) in terms.iter().enumerate() {
                table.add_row(vec![Cell::new(i + 1), Cell::new(term)]);
            }
            format!("{table}\n")
        }
    }
}

/// Loading spinner shown while a one-shot command waits on the index.
pub struct Spinner {
    pb: indicatif::ProgressBar,
}

impl Spinner {
    /// Create a new spinner with the given message.
    pub fn new(msg: &str) -> Self {
        let pb = indicatif::ProgressBar::new_spinner();
        if let Ok(style) = indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "));
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// Stop and erase the spinner.
    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StudyRecordBuilder;
    use crate::studies::FetchStatus;

    fn view(query: &str, status: FetchStatus, records: Vec<StudyRecord>) -> StudiesView {
        let total = records.len();
        StudiesView {
            query: query.to_string(),
            status,
            page: 1,
            total_pages: 1,
            total,
            records,
        }
    }

    #[test]
    fn test_status_icon() {
        assert_eq!(status_icon(Status::Success), "✓");
        assert_eq!(status_icon(Status::Error), "✗");
    }

    #[test]
    fn test_memory_recall_card() {
        let record = StudyRecordBuilder::new("Recall under stress")
            .year(2020)
            .study_id("123")
            .build();
        let out = render_studies(
            &view("memory AND recall", FetchStatus::Loaded, vec![record]),
            RenderOptions::plain(80),
        );

        assert!(out.contains("Page 1 / 1, Total 1 records"));
        assert!(out.contains("[Recall] under stress"));
        assert!(out.contains("2020 · (no journal)"));
        assert!(out.contains("(no authors)"));
        assert!(out.contains("STUDY ID : 123"));
        assert!(out.contains("https://pubmed.ncbi.nlm.nih.gov/123"));
        assert!(!out.contains("Next →"));
    }

    #[test]
    fn test_states() {
        let opts = RenderOptions::plain(80);
        let loading = render_studies(&view("fear", FetchStatus::Loading, vec![]), opts);
        assert!(loading.contains("Loading studies…"));

        let failed = render_studies(
            &view(
                "fear",
                FetchStatus::Failed("Failed to fetch studies: HTTP 500".to_string()),
                vec![],
            ),
            opts,
        );
        assert!(failed.contains("✗ Failed to fetch studies: HTTP 500"));

        let empty = render_studies(&view("fear", FetchStatus::Loaded, vec![]), opts);
        assert!(empty.contains("No results found."));

        let idle = render_studies(&view("", FetchStatus::Idle, vec![]), opts);
        assert!(!idle.contains("Page"));
    }

    #[test]
    fn test_pagination_footer() {
        let mut v = view(
            "memory",
            FetchStatus::Loaded,
            vec![StudyRecordBuilder::new("Memory").build()],
        );
        v.page = 2;
        v.total_pages = 3;
        v.total = 45;
        let out = render_studies(&v, RenderOptions::plain(80));
        assert!(out.contains("Page 2 / 3, Total 45 records"));
        assert!(out.contains("← Previous"));
        assert!(out.contains("Next →"));
    }

    #[test]
    fn test_contrast_and_journal() {
        let record = StudyRecordBuilder::new("Fear extinction")
            .journal("Neuron")
            .authors("Doe J; Roe R")
            .contrast("fear > neutral")
            .build();
        let out = render_card(&record, &Highlighter::new("fear"), RenderOptions::plain(80));
        assert!(out.starts_with("Neuron\n"));
        assert!(out.contains("[Fear] extinction"));
        assert!(out.contains("Doe J; Roe R"));
        assert!(out.contains("CONTRAST: fear > neutral"));
        assert!(!out.contains("STUDY ID"));
    }

    #[test]
    fn test_render_terms() {
        let opts = RenderOptions::plain(80);
        let terms = vec!["memory".to_string()];
        assert!(render_terms(&CatalogState::Ready, &terms, opts).contains("memory"));
        assert_eq!(render_terms(&CatalogState::Ready, &[], opts), "No terms found\n");
        assert!(render_terms(&CatalogState::Loading, &[], opts).contains("Loading terms…"));
        assert_eq!(
            render_terms(&CatalogState::Cancelled, &[], opts),
            "No terms found\n"
        );
        assert!(render_terms(
            &CatalogState::Errored("Failed to fetch terms: HTTP 404".to_string()),
            &[],
            opts
        )
        .contains("Failed to fetch terms: HTTP 404"));
    }
}
