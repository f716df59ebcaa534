//! Core data models for study records and result pages.

mod page;
mod study;

pub use page::{clamp_page, total_pages, ResultPage, PAGE_SIZE};
pub use study::{StudyRecord, StudyRecordBuilder, Year, RECORD_VIEWER_BASE};
