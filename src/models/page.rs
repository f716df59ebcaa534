//! Pagination over a fetched record set.

use serde::Serialize;

use super::StudyRecord;

/// Number of records shown per page
pub const PAGE_SIZE: usize = 20;

/// Number of pages needed for `count` records; never less than one
pub fn total_pages(count: usize) -> usize {
    count.div_ceil(PAGE_SIZE).max(1)
}

/// Clamp a requested 1-based page into `[1, total_pages(count)]`
pub fn clamp_page(requested: i64, count: usize) -> usize {
    let last = total_pages(count) as i64;
    requested.clamp(1, last) as usize
}

/// A view of one page of results
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ResultPage<'a> {
    /// Records on this page
    pub records: &'a [StudyRecord],

    /// 1-based page index, already clamped
    pub page: usize,

    /// Total number of pages
    pub total_pages: usize,

    /// Total number of records across all pages
    pub total: usize,
}

impl<'a> ResultPage<'a> {
    /// Slice `all` at `page`, clamping the index first
    pub fn new(all: &'a [StudyRecord], page: i64) -> Self {
        let total = all.len();
        let page = clamp_page(page, total);
        let start = ((page - 1) * PAGE_SIZE).min(total);
        let end = (start + PAGE_SIZE).min(total);

        Self {
            records: &all[start..end],
            page,
            total_pages: total_pages(total),
            total,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StudyRecordBuilder;

    fn records(n: usize) -> Vec<StudyRecord> {
        (0..n)
            .map(|i| StudyRecordBuilder::new(format!("Study {}", i)).build())
            .collect()
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0), 1);
        assert_eq!(total_pages(1), 1);
        assert_eq!(total_pages(20), 1);
        assert_eq!(total_pages(21), 2);
        assert_eq!(total_pages(45), 3);
    }

    #[test]
    fn test_clamp_page_bounds() {
        assert_eq!(clamp_page(0, 45), 1);
        assert_eq!(clamp_page(-7, 45), 1);
        assert_eq!(clamp_page(4, 45), 3);
        assert_eq!(clamp_page(2, 45), 2);
        assert_eq!(clamp_page(i64::MAX, 0), 1);
    }

    #[test]
    fn test_last_page_is_partial() {
        let all = records(45);
        let page = ResultPage::new(&all, 3);
        assert_eq!(page.records.len(), 5);
        assert_eq!(page.records[0].title(), "Study 40");
        assert!(page.has_previous());
        assert!(!page.has_next());
    }

    #[test]
    fn test_empty_set_has_one_empty_page() {
        let page = ResultPage::new(&[], 1);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 1);
        assert!(page.records.is_empty());
    }
}
