//! # Table Helpers
//!
//! Client-side helpers for list views: in-memory search filtering, page
//! slicing over already-fetched rows, and a search-input debouncer.
//!
//! These operate on rows that have already been fetched; they never issue
//! requests themselves.

use crate::{Contribution, MemberProfile};
use std::time::{Duration, Instant};

/// Delay between the last keystroke and the search actually running
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(250);

/// Default number of rows per page in list views
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Rows that can be matched by the free-text search box
pub trait Searchable {
    /// Text fields the search query is matched against
    fn search_fields(&self) -> Vec<&str>;
}

impl Searchable for MemberProfile {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.member_code.as_str(),
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.email.as_str(),
        ];
        if let Some(middle) = self.middle_name.as_deref() {
            fields.push(middle);
        }
        fields
    }
}

impl Searchable for Contribution {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.category.as_str()];
        fields.extend(self.payment_method.as_deref());
        fields.extend(self.reference_no.as_deref());
        fields.extend(self.remarks.as_deref());
        fields
    }
}

/// Case-insensitive substring filter over `Searchable` rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableFilter {
    query: String,
}

impl TableFilter {
    pub fn new(query: &str) -> Self {
        Self {
            query: query.trim().to_lowercase(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }

    /// Check whether a single row matches; an empty query matches everything
    pub fn matches<T: Searchable>(&self, row: &T) -> bool {
        if self.query.is_empty() {
            return true;
        }
        row.search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(&self.query))
    }

    /// Keep only the matching rows, preserving order
    pub fn apply<T: Searchable>(&self, rows: Vec<T>) -> Vec<T> {
        if self.query.is_empty() {
            return rows;
        }
        rows.into_iter().filter(|row| self.matches(row)).collect()
    }
}

/// One page of in-memory rows
#[derive(Debug, Clone, PartialEq)]
pub struct TablePage<T> {
    pub rows: Vec<T>,
    /// 1-based page number that was requested
    pub page: u32,
    pub page_size: u32,
    pub total_rows: usize,
    pub total_pages: u32,
}

impl<T> TablePage<T> {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// Slice `rows` into the requested 1-based page.
///
/// A page of 0 is treated as page 1 and a page size of 0 as the default.
/// Pages past the end come back empty with the totals still filled in.
pub fn paginate<T: Clone>(rows: &[T], page: u32, page_size: u32) -> TablePage<T> {
    let page = page.max(1);
    let page_size = if page_size == 0 { DEFAULT_PAGE_SIZE } else { page_size };
    let total_rows = rows.len();
    let total_pages = total_rows.div_ceil(page_size as usize) as u32;

    let start = (page as usize - 1).saturating_mul(page_size as usize);
    let page_rows = if start >= total_rows {
        Vec::new()
    } else {
        let end = (start + page_size as usize).min(total_rows);
        rows[start..end].to_vec()
    };

    TablePage {
        rows: page_rows,
        page,
        page_size,
        total_rows,
        total_pages,
    }
}

/// Rate-limits search input so the filter only re-runs after typing pauses.
///
/// Time is passed in explicitly, which keeps the debouncer free of timers
/// and lets any event loop drive it.
#[derive(Debug, Clone)]
pub struct SearchDebouncer {
    delay: Duration,
    pending: Option<(String, Instant)>,
    last_emitted: Option<String>,
}

impl SearchDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            last_emitted: None,
        }
    }

    /// Record a new input value; restarts the quiet period
    pub fn input(&mut self, text: &str, now: Instant) {
        self.pending = Some((text.to_string(), now));
    }

    /// Whether an input is still waiting for its quiet period to pass
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Release the pending query once the delay has elapsed since the last input.
    ///
    /// Returns `None` while still waiting, or when the settled value equals
    /// the one emitted last time.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        let ready = match &self.pending {
            Some((_, at)) => now.saturating_duration_since(*at) >= self.delay,
            None => false,
        };
        if !ready {
            return None;
        }

        let (text, _) = self.pending.take()?;
        if self.last_emitted.as_deref() == Some(text.as_str()) {
            return None;
        }
        self.last_emitted = Some(text.clone());
        Some(text)
    }
}

impl Default for SearchDebouncer {
    fn default() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }
}
