//! Query builder for the backend's REST table endpoints.
//!
//! Filters are rendered as `column=operator.value` query pairs, ordering as
//! a single `order=` pair, and pagination as a `Range` header.

use std::fmt::Display;

/// Row filters shared by reads and updates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    pairs: Vec<(String, String)>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.pairs.push((column.to_string(), format!("eq.{}", value)));
        self
    }

    pub fn gte(mut self, column: &str, value: impl Display) -> Self {
        self.pairs.push((column.to_string(), format!("gte.{}", value)));
        self
    }

    pub fn lt(mut self, column: &str, value: impl Display) -> Self {
        self.pairs.push((column.to_string(), format!("lt.{}", value)));
        self
    }

    pub fn is_null(mut self, column: &str) -> Self {
        self.pairs.push((column.to_string(), "is.null".to_string()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }
}

/// A `select` against one table
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    table: String,
    columns: String,
    filters: Filters,
    order: Vec<(String, bool)>,
    range: Option<(u64, u64)>,
    count_exact: bool,
}

impl SelectQuery {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: "*".to_string(),
            filters: Filters::new(),
            order: Vec::new(),
            range: None,
            count_exact: false,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(mut self, columns: &str) -> Self {
        self.columns = columns.to_string();
        self
    }

    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.filters = self.filters.eq(column, value);
        self
    }

    /// Add an equality filter only when `value` is present
    pub fn eq_opt<V: Display>(self, column: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.eq(column, value),
            None => self,
        }
    }

    pub fn gte(mut self, column: &str, value: impl Display) -> Self {
        self.filters = self.filters.gte(column, value);
        self
    }

    pub fn lt(mut self, column: &str, value: impl Display) -> Self {
        self.filters = self.filters.lt(column, value);
        self
    }

    pub fn is_null(mut self, column: &str) -> Self {
        self.filters = self.filters.is_null(column);
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order.push((column.to_string(), ascending));
        self
    }

    /// Restrict to rows `from..=to` (zero-based, inclusive)
    pub fn range(mut self, from: u64, to: u64) -> Self {
        self.range = Some((from, to.max(from)));
        self
    }

    /// Ask the backend for the exact number of matching rows
    pub fn count_exact(mut self) -> Self {
        self.count_exact = true;
        self
    }

    pub fn wants_count(&self) -> bool {
        self.count_exact
    }

    /// Query-string pairs for the request URL
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), self.columns.clone())];
        pairs.extend(self.filters.pairs().iter().cloned());

        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(|(column, ascending)| {
                    format!("{}.{}", column, if *ascending { "asc" } else { "desc" })
                })
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(("order".to_string(), order));
        }
        pairs
    }

    /// Extra request headers for pagination and counting
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = Vec::new();
        if let Some((from, to)) = self.range {
            headers.push(("Range-Unit", "items".to_string()));
            headers.push(("Range", format!("{}-{}", from, to)));
        }
        if self.count_exact {
            headers.push(("Prefer", "count=exact".to_string()));
        }
        headers
    }
}

/// Extract the total row count from a `Content-Range` header like `0-9/120`.
///
/// Returns `None` when the backend did not count (`0-9/*`) or the header is malformed.
pub fn parse_content_range_total(header: &str) -> Option<u64> {
    let (_, total) = header.trim().split_once('/')?;
    total.trim().parse().ok()
}
