//! Domain-level query types
//! These structs are used by services and storage inside the backend and are
//! **not** exposed over the public API. The REST layer maps query-string
//! parameters onto them.

pub mod pagination {
    use shared::{PageResponse, PaginationInfo};

    pub const DEFAULT_PAGE_SIZE: u32 = 10;
    pub const MAX_PAGE_SIZE: u32 = 100;

    /// A 1-based page request, clamped to sane bounds
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PageRequest {
        pub page: u32,
        pub page_size: u32,
    }

    impl PageRequest {
        pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
            Self {
                page: page.unwrap_or(1).max(1),
                page_size: page_size
                    .unwrap_or(DEFAULT_PAGE_SIZE)
                    .clamp(1, MAX_PAGE_SIZE),
            }
        }

        /// Zero-based inclusive row range for this page
        pub fn range(&self) -> (u64, u64) {
            let from = (self.page as u64 - 1) * self.page_size as u64;
            (from, from + self.page_size as u64 - 1)
        }

        /// Build the response page from fetched rows
        pub fn into_response<T>(self, rows: Vec<T>, total: Option<u64>) -> PageResponse<T> {
            let has_more = match total {
                Some(total) => (self.page as u64) * (self.page_size as u64) < total,
                None => rows.len() as u32 == self.page_size,
            };
            PageResponse {
                items: rows,
                pagination: PaginationInfo {
                    page: self.page,
                    page_size: self.page_size,
                    total,
                    has_more,
                },
            }
        }
    }

    impl Default for PageRequest {
        fn default() -> Self {
            Self::new(None, None)
        }
    }

    /// Rows of one page plus the exact total, as returned by storage
    #[derive(Debug, Clone, PartialEq)]
    pub struct PageResult<T> {
        pub rows: Vec<T>,
        pub total: Option<u64>,
    }
}

pub mod members {
    use super::pagination::PageRequest;
    use shared::MemberStatus;

    /// Query parameters for listing members
    #[derive(Debug, Clone, Default)]
    pub struct MemberListQuery {
        pub status: Option<MemberStatus>,
        /// Free-text search applied in memory to the fetched page
        pub search: Option<String>,
        pub page: PageRequest,
    }
}

pub mod contributions {
    use super::pagination::PageRequest;
    use crate::backend::domain::errors::DomainError;
    use crate::backend::storage::cache::QueryKey;
    use chrono::NaiveDate;
    use shared::ContributionCategory;
    use uuid::Uuid;

    pub const MIN_YEAR: i32 = 1;
    pub const MAX_YEAR: i32 = 9999;

    /// Calendar period filter: a whole year or one month of a year
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Period {
        pub year: Option<i32>,
        pub month: Option<u32>,
    }

    impl Period {
        pub fn new(year: Option<i32>, month: Option<u32>) -> Result<Self, DomainError> {
            if let Some(year) = year {
                if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
                    return Err(DomainError::validation(format!(
                        "Invalid year: {}. Must be {}-{}",
                        year, MIN_YEAR, MAX_YEAR
                    )));
                }
            }
            if let Some(month) = month {
                if !(1..=12).contains(&month) {
                    return Err(DomainError::validation(format!(
                        "Invalid month: {}. Must be 1-12",
                        month
                    )));
                }
                if year.is_none() {
                    return Err(DomainError::validation("A month filter requires a year"));
                }
            }
            Ok(Self { year, month })
        }

        pub fn month_of(year: i32, month: u32) -> Self {
            Self {
                year: Some(year),
                month: Some(month),
            }
        }

        /// Half-open date range `[start, end)` covered by this period
        pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
            let year = self.year?;
            match self.month {
                Some(month) => {
                    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
                    let end = if month == 12 {
                        NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
                    } else {
                        NaiveDate::from_ymd_opt(year, month + 1, 1)?
                    };
                    Some((start, end))
                }
                None => Some((
                    NaiveDate::from_ymd_opt(year, 1, 1)?,
                    NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?,
                )),
            }
        }

        /// The month before this one; `None` unless both year and month are set
        pub fn previous_month(&self) -> Option<Self> {
            let (year, month) = (self.year?, self.month?);
            if month == 1 {
                Some(Self::month_of(year.checked_sub(1)?, 12))
            } else {
                Some(Self::month_of(year, month.checked_sub(1)?))
            }
        }
    }

    /// Query parameters for listing contributions
    #[derive(Debug, Clone, Default)]
    pub struct ContributionListQuery {
        pub member_id: Option<Uuid>,
        pub category: Option<ContributionCategory>,
        pub period: Period,
        /// Oldest first instead of the default newest first
        pub ascending: bool,
        pub page: PageRequest,
    }

    /// Parameters of the contribution-total remote procedure
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ContributionTotalQuery {
        pub member_id: Option<Uuid>,
        pub period: Period,
        pub category: Option<ContributionCategory>,
    }

    impl ContributionTotalQuery {
        pub const CACHE_SCOPE: &'static str = "contribution_total";

        /// All-time share capital of one member
        pub fn share_capital_of(member_id: Uuid) -> Self {
            Self {
                member_id: Some(member_id),
                period: Period::default(),
                category: Some(ContributionCategory::ShareCapital),
            }
        }

        pub fn cache_key(&self) -> QueryKey {
            QueryKey::new(Self::CACHE_SCOPE)
                .with(self.member_id)
                .with(self.period.year)
                .with(self.period.month)
                .with(self.category)
        }
    }
}

pub mod loans {
    use super::pagination::PageRequest;
    use shared::LoanStatus;
    use uuid::Uuid;

    /// Query parameters for listing loan applications
    #[derive(Debug, Clone, Default)]
    pub struct LoanListQuery {
        pub member_id: Option<Uuid>,
        pub status: Option<LoanStatus>,
        pub page: PageRequest,
    }
}

pub mod activity {
    use super::pagination::PageRequest;
    use uuid::Uuid;

    /// Query parameters for listing activity logs
    #[derive(Debug, Clone, Default)]
    pub struct ActivityLogQuery {
        pub actor_id: Option<Uuid>,
        pub entity_type: Option<String>,
        pub page: PageRequest,
    }
}
