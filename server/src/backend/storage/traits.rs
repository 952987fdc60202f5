//! # Storage Traits
//!
//! Abstractions over the remote tables, procedures and object storage so the
//! domain services can run against the hosted backend or an in-memory store.

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::{ActivityLog, Contribution, LoanApplication, LoanPayment, LoanRelease, MemberProfile, Setting};
use uuid::Uuid;

use crate::backend::domain::commands::activity::ActivityLogQuery;
use crate::backend::domain::commands::contributions::{ContributionListQuery, ContributionTotalQuery};
use crate::backend::domain::commands::loans::LoanListQuery;
use crate::backend::domain::commands::members::MemberListQuery;
use crate::backend::domain::commands::pagination::PageResult;
use crate::backend::domain::models::activity_log::NewActivityLogRow;
use crate::backend::domain::models::contribution::NewContributionRow;
use crate::backend::domain::models::loan::{
    LoanApplicationChanges, NewLoanApplicationRow, NewLoanPaymentRow, NewLoanReleaseRow,
};
use crate::backend::domain::models::member::{MemberChanges, NewMemberRow};

/// Member profile storage
#[async_trait]
pub trait MemberStorage: Send + Sync {
    /// Retrieve a member by ID, archived or not
    async fn get_member(&self, member_id: Uuid) -> Result<Option<MemberProfile>>;

    /// One page of non-archived members ordered by last name, with the exact total
    async fn list_members(&self, query: &MemberListQuery) -> Result<PageResult<MemberProfile>>;

    /// Exact number of non-archived active members
    async fn count_active_members(&self) -> Result<u64>;

    async fn insert_member(&self, row: &NewMemberRow) -> Result<MemberProfile>;

    async fn update_member(&self, member_id: Uuid, changes: &MemberChanges) -> Result<MemberProfile>;
}

/// Contribution storage and the contribution-total aggregate
#[async_trait]
pub trait ContributionStorage: Send + Sync {
    /// One page of contributions ordered by contribution date
    async fn list_contributions(&self, query: &ContributionListQuery) -> Result<PageResult<Contribution>>;

    async fn insert_contribution(&self, row: &NewContributionRow) -> Result<Contribution>;

    /// Sum of matching contributions; zero when nothing matches
    async fn total_contributions(&self, query: &ContributionTotalQuery) -> Result<Decimal>;
}

/// Loan application, release and payment storage
#[async_trait]
pub trait LoanStorage: Send + Sync {
    async fn get_loan(&self, loan_id: Uuid) -> Result<Option<LoanApplication>>;

    /// One page of applications, newest first
    async fn list_loans(&self, query: &LoanListQuery) -> Result<PageResult<LoanApplication>>;

    async fn insert_loan(&self, row: &NewLoanApplicationRow) -> Result<LoanApplication>;

    async fn update_loan(&self, loan_id: Uuid, changes: &LoanApplicationChanges) -> Result<LoanApplication>;

    async fn get_release(&self, loan_id: Uuid) -> Result<Option<LoanRelease>>;

    async fn insert_release(&self, row: &NewLoanReleaseRow) -> Result<LoanRelease>;

    /// Payments of a loan, oldest first
    async fn list_payments(&self, loan_id: Uuid) -> Result<Vec<LoanPayment>>;

    async fn insert_payment(&self, row: &NewLoanPaymentRow) -> Result<LoanPayment>;
}

/// Key/value settings storage
#[async_trait]
pub trait SettingsStorage: Send + Sync {
    /// Settings of one category, or all settings, ordered by category and key
    async fn list_settings(&self, category: Option<&str>) -> Result<Vec<Setting>>;

    async fn get_setting(&self, category: &str, key: &str) -> Result<Option<Setting>>;

    async fn insert_setting(&self, setting: &Setting) -> Result<Setting>;

    /// Replace the value of an existing (category, key) row
    async fn update_setting(&self, setting: &Setting) -> Result<Setting>;
}

/// Audit trail storage
#[async_trait]
pub trait ActivityLogStorage: Send + Sync {
    async fn insert_log(&self, row: &NewActivityLogRow) -> Result<ActivityLog>;

    /// One page of logs, newest first
    async fn list_logs(&self, query: &ActivityLogQuery) -> Result<PageResult<ActivityLog>>;
}

/// Object storage for member files
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store `bytes` at `path`, replacing any existing object, and return its public URL
    async fn upload_object(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;
}
