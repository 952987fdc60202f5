/// Test utilities: an in-memory store implementing every storage trait
///
/// Service and REST tests run against `InMemoryStore` instead of the hosted
/// backend. `TestEnvironment` bundles it with a temporary directory that is
/// removed when the environment is dropped.
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{Datelike, Local, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use shared::{
    ActivityLog, Contribution, ContributionCategory, LoanApplication, LoanPayment, LoanRelease, MemberProfile,
    MemberRole, MemberStatus, Setting,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tempfile::TempDir;
use uuid::Uuid;

use super::traits::{
    ActivityLogStorage, ContributionStorage, FileStorage, LoanStorage, MemberStorage, SettingsStorage,
};
use super::Storage;
use crate::backend::domain::commands::activity::ActivityLogQuery;
use crate::backend::domain::commands::contributions::{ContributionListQuery, ContributionTotalQuery};
use crate::backend::domain::commands::loans::LoanListQuery;
use crate::backend::domain::commands::members::MemberListQuery;
use crate::backend::domain::commands::pagination::{PageRequest, PageResult};
use crate::backend::domain::models::activity_log::NewActivityLogRow;
use crate::backend::domain::models::contribution::NewContributionRow;
use crate::backend::domain::models::loan::{
    LoanApplicationChanges, NewLoanApplicationRow, NewLoanPaymentRow, NewLoanReleaseRow,
};
use crate::backend::domain::models::member::{MemberChanges, NewMemberRow};

#[derive(Default)]
struct Tables {
    members: Vec<MemberProfile>,
    contributions: Vec<Contribution>,
    loans: Vec<LoanApplication>,
    releases: Vec<LoanRelease>,
    payments: Vec<LoanPayment>,
    settings: Vec<Setting>,
    logs: Vec<ActivityLog>,
    uploads: Vec<String>,
}

/// All tables in memory, with counters for asserting cache behaviour
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    total_calls: AtomicUsize,
    fail_activity_logs: AtomicBool,
}

fn page_of<T: Clone>(rows: Vec<T>, page: &PageRequest) -> PageResult<T> {
    let total = rows.len() as u64;
    let (from, to) = page.range();
    let rows = rows
        .into_iter()
        .skip(from as usize)
        .take((to - from + 1) as usize)
        .collect();
    PageResult {
        rows,
        total: Some(total),
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert a member who joined `tenure_years` ago and is `age` years old
    pub fn seed_member(&self, role: MemberRole, tenure_years: u32, age: u32) -> MemberProfile {
        let today = Local::now().date_naive();
        let years_ago = |years: u32| today.checked_sub_months(Months::new(years * 12));
        let count = self.tables().members.len();
        let member = MemberProfile {
            id: Uuid::new_v4(),
            member_code: format!("M-{:04}", count + 1),
            first_name: format!("First{}", count + 1),
            middle_name: None,
            last_name: format!("Last{:02}", count + 1),
            email: format!("member{}@example.com", count + 1),
            phone: None,
            address: None,
            birth_date: years_ago(age),
            join_date: years_ago(tenure_years),
            role,
            status: MemberStatus::Active,
            profile_picture_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            archived_at: None,
        };
        self.tables().members.push(member.clone());
        member
    }

    pub fn seed_contribution(
        &self,
        member_id: Uuid,
        category: ContributionCategory,
        amount: i64,
        date: NaiveDate,
    ) -> Contribution {
        let contribution = Contribution {
            id: Uuid::new_v4(),
            member_id,
            category,
            amount: Decimal::from(amount),
            contribution_date: date,
            payment_method: Some("cash".to_string()),
            reference_no: None,
            remarks: None,
            recorded_by: member_id,
            created_at: Utc::now(),
        };
        self.tables().contributions.push(contribution.clone());
        contribution
    }

    pub fn seed_setting(&self, category: &str, key: &str, value: &str) {
        self.tables().settings.push(Setting {
            category: category.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            updated_at: None,
        });
    }

    pub fn member(&self, member_id: Uuid) -> Option<MemberProfile> {
        self.tables().members.iter().find(|m| m.id == member_id).cloned()
    }

    pub fn activity_logs(&self) -> Vec<ActivityLog> {
        self.tables().logs.clone()
    }

    pub fn loan_releases(&self, loan_id: Uuid) -> Vec<LoanRelease> {
        self.tables().releases.iter().filter(|r| r.loan_id == loan_id).cloned().collect()
    }

    pub fn uploads(&self) -> Vec<String> {
        self.tables().uploads.clone()
    }

    /// Number of contribution-total aggregate calls that reached the store
    pub fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }

    /// Make every activity-log insert fail from now on
    pub fn fail_activity_logs(&self) {
        self.fail_activity_logs.store(true, Ordering::SeqCst);
    }

    pub fn storage(self: &Arc<Self>) -> Storage {
        Storage {
            members: self.clone(),
            contributions: self.clone(),
            loans: self.clone(),
            settings: self.clone(),
            activity_logs: self.clone(),
            files: self.clone(),
        }
    }
}

#[async_trait]
impl MemberStorage for InMemoryStore {
    async fn get_member(&self, member_id: Uuid) -> Result<Option<MemberProfile>> {
        Ok(self.member(member_id))
    }

    async fn list_members(&self, query: &MemberListQuery) -> Result<PageResult<MemberProfile>> {
        let mut rows: Vec<MemberProfile> = self
            .tables()
            .members
            .iter()
            .filter(|m| m.archived_at.is_none())
            .filter(|m| query.status.map_or(true, |s| m.status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| (&a.last_name, &a.first_name).cmp(&(&b.last_name, &b.first_name)));
        Ok(page_of(rows, &query.page))
    }

    async fn count_active_members(&self) -> Result<u64> {
        Ok(self
            .tables()
            .members
            .iter()
            .filter(|m| m.archived_at.is_none() && m.status == MemberStatus::Active)
            .count() as u64)
    }

    async fn insert_member(&self, row: &NewMemberRow) -> Result<MemberProfile> {
        let mut tables = self.tables();
        if tables.members.iter().any(|m| m.member_code == row.member_code) {
            return Err(anyhow!("duplicate key value violates unique constraint \"members_member_code_key\""));
        }
        let member = MemberProfile {
            id: Uuid::new_v4(),
            member_code: row.member_code.clone(),
            first_name: row.first_name.clone(),
            middle_name: row.middle_name.clone(),
            last_name: row.last_name.clone(),
            email: row.email.clone(),
            phone: row.phone.clone(),
            address: row.address.clone(),
            birth_date: row.birth_date,
            join_date: row.join_date,
            role: row.role,
            status: row.status,
            profile_picture_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            archived_at: None,
        };
        tables.members.push(member.clone());
        Ok(member)
    }

    async fn update_member(&self, member_id: Uuid, changes: &MemberChanges) -> Result<MemberProfile> {
        let mut tables = self.tables();
        let member = tables
            .members
            .iter_mut()
            .find(|m| m.id == member_id)
            .ok_or_else(|| anyhow!("no member row {}", member_id))?;

        if let Some(v) = &changes.first_name {
            member.first_name = v.clone();
        }
        if let Some(v) = &changes.middle_name {
            member.middle_name = Some(v.clone());
        }
        if let Some(v) = &changes.last_name {
            member.last_name = v.clone();
        }
        if let Some(v) = &changes.email {
            member.email = v.clone();
        }
        if let Some(v) = &changes.phone {
            member.phone = Some(v.clone());
        }
        if let Some(v) = &changes.address {
            member.address = Some(v.clone());
        }
        if changes.birth_date.is_some() {
            member.birth_date = changes.birth_date;
        }
        if changes.join_date.is_some() {
            member.join_date = changes.join_date;
        }
        if let Some(v) = changes.role {
            member.role = v;
        }
        if let Some(v) = changes.status {
            member.status = v;
        }
        if let Some(v) = &changes.profile_picture_url {
            member.profile_picture_url = Some(v.clone());
        }
        if changes.archived_at.is_some() {
            member.archived_at = changes.archived_at;
        }
        member.updated_at = changes.updated_at;
        Ok(member.clone())
    }
}

#[async_trait]
impl ContributionStorage for InMemoryStore {
    async fn list_contributions(&self, query: &ContributionListQuery) -> Result<PageResult<Contribution>> {
        let range = query.period.date_range();
        let mut rows: Vec<Contribution> = self
            .tables()
            .contributions
            .iter()
            .filter(|c| query.member_id.map_or(true, |id| c.member_id == id))
            .filter(|c| query.category.map_or(true, |cat| c.category == cat))
            .filter(|c| {
                range.map_or(true, |(start, end)| c.contribution_date >= start && c.contribution_date < end)
            })
            .cloned()
            .collect();
        rows.sort_by_key(|c| (c.contribution_date, c.created_at));
        if !query.ascending {
            rows.reverse();
        }
        Ok(page_of(rows, &query.page))
    }

    async fn insert_contribution(&self, row: &NewContributionRow) -> Result<Contribution> {
        let contribution = Contribution {
            id: Uuid::new_v4(),
            member_id: row.member_id,
            category: row.category,
            amount: row.amount,
            contribution_date: row.contribution_date,
            payment_method: row.payment_method.clone(),
            reference_no: row.reference_no.clone(),
            remarks: row.remarks.clone(),
            recorded_by: row.recorded_by,
            created_at: Utc::now(),
        };
        self.tables().contributions.push(contribution.clone());
        Ok(contribution)
    }

    async fn total_contributions(&self, query: &ContributionTotalQuery) -> Result<Decimal> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .tables()
            .contributions
            .iter()
            .filter(|c| query.member_id.map_or(true, |id| c.member_id == id))
            .filter(|c| query.category.map_or(true, |cat| c.category == cat))
            .filter(|c| query.period.year.map_or(true, |y| c.contribution_date.year() == y))
            .filter(|c| query.period.month.map_or(true, |m| c.contribution_date.month() == m))
            .map(|c| c.amount)
            .sum())
    }
}

#[async_trait]
impl LoanStorage for InMemoryStore {
    async fn get_loan(&self, loan_id: Uuid) -> Result<Option<LoanApplication>> {
        Ok(self.tables().loans.iter().find(|l| l.id == loan_id).cloned())
    }

    async fn list_loans(&self, query: &LoanListQuery) -> Result<PageResult<LoanApplication>> {
        let mut rows: Vec<LoanApplication> = self
            .tables()
            .loans
            .iter()
            .filter(|l| query.member_id.map_or(true, |id| l.member_id == id))
            .filter(|l| query.status.map_or(true, |s| l.status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page_of(rows, &query.page))
    }

    async fn insert_loan(&self, row: &NewLoanApplicationRow) -> Result<LoanApplication> {
        let loan = LoanApplication {
            id: Uuid::new_v4(),
            member_id: row.member_id,
            loan_type: row.loan_type,
            amount_requested: row.amount_requested,
            term_months: row.term_months,
            purpose: row.purpose.clone(),
            status: row.status,
            reviewed_by: None,
            review_remarks: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.tables().loans.push(loan.clone());
        Ok(loan)
    }

    async fn update_loan(&self, loan_id: Uuid, changes: &LoanApplicationChanges) -> Result<LoanApplication> {
        let mut tables = self.tables();
        let loan = tables
            .loans
            .iter_mut()
            .find(|l| l.id == loan_id)
            .ok_or_else(|| anyhow!("no loan row {}", loan_id))?;
        loan.status = changes.status;
        if changes.reviewed_by.is_some() {
            loan.reviewed_by = changes.reviewed_by;
        }
        if changes.review_remarks.is_some() {
            loan.review_remarks = changes.review_remarks.clone();
        }
        loan.updated_at = changes.updated_at;
        Ok(loan.clone())
    }

    async fn get_release(&self, loan_id: Uuid) -> Result<Option<LoanRelease>> {
        Ok(self.tables().releases.iter().find(|r| r.loan_id == loan_id).cloned())
    }

    async fn insert_release(&self, row: &NewLoanReleaseRow) -> Result<LoanRelease> {
        let release = LoanRelease {
            id: Uuid::new_v4(),
            loan_id: row.loan_id,
            principal: row.principal,
            interest_rate: row.interest_rate,
            interest_amount: row.interest_amount,
            total_payable: row.total_payable,
            release_date: row.release_date,
            due_date: row.due_date,
            released_by: row.released_by,
            created_at: Utc::now(),
        };
        self.tables().releases.push(release.clone());
        Ok(release)
    }

    async fn list_payments(&self, loan_id: Uuid) -> Result<Vec<LoanPayment>> {
        let mut rows: Vec<LoanPayment> = self
            .tables()
            .payments
            .iter()
            .filter(|p| p.loan_id == loan_id)
            .cloned()
            .collect();
        rows.sort_by_key(|p| (p.payment_date, p.created_at));
        Ok(rows)
    }

    async fn insert_payment(&self, row: &NewLoanPaymentRow) -> Result<LoanPayment> {
        let payment = LoanPayment {
            id: Uuid::new_v4(),
            loan_id: row.loan_id,
            amount: row.amount,
            payment_date: row.payment_date,
            remaining_balance: row.remaining_balance,
            recorded_by: row.recorded_by,
            remarks: row.remarks.clone(),
            created_at: Utc::now(),
        };
        self.tables().payments.push(payment.clone());
        Ok(payment)
    }
}

#[async_trait]
impl SettingsStorage for InMemoryStore {
    async fn list_settings(&self, category: Option<&str>) -> Result<Vec<Setting>> {
        let mut rows: Vec<Setting> = self
            .tables()
            .settings
            .iter()
            .filter(|s| category.map_or(true, |c| s.category == c))
            .cloned()
            .collect();
        rows.sort_by(|a, b| (&a.category, &a.key).cmp(&(&b.category, &b.key)));
        Ok(rows)
    }

    async fn get_setting(&self, category: &str, key: &str) -> Result<Option<Setting>> {
        Ok(self
            .tables()
            .settings
            .iter()
            .find(|s| s.category == category && s.key == key)
            .cloned())
    }

    async fn insert_setting(&self, setting: &Setting) -> Result<Setting> {
        self.tables().settings.push(setting.clone());
        Ok(setting.clone())
    }

    async fn update_setting(&self, setting: &Setting) -> Result<Setting> {
        let mut tables = self.tables();
        let row = tables
            .settings
            .iter_mut()
            .find(|s| s.category == setting.category && s.key == setting.key)
            .ok_or_else(|| anyhow!("no setting row {}.{}", setting.category, setting.key))?;
        row.value = setting.value.clone();
        row.updated_at = setting.updated_at;
        Ok(row.clone())
    }
}

#[async_trait]
impl ActivityLogStorage for InMemoryStore {
    async fn insert_log(&self, row: &NewActivityLogRow) -> Result<ActivityLog> {
        if self.fail_activity_logs.load(Ordering::SeqCst) {
            return Err(anyhow!("activity_logs is unavailable"));
        }
        let log = ActivityLog {
            id: Uuid::new_v4(),
            actor_id: row.actor_id,
            action: row.action.clone(),
            entity_type: row.entity_type.clone(),
            entity_id: row.entity_id,
            details: row.details.clone(),
            created_at: Utc::now(),
        };
        self.tables().logs.push(log.clone());
        Ok(log)
    }

    async fn list_logs(&self, query: &ActivityLogQuery) -> Result<PageResult<ActivityLog>> {
        let mut rows: Vec<ActivityLog> = self
            .tables()
            .logs
            .iter()
            .filter(|l| query.actor_id.map_or(true, |id| l.actor_id == id))
            .filter(|l| query.entity_type.as_ref().map_or(true, |t| &l.entity_type == t))
            .cloned()
            .collect();
        rows.reverse();
        Ok(page_of(rows, &query.page))
    }
}

#[async_trait]
impl FileStorage for InMemoryStore {
    async fn upload_object(&self, path: &str, _bytes: Vec<u8>, _content_type: &str) -> Result<String> {
        self.tables().uploads.push(path.to_string());
        Ok(format!("https://test.supabase.co/storage/v1/object/public/avatars/{}", path))
    }
}

/// RAII test environment: an in-memory store plus a temporary directory
/// that is removed on drop
pub struct TestEnvironment {
    _temp_dir: TempDir,
    pub store: Arc<InMemoryStore>,
    pub storage: Storage,
    pub base_path: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let base_path = temp_dir.path().to_path_buf();
        let store = Arc::new(InMemoryStore::new());
        let storage = store.storage();
        Ok(Self {
            _temp_dir: temp_dir,
            store,
            storage,
            base_path,
        })
    }
}
