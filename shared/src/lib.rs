use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub mod table;

/// Role of a member within the cooperative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    /// Regular member, may only see their own records
    #[default]
    Member,
    /// Board user, manages members, contributions, loans and settings
    Board,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Member => "member",
            MemberRole::Board => "board",
        }
    }
}

/// Membership status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    #[default]
    Active,
    Inactive,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Active => "active",
            MemberStatus::Inactive => "inactive",
        }
    }
}

/// A member profile row from the `members` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberProfile {
    pub id: Uuid,
    /// Human-facing membership number, e.g. "M-0042"
    pub member_code: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub join_date: Option<NaiveDate>,
    #[serde(default)]
    pub role: MemberRole,
    #[serde(default)]
    pub status: MemberStatus,
    pub profile_picture_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when the member is archived (soft delete)
    pub archived_at: Option<DateTime<Utc>>,
}

impl MemberProfile {
    /// Display name in "Last, First M." form
    pub fn display_name(&self) -> String {
        match self.middle_name.as_deref().and_then(|m| m.chars().next()) {
            Some(initial) => format!("{}, {} {}.", self.last_name, self.first_name, initial),
            None => format!("{}, {}", self.last_name, self.first_name),
        }
    }

    pub fn is_board(&self) -> bool {
        self.role == MemberRole::Board
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }
}

/// Request for creating a new member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateMemberRequest {
    pub member_code: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub join_date: Option<NaiveDate>,
    pub role: Option<MemberRole>,
}

/// Request for updating an existing member; absent fields are left untouched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UpdateMemberRequest {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub join_date: Option<NaiveDate>,
    pub role: Option<MemberRole>,
    pub status: Option<MemberStatus>,
}

/// Response after creating or updating a member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberResponse {
    pub member: MemberProfile,
    pub success_message: String,
}

/// Response after uploading a profile picture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilePictureResponse {
    pub profile_picture_url: String,
    pub member: MemberProfile,
}

/// Elapsed calendar time; `months` is always in `0..=11`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateDifference {
    pub years: i32,
    pub months: u32,
    pub days: u32,
}

/// How long a member has been a member, and how old they are, as of today
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberDurationsResponse {
    pub member_id: Uuid,
    /// `None` without a join date, or when it lies in the future
    pub tenure: Option<DateDifference>,
    /// `None` without a birth date, or when it lies in the future
    pub age: Option<DateDifference>,
}

/// Kind of contribution a member deposits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionCategory {
    /// Member-owned equity, basis for loan eligibility and sizing
    ShareCapital,
    /// Club fund deposit
    ClubFund,
}

impl ContributionCategory {
    pub const ALL: [ContributionCategory; 2] =
        [ContributionCategory::ShareCapital, ContributionCategory::ClubFund];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContributionCategory::ShareCapital => "share_capital",
            ContributionCategory::ClubFund => "club_fund",
        }
    }
}

impl fmt::Display for ContributionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A contribution row from the `contributions` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub id: Uuid,
    pub member_id: Uuid,
    pub category: ContributionCategory,
    pub amount: Decimal,
    pub contribution_date: NaiveDate,
    pub payment_method: Option<String>,
    pub reference_no: Option<String>,
    pub remarks: Option<String>,
    /// Board user who recorded the deposit
    pub recorded_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Request for recording a contribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordContributionRequest {
    pub member_id: Uuid,
    pub category: ContributionCategory,
    pub amount: Decimal,
    /// Defaults to today when absent
    pub contribution_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
    pub reference_no: Option<String>,
    pub remarks: Option<String>,
}

/// Response containing an aggregate contribution total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionTotalResponse {
    pub member_id: Option<Uuid>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub category: Option<ContributionCategory>,
    pub total: Decimal,
}

/// Kind of loan a member may apply for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanType {
    Regular,
    /// Loan secured by share capital, capped at the loanable amount
    ShareCapital,
}

impl LoanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanType::Regular => "regular",
            LoanType::ShareCapital => "share_capital",
        }
    }
}

/// Lifecycle status of a loan application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Pending,
    Approved,
    Rejected,
    Released,
    Paid,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Pending => "pending",
            LoanStatus::Approved => "approved",
            LoanStatus::Rejected => "rejected",
            LoanStatus::Released => "released",
            LoanStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A loan application row from the `loan_applications` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub id: Uuid,
    pub member_id: Uuid,
    pub loan_type: LoanType,
    pub amount_requested: Decimal,
    pub term_months: u32,
    pub purpose: String,
    pub status: LoanStatus,
    pub reviewed_by: Option<Uuid>,
    pub review_remarks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A loan release row from the `loan_releases` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRelease {
    pub id: Uuid,
    pub loan_id: Uuid,
    pub principal: Decimal,
    /// Interest rate in percent, e.g. 5.00
    pub interest_rate: Decimal,
    pub interest_amount: Decimal,
    pub total_payable: Decimal,
    pub release_date: NaiveDate,
    pub due_date: NaiveDate,
    pub released_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A loan payment row from the `loan_payments` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanPayment {
    pub id: Uuid,
    pub loan_id: Uuid,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    /// Balance left on the loan after this payment
    pub remaining_balance: Decimal,
    pub recorded_by: Uuid,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request for applying for a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyLoanRequest {
    /// Defaults to the calling member
    pub member_id: Option<Uuid>,
    pub loan_type: LoanType,
    pub amount_requested: Decimal,
    pub term_months: u32,
    pub purpose: String,
}

/// Request body for approving or rejecting a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ReviewLoanRequest {
    pub remarks: Option<String>,
}

/// Request for releasing an approved loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ReleaseLoanRequest {
    /// Defaults to today when absent
    pub release_date: Option<NaiveDate>,
}

/// Request for recording a loan payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPaymentRequest {
    pub amount: Decimal,
    pub payment_date: Option<NaiveDate>,
    pub remarks: Option<String>,
}

/// Full view of a loan: application plus release and payments if any
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanDetailResponse {
    pub application: LoanApplication,
    pub release: Option<LoanRelease>,
    pub payments: Vec<LoanPayment>,
    /// Outstanding balance; `None` until the loan is released
    pub outstanding_balance: Option<Decimal>,
}

/// Response describing how much a member may borrow against share capital
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanableAmountResponse {
    pub member_id: Uuid,
    pub share_capital_total: Decimal,
    pub total_loanable: Decimal,
    pub percentage: Decimal,
}

/// One criterion of the loan-eligibility gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionCheck<T> {
    /// Current value; `None` when the underlying profile field is missing
    pub current: Option<T>,
    pub threshold: T,
    pub passed: bool,
}

/// Per-criterion breakdown of an eligibility evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityBreakdown {
    pub tenure_years: CriterionCheck<u32>,
    pub age_years: CriterionCheck<u32>,
    pub share_capital: CriterionCheck<Decimal>,
}

/// Response of the loan-eligibility gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityResponse {
    pub member_id: Uuid,
    pub has_restriction: bool,
    pub breakdown: EligibilityBreakdown,
}

/// A settings row: (category, key) -> free-text value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub category: String,
    pub key: String,
    pub value: String,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Request for creating or replacing a setting value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertSettingRequest {
    pub category: String,
    pub key: String,
    pub value: String,
}

/// Response containing settings rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsListResponse {
    pub settings: Vec<Setting>,
}

/// An activity log row from the `activity_logs` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Totals of one contribution category for the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: ContributionCategory,
    pub current_total: Decimal,
    pub previous_total: Decimal,
    /// Period-over-period growth in whole percent; `None` when there is no previous total
    pub growth_percentage: Option<i64>,
}

/// Dashboard contribution summary for a year/month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub year: i32,
    pub month: u32,
    /// `None` for organisation-wide totals
    pub member_id: Option<Uuid>,
    pub categories: Vec<CategorySummary>,
    /// Number of active members, only reported to board users
    pub active_member_count: Option<u64>,
}

/// Pagination info returned with list responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationInfo {
    /// 1-based page number
    pub page: u32,
    pub page_size: u32,
    /// Exact total row count when the backend reported one
    pub total: Option<u64>,
    pub has_more: bool,
}

/// A page of list results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub pagination: PaginationInfo,
}

/// Error body returned by the REST layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Eligibility breakdown when a loan application was refused by the gate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eligibility: Option<EligibilityBreakdown>,
}
