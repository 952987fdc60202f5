//! # Domain Module
//!
//! Business rules of the coop ledger: members, contributions, loans,
//! settings and the audit trail.
//!
//! ## Module Organization
//!
//! - **date_diff**, **loanable**, **growth**: pure derived-metric helpers
//! - **eligibility**: the loan-eligibility gate, parameterized by thresholds
//! - **settings**: typed loan settings and the settings service
//! - **\*_service**: one service per area; every operation takes the caller's
//!   `MemberContext` explicitly
//! - **commands**: query types passed from the REST layer to services and storage
//! - **models**: row shapes written to the remote tables
//!
//! ## Business Rules
//!
//! - Members only see their own records; board users manage everyone's
//! - Deposits are positive and capped; archived members receive none
//! - A loan application must pass the eligibility gate, and share-capital
//!   loans are capped at the loanable amount
//! - Loans move `pending → approved → released → paid`, or `pending → rejected`
//! - Every write is recorded in the activity log on a best-effort basis

pub mod activity_log_service;
pub mod commands;
pub mod context;
pub mod contribution_service;
pub mod dashboard_service;
pub mod date_diff;
pub mod eligibility;
pub mod eligibility_service;
pub mod errors;
pub mod export_service;
pub mod growth;
pub mod loan_service;
pub mod loanable;
pub mod member_service;
pub mod models;
pub mod settings;

pub use activity_log_service::ActivityLogService;
pub use context::MemberContext;
pub use contribution_service::ContributionService;
pub use dashboard_service::DashboardService;
pub use eligibility_service::EligibilityService;
pub use errors::DomainError;
pub use export_service::ExportService;
pub use loan_service::LoanService;
pub use member_service::MemberService;
pub use settings::SettingsService;
