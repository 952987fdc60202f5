//! Domain model for loan applications, releases and payments.
//!
//! A loan moves through `pending → approved → released → paid`, or ends at
//! `rejected` straight from `pending`.
use chrono::{DateTime, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{LoanPayment, LoanRelease, LoanStatus, LoanType};
use uuid::Uuid;

use crate::backend::domain::errors::DomainError;

pub const MIN_TERM_MONTHS: u32 = 1;
pub const MAX_TERM_MONTHS: u32 = 60;

/// Row inserted into `loan_applications`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewLoanApplicationRow {
    pub member_id: Uuid,
    pub loan_type: LoanType,
    pub amount_requested: Decimal,
    pub term_months: u32,
    pub purpose: String,
    pub status: LoanStatus,
}

/// Status change of a `loan_applications` row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanApplicationChanges {
    pub status: LoanStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_remarks: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Row inserted into `loan_releases`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewLoanReleaseRow {
    pub loan_id: Uuid,
    pub principal: Decimal,
    pub interest_rate: Decimal,
    pub interest_amount: Decimal,
    pub total_payable: Decimal,
    pub release_date: NaiveDate,
    pub due_date: NaiveDate,
    pub released_by: Uuid,
}

/// Row inserted into `loan_payments`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewLoanPaymentRow {
    pub loan_id: Uuid,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub remaining_balance: Decimal,
    pub recorded_by: Uuid,
    pub remarks: Option<String>,
}

pub fn can_transition(from: LoanStatus, to: LoanStatus) -> bool {
    matches!(
        (from, to),
        (LoanStatus::Pending, LoanStatus::Approved)
            | (LoanStatus::Pending, LoanStatus::Rejected)
            | (LoanStatus::Approved, LoanStatus::Released)
            | (LoanStatus::Released, LoanStatus::Paid)
    )
}

pub fn ensure_transition(from: LoanStatus, to: LoanStatus) -> Result<(), DomainError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(DomainError::InvalidTransition { from, to })
    }
}

/// Release date plus the loan term; end-of-month dates clamp to the shorter month
pub fn due_date(release_date: NaiveDate, term_months: u32) -> Option<NaiveDate> {
    release_date.checked_add_months(Months::new(term_months))
}

/// What is left to pay on a released loan, never below zero
pub fn outstanding_balance(release: &LoanRelease, payments: &[LoanPayment]) -> Decimal {
    let paid: Decimal = payments.iter().map(|p| p.amount).sum();
    (release.total_payable - paid).max(Decimal::ZERO)
}
