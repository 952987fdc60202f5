//! Typed domain failures.
//!
//! Services return `anyhow::Result` and raise these when the caller did
//! something the business rules refuse; the REST layer downcasts them to
//! choose a status code.

use shared::{EligibilityBreakdown, LoanStatus};

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("Member does not meet the loan eligibility requirements")]
    Restricted(Box<EligibilityBreakdown>),
    #[error("Cannot move loan from {from} to {to}")]
    InvalidTransition { from: LoanStatus, to: LoanStatus },
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DomainError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }
}
