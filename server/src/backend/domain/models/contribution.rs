//! Domain model for writing contribution rows.
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::ContributionCategory;
use uuid::Uuid;

/// Largest single deposit accepted
pub const MAX_CONTRIBUTION_AMOUNT: i64 = 10_000_000;

/// Row inserted into `contributions`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewContributionRow {
    pub member_id: Uuid,
    pub category: ContributionCategory,
    pub amount: Decimal,
    pub contribution_date: NaiveDate,
    pub payment_method: Option<String>,
    pub reference_no: Option<String>,
    pub remarks: Option<String>,
    pub recorded_by: Uuid,
}

/// Validate a deposit amount: positive, at most two decimals, within the cap
pub fn validate_amount(amount: Decimal) -> Result<(), String> {
    if amount <= Decimal::ZERO {
        return Err("Contribution amount must be positive".to_string());
    }
    if amount > Decimal::from(MAX_CONTRIBUTION_AMOUNT) {
        return Err("Contribution amount is too large".to_string());
    }
    if amount.normalize().scale() > 2 {
        return Err("Contribution amount cannot have more than two decimal places".to_string());
    }
    Ok(())
}
