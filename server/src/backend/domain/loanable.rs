//! Percentage-of-amount arithmetic for loanable amounts and loan interest.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoanableError {
    #[error("Invalid percentage: {0}")]
    InvalidPercentage(String),
}

/// How much may be borrowed against an amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanableAmount {
    pub total_loanable: Decimal,
    /// Percentage applied, normalized to two decimals
    pub percentage: Decimal,
}

fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Parse a stored percentage such as "50", "33.33" or "12.5%".
///
/// Missing or blank input is `Ok(None)`.
pub fn parse_percentage(value: Option<&str>) -> Result<Option<Decimal>, LoanableError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let trimmed = raw.trim().trim_end_matches('%').trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Decimal::from_str(trimmed)
        .map(Some)
        .map_err(|_| LoanableError::InvalidPercentage(raw.to_string()))
}

/// `amount * percentage / 100`, rounded to two decimals half away from zero
pub fn percentage_of(amount: Decimal, percentage: Decimal) -> Decimal {
    round_money(amount * percentage / Decimal::ONE_HUNDRED)
}

/// Loanable amount for `amount` at an optional percentage; no percentage lends nothing
pub fn calculate_loanable(amount: Decimal, percentage: Option<Decimal>) -> LoanableAmount {
    let percentage = round_money(percentage.unwrap_or(Decimal::ZERO));
    LoanableAmount {
        total_loanable: percentage_of(amount, percentage),
        percentage,
    }
}
