//! Loan-eligibility gate.
//!
//! A member may apply for a loan only after a minimum tenure, from a minimum
//! age and with a minimum all-time share capital. This module is the pure
//! evaluation; `EligibilityService` gathers the inputs.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::{CriterionCheck, EligibilityBreakdown};

use super::date_diff::whole_years_between;

pub const DEFAULT_MIN_TENURE_YEARS: u32 = 1;
pub const DEFAULT_MIN_AGE: u32 = 18;
pub const DEFAULT_MIN_SHARE_CAPITAL: i64 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibilityThresholds {
    pub min_tenure_years: u32,
    pub min_age: u32,
    pub min_share_capital: Decimal,
}

impl Default for EligibilityThresholds {
    fn default() -> Self {
        Self {
            min_tenure_years: DEFAULT_MIN_TENURE_YEARS,
            min_age: DEFAULT_MIN_AGE,
            min_share_capital: Decimal::from(DEFAULT_MIN_SHARE_CAPITAL),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EligibilityInput {
    pub join_date: Option<NaiveDate>,
    pub birth_date: Option<NaiveDate>,
    /// All-time share capital contributions
    pub share_capital_total: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EligibilityEvaluation {
    pub has_restriction: bool,
    pub breakdown: EligibilityBreakdown,
}

impl EligibilityEvaluation {
    /// Names of the criteria that failed, in evaluation order
    pub fn failed_criteria(&self) -> Vec<&'static str> {
        let mut failed = Vec::new();
        if !self.breakdown.tenure_years.passed {
            failed.push("tenure_years");
        }
        if !self.breakdown.age_years.passed {
            failed.push("age_years");
        }
        if !self.breakdown.share_capital.passed {
            failed.push("share_capital");
        }
        failed
    }
}

/// Whole years since `date`; a missing date fails the criterion
fn years_check(date: Option<NaiveDate>, threshold: u32, today: NaiveDate) -> CriterionCheck<u32> {
    let current = date.map(|d| whole_years_between(d, today));
    CriterionCheck {
        current,
        threshold,
        passed: current.is_some_and(|years| years >= threshold),
    }
}

pub fn evaluate_eligibility(
    input: &EligibilityInput,
    thresholds: &EligibilityThresholds,
    today: NaiveDate,
) -> EligibilityEvaluation {
    let tenure_years = years_check(input.join_date, thresholds.min_tenure_years, today);
    let age_years = years_check(input.birth_date, thresholds.min_age, today);
    let share_capital = CriterionCheck {
        current: Some(input.share_capital_total),
        threshold: thresholds.min_share_capital,
        passed: input.share_capital_total >= thresholds.min_share_capital,
    };

    let has_restriction = !(tenure_years.passed && age_years.passed && share_capital.passed);

    EligibilityEvaluation {
        has_restriction,
        breakdown: EligibilityBreakdown {
            tenure_years,
            age_years,
            share_capital,
        },
    }
}
