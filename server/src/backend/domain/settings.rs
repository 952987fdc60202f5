//! Typed settings and the settings service.
//!
//! Settings are stored as free-text `(category, key) -> value` rows. Loan
//! rules are parsed into `LoanSettings` once when read, so the rest of the
//! backend never sees raw strings.

use anyhow::Result;
use chrono::Utc;
use log::info;
use rust_decimal::Decimal;
use serde_json::json;
use shared::{Setting, SettingsListResponse, UpsertSettingRequest};
use std::str::FromStr;
use std::sync::Arc;

use super::activity_log_service::ActivityLogService;
use super::context::MemberContext;
use super::eligibility::{
    EligibilityThresholds, DEFAULT_MIN_AGE, DEFAULT_MIN_SHARE_CAPITAL, DEFAULT_MIN_TENURE_YEARS,
};
use super::errors::DomainError;
use super::loanable::parse_percentage;
use super::models::activity_log::{actions, entities};
use crate::backend::storage::{QueryCache, QueryKey, SettingsStorage};

pub const LOAN_CATEGORY: &str = "loan";
pub const MIN_TENURE_YEARS_KEY: &str = "min_tenure_years";
pub const MIN_AGE_KEY: &str = "min_age";
pub const MIN_SHARE_CAPITAL_KEY: &str = "min_share_capital";
pub const LOANABLE_PERCENTAGE_KEY: &str = "share_capital_loanable_percentage";
pub const INTEREST_RATE_KEY: &str = "interest_rate";

pub const SETTINGS_CACHE_SCOPE: &str = "settings";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("Invalid value for setting {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Loan rules from the `loan` settings category
#[derive(Debug, Clone, PartialEq)]
pub struct LoanSettings {
    pub min_tenure_years: u32,
    pub min_age: u32,
    pub min_share_capital: Decimal,
    /// Share of share capital that may be borrowed, in percent
    pub share_capital_loanable_percentage: Option<Decimal>,
    /// Flat interest charged on release, in percent of the principal
    pub interest_rate: Option<Decimal>,
}

impl Default for LoanSettings {
    fn default() -> Self {
        Self {
            min_tenure_years: DEFAULT_MIN_TENURE_YEARS,
            min_age: DEFAULT_MIN_AGE,
            min_share_capital: Decimal::from(DEFAULT_MIN_SHARE_CAPITAL),
            share_capital_loanable_percentage: None,
            interest_rate: None,
        }
    }
}

fn invalid(key: &str, value: &str) -> SettingsError {
    SettingsError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_years(key: &str, value: &str) -> Result<u32, SettingsError> {
    value.trim().parse::<u32>().map_err(|_| invalid(key, value))
}

fn parse_amount(key: &str, value: &str) -> Result<Decimal, SettingsError> {
    match Decimal::from_str(value.trim()) {
        Ok(amount) if amount >= Decimal::ZERO => Ok(amount),
        _ => Err(invalid(key, value)),
    }
}

fn parse_rate(key: &str, value: &str) -> Result<Option<Decimal>, SettingsError> {
    match parse_percentage(Some(value)) {
        Ok(Some(rate)) if rate < Decimal::ZERO => Err(invalid(key, value)),
        Ok(rate) => Ok(rate),
        Err(_) => Err(invalid(key, value)),
    }
}

impl LoanSettings {
    /// Parse the `loan` rows among `rows`; absent keys keep their defaults
    pub fn from_rows(rows: &[Setting]) -> Result<Self, SettingsError> {
        let mut settings = Self::default();
        for row in rows.iter().filter(|r| r.category == LOAN_CATEGORY) {
            let (key, value) = (row.key.as_str(), row.value.as_str());
            match key {
                MIN_TENURE_YEARS_KEY => settings.min_tenure_years = parse_years(key, value)?,
                MIN_AGE_KEY => settings.min_age = parse_years(key, value)?,
                MIN_SHARE_CAPITAL_KEY => settings.min_share_capital = parse_amount(key, value)?,
                LOANABLE_PERCENTAGE_KEY => settings.share_capital_loanable_percentage = parse_rate(key, value)?,
                INTEREST_RATE_KEY => settings.interest_rate = parse_rate(key, value)?,
                _ => {}
            }
        }
        Ok(settings)
    }

    /// Check a value about to be written for a known loan key; unknown keys pass
    pub fn validate_value(category: &str, key: &str, value: &str) -> Result<(), SettingsError> {
        if category != LOAN_CATEGORY {
            return Ok(());
        }
        match key {
            MIN_TENURE_YEARS_KEY | MIN_AGE_KEY => parse_years(key, value).map(|_| ()),
            MIN_SHARE_CAPITAL_KEY => parse_amount(key, value).map(|_| ()),
            LOANABLE_PERCENTAGE_KEY | INTEREST_RATE_KEY => parse_rate(key, value).map(|_| ()),
            _ => Ok(()),
        }
    }

    pub fn thresholds(&self) -> EligibilityThresholds {
        EligibilityThresholds {
            min_tenure_years: self.min_tenure_years,
            min_age: self.min_age,
            min_share_capital: self.min_share_capital,
        }
    }
}

/// Service for reading and writing settings
#[derive(Clone)]
pub struct SettingsService {
    settings: Arc<dyn SettingsStorage>,
    activity: ActivityLogService,
    cache: QueryCache<Vec<Setting>>,
}

impl SettingsService {
    pub fn new(settings: Arc<dyn SettingsStorage>, activity: ActivityLogService, cache_capacity: usize) -> Self {
        Self {
            settings,
            activity,
            cache: QueryCache::new(cache_capacity),
        }
    }

    async fn cached_rows(&self, category: Option<&str>) -> Result<Vec<Setting>> {
        let key = QueryKey::new(SETTINGS_CACHE_SCOPE).with(category);
        self.cache
            .get_or_fetch(key, || async { self.settings.list_settings(category).await })
            .await
    }

    /// List settings, optionally of one category
    pub async fn list_settings(&self, ctx: &MemberContext, category: Option<&str>) -> Result<SettingsListResponse> {
        info!("Listing settings for {} (category={:?})", ctx.member_id, category);
        let settings = self.cached_rows(category).await?;
        Ok(SettingsListResponse { settings })
    }

    /// Current loan rules
    pub async fn loan_settings(&self) -> Result<LoanSettings> {
        let rows = self.cached_rows(Some(LOAN_CATEGORY)).await?;
        Ok(LoanSettings::from_rows(&rows)?)
    }

    /// Create or replace a setting value (board only)
    pub async fn upsert_setting(&self, ctx: &MemberContext, request: UpsertSettingRequest) -> Result<Setting> {
        ctx.require_board("change settings")?;

        let category = request.category.trim();
        let key = request.key.trim();
        if category.is_empty() || key.is_empty() {
            return Err(DomainError::validation("Setting category and key cannot be empty").into());
        }
        LoanSettings::validate_value(category, key, &request.value)?;

        info!("Setting {}.{} = {} by {}", category, key, request.value, ctx.member_id);

        let setting = Setting {
            category: category.to_string(),
            key: key.to_string(),
            value: request.value.trim().to_string(),
            updated_at: Some(Utc::now()),
        };
        let previous = self.settings.get_setting(category, key).await?;
        let saved = match &previous {
            Some(_) => self.settings.update_setting(&setting).await?,
            None => self.settings.insert_setting(&setting).await?,
        };
        self.cache.invalidate_scope(SETTINGS_CACHE_SCOPE);

        self.activity
            .record(
                ctx,
                actions::SETTING_UPDATED,
                entities::SETTING,
                None,
                Some(json!({
                    "category": saved.category,
                    "key": saved.key,
                    "value": saved.value,
                    "previous_value": previous.map(|p| p.value),
                })),
            )
            .await;

        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::storage::test_utils::TestEnvironment;
    use shared::MemberRole;

    fn row(key: &str, value: &str) -> Setting {
        Setting {
            category: LOAN_CATEGORY.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            updated_at: None,
        }
    }

    #[test]
    fn test_defaults_when_absent() {
        let settings = LoanSettings::from_rows(&[]).unwrap();
        assert_eq!(settings, LoanSettings::default());
        assert_eq!(settings.thresholds(), EligibilityThresholds::default());
    }

    #[test]
    fn test_parses_loan_rows_only() {
        let mut other = row(MIN_AGE_KEY, "99");
        other.category = "general".to_string();
        let rows = vec![
            row(MIN_TENURE_YEARS_KEY, "2"),
            row(MIN_SHARE_CAPITAL_KEY, "7500.50"),
            row(LOANABLE_PERCENTAGE_KEY, "80%"),
            row(INTEREST_RATE_KEY, ""),
            other,
        ];
        let settings = LoanSettings::from_rows(&rows).unwrap();

        assert_eq!(settings.min_tenure_years, 2);
        assert_eq!(settings.min_age, DEFAULT_MIN_AGE);
        assert_eq!(settings.min_share_capital, Decimal::from_str("7500.50").unwrap());
        assert_eq!(settings.share_capital_loanable_percentage, Some(Decimal::from(80)));
        assert_eq!(settings.interest_rate, None);
    }

    #[test]
    fn test_unparsable_value_is_error() {
        let err = LoanSettings::from_rows(&[row(MIN_AGE_KEY, "eighteen")]).unwrap_err();
        assert_eq!(
            err,
            SettingsError::InvalidValue {
                key: MIN_AGE_KEY.to_string(),
                value: "eighteen".to_string()
            }
        );
        assert!(LoanSettings::from_rows(&[row(MIN_SHARE_CAPITAL_KEY, "-1")]).is_err());
        assert!(LoanSettings::validate_value(LOAN_CATEGORY, INTEREST_RATE_KEY, "-3").is_err());
        assert!(LoanSettings::validate_value("general", INTEREST_RATE_KEY, "-3").is_ok());
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_updates_and_refreshes_cache() {
        let env = TestEnvironment::new().unwrap();
        let activity = ActivityLogService::new(env.storage.activity_logs.clone());
        let service = SettingsService::new(env.storage.settings.clone(), activity, 16);
        let board = MemberContext::from_profile(&env.store.seed_member(MemberRole::Board, 5, 40));

        assert_eq!(service.loan_settings().await.unwrap().interest_rate, None);

        let request = |value: &str| UpsertSettingRequest {
            category: LOAN_CATEGORY.to_string(),
            key: INTEREST_RATE_KEY.to_string(),
            value: value.to_string(),
        };
        service.upsert_setting(&board, request("5")).await.unwrap();
        assert_eq!(service.loan_settings().await.unwrap().interest_rate, Some(Decimal::from(5)));

        service.upsert_setting(&board, request("6.5")).await.unwrap();
        let listed = service.list_settings(&board, Some(LOAN_CATEGORY)).await.unwrap();
        assert_eq!(listed.settings.len(), 1);
        assert_eq!(listed.settings[0].value, "6.5");

        let logs = env.store.activity_logs();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[1].details.as_ref().unwrap()["previous_value"], "5");
    }

    #[tokio::test]
    async fn test_upsert_rejects_members_and_bad_values() {
        let env = TestEnvironment::new().unwrap();
        let activity = ActivityLogService::new(env.storage.activity_logs.clone());
        let service = SettingsService::new(env.storage.settings.clone(), activity, 16);
        let board = MemberContext::from_profile(&env.store.seed_member(MemberRole::Board, 5, 40));
        let member = MemberContext::from_profile(&env.store.seed_member(MemberRole::Member, 5, 40));

        let request = UpsertSettingRequest {
            category: LOAN_CATEGORY.to_string(),
            key: MIN_AGE_KEY.to_string(),
            value: "21".to_string(),
        };
        let err = service.upsert_setting(&member, request.clone()).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::Forbidden(_))));

        let bad = UpsertSettingRequest {
            value: "abc".to_string(),
            ..request
        };
        let err = service.upsert_setting(&board, bad).await.unwrap_err();
        assert!(err.downcast_ref::<SettingsError>().is_some());
    }
}
