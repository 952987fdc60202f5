use anyhow::Result;
use chrono::Local;
use log::info;
use shared::{EligibilityResponse, MemberProfile};
use std::sync::Arc;
use uuid::Uuid;

use super::contribution_service::ContributionService;
use super::context::MemberContext;
use super::eligibility::{evaluate_eligibility, EligibilityEvaluation, EligibilityInput};
use super::errors::DomainError;
use super::settings::SettingsService;
use crate::backend::storage::MemberStorage;

/// Gathers profile, share capital and loan rules for the eligibility gate
#[derive(Clone)]
pub struct EligibilityService {
    members: Arc<dyn MemberStorage>,
    contributions: ContributionService,
    settings: SettingsService,
}

impl EligibilityService {
    pub fn new(members: Arc<dyn MemberStorage>, contributions: ContributionService, settings: SettingsService) -> Self {
        Self {
            members,
            contributions,
            settings,
        }
    }

    /// Evaluate an already loaded member against the current loan rules
    pub async fn evaluate_member(&self, member: &MemberProfile) -> Result<EligibilityEvaluation> {
        let share_capital_total = self.contributions.share_capital_total(member.id).await?;
        let thresholds = self.settings.loan_settings().await?.thresholds();
        let input = EligibilityInput {
            join_date: member.join_date,
            birth_date: member.birth_date,
            share_capital_total,
        };

        let evaluation = evaluate_eligibility(&input, &thresholds, Local::now().date_naive());
        if evaluation.has_restriction {
            info!("Member {} is restricted: {:?}", member.id, evaluation.failed_criteria());
        }
        Ok(evaluation)
    }

    /// Evaluate `member_id`, or the caller when absent
    pub async fn check_eligibility(&self, ctx: &MemberContext, member_id: Option<Uuid>) -> Result<EligibilityResponse> {
        let member_id = member_id.unwrap_or(ctx.member_id);
        ctx.require_self_or_board(member_id)?;
        info!("Checking loan eligibility for member {}", member_id);

        let member = self
            .members
            .get_member(member_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Member", member_id))?;
        let evaluation = self.evaluate_member(&member).await?;

        Ok(EligibilityResponse {
            member_id,
            has_restriction: evaluation.has_restriction,
            breakdown: evaluation.breakdown,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::activity_log_service::ActivityLogService;
    use crate::backend::domain::settings::{LOAN_CATEGORY, MIN_SHARE_CAPITAL_KEY};
    use crate::backend::storage::test_utils::TestEnvironment;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use shared::{ContributionCategory, MemberRole};

    fn service(env: &TestEnvironment) -> EligibilityService {
        let activity = ActivityLogService::new(env.storage.activity_logs.clone());
        let contributions = ContributionService::new(
            env.storage.contributions.clone(),
            env.storage.members.clone(),
            activity.clone(),
            32,
        );
        let settings = SettingsService::new(env.storage.settings.clone(), activity, 32);
        EligibilityService::new(env.storage.members.clone(), contributions, settings)
    }

    fn some_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[tokio::test]
    async fn test_eligible_member() {
        let env = TestEnvironment::new().unwrap();
        let member = env.store.seed_member(MemberRole::Member, 2, 20);
        env.store
            .seed_contribution(member.id, ContributionCategory::ShareCapital, 6000, some_date());

        let ctx = MemberContext::from_profile(&member);
        let response = service(&env).check_eligibility(&ctx, None).await.unwrap();

        assert!(!response.has_restriction);
        assert_eq!(response.breakdown.tenure_years.current, Some(2));
        assert_eq!(response.breakdown.age_years.current, Some(20));
        assert_eq!(response.breakdown.share_capital.current, Some(Decimal::from(6000)));
    }

    #[tokio::test]
    async fn test_club_fund_does_not_count_as_share_capital() {
        let env = TestEnvironment::new().unwrap();
        let member = env.store.seed_member(MemberRole::Member, 2, 20);
        env.store
            .seed_contribution(member.id, ContributionCategory::ShareCapital, 4000, some_date());
        env.store
            .seed_contribution(member.id, ContributionCategory::ClubFund, 9000, some_date());

        let ctx = MemberContext::from_profile(&member);
        let response = service(&env).check_eligibility(&ctx, None).await.unwrap();

        assert!(response.has_restriction);
        assert!(response.breakdown.tenure_years.passed);
        assert!(response.breakdown.age_years.passed);
        assert!(!response.breakdown.share_capital.passed);
    }

    #[tokio::test]
    async fn test_thresholds_come_from_settings() {
        let env = TestEnvironment::new().unwrap();
        env.store.seed_setting(LOAN_CATEGORY, MIN_SHARE_CAPITAL_KEY, "1000");
        let member = env.store.seed_member(MemberRole::Member, 2, 20);
        env.store
            .seed_contribution(member.id, ContributionCategory::ShareCapital, 4000, some_date());

        let ctx = MemberContext::from_profile(&member);
        let response = service(&env).check_eligibility(&ctx, None).await.unwrap();
        assert!(!response.has_restriction);
        assert_eq!(response.breakdown.share_capital.threshold, Decimal::from(1000));
    }

    #[tokio::test]
    async fn test_access_rules() {
        let env = TestEnvironment::new().unwrap();
        let board = MemberContext::from_profile(&env.store.seed_member(MemberRole::Board, 5, 40));
        let member = env.store.seed_member(MemberRole::Member, 2, 20);
        let other = MemberContext::from_profile(&env.store.seed_member(MemberRole::Member, 2, 20));
        let service = service(&env);

        assert!(service.check_eligibility(&board, Some(member.id)).await.is_ok());
        let err = service.check_eligibility(&other, Some(member.id)).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::Forbidden(_))));

        let err = service.check_eligibility(&board, Some(Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::NotFound { .. })));
    }
}
