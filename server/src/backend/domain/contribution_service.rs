use anyhow::Result;
use chrono::Local;
use log::{info, warn};
use rust_decimal::Decimal;
use serde_json::json;
use shared::{Contribution, ContributionTotalResponse, PageResponse, RecordContributionRequest};
use std::sync::Arc;
use uuid::Uuid;

use super::activity_log_service::ActivityLogService;
use super::commands::contributions::{ContributionListQuery, ContributionTotalQuery};
use super::context::MemberContext;
use super::errors::DomainError;
use super::models::activity_log::{actions, entities};
use super::models::contribution::{validate_amount, NewContributionRow};
use crate::backend::storage::{ContributionStorage, MemberStorage, QueryCache};

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Service for recording and summarizing member contributions
#[derive(Clone)]
pub struct ContributionService {
    contributions: Arc<dyn ContributionStorage>,
    members: Arc<dyn MemberStorage>,
    activity: ActivityLogService,
    totals: QueryCache<Decimal>,
}

impl ContributionService {
    pub fn new(
        contributions: Arc<dyn ContributionStorage>,
        members: Arc<dyn MemberStorage>,
        activity: ActivityLogService,
        cache_capacity: usize,
    ) -> Self {
        Self {
            contributions,
            members,
            activity,
            totals: QueryCache::new(cache_capacity),
        }
    }

    /// List contributions; members only ever see their own
    pub async fn list_contributions(
        &self,
        ctx: &MemberContext,
        mut query: ContributionListQuery,
    ) -> Result<PageResponse<Contribution>> {
        query.member_id = ctx.scope_member(query.member_id)?;
        info!(
            "Listing contributions: member={:?}, category={:?}, period={:?}",
            query.member_id, query.category, query.period
        );

        let result = self.contributions.list_contributions(&query).await?;
        Ok(query.page.into_response(result.rows, result.total))
    }

    /// Record a deposit for a member (board only)
    pub async fn record_contribution(
        &self,
        ctx: &MemberContext,
        request: RecordContributionRequest,
    ) -> Result<Contribution> {
        ctx.require_board("record contributions")?;
        info!(
            "Recording {} contribution of {} for member {}",
            request.category, request.amount, request.member_id
        );

        validate_amount(request.amount).map_err(DomainError::Validation)?;

        let member = self
            .members
            .get_member(request.member_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Member", request.member_id))?;
        if member.is_archived() {
            warn!("Refusing contribution for archived member {}", member.id);
            return Err(DomainError::validation("Cannot record contributions for an archived member").into());
        }

        let row = NewContributionRow {
            member_id: member.id,
            category: request.category,
            amount: request.amount,
            contribution_date: request.contribution_date.unwrap_or_else(|| Local::now().date_naive()),
            payment_method: non_blank(request.payment_method),
            reference_no: non_blank(request.reference_no),
            remarks: non_blank(request.remarks),
            recorded_by: ctx.member_id,
        };
        let contribution = self.contributions.insert_contribution(&row).await?;
        self.totals.invalidate_scope(ContributionTotalQuery::CACHE_SCOPE);

        self.activity
            .record(
                ctx,
                actions::CONTRIBUTION_RECORDED,
                entities::CONTRIBUTION,
                Some(contribution.id),
                Some(json!({
                    "member_id": contribution.member_id,
                    "category": contribution.category,
                    "amount": contribution.amount,
                })),
            )
            .await;

        info!("Recorded contribution {}", contribution.id);
        Ok(contribution)
    }

    /// Aggregate total via the backend procedure, cached until the next deposit
    pub async fn cached_total(&self, query: &ContributionTotalQuery) -> Result<Decimal> {
        self.totals
            .get_or_fetch(query.cache_key(), || async {
                self.contributions.total_contributions(query).await
            })
            .await
    }

    /// Total contributions matching the filters; members are pinned to themselves
    pub async fn total_contributions(
        &self,
        ctx: &MemberContext,
        mut query: ContributionTotalQuery,
    ) -> Result<ContributionTotalResponse> {
        query.member_id = ctx.scope_member(query.member_id)?;
        let total = self.cached_total(&query).await?;
        Ok(ContributionTotalResponse {
            member_id: query.member_id,
            year: query.period.year,
            month: query.period.month,
            category: query.category,
            total,
        })
    }

    /// All-time share capital of a member
    pub async fn share_capital_total(&self, member_id: Uuid) -> Result<Decimal> {
        self.cached_total(&ContributionTotalQuery::share_capital_of(member_id))
            .await
    }
}
