use anyhow::Result;
use chrono::{Datelike, Local};
use log::info;
use shared::{CategorySummary, ContributionCategory, DashboardResponse};
use std::sync::Arc;
use uuid::Uuid;

use super::commands::contributions::{ContributionTotalQuery, Period};
use super::context::MemberContext;
use super::contribution_service::ContributionService;
use super::errors::DomainError;
use super::growth::growth_percentage;
use crate::backend::storage::MemberStorage;

/// Service for the dashboard's month-over-month contribution summary
#[derive(Clone)]
pub struct DashboardService {
    contributions: ContributionService,
    members: Arc<dyn MemberStorage>,
}

impl DashboardService {
    pub fn new(contributions: ContributionService, members: Arc<dyn MemberStorage>) -> Self {
        Self { contributions, members }
    }

    /// Totals per category for a month and the month before it.
    ///
    /// Members see their own totals; board users see the organisation's
    /// unless they ask for one member. Defaults to the current month.
    pub async fn contribution_summary(
        &self,
        ctx: &MemberContext,
        year: Option<i32>,
        month: Option<u32>,
        member_id: Option<Uuid>,
    ) -> Result<DashboardResponse> {
        let member_id = ctx.scope_member(member_id)?;
        let today = Local::now().date_naive();
        let year = year.unwrap_or(today.year());
        let month = month.unwrap_or(today.month());
        let current = Period::new(Some(year), Some(month))?;
        let previous = current
            .previous_month()
            .ok_or_else(|| DomainError::validation("A month is required"))?;
        info!("Dashboard summary {}-{:02} for {:?}", year, month, member_id);

        let mut categories = Vec::with_capacity(ContributionCategory::ALL.len());
        for category in ContributionCategory::ALL {
            let query = |period| ContributionTotalQuery {
                member_id,
                period,
                category: Some(category),
            };
            let current_total = self.contributions.cached_total(&query(current)).await?;
            let previous_total = self.contributions.cached_total(&query(previous)).await?;
            categories.push(CategorySummary {
                category,
                current_total,
                previous_total,
                growth_percentage: growth_percentage(current_total, previous_total),
            });
        }

        let active_member_count = if ctx.is_board() {
            Some(self.members.count_active_members().await?)
        } else {
            None
        };

        Ok(DashboardResponse {
            year,
            month,
            member_id,
            categories,
            active_member_count,
        })
    }
}
