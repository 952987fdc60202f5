use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::Contribution;
use uuid::Uuid;

use crate::backend::domain::commands::contributions::{ContributionListQuery, ContributionTotalQuery};
use crate::backend::domain::commands::pagination::PageResult;
use crate::backend::domain::models::contribution::NewContributionRow;
use crate::backend::storage::remote::{RemoteConnection, SelectQuery};
use crate::backend::storage::traits::ContributionStorage;

pub const CONTRIBUTIONS_TABLE: &str = "contributions";
pub const TOTAL_CONTRIBUTIONS_RPC: &str = "get_total_contributions";

/// Named parameters of the contribution-total procedure; absent filters are sent as null
#[derive(Debug, Serialize, PartialEq)]
struct TotalParams {
    member_id: Option<Uuid>,
    year: Option<i32>,
    month: Option<u32>,
    category: Option<&'static str>,
}

impl From<&ContributionTotalQuery> for TotalParams {
    fn from(query: &ContributionTotalQuery) -> Self {
        Self {
            member_id: query.member_id,
            year: query.period.year,
            month: query.period.month,
            category: query.category.map(|c| c.as_str()),
        }
    }
}

/// Repository for the `contributions` table and its aggregate procedure
#[derive(Clone)]
pub struct ContributionRepository {
    conn: RemoteConnection,
}

impl ContributionRepository {
    pub fn new(conn: RemoteConnection) -> Self {
        Self { conn }
    }

    fn list_query(query: &ContributionListQuery) -> SelectQuery {
        let (from, to) = query.page.range();
        let mut select = SelectQuery::new(CONTRIBUTIONS_TABLE)
            .eq_opt("member_id", query.member_id)
            .eq_opt("category", query.category.map(|c| c.as_str()));
        if let Some((start, end)) = query.period.date_range() {
            select = select
                .gte("contribution_date", start)
                .lt("contribution_date", end);
        }
        select
            .order("contribution_date", query.ascending)
            .order("created_at", query.ascending)
            .range(from, to)
            .count_exact()
    }
}

#[async_trait]
impl ContributionStorage for ContributionRepository {
    async fn list_contributions(&self, query: &ContributionListQuery) -> Result<PageResult<Contribution>> {
        let fetched = self.conn.select(&Self::list_query(query)).await?;
        Ok(PageResult {
            rows: fetched.rows,
            total: fetched.total,
        })
    }

    async fn insert_contribution(&self, row: &NewContributionRow) -> Result<Contribution> {
        Ok(self.conn.insert(CONTRIBUTIONS_TABLE, row).await?)
    }

    async fn total_contributions(&self, query: &ContributionTotalQuery) -> Result<Decimal> {
        let total: Option<Decimal> = self
            .conn
            .rpc(TOTAL_CONTRIBUTIONS_RPC, &TotalParams::from(query))
            .await?;
        Ok(total.unwrap_or(Decimal::ZERO))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::commands::contributions::Period;
    use shared::ContributionCategory;

    #[test]
    fn test_list_query_turns_period_into_date_range() {
        let member_id = Uuid::new_v4();
        let query = ContributionListQuery {
            member_id: Some(member_id),
            category: Some(ContributionCategory::ClubFund),
            period: Period::month_of(2025, 2),
            ..ContributionListQuery::default()
        };
        let pairs = ContributionRepository::list_query(&query).query_pairs();

        assert!(pairs.contains(&("member_id".to_string(), format!("eq.{}", member_id))));
        assert!(pairs.contains(&("category".to_string(), "eq.club_fund".to_string())));
        assert!(pairs.contains(&("contribution_date".to_string(), "gte.2025-02-01".to_string())));
        assert!(pairs.contains(&("contribution_date".to_string(), "lt.2025-03-01".to_string())));
        assert!(pairs.contains(&(
            "order".to_string(),
            "contribution_date.desc,created_at.desc".to_string()
        )));
    }

    #[test]
    fn test_total_params_serialize_nulls() {
        let query = ContributionTotalQuery {
            member_id: None,
            period: Period::new(Some(2024), None).unwrap(),
            category: Some(ContributionCategory::ShareCapital),
        };
        let json = serde_json::to_value(TotalParams::from(&query)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "member_id": null,
                "year": 2024,
                "month": null,
                "category": "share_capital"
            })
        );
    }
}
