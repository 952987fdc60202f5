//! # REST API for Contributions
//!
//! Deposit history, recording deposits and aggregate totals.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use log::info;
use serde::Deserialize;
use shared::{Contribution, ContributionCategory, ContributionTotalResponse, PageResponse, RecordContributionRequest};
use uuid::Uuid;

use super::{ApiError, CurrentMember};
use crate::backend::domain::commands::contributions::{ContributionListQuery, ContributionTotalQuery, Period};
use crate::backend::domain::commands::pagination::PageRequest;
use crate::backend::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListContributionsParams {
    pub member_id: Option<Uuid>,
    pub category: Option<ContributionCategory>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    /// Oldest first when true
    pub ascending: Option<bool>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TotalParams {
    pub member_id: Option<Uuid>,
    pub category: Option<ContributionCategory>,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

/// Create a router for contribution related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_contributions).post(record_contribution))
        .route("/total", get(total_contributions))
}

pub async fn list_contributions(
    State(state): State<AppState>,
    CurrentMember(ctx): CurrentMember,
    Query(params): Query<ListContributionsParams>,
) -> Result<Json<PageResponse<Contribution>>, ApiError> {
    info!("GET /api/contributions - {:?}", params);
    let query = ContributionListQuery {
        member_id: params.member_id,
        category: params.category,
        period: Period::new(params.year, params.month).map_err(anyhow::Error::from)?,
        ascending: params.ascending.unwrap_or(false),
        page: PageRequest::new(params.page, params.page_size),
    };
    Ok(Json(state.contribution_service.list_contributions(&ctx, query).await?))
}

pub async fn record_contribution(
    State(state): State<AppState>,
    CurrentMember(ctx): CurrentMember,
    Json(request): Json<RecordContributionRequest>,
) -> Result<(StatusCode, Json<Contribution>), ApiError> {
    info!(
        "POST /api/contributions - {} {} for {}",
        request.category.as_str(),
        request.amount,
        request.member_id
    );
    let contribution = state.contribution_service.record_contribution(&ctx, request).await?;
    Ok((StatusCode::CREATED, Json(contribution)))
}

pub async fn total_contributions(
    State(state): State<AppState>,
    CurrentMember(ctx): CurrentMember,
    Query(params): Query<TotalParams>,
) -> Result<Json<ContributionTotalResponse>, ApiError> {
    info!("GET /api/contributions/total - {:?}", params);
    let query = ContributionTotalQuery {
        member_id: params.member_id,
        period: Period::new(params.year, params.month).map_err(anyhow::Error::from)?,
        category: params.category,
    };
    Ok(Json(state.contribution_service.total_contributions(&ctx, query).await?))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{app, send};
    use crate::backend::storage::test_utils::TestEnvironment;
    use axum::http::StatusCode;
    use chrono::NaiveDate;
    use serde_json::json;
    use shared::{ContributionCategory, MemberRole};

    #[tokio::test]
    async fn test_board_records_and_member_reads_total() {
        let env = TestEnvironment::new().unwrap();
        let app = app(&env);
        let board = env.store.seed_member(MemberRole::Board, 5, 40);
        let member = env.store.seed_member(MemberRole::Member, 2, 30);

        let body = json!({
            "member_id": member.id,
            "category": "share_capital",
            "amount": "1500.50",
            "contribution_date": "2025-01-15"
        });
        let (status, created) = send(&app, "POST", "/api/contributions", Some(board.id), Some(body.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["member_id"], member.id.to_string());

        let (status, _) = send(&app, "POST", "/api/contributions", Some(member.id), Some(body)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, total) = send(
            &app,
            "GET",
            "/api/contributions/total?category=share_capital&year=2025",
            Some(member.id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(total["member_id"], member.id.to_string());
        assert_eq!(total["total"], "1500.50");
    }

    #[tokio::test]
    async fn test_listing_is_scoped_and_validated() {
        let env = TestEnvironment::new().unwrap();
        let app = app(&env);
        let member = env.store.seed_member(MemberRole::Member, 2, 30);
        let other = env.store.seed_member(MemberRole::Member, 2, 30);
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        env.store.seed_contribution(member.id, ContributionCategory::ShareCapital, 100, date);
        env.store.seed_contribution(other.id, ContributionCategory::ShareCapital, 200, date);

        let (status, page) = send(&app, "GET", "/api/contributions", Some(member.id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["items"].as_array().unwrap().len(), 1);

        let uri = format!("/api/contributions?member_id={}", other.id);
        let (status, _) = send(&app, "GET", &uri, Some(member.id), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(&app, "GET", "/api/contributions?year=2025&month=13", Some(member.id), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("Invalid month"));
    }
}
