//! # REST API for the Dashboard

use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use log::info;
use serde::Deserialize;
use shared::DashboardResponse;
use uuid::Uuid;

use super::{ApiError, CurrentMember};
use crate::backend::AppState;

/// Defaults to the current month and the caller's own scope
#[derive(Debug, Default, Deserialize)]
pub struct DashboardParams {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub member_id: Option<Uuid>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(contribution_summary))
}

pub async fn contribution_summary(
    State(state): State<AppState>,
    CurrentMember(ctx): CurrentMember,
    Query(params): Query<DashboardParams>,
) -> Result<Json<DashboardResponse>, ApiError> {
    info!("GET /api/dashboard - {:?}", params);
    let summary = state
        .dashboard_service
        .contribution_summary(&ctx, params.year, params.month, params.member_id)
        .await?;
    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{app, send};
    use crate::backend::storage::test_utils::TestEnvironment;
    use axum::http::StatusCode;
    use chrono::NaiveDate;
    use shared::{ContributionCategory, MemberRole};

    #[tokio::test]
    async fn test_month_over_month_growth() {
        let env = TestEnvironment::new().unwrap();
        let app = app(&env);
        let board = env.store.seed_member(MemberRole::Board, 5, 40);
        let member = env.store.seed_member(MemberRole::Member, 2, 30);
        let date = |m, d| NaiveDate::from_ymd_opt(2025, m, d).unwrap();
        env.store.seed_contribution(member.id, ContributionCategory::ShareCapital, 1000, date(1, 10));
        env.store.seed_contribution(member.id, ContributionCategory::ShareCapital, 1500, date(2, 10));

        let (status, body) = send(&app, "GET", "/api/dashboard?year=2025&month=2", Some(board.id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["categories"][0]["category"], "share_capital");
        assert_eq!(body["categories"][0]["growth_percentage"], 50);
        assert_eq!(body["active_member_count"], 2);

        let (status, body) = send(&app, "GET", "/api/dashboard?year=2025&month=2", Some(member.id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["member_id"], member.id.to_string());
        assert!(body["active_member_count"].is_null());
    }

    #[tokio::test]
    async fn test_extreme_year_is_a_bad_request() {
        let env = TestEnvironment::new().unwrap();
        let app = app(&env);
        let board = env.store.seed_member(MemberRole::Board, 5, 40);

        let uri = "/api/dashboard?year=-2147483648&month=1";
        let (status, body) = send(&app, "GET", uri, Some(board.id), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("Invalid year"));
    }
}
