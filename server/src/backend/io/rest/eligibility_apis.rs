//! # REST API for Loan Eligibility

use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use log::info;
use serde::Deserialize;
use shared::EligibilityResponse;
use uuid::Uuid;

use super::{ApiError, CurrentMember};
use crate::backend::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct EligibilityParams {
    /// Defaults to the caller
    pub member_id: Option<Uuid>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(check_eligibility))
}

pub async fn check_eligibility(
    State(state): State<AppState>,
    CurrentMember(ctx): CurrentMember,
    Query(params): Query<EligibilityParams>,
) -> Result<Json<EligibilityResponse>, ApiError> {
    info!("GET /api/eligibility - member {:?}", params.member_id);
    Ok(Json(state.eligibility_service.check_eligibility(&ctx, params.member_id).await?))
}
