//! # REST API for the Activity Log

use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use log::info;
use serde::Deserialize;
use shared::{ActivityLog, PageResponse};
use uuid::Uuid;

use super::{ApiError, CurrentMember};
use crate::backend::domain::commands::activity::ActivityLogQuery;
use crate::backend::domain::commands::pagination::PageRequest;
use crate::backend::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ActivityLogParams {
    pub actor_id: Option<Uuid>,
    pub entity_type: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_logs))
}

pub async fn list_logs(
    State(state): State<AppState>,
    CurrentMember(ctx): CurrentMember,
    Query(params): Query<ActivityLogParams>,
) -> Result<Json<PageResponse<ActivityLog>>, ApiError> {
    info!("GET /api/activity-logs - {:?}", params);
    let query = ActivityLogQuery {
        actor_id: params.actor_id,
        entity_type: params.entity_type,
        page: PageRequest::new(params.page, params.page_size),
    };
    Ok(Json(state.activity_log_service.list_logs(&ctx, query).await?))
}
