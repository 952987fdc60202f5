//! # REST API for Settings
//!
//! Any member may read settings; only board users change them.

use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use log::info;
use serde::Deserialize;
use shared::{Setting, SettingsListResponse, UpsertSettingRequest};

use super::{ApiError, CurrentMember};
use crate::backend::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SettingsParams {
    pub category: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_settings).put(upsert_setting))
}

pub async fn list_settings(
    State(state): State<AppState>,
    CurrentMember(ctx): CurrentMember,
    Query(params): Query<SettingsParams>,
) -> Result<Json<SettingsListResponse>, ApiError> {
    info!("GET /api/settings - category {:?}", params.category);
    let category = params.category.as_deref().map(str::trim).filter(|c| !c.is_empty());
    Ok(Json(state.settings_service.list_settings(&ctx, category).await?))
}

pub async fn upsert_setting(
    State(state): State<AppState>,
    CurrentMember(ctx): CurrentMember,
    Json(request): Json<UpsertSettingRequest>,
) -> Result<Json<Setting>, ApiError> {
    info!("PUT /api/settings - {}.{}", request.category, request.key);
    Ok(Json(state.settings_service.upsert_setting(&ctx, request).await?))
}
