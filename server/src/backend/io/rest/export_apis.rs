//! # REST API for Data Export
//!
//! Contribution history as a downloadable CSV file.

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use log::info;
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiError, CurrentMember};
use crate::backend::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ExportParams {
    pub member_id: Option<Uuid>,
    pub year: Option<i32>,
}

/// Create a router for export related APIs
pub fn router() -> Router<AppState> {
    Router::new().route("/contributions", get(export_contributions_csv))
}

/// Export contributions as a CSV attachment
pub async fn export_contributions_csv(
    State(state): State<AppState>,
    CurrentMember(ctx): CurrentMember,
    Query(params): Query<ExportParams>,
) -> Result<Response, ApiError> {
    info!("GET /api/export/contributions - {:?}", params);
    let export = state
        .export_service
        .export_contributions_csv(&ctx, params.member_id, params.year)
        .await?;

    let disposition = format!("attachment; filename=\"{}\"", export.filename);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.csv_content,
    )
        .into_response())
}
