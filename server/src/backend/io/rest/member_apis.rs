//! # REST API for Members
//!
//! Profiles, archiving and profile pictures. Listing, creating and
//! archiving are board-only; members may read and edit themselves.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use log::info;
use serde::Deserialize;
use shared::{
    CreateMemberRequest, MemberDurationsResponse, MemberProfile, MemberResponse, MemberStatus, PageResponse,
    ProfilePictureResponse, UpdateMemberRequest,
};
use uuid::Uuid;

use super::{ApiError, CurrentMember};
use crate::backend::domain::commands::members::MemberListQuery;
use crate::backend::domain::commands::pagination::PageRequest;
use crate::backend::domain::member_service::MAX_AVATAR_BYTES;
use crate::backend::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListMembersParams {
    pub status: Option<MemberStatus>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Create a router for member related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_members).post(create_member))
        .route("/:id", get(get_member).patch(update_member))
        .route("/:id/archive", post(archive_member))
        .route("/:id/durations", get(member_durations))
        .route(
            "/:id/avatar",
            // Leave room above the avatar cap so oversized uploads reach validation
            post(upload_avatar).layer(DefaultBodyLimit::max(MAX_AVATAR_BYTES * 2)),
        )
}

pub async fn list_members(
    State(state): State<AppState>,
    CurrentMember(ctx): CurrentMember,
    Query(params): Query<ListMembersParams>,
) -> Result<Json<PageResponse<MemberProfile>>, ApiError> {
    info!("GET /api/members - {:?}", params);
    let query = MemberListQuery {
        status: params.status,
        search: params.search,
        page: PageRequest::new(params.page, params.page_size),
    };
    Ok(Json(state.member_service.list_members(&ctx, query).await?))
}

pub async fn get_member(
    State(state): State<AppState>,
    CurrentMember(ctx): CurrentMember,
    Path(id): Path<Uuid>,
) -> Result<Json<MemberProfile>, ApiError> {
    info!("GET /api/members/{}", id);
    Ok(Json(state.member_service.get_member(&ctx, id).await?))
}

pub async fn member_durations(
    State(state): State<AppState>,
    CurrentMember(ctx): CurrentMember,
    Path(id): Path<Uuid>,
) -> Result<Json<MemberDurationsResponse>, ApiError> {
    info!("GET /api/members/{}/durations", id);
    Ok(Json(state.member_service.member_durations(&ctx, id).await?))
}

pub async fn create_member(
    State(state): State<AppState>,
    CurrentMember(ctx): CurrentMember,
    Json(request): Json<CreateMemberRequest>,
) -> Result<(StatusCode, Json<MemberResponse>), ApiError> {
    info!("POST /api/members - code {}", request.member_code);
    let response = state.member_service.create_member(&ctx, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn update_member(
    State(state): State<AppState>,
    CurrentMember(ctx): CurrentMember,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateMemberRequest>,
) -> Result<Json<MemberResponse>, ApiError> {
    info!("PATCH /api/members/{}", id);
    Ok(Json(state.member_service.update_member(&ctx, id, request).await?))
}

pub async fn archive_member(
    State(state): State<AppState>,
    CurrentMember(ctx): CurrentMember,
    Path(id): Path<Uuid>,
) -> Result<Json<MemberResponse>, ApiError> {
    info!("POST /api/members/{}/archive", id);
    Ok(Json(state.member_service.archive_member(&ctx, id).await?))
}

/// Upload raw image bytes; the `Content-Type` header names the image type
pub async fn upload_avatar(
    State(state): State<AppState>,
    CurrentMember(ctx): CurrentMember,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ProfilePictureResponse>, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::bad_request("Missing Content-Type header"))?;
    info!("POST /api/members/{}/avatar - {} ({} bytes)", id, content_type, body.len());

    let response = state
        .member_service
        .upload_profile_picture(&ctx, id, body.to_vec(), content_type)
        .await?;
    Ok(Json(response))
}
