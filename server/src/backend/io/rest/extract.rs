//! Caller identity for REST handlers.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use super::error::ApiError;
use crate::backend::domain::MemberContext;
use crate::backend::AppState;

/// Header carrying the calling member's id
pub const MEMBER_ID_HEADER: &str = "x-member-id";

/// The calling member, resolved from `x-member-id` against the members table.
///
/// The role always comes from the stored profile, never from the request.
#[derive(Debug, Clone)]
pub struct CurrentMember(pub MemberContext);

#[async_trait]
impl FromRequestParts<AppState> for CurrentMember {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(MEMBER_ID_HEADER)
            .ok_or_else(|| ApiError::unauthorized("Missing x-member-id header"))?;
        let member_id = raw
            .to_str()
            .ok()
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .ok_or_else(|| ApiError::unauthorized("Invalid x-member-id header"))?;

        let ctx = state
            .member_service
            .resolve_context(member_id)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Unknown or archived member"))?;
        Ok(CurrentMember(ctx))
    }
}
