use anyhow::Result;
use chrono::Utc;
use log::{info, warn};
use serde_json::json;
use shared::table::TableFilter;
use shared::{
    CreateMemberRequest, MemberDurationsResponse, MemberProfile, MemberResponse, MemberStatus, PageResponse,
    ProfilePictureResponse, UpdateMemberRequest,
};
use std::sync::Arc;
use uuid::Uuid;

use super::activity_log_service::ActivityLogService;
use super::commands::members::MemberListQuery;
use super::context::MemberContext;
use super::date_diff::date_difference_until_today;
use super::errors::DomainError;
use super::models::activity_log::{actions, entities};
use super::models::member::{validate_dates, validate_email, validate_name, MemberChanges, NewMemberRow};
use crate::backend::storage::{FileStorage, MemberStorage};

/// Largest accepted profile picture
pub const MAX_AVATAR_BYTES: usize = 2 * 1024 * 1024;

/// File extension for an accepted image content type
pub fn avatar_extension(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    match essence.to_ascii_lowercase().as_str() {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Service for member profiles
#[derive(Clone)]
pub struct MemberService {
    members: Arc<dyn MemberStorage>,
    files: Arc<dyn FileStorage>,
    activity: ActivityLogService,
}

impl MemberService {
    pub fn new(members: Arc<dyn MemberStorage>, files: Arc<dyn FileStorage>, activity: ActivityLogService) -> Self {
        Self {
            members,
            files,
            activity,
        }
    }

    async fn load_member(&self, member_id: Uuid) -> Result<MemberProfile> {
        Ok(self
            .members
            .get_member(member_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Member", member_id))?)
    }

    /// Build the caller's context from their profile; unknown or archived members get none
    pub async fn resolve_context(&self, member_id: Uuid) -> Result<Option<MemberContext>> {
        match self.members.get_member(member_id).await? {
            Some(member) if !member.is_archived() => Ok(Some(MemberContext::from_profile(&member))),
            Some(_) => {
                warn!("Archived member {} attempted to act", member_id);
                Ok(None)
            }
            None => {
                warn!("Unknown member id {}", member_id);
                Ok(None)
            }
        }
    }

    /// Get a member; members may only read themselves
    pub async fn get_member(&self, ctx: &MemberContext, member_id: Uuid) -> Result<MemberProfile> {
        ctx.require_self_or_board(member_id)?;
        self.load_member(member_id).await
    }

    /// List non-archived members (board only)
    pub async fn list_members(&self, ctx: &MemberContext, query: MemberListQuery) -> Result<PageResponse<MemberProfile>> {
        ctx.require_board("list members")?;
        info!("Listing members: status={:?}, search={:?}", query.status, query.search);

        let result = self.members.list_members(&query).await?;
        let mut page = query.page.into_response(result.rows, result.total);

        // Search narrows the fetched page only; `has_more` still refers to the unfiltered listing
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            page.items = TableFilter::new(search).apply(page.items);
            page.pagination.total = None;
        }
        Ok(page)
    }

    /// Tenure and age as of today; members may only read their own
    pub async fn member_durations(&self, ctx: &MemberContext, member_id: Uuid) -> Result<MemberDurationsResponse> {
        ctx.require_self_or_board(member_id)?;
        let member = self.load_member(member_id).await?;

        let until_today = |date: Option<chrono::NaiveDate>| date.and_then(|d| date_difference_until_today(d).ok());
        Ok(MemberDurationsResponse {
            member_id,
            tenure: until_today(member.join_date),
            age: until_today(member.birth_date),
        })
    }

    /// Create a new member (board only)
    pub async fn create_member(&self, ctx: &MemberContext, request: CreateMemberRequest) -> Result<MemberResponse> {
        ctx.require_board("create members")?;
        info!("Creating member: {} {}", request.first_name, request.last_name);

        if request.member_code.trim().is_empty() {
            return Err(DomainError::validation("Member code cannot be empty").into());
        }
        validate_name("First name", &request.first_name).map_err(DomainError::Validation)?;
        validate_name("Last name", &request.last_name).map_err(DomainError::Validation)?;
        if let Some(middle) = request.middle_name.as_deref().filter(|m| !m.trim().is_empty()) {
            validate_name("Middle name", middle).map_err(DomainError::Validation)?;
        }
        validate_email(&request.email).map_err(DomainError::Validation)?;
        validate_dates(request.birth_date, request.join_date).map_err(DomainError::Validation)?;

        let member = self.members.insert_member(&NewMemberRow::from_request(request)).await?;

        self.activity
            .record(
                ctx,
                actions::MEMBER_CREATED,
                entities::MEMBER,
                Some(member.id),
                Some(json!({ "member_code": member.member_code })),
            )
            .await;

        info!("Created member {} ({})", member.display_name(), member.id);
        Ok(MemberResponse {
            member,
            success_message: "Member created successfully".to_string(),
        })
    }

    /// Update a member's profile; role and status are board-only fields
    pub async fn update_member(
        &self,
        ctx: &MemberContext,
        member_id: Uuid,
        request: UpdateMemberRequest,
    ) -> Result<MemberResponse> {
        ctx.require_self_or_board(member_id)?;
        if request.role.is_some() || request.status.is_some() {
            ctx.require_board("change member roles or status")?;
        }
        info!("Updating member {}", member_id);

        let existing = self.load_member(member_id).await?;
        if existing.is_archived() {
            return Err(DomainError::validation("Archived members cannot be updated").into());
        }

        if let Some(first) = &request.first_name {
            validate_name("First name", first).map_err(DomainError::Validation)?;
        }
        if let Some(last) = &request.last_name {
            validate_name("Last name", last).map_err(DomainError::Validation)?;
        }
        if let Some(middle) = request.middle_name.as_deref().filter(|m| !m.trim().is_empty()) {
            validate_name("Middle name", middle).map_err(DomainError::Validation)?;
        }
        if let Some(email) = &request.email {
            validate_email(email).map_err(DomainError::Validation)?;
        }
        validate_dates(
            request.birth_date.or(existing.birth_date),
            request.join_date.or(existing.join_date),
        )
        .map_err(DomainError::Validation)?;

        let trim = |value: Option<String>| value.map(|v| v.trim().to_string());
        let changes = MemberChanges {
            first_name: trim(request.first_name),
            middle_name: trim(request.middle_name),
            last_name: trim(request.last_name),
            email: request.email.map(|e| e.trim().to_lowercase()),
            phone: trim(request.phone),
            address: trim(request.address),
            birth_date: request.birth_date,
            join_date: request.join_date,
            role: request.role,
            status: request.status,
            ..MemberChanges::at(Utc::now())
        };
        let member = self.members.update_member(member_id, &changes).await?;

        self.activity
            .record(
                ctx,
                actions::MEMBER_UPDATED,
                entities::MEMBER,
                Some(member_id),
                serde_json::to_value(&changes).ok(),
            )
            .await;

        Ok(MemberResponse {
            member,
            success_message: "Member updated successfully".to_string(),
        })
    }

    /// Soft-delete a member (board only)
    pub async fn archive_member(&self, ctx: &MemberContext, member_id: Uuid) -> Result<MemberResponse> {
        ctx.require_board("archive members")?;
        if member_id == ctx.member_id {
            return Err(DomainError::validation("Board members cannot archive themselves").into());
        }
        let existing = self.load_member(member_id).await?;
        if existing.is_archived() {
            return Err(DomainError::validation("Member is already archived").into());
        }

        let now = Utc::now();
        let changes = MemberChanges {
            status: Some(MemberStatus::Inactive),
            archived_at: Some(now),
            ..MemberChanges::at(now)
        };
        let member = self.members.update_member(member_id, &changes).await?;

        self.activity
            .record(ctx, actions::MEMBER_ARCHIVED, entities::MEMBER, Some(member_id), None)
            .await;

        info!("Archived member {}", member_id);
        Ok(MemberResponse {
            member,
            success_message: "Member archived successfully".to_string(),
        })
    }

    /// Upload and attach a profile picture
    pub async fn upload_profile_picture(
        &self,
        ctx: &MemberContext,
        member_id: Uuid,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<ProfilePictureResponse> {
        ctx.require_self_or_board(member_id)?;

        let extension = avatar_extension(content_type).ok_or_else(|| {
            DomainError::validation(format!(
                "Unsupported image type {}; use PNG, JPEG or WebP",
                content_type
            ))
        })?;
        if bytes.is_empty() {
            return Err(DomainError::validation("Profile picture is empty").into());
        }
        if bytes.len() > MAX_AVATAR_BYTES {
            return Err(DomainError::validation("Profile picture must be 2 MB or smaller").into());
        }
        self.load_member(member_id).await?;

        let path = format!("{}/avatar-{}.{}", member_id, Utc::now().timestamp_millis(), extension);
        info!("Uploading profile picture for {} to {} ({} bytes)", member_id, path, bytes.len());
        let url = self.files.upload_object(&path, bytes, content_type).await?;

        let changes = MemberChanges {
            profile_picture_url: Some(url.clone()),
            ..MemberChanges::at(Utc::now())
        };
        let member = self.members.update_member(member_id, &changes).await?;

        self.activity
            .record(
                ctx,
                actions::PROFILE_PICTURE_UPLOADED,
                entities::MEMBER,
                Some(member_id),
                Some(json!({ "path": path })),
            )
            .await;

        Ok(ProfilePictureResponse {
            profile_picture_url: url,
            member,
        })
    }
}
