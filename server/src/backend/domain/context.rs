//! The calling member, passed explicitly into every service operation.

use shared::{MemberProfile, MemberRole};
use uuid::Uuid;

use super::errors::DomainError;

/// Identity and role of the member on whose behalf an operation runs
#[derive(Debug, Clone, PartialEq)]
pub struct MemberContext {
    pub member_id: Uuid,
    pub role: MemberRole,
}

impl MemberContext {
    pub fn new(member_id: Uuid, role: MemberRole) -> Self {
        Self { member_id, role }
    }

    pub fn from_profile(profile: &MemberProfile) -> Self {
        Self::new(profile.id, profile.role)
    }

    pub fn is_board(&self) -> bool {
        self.role == MemberRole::Board
    }

    /// Fail unless the caller is a board user; `action` completes "Only board members may ..."
    pub fn require_board(&self, action: &str) -> Result<(), DomainError> {
        if self.is_board() {
            Ok(())
        } else {
            Err(DomainError::Forbidden(format!("Only board members may {}", action)))
        }
    }

    /// Fail unless the caller is `member_id` or a board user
    pub fn require_self_or_board(&self, member_id: Uuid) -> Result<(), DomainError> {
        if self.member_id == member_id || self.is_board() {
            Ok(())
        } else {
            Err(DomainError::Forbidden(
                "Members may only access their own records".to_string(),
            ))
        }
    }

    /// Resolve an optional member filter: members are pinned to themselves
    pub fn scope_member(&self, requested: Option<Uuid>) -> Result<Option<Uuid>, DomainError> {
        match (self.is_board(), requested) {
            (true, requested) => Ok(requested),
            (false, None) => Ok(Some(self.member_id)),
            (false, Some(id)) => {
                self.require_self_or_board(id)?;
                Ok(Some(id))
            }
        }
    }
}
