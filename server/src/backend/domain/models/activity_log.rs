//! Domain model for activity log rows.
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// Action names written to `activity_logs.action`
pub mod actions {
    pub const MEMBER_CREATED: &str = "member.created";
    pub const MEMBER_UPDATED: &str = "member.updated";
    pub const MEMBER_ARCHIVED: &str = "member.archived";
    pub const PROFILE_PICTURE_UPLOADED: &str = "member.profile_picture_uploaded";
    pub const CONTRIBUTION_RECORDED: &str = "contribution.recorded";
    pub const LOAN_APPLIED: &str = "loan.applied";
    pub const LOAN_APPROVED: &str = "loan.approved";
    pub const LOAN_REJECTED: &str = "loan.rejected";
    pub const LOAN_RELEASED: &str = "loan.released";
    pub const LOAN_PAYMENT_RECORDED: &str = "loan.payment_recorded";
    pub const SETTING_UPDATED: &str = "setting.updated";
    pub const CONTRIBUTIONS_EXPORTED: &str = "contribution.exported";
}

/// Entity types written to `activity_logs.entity_type`
pub mod entities {
    pub const MEMBER: &str = "member";
    pub const CONTRIBUTION: &str = "contribution";
    pub const LOAN: &str = "loan";
    pub const SETTING: &str = "setting";
}

/// Row inserted into `activity_logs`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewActivityLogRow {
    pub actor_id: Uuid,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub details: Option<Value>,
}
