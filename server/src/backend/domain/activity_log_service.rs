use anyhow::Result;
use log::{info, warn};
use serde_json::Value;
use shared::{ActivityLog, PageResponse};
use std::sync::Arc;
use uuid::Uuid;

use super::commands::activity::ActivityLogQuery;
use super::context::MemberContext;
use super::models::activity_log::NewActivityLogRow;
use crate::backend::storage::ActivityLogStorage;

/// Service for the audit trail of board and member actions
#[derive(Clone)]
pub struct ActivityLogService {
    logs: Arc<dyn ActivityLogStorage>,
}

impl ActivityLogService {
    pub fn new(logs: Arc<dyn ActivityLogStorage>) -> Self {
        Self { logs }
    }

    /// Record an action by the caller. Failures are logged and swallowed so an
    /// unavailable audit table never fails the operation being audited.
    pub async fn record(
        &self,
        ctx: &MemberContext,
        action: &str,
        entity_type: &str,
        entity_id: Option<Uuid>,
        details: Option<Value>,
    ) {
        let row = NewActivityLogRow {
            actor_id: ctx.member_id,
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            entity_id,
            details,
        };
        if let Err(e) = self.logs.insert_log(&row).await {
            warn!("Failed to record activity {} by {}: {}", action, ctx.member_id, e);
        }
    }

    /// List activity logs, newest first (board only)
    pub async fn list_logs(&self, ctx: &MemberContext, query: ActivityLogQuery) -> Result<PageResponse<ActivityLog>> {
        ctx.require_board("view activity logs")?;
        info!("Listing activity logs: actor={:?}, entity_type={:?}", query.actor_id, query.entity_type);

        let result = self.logs.list_logs(&query).await?;
        Ok(query.page.into_response(result.rows, result.total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::errors::DomainError;
    use crate::backend::domain::models::activity_log::{actions, entities};
    use crate::backend::storage::test_utils::TestEnvironment;
    use shared::MemberRole;

    #[tokio::test]
    async fn test_record_and_list_newest_first() {
        let env = TestEnvironment::new().unwrap();
        let service = ActivityLogService::new(env.storage.activity_logs.clone());
        let board = MemberContext::from_profile(&env.store.seed_member(MemberRole::Board, 5, 40));

        service.record(&board, actions::MEMBER_CREATED, entities::MEMBER, None, None).await;
        service
            .record(&board, actions::LOAN_APPROVED, entities::LOAN, Some(Uuid::new_v4()), None)
            .await;

        let page = service.list_logs(&board, ActivityLogQuery::default()).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].action, actions::LOAN_APPROVED);
        assert_eq!(page.pagination.total, Some(2));

        let loans_only = ActivityLogQuery {
            entity_type: Some(entities::LOAN.to_string()),
            ..ActivityLogQuery::default()
        };
        let page = service.list_logs(&board, loans_only).await.unwrap();
        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn test_record_failure_is_swallowed() {
        let env = TestEnvironment::new().unwrap();
        let service = ActivityLogService::new(env.storage.activity_logs.clone());
        let board = MemberContext::from_profile(&env.store.seed_member(MemberRole::Board, 5, 40));

        env.store.fail_activity_logs();
        service.record(&board, actions::SETTING_UPDATED, entities::SETTING, None, None).await;

        assert!(env.store.activity_logs().is_empty());
    }

    #[tokio::test]
    async fn test_members_cannot_list_logs() {
        let env = TestEnvironment::new().unwrap();
        let service = ActivityLogService::new(env.storage.activity_logs.clone());
        let member = MemberContext::from_profile(&env.store.seed_member(MemberRole::Member, 2, 30));

        let err = service.list_logs(&member, ActivityLogQuery::default()).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::Forbidden(_))));
    }
}
