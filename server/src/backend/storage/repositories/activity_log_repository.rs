use anyhow::Result;
use async_trait::async_trait;
use shared::ActivityLog;

use crate::backend::domain::commands::activity::ActivityLogQuery;
use crate::backend::domain::commands::pagination::PageResult;
use crate::backend::domain::models::activity_log::NewActivityLogRow;
use crate::backend::storage::remote::{RemoteConnection, SelectQuery};
use crate::backend::storage::traits::ActivityLogStorage;

pub const ACTIVITY_LOGS_TABLE: &str = "activity_logs";

/// Repository for the `activity_logs` audit table
#[derive(Clone)]
pub struct ActivityLogRepository {
    conn: RemoteConnection,
}

impl ActivityLogRepository {
    pub fn new(conn: RemoteConnection) -> Self {
        Self { conn }
    }

    fn list_query(query: &ActivityLogQuery) -> SelectQuery {
        let (from, to) = query.page.range();
        SelectQuery::new(ACTIVITY_LOGS_TABLE)
            .eq_opt("actor_id", query.actor_id)
            .eq_opt("entity_type", query.entity_type.as_deref())
            .order("created_at", false)
            .range(from, to)
            .count_exact()
    }
}

#[async_trait]
impl ActivityLogStorage for ActivityLogRepository {
    async fn insert_log(&self, row: &NewActivityLogRow) -> Result<ActivityLog> {
        Ok(self.conn.insert(ACTIVITY_LOGS_TABLE, row).await?)
    }

    async fn list_logs(&self, query: &ActivityLogQuery) -> Result<PageResult<ActivityLog>> {
        let fetched = self.conn.select(&Self::list_query(query)).await?;
        Ok(PageResult {
            rows: fetched.rows,
            total: fetched.total,
        })
    }
}
