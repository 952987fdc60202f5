use anyhow::Result;
use async_trait::async_trait;
use shared::{MemberProfile, MemberStatus};
use uuid::Uuid;

use crate::backend::domain::commands::members::MemberListQuery;
use crate::backend::domain::commands::pagination::PageResult;
use crate::backend::domain::models::member::{MemberChanges, NewMemberRow};
use crate::backend::storage::remote::{Filters, RemoteConnection, SelectQuery};
use crate::backend::storage::traits::MemberStorage;

pub const MEMBERS_TABLE: &str = "members";

/// Repository for the `members` table
#[derive(Clone)]
pub struct MemberRepository {
    conn: RemoteConnection,
}

impl MemberRepository {
    pub fn new(conn: RemoteConnection) -> Self {
        Self { conn }
    }

    fn list_query(query: &MemberListQuery) -> SelectQuery {
        let (from, to) = query.page.range();
        SelectQuery::new(MEMBERS_TABLE)
            .is_null("archived_at")
            .eq_opt("status", query.status.map(|s| s.as_str()))
            .order("last_name", true)
            .order("first_name", true)
            .range(from, to)
            .count_exact()
    }

    fn active_count_query() -> SelectQuery {
        SelectQuery::new(MEMBERS_TABLE)
            .columns("id")
            .is_null("archived_at")
            .eq("status", MemberStatus::Active.as_str())
            .range(0, 0)
            .count_exact()
    }
}

#[async_trait]
impl MemberStorage for MemberRepository {
    async fn get_member(&self, member_id: Uuid) -> Result<Option<MemberProfile>> {
        let query = SelectQuery::new(MEMBERS_TABLE).eq("id", member_id);
        Ok(self.conn.select_one(query).await?)
    }

    async fn list_members(&self, query: &MemberListQuery) -> Result<PageResult<MemberProfile>> {
        let fetched = self.conn.select(&Self::list_query(query)).await?;
        Ok(PageResult {
            rows: fetched.rows,
            total: fetched.total,
        })
    }

    async fn count_active_members(&self) -> Result<u64> {
        let fetched = self
            .conn
            .select::<serde_json::Value>(&Self::active_count_query())
            .await?;
        Ok(fetched.total.unwrap_or(fetched.rows.len() as u64))
    }

    async fn insert_member(&self, row: &NewMemberRow) -> Result<MemberProfile> {
        Ok(self.conn.insert(MEMBERS_TABLE, row).await?)
    }

    async fn update_member(&self, member_id: Uuid, changes: &MemberChanges) -> Result<MemberProfile> {
        let filters = Filters::new().eq("id", member_id);
        Ok(self.conn.update(MEMBERS_TABLE, &filters, changes).await?)
    }
}
