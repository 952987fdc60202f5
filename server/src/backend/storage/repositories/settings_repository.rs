use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::Setting;

use crate::backend::storage::remote::{Filters, RemoteConnection, SelectQuery};
use crate::backend::storage::traits::SettingsStorage;

pub const SETTINGS_TABLE: &str = "settings";

#[derive(Debug, Serialize)]
struct SettingValueChange<'a> {
    value: &'a str,
    updated_at: Option<DateTime<Utc>>,
}

/// Repository for the `settings` key/value table
#[derive(Clone)]
pub struct SettingsRepository {
    conn: RemoteConnection,
}

impl SettingsRepository {
    pub fn new(conn: RemoteConnection) -> Self {
        Self { conn }
    }

    fn list_query(category: Option<&str>) -> SelectQuery {
        SelectQuery::new(SETTINGS_TABLE)
            .eq_opt("category", category)
            .order("category", true)
            .order("key", true)
    }
}

#[async_trait]
impl SettingsStorage for SettingsRepository {
    async fn list_settings(&self, category: Option<&str>) -> Result<Vec<Setting>> {
        let fetched = self.conn.select(&Self::list_query(category)).await?;
        Ok(fetched.rows)
    }

    async fn get_setting(&self, category: &str, key: &str) -> Result<Option<Setting>> {
        let query = SelectQuery::new(SETTINGS_TABLE)
            .eq("category", category)
            .eq("key", key);
        Ok(self.conn.select_one(query).await?)
    }

    async fn insert_setting(&self, setting: &Setting) -> Result<Setting> {
        Ok(self.conn.insert(SETTINGS_TABLE, setting).await?)
    }

    async fn update_setting(&self, setting: &Setting) -> Result<Setting> {
        let filters = Filters::new()
            .eq("category", &setting.category)
            .eq("key", &setting.key);
        let change = SettingValueChange {
            value: &setting.value,
            updated_at: setting.updated_at,
        };
        Ok(self.conn.update(SETTINGS_TABLE, &filters, &change).await?)
    }
}
