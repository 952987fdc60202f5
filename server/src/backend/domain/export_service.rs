//! CSV export of contribution history.

use anyhow::Result;
use chrono::Utc;
use log::{error, info};
use serde_json::json;
use shared::Contribution;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use super::activity_log_service::ActivityLogService;
use super::commands::contributions::{ContributionListQuery, Period};
use super::commands::pagination::{PageRequest, MAX_PAGE_SIZE};
use super::context::MemberContext;
use super::errors::DomainError;
use super::models::activity_log::{actions, entities};
use crate::backend::storage::{ContributionStorage, MemberStorage};

pub const CSV_HEADER: [&str; 8] = [
    "contribution_id",
    "member_id",
    "category",
    "amount",
    "contribution_date",
    "payment_method",
    "reference_no",
    "remarks",
];

/// Generated CSV document
#[derive(Debug, Clone, PartialEq)]
pub struct ContributionExport {
    pub csv_content: String,
    pub filename: String,
    pub row_count: usize,
}

/// Service that exports contributions as CSV
#[derive(Clone)]
pub struct ExportService {
    contributions: Arc<dyn ContributionStorage>,
    members: Arc<dyn MemberStorage>,
    activity: ActivityLogService,
}

impl ExportService {
    pub fn new(
        contributions: Arc<dyn ContributionStorage>,
        members: Arc<dyn MemberStorage>,
        activity: ActivityLogService,
    ) -> Self {
        Self {
            contributions,
            members,
            activity,
        }
    }

    /// Every matching contribution, oldest first, fetched page by page
    async fn fetch_all(&self, member_id: Option<Uuid>, period: Period) -> Result<Vec<Contribution>> {
        let mut rows = Vec::new();
        let mut page = 1;
        loop {
            let query = ContributionListQuery {
                member_id,
                category: None,
                period,
                ascending: true,
                page: PageRequest::new(Some(page), Some(MAX_PAGE_SIZE)),
            };
            let result = self.contributions.list_contributions(&query).await?;
            let fetched = result.rows.len();
            rows.extend(result.rows);

            let done = match result.total {
                Some(total) => rows.len() as u64 >= total,
                None => fetched < MAX_PAGE_SIZE as usize,
            };
            if done || fetched == 0 {
                break;
            }
            page += 1;
        }
        Ok(rows)
    }

    /// Export contributions of one member (or everyone, for board users) as CSV
    pub async fn export_contributions_csv(
        &self,
        ctx: &MemberContext,
        member_id: Option<Uuid>,
        year: Option<i32>,
    ) -> Result<ContributionExport> {
        let member_id = ctx.scope_member(member_id)?;
        let period = Period::new(year, None)?;
        info!("Exporting contributions: member={:?}, year={:?}", member_id, year);

        let scope = match member_id {
            Some(id) => {
                let member = self
                    .members
                    .get_member(id)
                    .await?
                    .ok_or_else(|| DomainError::not_found("Member", id))?;
                member.member_code.replace(|c: char| !c.is_ascii_alphanumeric(), "_").to_lowercase()
            }
            None => "all".to_string(),
        };

        let contributions = self.fetch_all(member_id, period).await?;
        let csv_content = write_csv(&contributions)?;
        let filename = match year {
            Some(year) => format!("contributions_{}_{}_{}.csv", scope, year, Utc::now().format("%Y%m%d")),
            None => format!("contributions_{}_{}.csv", scope, Utc::now().format("%Y%m%d")),
        };

        self.activity
            .record(
                ctx,
                actions::CONTRIBUTIONS_EXPORTED,
                entities::CONTRIBUTION,
                member_id,
                Some(json!({ "year": year, "rows": contributions.len() })),
            )
            .await;

        info!("Exported {} contributions as {}", contributions.len(), filename);
        Ok(ContributionExport {
            csv_content,
            filename,
            row_count: contributions.len(),
        })
    }

    /// Export to a file inside `directory`, returning the written path
    pub async fn export_to_path(
        &self,
        ctx: &MemberContext,
        member_id: Option<Uuid>,
        year: Option<i32>,
        directory: &Path,
    ) -> Result<PathBuf> {
        let export = self.export_contributions_csv(ctx, member_id, year).await?;
        if !directory.is_dir() {
            error!("Export directory does not exist: {}", directory.display());
            return Err(DomainError::validation(format!(
                "Export directory does not exist: {}",
                directory.display()
            ))
            .into());
        }
        let path = directory.join(&export.filename);
        fs::write(&path, export.csv_content.as_bytes())?;
        info!("Wrote {} contributions to {}", export.row_count, path.display());
        Ok(path)
    }
}

fn write_csv(contributions: &[Contribution]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for c in contributions {
        writer.write_record([
            c.id.to_string(),
            c.member_id.to_string(),
            c.category.as_str().to_string(),
            format!("{:.2}", c.amount),
            c.contribution_date.to_string(),
            c.payment_method.clone().unwrap_or_default(),
            c.reference_no.clone().unwrap_or_default(),
            c.remarks.clone().unwrap_or_default(),
        ])?;
    }
    let bytes = writer.into_inner().map_err(|e| anyhow::anyhow!("Failed to finish CSV: {}", e))?;
    Ok(String::from_utf8(bytes)?)
}
