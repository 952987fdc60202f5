use anyhow::Result;
use async_trait::async_trait;
use shared::{LoanApplication, LoanPayment, LoanRelease};
use uuid::Uuid;

use crate::backend::domain::commands::loans::LoanListQuery;
use crate::backend::domain::commands::pagination::PageResult;
use crate::backend::domain::models::loan::{
    LoanApplicationChanges, NewLoanApplicationRow, NewLoanPaymentRow, NewLoanReleaseRow,
};
use crate::backend::storage::remote::{Filters, RemoteConnection, SelectQuery};
use crate::backend::storage::traits::LoanStorage;

pub const LOAN_APPLICATIONS_TABLE: &str = "loan_applications";
pub const LOAN_RELEASES_TABLE: &str = "loan_releases";
pub const LOAN_PAYMENTS_TABLE: &str = "loan_payments";

/// Repository for loan applications and their releases and payments
#[derive(Clone)]
pub struct LoanRepository {
    conn: RemoteConnection,
}

impl LoanRepository {
    pub fn new(conn: RemoteConnection) -> Self {
        Self { conn }
    }

    fn list_query(query: &LoanListQuery) -> SelectQuery {
        let (from, to) = query.page.range();
        SelectQuery::new(LOAN_APPLICATIONS_TABLE)
            .eq_opt("member_id", query.member_id)
            .eq_opt("status", query.status.map(|s| s.as_str()))
            .order("created_at", false)
            .range(from, to)
            .count_exact()
    }

    fn payments_query(loan_id: Uuid) -> SelectQuery {
        SelectQuery::new(LOAN_PAYMENTS_TABLE)
            .eq("loan_id", loan_id)
            .order("payment_date", true)
            .order("created_at", true)
    }
}

#[async_trait]
impl LoanStorage for LoanRepository {
    async fn get_loan(&self, loan_id: Uuid) -> Result<Option<LoanApplication>> {
        let query = SelectQuery::new(LOAN_APPLICATIONS_TABLE).eq("id", loan_id);
        Ok(self.conn.select_one(query).await?)
    }

    async fn list_loans(&self, query: &LoanListQuery) -> Result<PageResult<LoanApplication>> {
        let fetched = self.conn.select(&Self::list_query(query)).await?;
        Ok(PageResult {
            rows: fetched.rows,
            total: fetched.total,
        })
    }

    async fn insert_loan(&self, row: &NewLoanApplicationRow) -> Result<LoanApplication> {
        Ok(self.conn.insert(LOAN_APPLICATIONS_TABLE, row).await?)
    }

    async fn update_loan(&self, loan_id: Uuid, changes: &LoanApplicationChanges) -> Result<LoanApplication> {
        let filters = Filters::new().eq("id", loan_id);
        Ok(self.conn.update(LOAN_APPLICATIONS_TABLE, &filters, changes).await?)
    }

    async fn get_release(&self, loan_id: Uuid) -> Result<Option<LoanRelease>> {
        let query = SelectQuery::new(LOAN_RELEASES_TABLE).eq("loan_id", loan_id);
        Ok(self.conn.select_one(query).await?)
    }

    async fn insert_release(&self, row: &NewLoanReleaseRow) -> Result<LoanRelease> {
        Ok(self.conn.insert(LOAN_RELEASES_TABLE, row).await?)
    }

    async fn list_payments(&self, loan_id: Uuid) -> Result<Vec<LoanPayment>> {
        let fetched = self.conn.select(&Self::payments_query(loan_id)).await?;
        Ok(fetched.rows)
    }

    async fn insert_payment(&self, row: &NewLoanPaymentRow) -> Result<LoanPayment> {
        Ok(self.conn.insert(LOAN_PAYMENTS_TABLE, row).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::commands::pagination::PageRequest;
    use shared::LoanStatus;

    #[test]
    fn test_list_query() {
        let query = LoanListQuery {
            member_id: None,
            status: Some(LoanStatus::Pending),
            page: PageRequest::default(),
        };
        let select = LoanRepository::list_query(&query);
        let pairs = select.query_pairs();

        assert!(pairs.contains(&("status".to_string(), "eq.pending".to_string())));
        assert!(!pairs.iter().any(|(k, _)| k == "member_id"));
        assert!(pairs.contains(&("order".to_string(), "created_at.desc".to_string())));
        assert!(select.headers().contains(&("Range", "0-9".to_string())));
    }

    #[test]
    fn test_payments_are_oldest_first() {
        let pairs = LoanRepository::payments_query(Uuid::new_v4()).query_pairs();
        assert!(pairs.contains(&("order".to_string(), "payment_date.asc,created_at.asc".to_string())));
    }
}
