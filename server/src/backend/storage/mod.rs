//! # Storage Module
//!
//! Data access for the coop ledger. Rows live in the hosted Postgres backend
//! and are reached through its REST table endpoints, remote procedures and
//! object storage; nothing is persisted locally.
//!
//! ## Layout
//!
//! - **remote**: HTTP connection, select builder and backend error decoding
//! - **repositories**: one repository per table, implementing the storage traits
//! - **traits**: the interfaces the domain services depend on
//! - **cache**: LRU cache for aggregate reads, invalidated by writes

pub mod cache;
pub mod remote;
pub mod repositories;
pub mod traits;

#[cfg(test)]
pub mod test_utils;

use std::sync::Arc;

pub use cache::{QueryCache, QueryKey};
pub use remote::{RemoteConnection, RemoteError};
pub use repositories::{
    ActivityLogRepository, AvatarRepository, ContributionRepository, LoanRepository, MemberRepository,
    SettingsRepository,
};
pub use traits::{
    ActivityLogStorage, ContributionStorage, FileStorage, LoanStorage, MemberStorage, SettingsStorage,
};

/// Every storage backend the services need, behind their traits
#[derive(Clone)]
pub struct Storage {
    pub members: Arc<dyn MemberStorage>,
    pub contributions: Arc<dyn ContributionStorage>,
    pub loans: Arc<dyn LoanStorage>,
    pub settings: Arc<dyn SettingsStorage>,
    pub activity_logs: Arc<dyn ActivityLogStorage>,
    pub files: Arc<dyn FileStorage>,
}

impl Storage {
    /// Repositories over one remote connection; profile pictures go to `avatar_bucket`
    pub fn remote(conn: RemoteConnection, avatar_bucket: &str) -> Self {
        Self {
            members: Arc::new(MemberRepository::new(conn.clone())),
            contributions: Arc::new(ContributionRepository::new(conn.clone())),
            loans: Arc::new(LoanRepository::new(conn.clone())),
            settings: Arc::new(SettingsRepository::new(conn.clone())),
            activity_logs: Arc::new(ActivityLogRepository::new(conn.clone())),
            files: Arc::new(AvatarRepository::new(conn, avatar_bucket)),
        }
    }
}
