use anyhow::Result;
use async_trait::async_trait;

use crate::backend::storage::remote::RemoteConnection;
use crate::backend::storage::traits::FileStorage;

/// Profile pictures in a public object-storage bucket
#[derive(Clone)]
pub struct AvatarRepository {
    conn: RemoteConnection,
    bucket: String,
}

impl AvatarRepository {
    pub fn new(conn: RemoteConnection, bucket: &str) -> Self {
        Self {
            conn,
            bucket: bucket.to_string(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl FileStorage for AvatarRepository {
    async fn upload_object(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        Ok(self.conn.upload(&self.bucket, path, bytes, content_type).await?)
    }
}
