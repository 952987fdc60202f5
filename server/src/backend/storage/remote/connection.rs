use log::{debug, warn};
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

use super::error::RemoteError;
use super::query::{parse_content_range_total, Filters, SelectQuery};
use crate::config::AppConfig;

/// Rows returned by a select, with the exact total when it was requested
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedRows<T> {
    pub rows: Vec<T>,
    pub total: Option<u64>,
}

/// RemoteConnection issues table, RPC and storage requests against the hosted backend
#[derive(Clone)]
pub struct RemoteConnection {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RemoteConnection {
    /// Create a new connection
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Create a connection from application configuration
    pub fn from_config(config: &AppConfig) -> Result<Self, RemoteError> {
        Self::new(
            &config.supabase_url,
            &config.supabase_service_key,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn rpc_url(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{}", self.base_url, function)
    }

    fn object_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, path)
    }

    /// Public URL of an object in a public bucket
    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, bucket, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Turn non-success responses into `RemoteError::Api` with the backend's message
    async fn check(response: Response) -> Result<Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let error = RemoteError::from_response_body(status.as_u16(), &body);
        warn!("Backend request failed ({}): {}", status, error);
        Err(error)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Run a select and return the rows plus the exact count if requested
    pub async fn select<T: DeserializeOwned>(
        &self,
        query: &SelectQuery,
    ) -> Result<FetchedRows<T>, RemoteError> {
        debug!("SELECT {} {:?}", query.table(), query.query_pairs());

        let mut request = self
            .authorize(self.client.get(self.table_url(query.table())))
            .query(&query.query_pairs());
        for (name, value) in query.headers() {
            request = request.header(name, value);
        }

        let response = Self::check(request.send().await?).await?;
        let total = if query.wants_count() {
            response
                .headers()
                .get("content-range")
                .and_then(|value| value.to_str().ok())
                .and_then(parse_content_range_total)
        } else {
            None
        };
        let rows: Vec<T> = Self::decode(response).await?;

        Ok(FetchedRows { rows, total })
    }

    /// Run a select expected to match at most one row
    pub async fn select_one<T: DeserializeOwned>(
        &self,
        query: SelectQuery,
    ) -> Result<Option<T>, RemoteError> {
        let fetched = self.select(&query.range(0, 0)).await?;
        Ok(fetched.rows.into_iter().next())
    }

    /// Insert a single row and return it as written
    pub async fn insert<T, B>(&self, table: &str, row: &B) -> Result<T, RemoteError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        debug!("INSERT {}", table);

        let request = self
            .authorize(self.client.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(row);

        let response = Self::check(request.send().await?).await?;
        let rows: Vec<T> = Self::decode(response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| RemoteError::EmptyResult(format!("insert into {}", table)))
    }

    /// Update the row matching `filters` and return it as written
    pub async fn update<T, B>(&self, table: &str, filters: &Filters, changes: &B) -> Result<T, RemoteError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        debug!("UPDATE {} {:?}", table, filters.pairs());

        let request = self
            .authorize(self.client.patch(self.table_url(table)))
            .query(filters.pairs())
            .header("Prefer", "return=representation")
            .json(changes);

        let response = Self::check(request.send().await?).await?;
        let rows: Vec<T> = Self::decode(response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| RemoteError::EmptyResult(format!("update of {}", table)))
    }

    /// Call a remote procedure with named parameters
    pub async fn rpc<T, P>(&self, function: &str, params: &P) -> Result<T, RemoteError>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        debug!("RPC {}", function);

        let request = self
            .authorize(self.client.post(self.rpc_url(function)))
            .json(params);

        let response = Self::check(request.send().await?).await?;
        Self::decode(response).await
    }

    /// Upload a blob to `bucket/path`, replacing any existing object, and return its public URL
    pub async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, RemoteError> {
        debug!("UPLOAD {}/{} ({} bytes)", bucket, path, bytes.len());

        let request = self
            .authorize(self.client.post(self.object_url(bucket, path)))
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(bytes);

        Self::check(request.send().await?).await?;
        Ok(self.public_url(bucket, path))
    }
}
