//! # REST API Interface Layer
//!
//! HTTP endpoints for the coop ledger. This layer handles:
//! - JSON request/response serialization
//! - Resolving the calling member from the `x-member-id` header
//! - Translating domain errors to HTTP status codes
//!
//! Handlers hold no business rules; every decision is made by the domain
//! services, which receive the caller's `MemberContext` explicitly.

use axum::response::Json;
use serde_json::{json, Value};

pub mod error;
pub mod extract;

pub mod activity_log_apis;
pub mod contribution_apis;
pub mod dashboard_apis;
pub mod eligibility_apis;
pub mod export_apis;
pub mod loan_apis;
pub mod member_apis;
pub mod settings_apis;

pub use error::ApiError;
pub use extract::{CurrentMember, MEMBER_ID_HEADER};

/// Liveness check; needs no identity
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::MEMBER_ID_HEADER;
    use crate::backend::storage::test_utils::TestEnvironment;
    use crate::backend::{create_router, AppState};

    pub fn app(env: &TestEnvironment) -> Router {
        let state = AppState::new(env.storage.clone(), 32);
        create_router(state, None).unwrap()
    }

    /// Send a request as `member` and return status plus the decoded JSON body
    pub async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        member: Option<Uuid>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(id) = member {
            builder = builder.header(MEMBER_ID_HEADER, id.to_string());
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }
}
