//! Translation of service errors into HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use log::{error, warn};
use shared::ErrorResponse;

use crate::backend::domain::date_diff::DateDiffError;
use crate::backend::domain::errors::DomainError;
use crate::backend::domain::loanable::LoanableError;
use crate::backend::domain::settings::SettingsError;
use crate::backend::storage::RemoteError;

/// An error response: status code plus `{ "error": message }` body
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: message.into(),
                eligibility: None,
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(domain) = err.downcast_ref::<DomainError>() {
            return match domain {
                DomainError::NotFound { .. } => Self::new(StatusCode::NOT_FOUND, domain.to_string()),
                DomainError::Validation(_) | DomainError::InvalidTransition { .. } => {
                    Self::bad_request(domain.to_string())
                }
                DomainError::Forbidden(_) => Self::new(StatusCode::FORBIDDEN, domain.to_string()),
                DomainError::Restricted(breakdown) => Self {
                    status: StatusCode::UNPROCESSABLE_ENTITY,
                    body: ErrorResponse {
                        error: domain.to_string(),
                        eligibility: Some((**breakdown).clone()),
                    },
                },
            };
        }

        if err.downcast_ref::<DateDiffError>().is_some()
            || err.downcast_ref::<LoanableError>().is_some()
            || err.downcast_ref::<SettingsError>().is_some()
        {
            return Self::bad_request(err.to_string());
        }

        if let Some(RemoteError::Api { status, message, .. }) = err.downcast_ref::<RemoteError>() {
            warn!("Backend rejected request ({}): {}", status, message);
            return Self::new(StatusCode::BAD_GATEWAY, message.clone());
        }

        error!("Request failed: {:#}", err);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
