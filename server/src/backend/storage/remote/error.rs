//! Errors raised while talking to the hosted backend.

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The backend answered with a non-success status; `message` is its own text
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
        details: Option<String>,
        hint: Option<String>,
    },
    #[error("Request to backend failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Could not decode backend response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Backend returned no row for {0}")]
    EmptyResult(String),
}

/// Error body shape used by the backend's REST and storage APIs
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    #[serde(alias = "error")]
    error_description: Option<String>,
    code: Option<serde_json::Value>,
    details: Option<String>,
    hint: Option<String>,
}

impl RemoteError {
    /// Build an `Api` error from a status code and the raw response body
    pub fn from_response_body(status: u16, body: &str) -> Self {
        let parsed: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();
        let message = parsed
            .message
            .or(parsed.error_description)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    format!("Backend request failed with status {}", status)
                } else {
                    trimmed.to_string()
                }
            });

        let code = parsed.code.map(|c| match c {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        });

        RemoteError::Api {
            status,
            message,
            code,
            details: parsed.details,
            hint: parsed.hint,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Api { status, .. } => Some(*status),
            RemoteError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
