use std::time::Duration;

use serde_json::Value;

/// Every failure the client can surface. Carries the HTTP status and the server payload when there was one.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The timer fired before the server answered.
    #[error("request timed out after {}ms", .timeout.as_millis())]
    Timeout { timeout: Duration },

    /// HTTP 401. The session has already been cleared when this is returned.
    #[error("unauthorized, please sign in again")]
    Unauthorized { payload: Option<Value> },

    /// Non-2xx status or an envelope with `status: false`.
    #[error("{message}")]
    RequestFailed {
        message: String,
        status: u16,
        payload: Option<Value>,
    },

    /// Body was not JSON, or `data` did not match the expected shape.
    #[error("bad response (HTTP {status}): {message}")]
    BadResponse { status: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Session(#[from] anyhow::Error),
}

pub const GENERIC_FAILURE: &str = "Request failed";

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::RequestFailed { status, .. } | ApiError::BadResponse { status, .. } => {
                Some(*status)
            }
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            ApiError::Timeout { .. } | ApiError::Encode(_) | ApiError::Session(_) => None,
        }
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            ApiError::Unauthorized { payload } | ApiError::RequestFailed { payload, .. } => {
                payload.as_ref()
            }
            _ => None,
        }
    }

    /// Text suitable for a user-facing notification.
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Timeout { .. })
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }
}
