use crate::forms::FormError;
use thiserror::Error;

/// Failures talking to the forms backend
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid credentials")]
    Unauthorized,

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid API base URL '{0}'")]
    BaseUrl(String),

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),

    #[error("{0} record has no id; create it before updating")]
    MissingId(crate::lifecycle::types::FormKind),
}

impl ApiError {
    /// Build an error from a non-success response status and body
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return ApiError::Unauthorized;
        }
        let message = if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        } else {
            body.trim().to_string()
        };
        ApiError::Http {
            status: status.as_u16(),
            message,
        }
    }

    /// True when the request never produced an HTTP response
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
