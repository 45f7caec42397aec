//! API client error types.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::envelope::extract_message;

/// Result type for API calls.
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// HTTP Failures
// =============================================================================

/// A non-2xx response: status, the server's message and the parsed body.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpFailure {
    /// HTTP status code.
    pub status: u16,
    /// The body's `message`, `error` or `detail` field, the raw text body,
    /// or the status reason phrase, in that order.
    pub message: String,
    /// Parsed JSON body; a JSON string for non-JSON text, `Null` when empty.
    pub payload: Value,
}

impl HttpFailure {
    /// Build from a status and a (possibly empty) response body.
    pub fn from_body(status: u16, body: &str) -> Self {
        let payload = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
        };

        let message = extract_message(&payload)
            .or_else(|| match &payload {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                _ => None,
            })
            .unwrap_or_else(|| default_reason(status).to_string());

        Self {
            status,
            message,
            payload,
        }
    }

    /// True when the message mentions `needle`, ignoring case.
    pub fn message_mentions(&self, needle: &str) -> bool {
        self.message.to_lowercase().contains(&needle.to_lowercase())
    }
}

fn default_reason(status: u16) -> &'static str {
    match status {
        400 => "Bad request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not found",
        409 => "Conflict",
        410 => "Gone",
        422 => "Unprocessable entity",
        429 => "Too many requests",
        500..=599 => "Server error",
        _ => "Request failed",
    }
}

// =============================================================================
// Error Taxonomy
// =============================================================================

/// Errors that can occur during API calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 401 or 403: bad credentials, expired token or a refused OTP.
    #[error("{}", .0.message)]
    Auth(HttpFailure),

    /// 404. Often a valid "not created yet" state rather than a failure.
    #[error("{}", .0.message)]
    NotFound(HttpFailure),

    /// 409, e.g. a duplicate email or a repeated application.
    #[error("{}", .0.message)]
    Conflict(HttpFailure),

    /// Any other 4xx, including 400 and 422.
    #[error("{}", .0.message)]
    Rejected(HttpFailure),

    /// 429; `retry_after_ms` comes from the `Retry-After` header.
    #[error("{}", .failure.message)]
    RateLimited {
        failure: HttpFailure,
        retry_after_ms: Option<u64>,
    },

    /// 5xx.
    #[error("{}", .0.message)]
    Server(HttpFailure),

    /// The request exceeded the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// Connection refused, DNS failure, TLS error or a dropped connection.
    #[error("Network error: {0}")]
    Network(reqwest::Error),

    /// A 2xx body that does not have the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Network(err)
        }
    }
}

// =============================================================================
// Classification
// =============================================================================

impl ApiError {
    /// Map an HTTP status and body into the taxonomy.
    pub fn from_http_status(status: u16, body: &str, retry_after: Option<Duration>) -> Self {
        let failure = HttpFailure::from_body(status, body);
        match status {
            401 | 403 => ApiError::Auth(failure),
            404 => ApiError::NotFound(failure),
            409 => ApiError::Conflict(failure),
            429 => ApiError::RateLimited {
                failure,
                retry_after_ms: retry_after.map(|d| d.as_millis() as u64),
            },
            500..=599 => ApiError::Server(failure),
            _ => ApiError::Rejected(failure),
        }
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// The structured HTTP failure, when the server answered.
    pub fn failure(&self) -> Option<&HttpFailure> {
        match self {
            ApiError::Auth(f)
            | ApiError::NotFound(f)
            | ApiError::Conflict(f)
            | ApiError::Rejected(f)
            | ApiError::Server(f) => Some(f),
            ApiError::RateLimited { failure, .. } => Some(failure),
            _ => None,
        }
    }

    pub fn http_status(&self) -> Option<u16> {
        self.failure().map(|f| f.status)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }

    /// Transient failures worth retrying for idempotent requests.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::Network(_)
                | ApiError::Timeout
                | ApiError::RateLimited { .. }
                | ApiError::Server(_)
        )
    }

    /// Network and server failures, shown as dismissible notifications.
    pub fn is_transient(&self) -> bool {
        self.is_retryable()
    }

    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ApiError::RateLimited { retry_after_ms, .. } => *retry_after_ms,
            _ => None,
        }
    }

    /// Text for the user-facing error channel.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => "Unable to reach the server. Check your connection.".to_string(),
            ApiError::InvalidResponse(_) | ApiError::Json(_) => {
                "The server sent an unexpected response.".to_string()
            }
            other => other.to_string(),
        }
    }
}
