use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Unauthorized - session is no longer valid")]
    Unauthorized,

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("Request rejected ({status}): {detail}")]
    ClientError { status: u16, detail: String },

    #[error("Server unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("Server error ({status}): {detail}")]
    ServerError { status: u16, detail: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Pull the backend's `detail` field out of an error body.
    ///
    /// Validation failures carry `detail` as a list of objects; those are
    /// rendered back to compact JSON rather than dropped.
    pub fn detail_from_body(body: &str) -> Option<String> {
        let value: Value = serde_json::from_str(body).ok()?;
        match value.get("detail")? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = Self::detail_from_body(body).unwrap_or_else(|| Self::truncate_body(body));
        match status {
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden(detail),
            500..=599 => ApiError::ServerError { status, detail },
            _ => ApiError::ClientError { status, detail },
        }
    }

    /// Human-readable detail for display, without the variant prefix.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Forbidden(detail)
            | ApiError::ClientError { detail, .. }
            | ApiError::ServerError { detail, .. } => Some(detail.as_str()),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::NetworkUnreachable(err.to_string())
    }
}
