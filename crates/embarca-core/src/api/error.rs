use thiserror::Error;

/// Failure taxonomy surfaced by the API client.
///
/// Payloads are plain strings so a single error can be cloned out to every
/// request that was queued behind a failed credential refresh.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("session expired - please sign in again")]
    SessionExpired,

    #[error("request failed ({status}): {message}")]
    Client { status: u16, message: String },

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("credential storage error: {0}")]
    Storage(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid carrying excessive data in errors.
    /// The cut lands on the nearest char boundary at or below the limit.
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut cut = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!(
            "{}... (truncated, {} total bytes)",
            &body[..cut],
            body.len()
        )
    }

    /// Classify a non-success HTTP response.
    ///
    /// A 401 maps to `Unauthorized`; whether that means "retry after refresh"
    /// or "surface to the caller" is decided by the client, not here.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            status @ 400..=499 => ApiError::Client {
                status,
                message: truncated,
            },
            status @ 500..=599 => ApiError::Server {
                status,
                message: truncated,
            },
            other => ApiError::InvalidResponse(format!("status {}: {}", other, truncated)),
        }
    }
}
