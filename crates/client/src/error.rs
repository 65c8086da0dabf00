use thiserror::Error;

use billdesk_core::DomainError;

pub const GENERIC_ERROR_MESSAGE: &str = "Request failed";

#[derive(Debug, Error)]
pub enum ApiError {
    /// 401/403: the token was dropped; log in again.
    #[error("session expired")]
    SessionExpired,

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("decode error: {0}")]
    Decode(String),

    /// Rejected locally before any request was sent.
    #[error(transparent)]
    Invalid(#[from] DomainError),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// User-facing message from an error response body.
///
/// Looks at `message`, then `error`, then `detail`; anything else (including
/// a non-JSON body) yields [`GENERIC_ERROR_MESSAGE`].
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            ["message", "error", "detail"].iter().find_map(|key| {
                json.get(key)
                    .and_then(serde_json::Value::as_str)
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
            })
        })
        .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_message_then_error_then_detail() {
        assert_eq!(
            error_message(r#"{"message":"Invoice not found","error":"Not Found"}"#),
            "Invoice not found"
        );
        assert_eq!(error_message(r#"{"error":"Bad Request","detail":"x"}"#), "Bad Request");
        assert_eq!(error_message(r#"{"detail":"quantity must be >= 0"}"#), "quantity must be >= 0");
    }

    #[test]
    fn falls_back_to_generic_message() {
        assert_eq!(error_message(""), GENERIC_ERROR_MESSAGE);
        assert_eq!(error_message("<html>502</html>"), GENERIC_ERROR_MESSAGE);
        assert_eq!(error_message(r#"{"message":"  "}"#), GENERIC_ERROR_MESSAGE);
        assert_eq!(error_message(r#"{"message":42}"#), GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn display_includes_status() {
        let err = ApiError::Api {
            status: 409,
            message: "Conflict".to_string(),
        };
        assert_eq!(err.to_string(), "API error (409): Conflict");
        assert_eq!(err.status(), Some(409));
    }
}
