// ── Core error types ──
//
// User-facing errors from lanboard-core. Consumers never see raw HTTP
// status codes or JSON parse failures; the `From<lanboard_api::Error>`
// impl translates transport-layer errors into domain variants.

use thiserror::Error;

/// Message shown for any failure that is not the user's to fix.
pub const GENERIC_FAILURE_MESSAGE: &str = "An unexpected error occurred. Please try again later.";

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Dashboard is not connected")]
    Disconnected,

    #[error("Backend request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Entity not found: {entity_type} with id {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── Operation errors ─────────────────────────────────────────────
    /// Rejected locally, before any request was sent.
    #[error("{message}")]
    ValidationFailed { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if the backend answered).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }

    pub fn not_found(entity_type: &str, identifier: impl ToString) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_owned(),
            identifier: identifier.to_string(),
        }
    }

    /// Text for a transient notification banner.
    ///
    /// Validation failures are the user's to fix and keep their message;
    /// everything else collapses into one generic line.
    pub fn user_message(&self) -> String {
        match self {
            Self::ValidationFailed { message } => message.clone(),
            _ => GENERIC_FAILURE_MESSAGE.to_owned(),
        }
    }

    /// Worth retrying on the next refresh tick.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionFailed { .. } | Self::Timeout { .. } => true,
            Self::Api { status, .. } => status.is_some_and(|s| s >= 500),
            _ => false,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<lanboard_api::Error> for CoreError {
    fn from(err: lanboard_api::Error) -> Self {
        match err {
            lanboard_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            lanboard_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            lanboard_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            lanboard_api::Error::Api {
                status: 404,
                message,
            } => CoreError::NotFound {
                entity_type: "resource".into(),
                identifier: message,
            },
            lanboard_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            lanboard_api::Error::PushConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("push channel connection failed: {reason}"),
            },
            lanboard_api::Error::PushClosed { code, reason } => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("push channel closed (code {code}): {reason}"),
            },
            lanboard_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_is_shown_verbatim() {
        let err = CoreError::validation("Category is required.");
        assert_eq!(err.user_message(), "Category is required.");
        assert_eq!(err.to_string(), "Category is required.");
    }

    #[test]
    fn backend_failures_collapse_to_generic_message() {
        let err = CoreError::from(lanboard_api::Error::Api {
            status: 500,
            message: "Traceback ...".into(),
        });
        assert!(err.is_transient());
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn api_not_found_maps_to_not_found() {
        let err = CoreError::from(lanboard_api::Error::Api {
            status: 404,
            message: "Device not found".into(),
        });
        assert!(matches!(err, CoreError::NotFound { .. }));
    }
}
