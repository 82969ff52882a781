//! Gateway error taxonomy with MCP protocol conversion.
//!
//! Every failure a tool call can hit is expressed here and re-shaped into a
//! structured MCP error before it crosses the transport boundary. Backend
//! error bodies are never forwarded verbatim; only the error class and a safe
//! summary survive.

use rmcp::model::ErrorCode;
use thiserror::Error;

use crate::auth::API_KEY_PREFIX;

/// Gateway-level errors for Graforest.
#[derive(Error, Debug)]
pub enum GatewayError {
    // Auth errors
    #[error("API key is required")]
    MissingApiKey,

    #[error("invalid API key format - must start with '{API_KEY_PREFIX}'")]
    MalformedApiKey,

    #[error("API key is too short")]
    ApiKeyTooShort,

    // Validation errors
    #[error("{kind} batch of {len} records exceeds the {max}-record limit - split into smaller calls")]
    BatchTooLarge {
        kind: &'static str,
        len: usize,
        max: usize,
    },

    #[error("text content too short - provide at least {min} characters")]
    ContentTooShort { min: usize },

    #[error("text content too large ({len} chars, maximum {max}) - split into smaller chunks")]
    ContentTooLarge { len: usize, max: usize },

    #[error("limit must be between 1 and {max}, got {got}")]
    PageSizeOutOfRange { got: u32, max: u32 },

    #[error("max_depth must be between 1 and {max}, got {got}")]
    DepthOutOfRange { got: u32, max: u32 },

    #[error("validation error: {0}")]
    Validation(String),

    // Backend errors
    #[error("backend request timed out: {operation}")]
    BackendTimeout { operation: String },

    #[error("backend unavailable: {message}")]
    BackendUnavailable { message: String },

    #[error("backend rejected request ({status}): {message}")]
    BackendRejected { status: u16, message: String },

    #[error("provisioning failed: {message}")]
    Provisioning { message: String },

    // Config errors
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("provisioning service key not configured - set GRAFOREST_PROVISION_KEY")]
    MissingServiceKey,

    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Only transient transport-level failures qualify; anything the backend
    /// decided on purpose is final.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GatewayError::BackendTimeout { .. } | GatewayError::BackendUnavailable { .. }
        )
    }

    /// Map a reqwest transport error into the gateway taxonomy.
    pub fn from_reqwest(operation: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::BackendTimeout {
                operation: operation.to_string(),
            }
        } else if err.is_connect() {
            GatewayError::BackendUnavailable {
                message: format!("{operation}: connection failed"),
            }
        } else if err.is_decode() {
            GatewayError::Internal(format!("{operation}: malformed backend response"))
        } else {
            GatewayError::BackendUnavailable {
                message: format!("{operation}: request failed"),
            }
        }
    }
}

impl From<GatewayError> for rmcp::model::ErrorData {
    fn from(err: GatewayError) -> Self {
        let (code, app_code) = match &err {
            GatewayError::MissingApiKey => (ErrorCode::INVALID_REQUEST, "AUTH_MISSING"),
            GatewayError::MalformedApiKey => (ErrorCode::INVALID_REQUEST, "AUTH_MALFORMED"),
            GatewayError::ApiKeyTooShort => (ErrorCode::INVALID_REQUEST, "AUTH_MALFORMED"),
            GatewayError::BatchTooLarge { .. } => (ErrorCode::INVALID_PARAMS, "BATCH_TOO_LARGE"),
            GatewayError::ContentTooShort { .. } => (ErrorCode::INVALID_PARAMS, "CONTENT_TOO_SHORT"),
            GatewayError::ContentTooLarge { .. } => (ErrorCode::INVALID_PARAMS, "CONTENT_TOO_LARGE"),
            GatewayError::PageSizeOutOfRange { .. } => {
                (ErrorCode::INVALID_PARAMS, "PAGE_OUT_OF_RANGE")
            }
            GatewayError::DepthOutOfRange { .. } => {
                (ErrorCode::INVALID_PARAMS, "DEPTH_OUT_OF_RANGE")
            }
            GatewayError::Validation(_) => (ErrorCode::INVALID_PARAMS, "VALIDATION_ERROR"),
            GatewayError::BackendTimeout { .. } => (ErrorCode::INTERNAL_ERROR, "BACKEND_TIMEOUT"),
            GatewayError::BackendUnavailable { .. } => {
                (ErrorCode::INTERNAL_ERROR, "BACKEND_UNAVAILABLE")
            }
            GatewayError::BackendRejected { .. } => (ErrorCode::INVALID_REQUEST, "BACKEND_REJECTED"),
            GatewayError::Provisioning { .. } => (ErrorCode::INTERNAL_ERROR, "PROVISIONING_FAILED"),
            GatewayError::Config(_) => (ErrorCode::INTERNAL_ERROR, "CONFIG_ERROR"),
            GatewayError::MissingServiceKey => (ErrorCode::INTERNAL_ERROR, "CONFIG_ERROR"),
            GatewayError::Internal(_) => (ErrorCode::INTERNAL_ERROR, "INTERNAL_ERROR"),
        };

        rmcp::model::ErrorData::new(code, format!("[{}] {}", app_code, err), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(GatewayError::BackendTimeout {
            operation: "get_schema".into()
        }
        .is_transient());
        assert!(GatewayError::BackendUnavailable {
            message: "connection failed".into()
        }
        .is_transient());
        assert!(!GatewayError::BackendRejected {
            status: 404,
            message: "resource not found".into()
        }
        .is_transient());
        assert!(!GatewayError::MissingApiKey.is_transient());
        assert!(!GatewayError::BatchTooLarge {
            kind: "entities",
            len: 501,
            max: 500
        }
        .is_transient());
    }

    #[test]
    fn test_error_data_carries_app_code() {
        let data = rmcp::model::ErrorData::from(GatewayError::MissingApiKey);
        assert!(data.message.starts_with("[AUTH_MISSING]"));

        let data = rmcp::model::ErrorData::from(GatewayError::BatchTooLarge {
            kind: "entities",
            len: 501,
            max: 500,
        });
        assert!(data.message.starts_with("[BATCH_TOO_LARGE]"));
        assert!(data.message.contains("501"));
    }
}
