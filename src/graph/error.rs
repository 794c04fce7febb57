// ABOUTME: Error types for remote drive operations
// ABOUTME: Separates structured service errors from transport and decoding failures

use serde::Deserialize;
use thiserror::Error;

use crate::auth::AuthError;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Graph request failed ({status}): {code} - {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response: {message}")]
    Decode { message: String },

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
}

impl GraphError {
    /// The service reported that the addressed item or drive does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            GraphError::Api { status, code, .. } => *status == 404 || code.contains("itemNotFound"),
            _ => false,
        }
    }

    pub fn is_invalid_request(&self) -> bool {
        match self {
            GraphError::Api { code, message, .. } => {
                code.contains("invalidRequest") || message.contains("malformed")
            }
            _ => false,
        }
    }

    /// Statuses that mean "not ready yet" for a freshly written item.
    pub fn is_retryable(&self) -> bool {
        match self {
            GraphError::Api { status, .. } => {
                matches!(*status, 404 | 409 | 423 | 429) || *status >= 500
            }
            GraphError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    pub(crate) fn decode(message: impl Into<String>) -> Self {
        GraphError::Decode {
            message: message.into(),
        }
    }

    /// Build an API error from a status and the raw response body.
    pub(crate) fn from_body(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => GraphError::Api {
                status,
                code: envelope.error.code.unwrap_or_else(|| "unknown".to_string()),
                message: envelope.error.message.unwrap_or_default(),
            },
            Err(_) => GraphError::Api {
                status,
                code: "unknown".to_string(),
                message: body.chars().take(500).collect(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

pub type Result<T> = std::result::Result<T, GraphError>;
