// ABOUTME: Error types for credential acquisition
// ABOUTME: Distinguishes configuration problems, user declines and transport failures

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Authentication is not configured: {message}")]
    NotConfigured { message: String },

    #[error("Sign-in was declined or failed: {code} - {description}")]
    Denied { code: String, description: String },

    #[error("Sign-in code expired before it was used")]
    Expired,

    #[error("Token endpoint returned an unexpected response: {message}")]
    InvalidResponse { message: String },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, AuthError>;
