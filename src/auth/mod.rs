// ABOUTME: Credential module supplying bearer tokens for drive requests
// ABOUTME: One asynchronous credential interface with device-code and static-token providers

pub mod device_code;
pub mod error;

pub use device_code::DeviceCodeCredential;
pub use error::{AuthError, Result};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

/// Tokens this close to expiry are treated as expired.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Clone)]
pub struct AccessToken {
    pub secret: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(secret: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            secret: secret.into(),
            expires_at,
        }
    }

    pub fn is_fresh(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS) < expires_at,
            None => true,
        }
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"***")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[async_trait]
pub trait TokenCredential: Send + Sync {
    async fn token(&self) -> Result<AccessToken>;
}

/// A token acquired outside this tool.
pub struct StaticTokenCredential {
    token: AccessToken,
}

impl StaticTokenCredential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(secret, None),
        }
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn token(&self) -> Result<AccessToken> {
        Ok(self.token.clone())
    }
}

/// Mask an identifier for logging, keeping the last four characters.
pub fn mask_identifier(value: &str) -> String {
    let tail: String = value
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("***{}", tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_freshness() {
        assert!(AccessToken::new("t", None).is_fresh());
        assert!(AccessToken::new("t", Some(Utc::now() + Duration::hours(1))).is_fresh());
        assert!(!AccessToken::new("t", Some(Utc::now() + Duration::seconds(10))).is_fresh());
    }

    #[test]
    fn test_debug_hides_secret() {
        let token = AccessToken::new("super-secret", None);
        assert!(!format!("{:?}", token).contains("super-secret"));
    }

    #[test]
    fn test_mask_identifier() {
        assert_eq!(mask_identifier("0123456789abcdef"), "***cdef");
        assert_eq!(mask_identifier("ab"), "***ab");
    }

    #[tokio::test]
    async fn test_static_token_credential() {
        let credential = StaticTokenCredential::new("abc");
        assert_eq!(credential.token().await.unwrap().secret, "abc");
    }
}
