// ABOUTME: OAuth 2.0 device authorization grant against the identity platform
// ABOUTME: Prints the sign-in instructions, polls for the token and keeps it for the run

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, info};

use super::error::{AuthError, Result};
use super::{AccessToken, TokenCredential};

const DEVICE_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
const SLOW_DOWN_INCREMENT_SECS: u64 = 5;

#[derive(Debug, Deserialize)]
struct DeviceCodeResponse {
    device_code: String,
    user_code: String,
    verification_uri: String,
    expires_in: u64,
    #[serde(default)]
    interval: Option<u64>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Interactive sign-in for a public client. The token lives only as long as
/// this value does; nothing is written to disk.
pub struct DeviceCodeCredential {
    http_client: Client,
    authority: String,
    tenant_id: String,
    client_id: String,
    scopes: Vec<String>,
    token: Mutex<Option<AccessToken>>,
}

impl DeviceCodeCredential {
    pub fn new(
        authority: impl Into<String>,
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            http_client: Client::new(),
            authority: authority.into(),
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            scopes,
            token: Mutex::new(None),
        }
    }

    fn endpoint(&self, name: &str) -> String {
        format!(
            "{}/{}/oauth2/v2.0/{}",
            self.authority.trim_end_matches('/'),
            self.tenant_id,
            name
        )
    }

    async fn request_device_code(&self) -> Result<DeviceCodeResponse> {
        let scope = self.scopes.join(" ");
        let response = self
            .http_client
            .post(self.endpoint("devicecode"))
            .form(&[("client_id", self.client_id.as_str()), ("scope", scope.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(token_error(&body).unwrap_or_else(|| AuthError::InvalidResponse {
                message: format!("device code request failed with status {}", status),
            }));
        }

        serde_json::from_str(&body).map_err(|e| AuthError::InvalidResponse {
            message: format!("device code response: {}", e),
        })
    }

    async fn poll_for_token(&self, device: &DeviceCodeResponse) -> Result<AccessToken> {
        let mut interval = device.interval.unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
        let deadline = Instant::now() + Duration::from_secs(device.expires_in);

        loop {
            sleep(Duration::from_secs(interval)).await;
            if Instant::now() >= deadline {
                return Err(AuthError::Expired);
            }

            let response = self
                .http_client
                .post(self.endpoint("token"))
                .form(&[
                    ("grant_type", DEVICE_CODE_GRANT),
                    ("client_id", self.client_id.as_str()),
                    ("device_code", device.device_code.as_str()),
                ])
                .send()
                .await?;

            let status = response.status();
            let body = response.text().await?;

            if status.is_success() {
                let token: TokenResponse =
                    serde_json::from_str(&body).map_err(|e| AuthError::InvalidResponse {
                        message: format!("token response: {}", e),
                    })?;
                let expires_at = token
                    .expires_in
                    .map(|seconds| Utc::now() + chrono::Duration::seconds(seconds));
                return Ok(AccessToken::new(token.access_token, expires_at));
            }

            let error: TokenErrorResponse =
                serde_json::from_str(&body).map_err(|_| AuthError::InvalidResponse {
                    message: format!("token request failed with status {}", status),
                })?;

            match error.error.as_str() {
                "authorization_pending" => {
                    debug!("Waiting for the user to complete sign-in...");
                }
                "slow_down" => {
                    interval += SLOW_DOWN_INCREMENT_SECS;
                    debug!("Token endpoint asked to slow down, polling every {}s", interval);
                }
                "expired_token" => return Err(AuthError::Expired),
                _ => {
                    return Err(AuthError::Denied {
                        code: error.error,
                        description: error.error_description.unwrap_or_default(),
                    })
                }
            }
        }
    }
}

fn token_error(body: &str) -> Option<AuthError> {
    let error: TokenErrorResponse = serde_json::from_str(body).ok()?;
    Some(AuthError::Denied {
        code: error.error,
        description: error.error_description.unwrap_or_default(),
    })
}

#[async_trait]
impl TokenCredential for DeviceCodeCredential {
    async fn token(&self) -> Result<AccessToken> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|token| token.is_fresh()) {
            return Ok(token.clone());
        }
        if self.client_id.trim().is_empty() {
            return Err(AuthError::NotConfigured {
                message: "no client id for device code sign-in".to_string(),
            });
        }

        let device = self.request_device_code().await?;
        let instructions = device.message.clone().unwrap_or_else(|| {
            format!(
                "To sign in, open {} and enter the code {}",
                device.verification_uri, device.user_code
            )
        });
        eprintln!("{}", instructions);
        info!("Waiting for device sign-in (code expires in {}s)", device.expires_in);

        let token = self.poll_for_token(&device).await?;
        info!("Device sign-in completed");
        *cached = Some(token.clone());
        Ok(token)
    }
}
