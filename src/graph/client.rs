// ABOUTME: HTTP implementation of the drive store against the Microsoft Graph REST API
// ABOUTME: Attaches bearer tokens from the session credential and maps service errors

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{redirect, Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::error::{GraphError, Result};
use super::models::{Drive, DriveItem, UserProfile};
use super::path::{encode_drive_path, encode_segment};
use super::store::{DownloadBody, DriveStore};
use crate::auth::TokenCredential;

pub const DEFAULT_GRAPH_URL: &str = "https://graph.microsoft.com/v1.0";

const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Session object for one run: an HTTP client pair plus the credential
/// that signs every request.
pub struct GraphClient {
    http_client: Client,
    no_redirect_client: Client,
    base_url: String,
    credential: Arc<dyn TokenCredential>,
}

impl GraphClient {
    pub fn new(base_url: impl Into<String>, credential: Arc<dyn TokenCredential>) -> Result<Self> {
        let timeout = Duration::from_secs(REQUEST_TIMEOUT_SECS);
        let http_client = Client::builder().timeout(timeout).build()?;
        let no_redirect_client = Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            http_client,
            no_redirect_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credential,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn request(&self, client: &Client, method: Method, path: &str) -> Result<RequestBuilder> {
        let token = self.credential.token().await?;
        let url = self.url(path);
        debug!("{} {}", method, url);
        Ok(client.request(method, url).bearer_auth(token.secret))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let response = ensure_success(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| GraphError::decode(format!("{}", e)))
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GraphError::from_body(status.as_u16(), &body))
}

#[async_trait]
impl DriveStore for GraphClient {
    async fn current_user(&self) -> Result<UserProfile> {
        let request = self
            .request(&self.http_client, Method::GET, "/me?$select=displayName")
            .await?;
        self.send_json(request).await
    }

    async fn default_drive(&self) -> Result<Drive> {
        let request = self
            .request(&self.http_client, Method::GET, "/me/drive?$select=id,driveType")
            .await?;
        self.send_json(request).await
    }

    async fn item_by_path(&self, drive_id: &str, path: &str) -> Result<DriveItem> {
        let resource = format!(
            "/drives/{}/root:/{}?$select=id,name,size,parentReference",
            encode_segment(drive_id),
            encode_drive_path(path)
        );
        let request = self
            .request(&self.http_client, Method::GET, &resource)
            .await?;
        self.send_json(request).await
    }

    async fn root_item(&self, drive_id: &str) -> Result<DriveItem> {
        let resource = format!("/drives/{}/root?$select=id", encode_segment(drive_id));
        let request = self
            .request(&self.http_client, Method::GET, &resource)
            .await?;
        self.send_json(request).await
    }

    async fn download_content(&self, drive_id: &str, item_id: &str) -> Result<DownloadBody> {
        let resource = format!(
            "/drives/{}/items/{}/content",
            encode_segment(drive_id),
            encode_segment(item_id)
        );
        let request = self
            .request(&self.http_client, Method::GET, &resource)
            .await?;
        let response = ensure_success(request.send().await?).await?;

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(GraphError::from))
            .boxed();
        Ok(DownloadBody::Streamed(stream))
    }

    async fn upload_content(
        &self,
        drive_id: &str,
        parent_id: &str,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<DriveItem> {
        let resource = format!(
            "/drives/{}/items/{}:/{}:/content",
            encode_segment(drive_id),
            encode_segment(parent_id),
            encode_segment(file_name)
        );
        let request = self
            .request(&self.http_client, Method::PUT, &resource)
            .await?
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(content);
        self.send_json(request).await
    }

    async fn download_converted(
        &self,
        drive_id: &str,
        item_id: &str,
        format: &str,
    ) -> Result<Vec<u8>> {
        let resource = format!(
            "/drives/{}/items/{}/content?format={}",
            encode_segment(drive_id),
            encode_segment(item_id),
            encode_segment(format)
        );
        let request = self
            .request(&self.no_redirect_client, Method::GET, &resource)
            .await?;
        let response = request.send().await?;
        let status = response.status();

        match status {
            StatusCode::FOUND | StatusCode::SEE_OTHER | StatusCode::TEMPORARY_REDIRECT => {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string)
                    .ok_or_else(|| {
                        GraphError::decode(format!("{} redirect without a Location header", status))
                    })?;
                debug!("Conversion redirected ({}), fetching converted content", status);

                // Pre-authenticated download URL; the bearer token must not follow it.
                let converted = self.http_client.get(&location).send().await?;
                let converted = ensure_success(converted).await?;
                Ok(converted.bytes().await?.to_vec())
            }
            StatusCode::OK => {
                warn!("Conversion returned content directly (200 OK) instead of a redirect");
                Ok(response.bytes().await?.to_vec())
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(GraphError::from_body(status.as_u16(), &body))
            }
        }
    }

    async fn delete_item(&self, drive_id: &str, item_id: &str) -> Result<()> {
        let resource = format!(
            "/drives/{}/items/{}",
            encode_segment(drive_id),
            encode_segment(item_id)
        );
        let request = self
            .request(&self.http_client, Method::DELETE, &resource)
            .await?;
        let response = ensure_success(request.send().await?).await?;
        if response.status() != StatusCode::NO_CONTENT {
            debug!("Delete returned {} instead of 204", response.status());
        }
        Ok(())
    }
}
