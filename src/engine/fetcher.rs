// ABOUTME: Downloads template bytes for a resolved item
// ABOUTME: Streamed responses are accumulated into one buffer

use futures::StreamExt;
use tracing::{info, warn};

use super::error::{Result, WorkflowError};
use super::locator::ResolvedItem;
use crate::graph::{DownloadBody, DriveStore};

pub async fn fetch_content(store: &dyn DriveStore, item: &ResolvedItem) -> Result<Vec<u8>> {
    let body = store
        .download_content(&item.drive_id, &item.item_id)
        .await
        .map_err(WorkflowError::Fetch)?;

    let content = collect_body(body).await?;
    if content.is_empty() {
        warn!("Downloaded content for item {} is empty", item.item_id);
    } else {
        info!("Downloaded {} bytes", content.len());
    }
    Ok(content)
}

pub async fn collect_body(body: DownloadBody) -> Result<Vec<u8>> {
    match body {
        DownloadBody::Buffered(bytes) => Ok(bytes),
        DownloadBody::Streamed(mut stream) => {
            let mut buffer = Vec::new();
            while let Some(chunk) = stream.next().await {
                buffer.extend_from_slice(&chunk.map_err(WorkflowError::Fetch)?);
            }
            Ok(buffer)
        }
    }
}
