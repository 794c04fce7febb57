// ABOUTME: Temporary remote copy lifecycle: upload, server-side conversion, local save, cleanup
// ABOUTME: The remote copy is only deleted once the converted file has been saved locally

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::{Result, WorkflowError};
use super::locator::ResolvedItem;
use crate::graph::DriveStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionSettings {
    pub target_format: String,
    /// Wait after upload before the first conversion request.
    pub settle_delay_secs: u64,
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
    /// Converted files smaller than this are saved but flagged.
    pub min_expected_bytes: usize,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            target_format: "pdf".to_string(),
            settle_delay_secs: 5,
            max_attempts: 3,
            retry_delay_secs: 2,
            min_expected_bytes: 1000,
        }
    }
}

/// `<stem>_temp_<unique><.ext>` for the last segment of `template_path`.
pub fn temp_file_name(template_path: &str) -> String {
    let file_name = template_path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(template_path);
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "document".to_string());
    let suffix = Uuid::new_v4().simple().to_string();

    match path.extension() {
        Some(ext) => format!("{}_temp_{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}_temp_{}", stem, suffix),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporaryArtifact {
    pub drive_id: String,
    pub item_id: String,
    pub name: String,
}

pub struct ArtifactManager<'a> {
    store: &'a dyn DriveStore,
    settings: &'a ConversionSettings,
}

impl<'a> ArtifactManager<'a> {
    pub fn new(store: &'a dyn DriveStore, settings: &'a ConversionSettings) -> Self {
        Self { store, settings }
    }

    pub async fn upload(
        &self,
        item: &ResolvedItem,
        name: &str,
        content: Vec<u8>,
    ) -> Result<TemporaryArtifact> {
        info!("Uploading temporary file '{}' ({} bytes)", name, content.len());
        let uploaded = self
            .store
            .upload_content(&item.drive_id, &item.parent_id, name, content)
            .await
            .map_err(|source| WorkflowError::Upload {
                name: name.to_string(),
                source,
            })?;

        let item_id = uploaded
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| WorkflowError::Upload {
                name: name.to_string(),
                source: crate::graph::GraphError::decode("upload response has no item id"),
            })?;

        info!("Uploaded temporary file '{}' with id {}", name, item_id);
        Ok(TemporaryArtifact {
            drive_id: item.drive_id.clone(),
            item_id,
            name: name.to_string(),
        })
    }

    /// Request the converted content, waiting for the upload to settle first
    /// and retrying while the service reports the item as not ready.
    pub async fn convert(&self, artifact: &TemporaryArtifact) -> Result<Vec<u8>> {
        if self.settings.settle_delay_secs > 0 {
            info!(
                "Waiting {}s before requesting conversion",
                self.settings.settle_delay_secs
            );
            tokio::time::sleep(Duration::from_secs(self.settings.settle_delay_secs)).await;
        }

        let max_attempts = self.settings.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            debug!(
                "Conversion attempt {}/{} for item {}",
                attempt, max_attempts, artifact.item_id
            );
            match self
                .store
                .download_converted(
                    &artifact.drive_id,
                    &artifact.item_id,
                    &self.settings.target_format,
                )
                .await
            {
                Ok(bytes) if bytes.is_empty() => {
                    return Err(WorkflowError::Conversion {
                        item_id: artifact.item_id.clone(),
                        message: "converted content is empty".to_string(),
                    });
                }
                Ok(bytes) => {
                    info!(
                        "Received {} bytes of {} content",
                        bytes.len(),
                        self.settings.target_format
                    );
                    return Ok(bytes);
                }
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    warn!(
                        "Conversion not ready (attempt {}/{}): {}",
                        attempt, max_attempts, e
                    );
                    attempt += 1;
                    tokio::time::sleep(Duration::from_secs(self.settings.retry_delay_secs)).await;
                }
                Err(e) => {
                    debug!("Conversion failure details: {:?}", e);
                    return Err(WorkflowError::Conversion {
                        item_id: artifact.item_id.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    pub async fn save(
        &self,
        artifact: &TemporaryArtifact,
        bytes: &[u8],
        output: &Path,
    ) -> Result<()> {
        let save_error = |source: std::io::Error| WorkflowError::Save {
            path: output.to_path_buf(),
            source,
            temp_item_id: artifact.item_id.clone(),
        };

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(save_error)?;
        }

        if bytes.len() < self.settings.min_expected_bytes {
            warn!(
                "Converted file is only {} bytes; the output may be incomplete",
                bytes.len()
            );
        }

        fs::write(output, bytes).await.map_err(save_error)?;
        info!("Saved {} bytes to '{}'", bytes.len(), output.display());
        Ok(())
    }

    /// Delete the temporary item when `saved` is true; otherwise leave it for
    /// manual recovery. Returns whether the item was deleted.
    pub async fn cleanup(&self, artifact: &TemporaryArtifact, saved: bool) -> bool {
        if !saved {
            warn!(
                "Skipping deletion of temporary file '{}' ({}) because the converted file was not saved. Manual cleanup may be required.",
                artifact.name, artifact.item_id
            );
            return false;
        }

        info!("Deleting temporary file '{}'", artifact.name);
        match self
            .store
            .delete_item(&artifact.drive_id, &artifact.item_id)
            .await
        {
            Ok(()) => {
                info!("Deleted temporary item {}", artifact.item_id);
                true
            }
            Err(e) => {
                warn!(
                    "Failed to delete temporary file '{}' ({}): {}. Manual cleanup may be required.",
                    artifact.name, artifact.item_id, e
                );
                false
            }
        }
    }
}
