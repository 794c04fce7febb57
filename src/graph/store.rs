// ABOUTME: Remote drive abstraction the workflow runs against
// ABOUTME: Path and id addressed item lookup, content transfer, conversion and deletion

use async_trait::async_trait;
use futures::stream::BoxStream;

use super::error::Result;
use super::models::{Drive, DriveItem, UserProfile};

/// Item content as delivered by the store.
pub enum DownloadBody {
    Buffered(Vec<u8>),
    Streamed(BoxStream<'static, Result<Vec<u8>>>),
}

impl std::fmt::Debug for DownloadBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DownloadBody::Buffered(bytes) => write!(f, "Buffered({} bytes)", bytes.len()),
            DownloadBody::Streamed(_) => write!(f, "Streamed"),
        }
    }
}

#[async_trait]
pub trait DriveStore: Send + Sync {
    /// Signed-in user; doubles as the authentication check.
    async fn current_user(&self) -> Result<UserProfile>;

    async fn default_drive(&self) -> Result<Drive>;

    /// Resolve an item by its path relative to the drive root.
    async fn item_by_path(&self, drive_id: &str, path: &str) -> Result<DriveItem>;

    async fn root_item(&self, drive_id: &str) -> Result<DriveItem>;

    async fn download_content(&self, drive_id: &str, item_id: &str) -> Result<DownloadBody>;

    /// Create or replace `file_name` inside the folder `parent_id`.
    async fn upload_content(
        &self,
        drive_id: &str,
        parent_id: &str,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<DriveItem>;

    /// Item content converted server-side to `format` (e.g. `pdf`).
    async fn download_converted(&self, drive_id: &str, item_id: &str, format: &str)
        -> Result<Vec<u8>>;

    async fn delete_item(&self, drive_id: &str, item_id: &str) -> Result<()>;
}
