// ABOUTME: Resolves a drive path into the drive, item and parent folder identifiers
// ABOUTME: Falls back to the drive root when the service omits the parent reference

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::error::{Result, WorkflowError};
use crate::graph::path::path_based_id;
use crate::graph::{DriveStore, GraphError};

/// Identifiers every later remote operation is addressed by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedItem {
    pub drive_id: String,
    pub item_id: String,
    pub parent_id: String,
}

pub async fn locate(store: &dyn DriveStore, path: &str) -> Result<ResolvedItem> {
    info!("Locating '{}'", path);

    let drive = store
        .default_drive()
        .await
        .map_err(|e| locate_failure(path, e))?;
    let drive_id = drive
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| WorkflowError::ItemIncomplete {
            path: path.to_string(),
            message: "default drive has no id".to_string(),
        })?;
    debug!("Default drive id: {}", drive_id);

    let item = store
        .item_by_path(&drive_id, path)
        .await
        .map_err(|e| locate_failure(path, e))?;
    let item_id = item
        .id
        .clone()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| WorkflowError::ItemIncomplete {
            path: path.to_string(),
            message: "item has no id".to_string(),
        })?;

    let parent_id = match item.parent_id() {
        Some(parent_id) => parent_id.to_string(),
        None => {
            debug!("No parent reference for item {}, checking drive root", item_id);
            let root = store
                .root_item(&drive_id)
                .await
                .map_err(|e| locate_failure(path, e))?;
            let root_id = root
                .id
                .filter(|id| !id.is_empty())
                .ok_or_else(|| WorkflowError::ItemIncomplete {
                    path: path.to_string(),
                    message: "no parent reference and the drive root has no id".to_string(),
                })?;

            if root_id == item_id {
                info!("'{}' is the drive root; using its own id as parent", path);
            } else {
                warn!(
                    "Item {} has no parent reference but is not the drive root; using root {} as parent",
                    item_id, root_id
                );
            }
            root_id
        }
    };

    info!("Found item {} (parent {})", item_id, parent_id);
    Ok(ResolvedItem {
        drive_id,
        item_id,
        parent_id,
    })
}

fn locate_failure(path: &str, source: GraphError) -> WorkflowError {
    if source.is_not_found() {
        error!(
            "Item not found at '{}' (requested as {}). Check the path and its capitalisation.",
            path,
            path_based_id(path)
        );
    } else if source.is_invalid_request() {
        error!(
            "The service rejected the request for '{}'; the path may be malformed",
            path
        );
    }
    debug!("Locate failure details: {:?}", source);

    WorkflowError::Locate {
        path: path.to_string(),
        source,
    }
}
