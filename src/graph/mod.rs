// ABOUTME: Remote drive module: store abstraction, Graph HTTP client and wire models
// ABOUTME: The workflow depends only on the DriveStore trait re-exported here

pub mod client;
pub mod error;
pub mod models;
pub mod path;
pub mod store;

pub use client::{GraphClient, DEFAULT_GRAPH_URL};
pub use error::{GraphError, Result};
pub use models::{Drive, DriveItem, ItemReference, UserProfile};
pub use store::{DownloadBody, DriveStore};
