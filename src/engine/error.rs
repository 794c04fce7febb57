// ABOUTME: Error types for the recovery workflow stages
// ABOUTME: Each stage failure maps onto a fatal, partial or interrupted category

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::DocumentError;
use crate::graph::GraphError;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Setup error: {message}")]
    Setup { message: String },

    #[error("Authentication failed: {0}")]
    Authentication(#[source] GraphError),

    #[error("Could not locate '{path}': {source}")]
    Locate {
        path: String,
        #[source]
        source: GraphError,
    },

    #[error("Incomplete item details for '{path}': {message}")]
    ItemIncomplete { path: String, message: String },

    #[error("Failed to download template content: {0}")]
    Fetch(#[source] GraphError),

    #[error("Placeholder substitution failed: {0}")]
    Substitution(#[from] DocumentError),

    #[error("Failed to upload temporary file '{name}': {source}")]
    Upload {
        name: String,
        #[source]
        source: GraphError,
    },

    #[error("PDF conversion failed for temporary item {item_id}: {message}")]
    Conversion { item_id: String, message: String },

    #[error("Failed to save '{}': {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        temp_item_id: String,
    },

    #[error("Interrupted by user")]
    Interrupted,
}

/// How a failure is treated by the run as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration or local environment problem, before any network call.
    FatalSetup,
    FatalRemote,
    FatalProcessing,
    /// Converted output exists remotely but was not saved locally.
    PartialFailure,
    Interrupted,
}

impl WorkflowError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            WorkflowError::Setup { .. } => ErrorCategory::FatalSetup,
            WorkflowError::Authentication(_)
            | WorkflowError::Locate { .. }
            | WorkflowError::ItemIncomplete { .. }
            | WorkflowError::Fetch(_)
            | WorkflowError::Upload { .. }
            | WorkflowError::Conversion { .. } => ErrorCategory::FatalRemote,
            WorkflowError::Substitution(_) => ErrorCategory::FatalProcessing,
            WorkflowError::Save { .. } => ErrorCategory::PartialFailure,
            WorkflowError::Interrupted => ErrorCategory::Interrupted,
        }
    }

    pub fn setup(message: impl Into<String>) -> Self {
        WorkflowError::Setup {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WorkflowError>;
