// ABOUTME: Recovery workflow engine: locate, fetch, temporary artifact lifecycle and orchestration
// ABOUTME: Runs against any DriveStore and produces a serialisable run report

pub mod artifact;
pub mod error;
pub mod fetcher;
pub mod locator;
pub mod result;
pub mod workflow;

pub use artifact::{temp_file_name, ArtifactManager, ConversionSettings, TemporaryArtifact};
pub use error::{ErrorCategory, Result, WorkflowError};
pub use fetcher::fetch_content;
pub use locator::{locate, ResolvedItem};
pub use result::{StageResult, StageStatus, WorkflowReport, WorkflowState};
pub use workflow::{finish, Workflow, WorkflowOptions, WorkflowRequest, WorkflowRun};
