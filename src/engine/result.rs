// ABOUTME: Workflow state and run report types
// ABOUTME: Records per-state timing, placeholder findings and the temporary item lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use super::error::ErrorCategory;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Authenticating,
    Locating,
    Fetching,
    Scanning,
    Substituting,
    Uploading,
    Converting,
    Saving,
    Cleaning,
    Done,
    Failed,
}

impl WorkflowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowState::Done | WorkflowState::Failed)
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowState::Authenticating => "Authenticating",
            WorkflowState::Locating => "Locating",
            WorkflowState::Fetching => "Fetching",
            WorkflowState::Scanning => "Scanning",
            WorkflowState::Substituting => "Substituting",
            WorkflowState::Uploading => "Uploading",
            WorkflowState::Converting => "Converting",
            WorkflowState::Saving => "Saving",
            WorkflowState::Cleaning => "Cleaning",
            WorkflowState::Done => "Done",
            WorkflowState::Failed => "Failed",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Running,
    Success,
    Warning,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
    pub state: WorkflowState,
    pub status: StageStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration: Option<Duration>,
    pub detail: Option<String>,
}

impl StageResult {
    pub fn started(state: WorkflowState) -> Self {
        Self {
            state,
            status: StageStatus::Running,
            started_at: Utc::now(),
            ended_at: None,
            duration: None,
            detail: None,
        }
    }

    pub fn mark_completed(&mut self, status: StageStatus, detail: Option<String>) {
        let now = Utc::now();
        self.status = status;
        self.ended_at = Some(now);
        self.duration = Some((now - self.started_at).to_std().unwrap_or(Duration::ZERO));
        self.detail = detail;
    }

    pub fn is_failed(&self) -> bool {
        self.status == StageStatus::Failed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowReport {
    pub run_id: String,
    pub template_path: String,
    pub output_path: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration: Option<Duration>,
    pub final_state: WorkflowState,
    pub failed_state: Option<WorkflowState>,
    pub stages: Vec<StageResult>,
    pub placeholders_found: Vec<String>,
    pub placeholders_undefined: Vec<String>,
    pub placeholders_removed: Vec<String>,
    pub temp_item_name: Option<String>,
    pub temp_item_id: Option<String>,
    pub temp_item_deleted: bool,
    pub converted_bytes: Option<usize>,
    pub error: Option<String>,
    pub error_category: Option<ErrorCategory>,
}

impl WorkflowReport {
    pub fn new(template_path: impl Into<String>, output_path: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            template_path: template_path.into(),
            output_path: output_path.into(),
            started_at: Utc::now(),
            ended_at: None,
            duration: None,
            final_state: WorkflowState::Authenticating,
            failed_state: None,
            stages: Vec::new(),
            placeholders_found: Vec::new(),
            placeholders_undefined: Vec::new(),
            placeholders_removed: Vec::new(),
            temp_item_name: None,
            temp_item_id: None,
            temp_item_deleted: false,
            converted_bytes: None,
            error: None,
            error_category: None,
        }
    }

    pub fn add_stage(&mut self, stage: StageResult) {
        if stage.is_failed() && self.failed_state.is_none() {
            self.failed_state = Some(stage.state);
        }
        self.stages.push(stage);
    }

    pub fn stage(&self, state: WorkflowState) -> Option<&StageResult> {
        self.stages.iter().find(|s| s.state == state)
    }

    pub fn reached(&self, state: WorkflowState) -> bool {
        self.stage(state).is_some()
    }

    pub fn mark_completed(&mut self, final_state: WorkflowState) {
        let now = Utc::now();
        self.final_state = final_state;
        self.ended_at = Some(now);
        self.duration = Some((now - self.started_at).to_std().unwrap_or(Duration::ZERO));
    }

    pub fn is_success(&self) -> bool {
        self.final_state == WorkflowState::Done
    }

    /// One line describing the outcome of the run.
    pub fn summary_line(&self) -> String {
        if self.is_success() {
            let mut line = format!(
                "Success: '{}' saved as '{}'",
                self.template_path, self.output_path
            );
            if !self.placeholders_undefined.is_empty() {
                line.push_str(&format!(
                    " ({} placeholder(s) left undefined)",
                    self.placeholders_undefined.len()
                ));
            }
            line
        } else {
            let state = self
                .failed_state
                .map(|s| s.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            format!(
                "Failed during {}: {}",
                state,
                self.error.as_deref().unwrap_or("unknown error")
            )
        }
    }
}
