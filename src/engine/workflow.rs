// ABOUTME: Recovery workflow orchestrator driving the state machine from authentication to cleanup
// ABOUTME: Any stage failure ends the run; the temporary copy is only removed after a local save

use std::path::PathBuf;

use tracing::{debug, error, info, warn};

use super::artifact::{temp_file_name, ArtifactManager, ConversionSettings, TemporaryArtifact};
use super::error::{Result, WorkflowError};
use super::fetcher::fetch_content;
use super::locator::locate;
use super::result::{StageResult, StageStatus, WorkflowReport, WorkflowState};
use crate::document::{
    scan_placeholders, Definitions, PlaceholderSyntax, SubstitutionOptions, Substituter,
};
use crate::graph::DriveStore;

#[derive(Debug, Clone)]
pub struct WorkflowRequest {
    pub template_path: String,
    pub output_path: PathBuf,
    pub definitions: Definitions,
}

#[derive(Debug, Clone, Default)]
pub struct WorkflowOptions {
    pub syntax: PlaceholderSyntax,
    pub substitution: SubstitutionOptions,
    pub conversion: ConversionSettings,
}

pub struct WorkflowRun {
    pub report: WorkflowReport,
    pub result: Result<()>,
}

pub struct Workflow<'a> {
    store: &'a dyn DriveStore,
    options: &'a WorkflowOptions,
}

impl<'a> Workflow<'a> {
    pub fn new(store: &'a dyn DriveStore, options: &'a WorkflowOptions) -> Self {
        Self { store, options }
    }

    pub async fn execute(&self, request: &WorkflowRequest) -> WorkflowRun {
        let mut report = WorkflowReport::new(
            request.template_path.clone(),
            request.output_path.display().to_string(),
        );
        let result = self.run(request, &mut report).await;
        WorkflowRun { report, result }
    }

    /// Drive every state in order, recording progress into `report`.
    ///
    /// The report stays usable if this future is dropped part-way through.
    pub async fn run(&self, request: &WorkflowRequest, report: &mut WorkflowReport) -> Result<()> {
        let mut temp: Option<TemporaryArtifact> = None;
        let mut saved = false;

        let result = self
            .run_stages(request, report, &mut temp, &mut saved)
            .await;

        if let Some(artifact) = temp.as_ref() {
            report.final_state = WorkflowState::Cleaning;
            let mut stage = StageResult::started(WorkflowState::Cleaning);
            let manager = ArtifactManager::new(self.store, &self.options.conversion);
            let deleted = manager.cleanup(artifact, saved).await;
            report.temp_item_deleted = deleted;

            let (status, detail) = match (saved, deleted) {
                (true, true) => (StageStatus::Success, "temporary item deleted"),
                (true, false) => (StageStatus::Warning, "temporary item could not be deleted"),
                (false, _) => (
                    StageStatus::Skipped,
                    "temporary item kept because the converted file was not saved",
                ),
            };
            stage.mark_completed(status, Some(detail.to_string()));
            report.add_stage(stage);
        }

        finish(report, &result);
        result
    }

    async fn run_stages(
        &self,
        request: &WorkflowRequest,
        report: &mut WorkflowReport,
        temp: &mut Option<TemporaryArtifact>,
        saved: &mut bool,
    ) -> Result<()> {
        let options = self.options;

        // Authenticating
        let stage = enter(report, WorkflowState::Authenticating);
        let user = self
            .store
            .current_user()
            .await
            .map_err(WorkflowError::Authentication);
        let user = record(report, stage, user, |user| {
            user.display_name
                .as_ref()
                .map(|name| format!("signed in as {}", name))
        })?;
        match user.display_name.as_deref() {
            Some(name) => info!("Authenticated as {}", name),
            None => info!("Authenticated"),
        }

        // Locating
        info!("Processing template file: {}", request.template_path);
        let stage = enter(report, WorkflowState::Locating);
        let located = locate(self.store, &request.template_path).await;
        let item = record(report, stage, located, |item| {
            Some(format!("item {} in folder {}", item.item_id, item.parent_id))
        })?;

        // Fetching
        let stage = enter(report, WorkflowState::Fetching);
        let fetched = fetch_content(self.store, &item).await;
        let content = record(report, stage, fetched, |bytes| {
            Some(format!("{} bytes", bytes.len()))
        })?;

        // Scanning
        let stage = enter(report, WorkflowState::Scanning);
        info!(
            "Scanning template for placeholders {}...",
            options.syntax.style().wrap("...")
        );
        let found = scan_placeholders(&content, &options.syntax);
        let plan = options.syntax.plan(&found, &request.definitions);
        report_plan(&options.syntax, &plan, &request.definitions);
        report.placeholders_found = plan.found.iter().cloned().collect();
        report.placeholders_undefined = plan.undefined.iter().cloned().collect();
        report.placeholders_removed = plan.removals.iter().cloned().collect();
        let detail = format!(
            "{} found, {} undefined, {} optional removed",
            plan.found.len(),
            plan.undefined.len(),
            plan.removals.len()
        );
        let status = if plan.undefined.is_empty() {
            StageStatus::Success
        } else {
            StageStatus::Warning
        };
        let mut stage = stage;
        stage.mark_completed(status, Some(detail));
        report.add_stage(stage);

        // Substituting
        let stage = enter(report, WorkflowState::Substituting);
        let substituted = Substituter::new(&options.syntax, &options.substitution)
            .apply(&content, &request.definitions, &plan.removals)
            .map_err(WorkflowError::from);
        let outcome = record(report, stage, substituted, |outcome| {
            Some(if outcome.unchanged {
                "content unchanged".to_string()
            } else {
                format!(
                    "{} replaced, {} removed, {} run(s) modified",
                    outcome.replaced, outcome.removed, outcome.modified_runs
                )
            })
        })?;

        // Uploading
        let manager = ArtifactManager::new(self.store, &options.conversion);
        let name = temp_file_name(&request.template_path);
        info!("Generated temporary filename: {}", name);
        report.temp_item_name = Some(name.clone());
        let stage = enter(report, WorkflowState::Uploading);
        let uploaded = manager.upload(&item, &name, outcome.content).await;
        let artifact = record(report, stage, uploaded, |artifact| {
            Some(format!("temporary item {}", artifact.item_id))
        })?;
        report.temp_item_id = Some(artifact.item_id.clone());
        let artifact = temp.insert(artifact);

        // Converting
        let stage = enter(report, WorkflowState::Converting);
        let converted = manager.convert(artifact).await;
        let bytes = record(report, stage, converted, |bytes| {
            Some(format!("{} bytes", bytes.len()))
        })?;
        report.converted_bytes = Some(bytes.len());

        // Saving
        let stage = enter(report, WorkflowState::Saving);
        let written = manager.save(artifact, &bytes, &request.output_path).await;
        record(report, stage, written, |_| {
            Some(request.output_path.display().to_string())
        })?;
        *saved = true;

        Ok(())
    }
}

fn enter(report: &mut WorkflowReport, state: WorkflowState) -> StageResult {
    debug!("Entering state {}", state);
    report.final_state = state;
    StageResult::started(state)
}

fn record<T>(
    report: &mut WorkflowReport,
    mut stage: StageResult,
    result: Result<T>,
    detail: impl FnOnce(&T) -> Option<String>,
) -> Result<T> {
    match &result {
        Ok(value) => stage.mark_completed(StageStatus::Success, detail(value)),
        Err(e) => {
            error!("{} failed: {}", stage.state, e);
            debug!("{} failure details: {:?}", stage.state, e);
            stage.mark_completed(StageStatus::Failed, Some(e.to_string()));
        }
    }
    report.add_stage(stage);
    result
}

fn report_plan(
    syntax: &PlaceholderSyntax,
    plan: &crate::document::PlaceholderPlan,
    definitions: &Definitions,
) {
    if plan.found.is_empty() {
        info!("No placeholders found in the template (or parsing failed).");
        return;
    }

    let keys: Vec<&str> = plan.found.iter().map(String::as_str).collect();
    info!("Found placeholders: {}", keys.join(", "));

    if plan.undefined.is_empty() {
        info!(
            "All found non-{} placeholders have definitions provided via -D.",
            syntax.optional_prefix()
        );
    } else {
        warn!("The following placeholders were found but not defined via -D:");
        for key in &plan.undefined {
            warn!("  - {}", syntax.style().wrap(key));
        }
        warn!("These placeholders will remain unchanged in the output.");
    }

    for key in &plan.removals {
        info!(
            "Optional placeholder {} is not defined and will be removed",
            syntax.style().wrap(key)
        );
    }

    for key in definitions.keys().filter(|key| !plan.found.contains(*key)) {
        debug!("Definition '{}' does not match any placeholder in the template", key);
    }
}

/// Close out the report with the run's outcome.
pub fn finish(report: &mut WorkflowReport, result: &Result<()>) {
    match result {
        Ok(()) => report.mark_completed(WorkflowState::Done),
        Err(e) => {
            if report.failed_state.is_none() {
                report.failed_state = Some(report.final_state);
            }
            report.error = Some(e.to_string());
            report.error_category = Some(e.category());
            report.mark_completed(WorkflowState::Failed);
        }
    }
}
