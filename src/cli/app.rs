// ABOUTME: Main application orchestration for the recoverlette CLI
// ABOUTME: Sets up logging and the drive session, runs the workflow and reports the outcome

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use super::{Args, Config};
use crate::auth::{mask_identifier, DeviceCodeCredential, StaticTokenCredential, TokenCredential};
use crate::document::ColorPolicy;
use crate::engine::{
    finish, Workflow, WorkflowError, WorkflowOptions, WorkflowReport, WorkflowRequest,
};
use crate::graph::GraphClient;

pub struct App {
    config: Config,
}

impl App {
    /// Create a new application instance
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Initialize logging based on configuration
    pub fn init_logging(&self, verbose: bool, no_color: bool) -> Result<()> {
        let log_level = if verbose {
            "debug"
        } else {
            &self.config.logging.level
        };

        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

        match self.config.logging.format.as_str() {
            "compact" => {
                tracing_subscriber::fmt()
                    .compact()
                    .with_env_filter(env_filter)
                    .with_ansi(!no_color)
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .init();
            }
            _ => {
                tracing_subscriber::fmt()
                    .with_env_filter(env_filter)
                    .with_ansi(!no_color)
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .init();
            }
        }

        debug!("Logging initialized with level: {}", log_level);
        Ok(())
    }

    /// Workflow options from the configuration with the command line flags applied.
    pub fn workflow_options(&self, args: &Args) -> WorkflowOptions {
        let mut substitution = self.config.substitution.clone();

        if args.preserve_color && args.force_all_black {
            warn!("Both --preserve-color and --force-all-black given; forcing all text to the neutral colour");
        }
        substitution.color_policy = ColorPolicy::from_flags(
            args.preserve_color,
            args.force_all_black,
            substitution.color_policy,
        );
        if let Some(strategy) = args.strategy {
            substitution.strategy = strategy;
        }

        WorkflowOptions {
            syntax: self.config.placeholders.syntax(),
            substitution,
            conversion: self.config.conversion.clone(),
        }
    }

    fn credential(&self) -> Arc<dyn TokenCredential> {
        let auth = &self.config.auth;
        match auth.access_token.as_deref() {
            Some(token) => {
                info!("Using access token from RECOVERLETTE_ACCESS_TOKEN");
                Arc::new(StaticTokenCredential::new(token))
            }
            None => Arc::new(DeviceCodeCredential::new(
                auth.authority.clone(),
                auth.tenant_id.clone(),
                auth.client_id.clone().unwrap_or_default(),
                auth.scopes.clone(),
            )),
        }
    }

    /// Run the application with parsed arguments.
    ///
    /// Setup problems are returned as errors before any network call; once
    /// the workflow starts, its outcome is carried by the returned report.
    pub async fn run(&mut self, args: Args) -> Result<WorkflowReport> {
        self.init_logging(args.verbose, args.no_color)?;

        info!("Starting recoverlette v{}", env!("CARGO_PKG_VERSION"));
        debug!("Configuration loaded from: {:?}", args.config);

        self.config.validate()?;
        let client_id = self.config.auth.client_id.as_deref().unwrap_or_default();
        info!(
            "Client id: {}, tenant: {}",
            mask_identifier(client_id),
            self.config.auth.tenant_id
        );

        let definitions = Args::parse_definitions(&args.definitions)?;
        debug!("{} definition(s) provided", definitions.len());

        prepare_output(&args.output)?;

        let options = self.workflow_options(&args);
        let client = GraphClient::new(self.config.graph.base_url.clone(), self.credential())
            .context("Failed to create the Graph client")?;
        let workflow = Workflow::new(&client, &options);

        let request = WorkflowRequest {
            template_path: args.input.clone(),
            output_path: args.output.clone(),
            definitions,
        };
        let mut report = WorkflowReport::new(
            request.template_path.clone(),
            request.output_path.display().to_string(),
        );

        let result = tokio::select! {
            result = workflow.run(&request, &mut report) => result,
            _ = tokio::signal::ctrl_c() => Err(WorkflowError::Interrupted),
        };
        if let Err(WorkflowError::Interrupted) = &result {
            warn!("Operation cancelled by user.");
            finish(&mut report, &result);
            if let Some(temp_id) = report.temp_item_id.as_deref() {
                warn!(
                    "Temporary item {} may remain in the drive. Manual cleanup may be required.",
                    temp_id
                );
            }
        }

        if let Some(report_path) = args.report.as_deref() {
            write_report(&report, report_path);
        }

        if report.is_success() {
            println!("{}", report.summary_line());
        } else {
            eprintln!("{}", report.summary_line());
        }

        Ok(report)
    }
}

/// Warn about a non-PDF output name and make sure the output directory exists.
fn prepare_output(output: &Path) -> Result<()> {
    let is_pdf = output
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if !is_pdf {
        warn!("Output file '{}' does not end with .pdf", output.display());
    }

    if let Some(dir) = output.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        if !dir.exists() {
            std::fs::create_dir_all(dir).map_err(|e| {
                WorkflowError::setup(format!(
                    "Could not create output directory '{}': {}",
                    dir.display(),
                    e
                ))
            })?;
            info!("Created output directory: {}", dir.display());
        }
    }
    Ok(())
}

fn write_report(report: &WorkflowReport, path: &Path) {
    let written = serde_json::to_string_pretty(report)
        .map_err(anyhow::Error::from)
        .and_then(|json| std::fs::write(path, json).map_err(anyhow::Error::from));
    match written {
        Ok(()) => info!("Run report written to {}", path.display()),
        Err(e) => warn!("Failed to write run report to {}: {}", path.display(), e),
    }
}
