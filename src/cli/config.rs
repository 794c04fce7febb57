// ABOUTME: Configuration management for recoverlette
// ABOUTME: Loads an optional YAML file, merges RECOVERLETTE_* environment variables and validates

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::document::{DelimiterStyle, PlaceholderSyntax, SubstitutionOptions};
use crate::engine::{ConversionSettings, WorkflowError};
use crate::graph::DEFAULT_GRAPH_URL;

pub const DEFAULT_TENANT: &str = "consumers";
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub graph: GraphConfig,

    #[serde(default)]
    pub placeholders: PlaceholderConfig,

    #[serde(default)]
    pub substitution: SubstitutionOptions,

    #[serde(default)]
    pub conversion: ConversionSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub client_id: Option<String>,
    pub tenant_id: String,
    pub authority: String,
    pub scopes: Vec<String>,
    /// Pre-acquired bearer token; skips the device code sign-in.
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholderConfig {
    pub delimiter: DelimiterStyle,
    pub optional_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            tenant_id: DEFAULT_TENANT.to_string(),
            authority: DEFAULT_AUTHORITY.to_string(),
            scopes: vec!["Files.ReadWrite".to_string(), "User.Read".to_string()],
            access_token: None,
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GRAPH_URL.to_string(),
        }
    }
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        let syntax = PlaceholderSyntax::default();
        Self {
            delimiter: syntax.style(),
            optional_prefix: syntax.optional_prefix().to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl PlaceholderConfig {
    pub fn syntax(&self) -> PlaceholderSyntax {
        PlaceholderSyntax::new(self.delimiter, self.optional_prefix.clone())
    }
}

impl Config {
    /// Load configuration from file path or default locations
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p,
            None => Self::find_config_file(),
        };

        let mut config = if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            serde_yaml::from_str::<Config>(&contents)?
        } else {
            Config::default()
        };

        config.merge_env()?;
        Ok(config)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> PathBuf {
        let mut possible_paths = vec![
            PathBuf::from("recoverlette.yaml"),
            PathBuf::from("recoverlette.yml"),
            PathBuf::from(".recoverlette.yaml"),
            PathBuf::from(".recoverlette.yml"),
        ];

        if let Some(home_dir) = dirs::home_dir() {
            possible_paths.push(home_dir.join(".recoverlette").join("config.yaml"));
        }

        possible_paths
            .into_iter()
            .find(|path| path.exists())
            .unwrap_or_else(|| PathBuf::from("recoverlette.yaml"))
    }

    fn merge_env(&mut self) -> Result<()> {
        self.merge_env_from(|name| std::env::var(name).ok())
    }

    /// Merge `RECOVERLETTE_*` variables supplied by `lookup`; empty values are ignored.
    pub fn merge_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        // Authentication
        if let Some(client_id) = var("RECOVERLETTE_CLIENT_ID") {
            self.auth.client_id = Some(client_id);
        }
        if let Some(tenant_id) = var("RECOVERLETTE_TENANT_ID") {
            self.auth.tenant_id = tenant_id;
        }
        if let Some(authority) = var("RECOVERLETTE_AUTHORITY") {
            self.auth.authority = authority;
        }
        if let Some(token) = var("RECOVERLETTE_ACCESS_TOKEN") {
            self.auth.access_token = Some(token);
        }

        // Remote store
        if let Some(base_url) = var("RECOVERLETTE_GRAPH_URL") {
            self.graph.base_url = base_url;
        }
        if let Some(delay) = var("RECOVERLETTE_SETTLE_DELAY_SECS") {
            self.conversion.settle_delay_secs = delay.trim().parse()?;
        }

        // Logging configuration
        if let Some(level) = var("RECOVERLETTE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("RECOVERLETTE_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Settings that must be present before any network activity.
    pub fn validate(&self) -> std::result::Result<(), WorkflowError> {
        let has_client_id = self
            .auth
            .client_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty());
        if !has_client_id {
            return Err(WorkflowError::setup(
                "RECOVERLETTE_CLIENT_ID is not set (environment, .env file or auth.client_id in the config file)",
            ));
        }
        if self.auth.tenant_id.trim().is_empty() {
            return Err(WorkflowError::setup("tenant id is empty"));
        }
        if self.conversion.target_format.trim().is_empty() {
            return Err(WorkflowError::setup("conversion.target_format is empty"));
        }
        Ok(())
    }
}
