// ABOUTME: Main library module for recoverlette
// ABOUTME: Exports the credential, drive, document, workflow and CLI modules

pub mod auth;
pub mod cli;
pub mod document;
pub mod engine;
pub mod graph;

// Re-export commonly used types
pub use cli::{App, Args, Config};
pub use document::{Definitions, PlaceholderSyntax, SubstitutionOptions, Substituter};
pub use engine::{Workflow, WorkflowError, WorkflowOptions, WorkflowReport, WorkflowRequest};
pub use graph::{DriveStore, GraphClient};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
