// ABOUTME: CLI module for recoverlette
// ABOUTME: Exports command line arguments, configuration and the application runner

pub mod app;
pub mod args;
pub mod config;

pub use app::App;
pub use args::Args;
pub use config::Config;
