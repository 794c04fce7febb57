// ABOUTME: Command line argument definitions and parsing using Clap
// ABOUTME: Template path, output path, placeholder definitions and substitution flags

use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::document::{Definitions, SubstitutionStrategy};

#[derive(Parser, Debug)]
#[command(name = "recoverlette")]
#[command(
    about = "Fill a Word template stored in OneDrive with placeholder values and save it as a local PDF"
)]
#[command(version)]
pub struct Args {
    #[arg(
        short,
        long,
        value_name = "REMOTE_PATH",
        help = "Path of the .docx template relative to the OneDrive root (e.g. 'Documents/Templates/Letter.docx')"
    )]
    pub input: String,

    #[arg(
        short,
        long,
        value_name = "LOCAL_PATH",
        help = "Local path for the generated PDF (e.g. 'output/letter.pdf')"
    )]
    pub output: PathBuf,

    #[arg(
        short = 'D',
        long = "define",
        value_name = "KEY=VALUE",
        num_args = 1..,
        action = ArgAction::Append,
        help = "Placeholder replacement; {{KEY}} in the template becomes VALUE. Repeatable, and one -D accepts several pairs"
    )]
    pub definitions: Vec<String>,

    #[arg(short, long, help = "Enable verbose (debug level) logging")]
    pub verbose: bool,

    #[arg(long, help = "Keep the original colour of runs that receive replaced text")]
    pub preserve_color: bool,

    #[arg(
        long = "force-all-black",
        help = "Force every run in the document to the neutral colour (wins over --preserve-color)"
    )]
    pub force_all_black: bool,

    #[arg(long, value_name = "paragraph|run", help = "Where replaced text is written back")]
    pub strategy: Option<SubstitutionStrategy>,

    #[arg(short, long, help = "Path to configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, value_name = "FILE", help = "Write a JSON report of the run to FILE")]
    pub report: Option<PathBuf>,

    #[arg(long, help = "Disable colored output")]
    pub no_color: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Build the definition map from `KEY=VALUE` pairs; key and value are
    /// trimmed and the last value given for a key wins.
    pub fn parse_definitions(pairs: &[String]) -> anyhow::Result<Definitions> {
        let mut definitions = Definitions::new();

        for pair in pairs {
            let Some((key, value)) = pair.split_once('=') else {
                return Err(anyhow::anyhow!(
                    "Invalid definition format '{}'. Expected 'KEY=VALUE'",
                    pair
                ));
            };

            let key = key.trim();
            if key.is_empty() {
                return Err(anyhow::anyhow!(
                    "Invalid definition '{}': the key is empty",
                    pair
                ));
            }
            definitions.insert(key, value.trim());
        }

        Ok(definitions)
    }
}
