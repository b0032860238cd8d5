//! CLI surface: audit a list of requirement lines against a rule bundle.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "depaudit",
    about = "Audit package requirements against a precomputed vulnerability rule bundle",
    version,
    long_about = None
)]
pub struct Cli {
    /// Requirement lines to audit: bare specifiers (`name>=1.0,<2.0`),
    /// `-r <path>`, or `-r path` to recursively include a requirements file.
    #[arg(value_name = "REQUIREMENT")]
    pub requirements: Vec<String>,

    /// Path to the rule bundle (zipped JSON). Falls back to the
    /// `DEPAUDIT_BUNDLE` environment variable, then a default path under
    /// the platform data directory.
    #[arg(long, value_name = "PATH")]
    pub bundle: Option<PathBuf>,

    /// Output format for machine readability.
    #[arg(long, default_value_t = OutputFormat::Text, value_enum)]
    pub format: OutputFormat,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
