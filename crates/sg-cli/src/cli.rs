//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// sqlguard - check SQL templates in application code against declared tables
#[derive(Parser, Debug)]
#[command(name = "sqlguard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(
        short = 'p',
        long,
        global = true,
        default_value = ".",
        env = "SQLGUARD_PROJECT_DIR"
    )]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check SQL templates against the declared tables
    Check(CheckArgs),

    /// List declared tables and their columns
    Tables(TablesArgs),
}

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Manifest files or directories (default: config `manifest_paths`)
    pub paths: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Minimum severity of printed diagnostics
    #[arg(short, long, value_enum, default_value = "info")]
    pub severity: SeverityFilter,
}

/// Arguments for the tables command
#[derive(Args, Debug)]
pub struct TablesArgs {
    /// Manifest files or directories (default: config `manifest_paths`)
    pub paths: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output
    Text,
    /// JSON output
    Json,
}

/// Minimum diagnostic severity to print
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityFilter {
    Info,
    Warning,
    Error,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
