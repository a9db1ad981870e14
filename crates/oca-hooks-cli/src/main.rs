//! oca-hooks CLI tool.
//!
//! Usage:
//! ```bash
//! oca-hooks [OPTIONS] [PATHS]...
//! oca-hooks --list-msgs
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Module-aware checks for Odoo addon XML, CSV and PO files
#[derive(Parser)]
#[command(name = "oca-hooks")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Files, module directories or manifests to check
    #[arg(default_value = ".")]
    paths: Vec<PathBuf>,

    /// Only run these messages (comma-separated, repeatable)
    #[arg(short, long, value_name = "LIST")]
    enable: Vec<String>,

    /// Never run these messages (comma-separated, repeatable)
    #[arg(short, long, value_name = "LIST")]
    disable: Vec<String>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// List the active messages and exit
    #[arg(long)]
    list_msgs: bool,

    /// Exit successfully even when findings remain
    #[arg(long)]
    no_exit: bool,

    /// Do not print findings
    #[arg(long)]
    no_verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

/// Output format for findings.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with a summary line.
    #[default]
    Text,
    /// The run report as JSON.
    Json,
    /// One line per finding.
    Compact,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let status = commands::check::run(&commands::check::CheckArgs {
        paths: &cli.paths,
        enable: &cli.enable,
        disable: &cli.disable,
        config: cli.config.as_deref(),
        list_msgs: cli.list_msgs,
        no_exit: cli.no_exit,
        no_verbose: cli.no_verbose,
        format: cli.format,
    })?;

    Ok(ExitCode::from(u8::try_from(status.code()).unwrap_or(1)))
}
