//! Check command implementation.

use anyhow::{Context, Result};
use oca_hooks_core::{
    ConfigFile, ConfigMerger, ConfigSource, ExitStatus, ModuleResolver, Outcome, Resolution,
    RuleDirectives, RunOptions, Scheduler,
};
use oca_hooks_rules::all_rules;
use std::path::{Path, PathBuf};

use crate::config_resolver::{self, ConfigLocation};
use crate::OutputFormat;

/// Arguments of one invocation.
pub struct CheckArgs<'a> {
    pub paths: &'a [PathBuf],
    pub enable: &'a [String],
    pub disable: &'a [String],
    pub config: Option<&'a Path>,
    pub list_msgs: bool,
    pub no_exit: bool,
    pub no_verbose: bool,
    pub format: OutputFormat,
}

/// Runs the checks (or lists messages) and returns the process result.
pub fn run(args: &CheckArgs<'_>) -> Result<ExitStatus> {
    let registry = all_rules();
    let current_dir = std::env::current_dir().context("Cannot read current directory")?;

    let location = config_resolver::resolve(&current_dir, args.config);
    let file_directives = load_file_directives(&location)?;

    let merged = ConfigMerger::new()
        .source(
            ConfigSource::CommandLine,
            RuleDirectives::new()
                .enable(args.enable)
                .disable(args.disable),
        )
        .source(ConfigSource::Environment, RuleDirectives::from_env())
        .source(ConfigSource::ConfigFile, file_directives)
        .merge(&registry);
    super::output::print_unknown(&merged.unknown);

    let mut scheduler = Scheduler::new(&registry, &merged.rules).options(RunOptions {
        list_msgs: args.list_msgs,
        force_success: args.no_exit,
    });

    let resolution = if args.list_msgs {
        Resolution::default()
    } else {
        ModuleResolver::default().resolve(args.paths)
    };

    let outcome = scheduler.run(&resolution);
    match &outcome {
        Outcome::Listed(descriptors) => super::list_msgs::print(descriptors),
        Outcome::Checked { report, .. } => {
            if !args.no_verbose {
                let base = current_dir
                    .canonicalize()
                    .unwrap_or_else(|_| current_dir.clone());
                super::output::print(report, &registry, args.format, &base)?;
            }
        }
    }

    Ok(outcome.status())
}

fn load_file_directives(location: &ConfigLocation) -> Result<RuleDirectives> {
    let Some(path) = location.path() else {
        return Ok(RuleDirectives::new());
    };
    match ConfigFile::from_file(path) {
        Ok(config) => {
            tracing::debug!("Using config: {}", path.display());
            Ok(config.directives())
        }
        Err(e) if location.is_explicit() => {
            Err(e).with_context(|| format!("Failed to load config: {}", path.display()))
        }
        Err(e) => {
            tracing::warn!("Ignoring config {}: {e}", path.display());
            Ok(RuleDirectives::new())
        }
    }
}
