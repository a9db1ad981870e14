//! # oca-hooks-core
//!
//! Module-aware lint orchestration for Odoo addons.
//!
//! This crate decides which files a check sees and which checks run. It
//! includes:
//!
//! - [`ModuleResolver`] expanding path arguments into module and file targets
//! - [`ConfigMerger`] merging command-line, environment and file directives
//! - [`RuleRegistry`] holding [`IndependentRule`] and [`DependentRule`]
//!   routines
//! - [`Scheduler`] driving the run lifecycle
//! - [`SuppressionEngine`] applying in-file `oca-hooks:disable=` directives
//! - [`MessageCollector`] and [`ExitStatus`] for the final result
//!
//! ## Example
//!
//! ```ignore
//! use oca_hooks_core::{ConfigMerger, ModuleResolver, RuleRegistry, Scheduler};
//!
//! let registry = RuleRegistry::new().with(my_rule());
//! let merged = ConfigMerger::new().merge(&registry);
//! let resolution = ModuleResolver::default().resolve(&["addons/sale_extra"]);
//!
//! let outcome = Scheduler::new(&registry, &merged.rules).run(&resolution);
//! std::process::exit(outcome.status().code());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod collector;
mod config;
mod context;
mod manifest;
mod registry;
mod resolver;
mod rule;
mod scheduler;
mod suppression;
mod text;
mod types;

/// Literal-only parser for manifest files.
pub mod literal;

pub use collector::{CollectorError, ExitStatus, MessageCollector};
pub use config::{
    parse_csv, ConfigError, ConfigFile, ConfigMerger, ConfigSource, EffectiveRuleSet,
    MergeOutcome, RuleDirectives, UnknownRule, CONFIG_FILE_NAME, DISABLE_ENV_VAR, ENABLE_ENV_VAR,
};
pub use context::{Document, Emitter, FileContext, ModuleContext};
pub use manifest::{DataEntry, Manifest, ManifestError, DATA_KEYS, MANIFEST_NAMES};
pub use registry::{
    RuleRegistry, FILE_UNREADABLE, INTERNAL_ERROR, MANIFEST_SYNTAX_ERROR, PATH_NOT_FOUND,
};
pub use resolver::{
    FileTarget, Module, ModuleFile, ModuleResolver, ModuleTarget, Resolution, ResolvedTarget,
    ResolverOptions,
};
pub use rule::{
    DependentRule, ExecutionMode, FileType, IndependentRule, Routine, RuleDescriptor, RuleError,
};
pub use scheduler::{Outcome, Phase, RunOptions, Scheduler};
pub use suppression::{SuppressionDirective, SuppressionEngine, DIRECTIVE_PREFIX};
pub use text::{decode_source, read_source, SourceError};
pub use types::{render_message, Finding, Location, RunReport};
