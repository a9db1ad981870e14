//! Configuration sources and the merge into one effective rule set.
//!
//! Three sources can enable or disable rules, in fixed priority order:
//!
//! 1. command-line flags
//! 2. environment variables (`OCA_HOOKS_ENABLE`, `OCA_HOOKS_DISABLE`)
//! 3. configuration file (`[MESSAGES_CONTROL]` section)
//!
//! The enable list and the disable list are each taken whole from the
//! highest-priority source that specifies a non-empty one. Lists are never
//! unioned across sources, so a command-line `--disable` fully eclipses a
//! committed configuration file. Identifiers no rule answers to are returned
//! in [`MergeOutcome::unknown`] for the caller to report.

use crate::registry::RuleRegistry;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable holding a comma-separated enable list.
pub const ENABLE_ENV_VAR: &str = "OCA_HOOKS_ENABLE";

/// Environment variable holding a comma-separated disable list.
pub const DISABLE_ENV_VAR: &str = "OCA_HOOKS_DISABLE";

/// File name searched for when no explicit config path is given.
pub const CONFIG_FILE_NAME: &str = ".oca_hooks.toml";

/// Where a set of directives came from. Variants are ordered by priority,
/// highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigSource {
    /// `--enable` / `--disable` flags.
    CommandLine,
    /// `OCA_HOOKS_ENABLE` / `OCA_HOOKS_DISABLE`.
    Environment,
    /// The configuration file.
    ConfigFile,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CommandLine => write!(f, "command line"),
            Self::Environment => write!(f, "environment"),
            Self::ConfigFile => write!(f, "configuration file"),
        }
    }
}

/// Splits a comma-separated list, trimming entries and dropping empty ones.
#[must_use]
pub fn parse_csv(list: &str) -> BTreeSet<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Enable and disable lists read from one source. An empty list means the
/// source does not specify that list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleDirectives {
    /// Identifiers to enable exclusively.
    pub enable: BTreeSet<String>,
    /// Identifiers to disable.
    pub disable: BTreeSet<String>,
}

impl RuleDirectives {
    /// Creates directives that specify nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds identifiers to the enable list.
    #[must_use]
    pub fn enable<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.enable.extend(
            ids.into_iter()
                .flat_map(|s| parse_csv(s.as_ref()).into_iter()),
        );
        self
    }

    /// Adds identifiers to the disable list.
    #[must_use]
    pub fn disable<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.disable.extend(
            ids.into_iter()
                .flat_map(|s| parse_csv(s.as_ref()).into_iter()),
        );
        self
    }

    /// Returns true if neither list is specified.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.enable.is_empty() && self.disable.is_empty()
    }

    /// Reads directives from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Reads directives through `lookup`, which stands in for the environment.
    #[must_use]
    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            enable: lookup(ENABLE_ENV_VAR)
                .map(|v| parse_csv(&v))
                .unwrap_or_default(),
            disable: lookup(DISABLE_ENV_VAR)
                .map(|v| parse_csv(&v))
                .unwrap_or_default(),
        }
    }
}

/// A rule list written either as `"a, b"` or as `["a", "b"]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RuleList {
    Csv(String),
    Items(Vec<String>),
}

impl RuleList {
    fn into_set(self) -> BTreeSet<String> {
        match self {
            Self::Csv(s) => parse_csv(&s),
            Self::Items(items) => items.iter().flat_map(|s| parse_csv(s)).collect(),
        }
    }
}

/// The `[MESSAGES_CONTROL]` section.
#[derive(Debug, Clone, Default, Deserialize)]
struct MessagesControl {
    #[serde(default)]
    enable: Option<RuleList>,
    #[serde(default)]
    disable: Option<RuleList>,
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(rename = "MESSAGES_CONTROL", default)]
    messages_control: Option<MessagesControl>,
}

impl ConfigFile {
    /// Loads a configuration file from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Extracts the enable/disable directives.
    #[must_use]
    pub fn directives(&self) -> RuleDirectives {
        let Some(section) = self.messages_control.clone() else {
            return RuleDirectives::new();
        };
        RuleDirectives {
            enable: section.enable.map(RuleList::into_set).unwrap_or_default(),
            disable: section.disable.map(RuleList::into_set).unwrap_or_default(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },
}

/// An identifier named by configuration that no rule answers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRule {
    /// The unknown identifier.
    pub id: String,
    /// Source that named it.
    pub source: ConfigSource,
}

/// Identifiers permitted to run in this invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectiveRuleSet {
    active: BTreeSet<String>,
}

impl EffectiveRuleSet {
    /// Every identifier the registry knows.
    #[must_use]
    pub fn all(registry: &RuleRegistry) -> Self {
        Self {
            active: registry.ids().map(String::from).collect(),
        }
    }

    /// Returns true if `id` may run and be reported.
    #[must_use]
    pub fn is_active(&self, id: &str) -> bool {
        self.active.contains(id)
    }

    /// Iterates over active identifiers in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.active.iter().map(String::as_str)
    }

    /// Returns the number of active identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Returns true if nothing is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

/// Result of merging configuration sources.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// The effective rule set.
    pub rules: EffectiveRuleSet,
    /// Source whose enable list was used, if any.
    pub enable_from: Option<ConfigSource>,
    /// Source whose disable list was used, if any.
    pub disable_from: Option<ConfigSource>,
    /// Identifiers named by some source but unknown to the registry.
    pub unknown: Vec<UnknownRule>,
}

/// Collects the directives of each source and merges them.
#[derive(Debug, Clone, Default)]
pub struct ConfigMerger {
    sources: BTreeMap<ConfigSource, RuleDirectives>,
}

impl ConfigMerger {
    /// Creates a merger with no sources.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the directives read from `source`.
    ///
    /// Each source is read once per invocation; recording it again replaces
    /// the earlier directives.
    #[must_use]
    pub fn source(mut self, source: ConfigSource, directives: RuleDirectives) -> Self {
        if self.sources.insert(source, directives).is_some() {
            warn!("Configuration source '{source}' recorded twice, keeping the last");
        }
        self
    }

    /// Merges the recorded sources against `registry`.
    ///
    /// An identifier is active iff it is registered, it is not in the chosen
    /// disable list, and either no enable list is chosen or it is in it.
    /// The result does not depend on the order sources were recorded in.
    #[must_use]
    pub fn merge(&self, registry: &RuleRegistry) -> MergeOutcome {
        // BTreeMap iterates in priority order.
        let enable = self
            .sources
            .iter()
            .find(|(_, d)| !d.enable.is_empty())
            .map(|(s, d)| (*s, &d.enable));
        let disable = self
            .sources
            .iter()
            .find(|(_, d)| !d.disable.is_empty())
            .map(|(s, d)| (*s, &d.disable));

        if let Some((source, ids)) = enable {
            debug!("Enable list from {source}: {ids:?}");
        }
        if let Some((source, ids)) = disable {
            debug!("Disable list from {source}: {ids:?}");
        }

        let active = registry
            .ids()
            .filter(|id| !disable.is_some_and(|(_, ids)| ids.contains(*id)))
            .filter(|id| enable.map_or(true, |(_, ids)| ids.contains(*id)))
            .map(String::from)
            .collect();

        let mut unknown = Vec::new();
        for (source, directives) in &self.sources {
            for id in directives.enable.union(&directives.disable) {
                if !registry.contains(id) {
                    debug!("Unknown rule '{id}' in {source} configuration");
                    unknown.push(UnknownRule {
                        id: id.clone(),
                        source: *source,
                    });
                }
            }
        }

        MergeOutcome {
            rules: EffectiveRuleSet { active },
            enable_from: enable.map(|(s, _)| s),
            disable_from: disable.map(|(s, _)| s),
            unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{INTERNAL_ERROR, MANIFEST_SYNTAX_ERROR, PATH_NOT_FOUND};

    fn registry() -> RuleRegistry {
        RuleRegistry::new()
    }

    #[test]
    fn parse_csv_trims_and_drops_empty() {
        let set = parse_csv(" a, b ,,c ,");
        assert_eq!(set.len(), 3);
        assert!(set.contains("a") && set.contains("b") && set.contains("c"));
        assert!(parse_csv(" , ").is_empty());
    }

    #[test]
    fn no_sources_activates_everything() {
        let outcome = ConfigMerger::new().merge(&registry());
        assert_eq!(outcome.rules, EffectiveRuleSet::all(&registry()));
        assert!(outcome.enable_from.is_none());
        assert!(outcome.disable_from.is_none());
    }

    #[test]
    fn highest_priority_disable_list_wins_outright() {
        let outcome = ConfigMerger::new()
            .source(
                ConfigSource::ConfigFile,
                RuleDirectives::new().disable([INTERNAL_ERROR]),
            )
            .source(
                ConfigSource::Environment,
                RuleDirectives::new().disable([PATH_NOT_FOUND]),
            )
            .source(
                ConfigSource::CommandLine,
                RuleDirectives::new().disable([MANIFEST_SYNTAX_ERROR]),
            )
            .merge(&registry());

        assert_eq!(outcome.disable_from, Some(ConfigSource::CommandLine));
        assert!(!outcome.rules.is_active(MANIFEST_SYNTAX_ERROR));
        assert!(outcome.rules.is_active(PATH_NOT_FOUND));
        assert!(outcome.rules.is_active(INTERNAL_ERROR));
    }

    #[test]
    fn enable_and_disable_are_chosen_independently() {
        let outcome = ConfigMerger::new()
            .source(
                ConfigSource::CommandLine,
                RuleDirectives::new().enable([MANIFEST_SYNTAX_ERROR, PATH_NOT_FOUND]),
            )
            .source(
                ConfigSource::Environment,
                RuleDirectives::new().disable([PATH_NOT_FOUND]),
            )
            .merge(&registry());

        assert_eq!(outcome.enable_from, Some(ConfigSource::CommandLine));
        assert_eq!(outcome.disable_from, Some(ConfigSource::Environment));
        let active: Vec<_> = outcome.rules.iter().collect();
        assert_eq!(active, vec![MANIFEST_SYNTAX_ERROR]);
    }

    #[test]
    fn disable_beats_enable_for_same_id() {
        let outcome = ConfigMerger::new()
            .source(
                ConfigSource::CommandLine,
                RuleDirectives::new()
                    .enable([MANIFEST_SYNTAX_ERROR])
                    .disable([MANIFEST_SYNTAX_ERROR]),
            )
            .merge(&registry());
        assert!(outcome.rules.is_empty());
    }

    #[test]
    fn merge_ignores_recording_order() {
        let a = ConfigMerger::new()
            .source(
                ConfigSource::ConfigFile,
                RuleDirectives::new().enable([PATH_NOT_FOUND]),
            )
            .source(
                ConfigSource::Environment,
                RuleDirectives::new().enable([INTERNAL_ERROR]),
            )
            .merge(&registry());
        let b = ConfigMerger::new()
            .source(
                ConfigSource::Environment,
                RuleDirectives::new().enable([INTERNAL_ERROR]),
            )
            .source(
                ConfigSource::ConfigFile,
                RuleDirectives::new().enable([PATH_NOT_FOUND]),
            )
            .merge(&registry());
        assert_eq!(a.rules, b.rules);
        assert_eq!(a.rules.iter().collect::<Vec<_>>(), vec![INTERNAL_ERROR]);
    }

    #[test]
    fn unknown_ids_are_reported_not_fatal() {
        let outcome = ConfigMerger::new()
            .source(
                ConfigSource::CommandLine,
                RuleDirectives::new().enable(["no-such-rule", INTERNAL_ERROR]),
            )
            .merge(&registry());
        assert_eq!(
            outcome.unknown,
            vec![UnknownRule {
                id: "no-such-rule".to_string(),
                source: ConfigSource::CommandLine,
            }]
        );
        assert_eq!(outcome.rules.iter().collect::<Vec<_>>(), vec![INTERNAL_ERROR]);
    }

    #[test]
    fn env_lookup_reads_both_lists() {
        let directives = RuleDirectives::from_env_with(|key| match key {
            ENABLE_ENV_VAR => Some("a,b".to_string()),
            DISABLE_ENV_VAR => Some(" ".to_string()),
            _ => None,
        });
        assert_eq!(directives.enable.len(), 2);
        assert!(directives.disable.is_empty());
    }

    #[test]
    fn config_file_accepts_string_and_array() {
        let config = ConfigFile::parse(
            r#"
[MESSAGES_CONTROL]
enable = "xml-syntax-error, csv-syntax-error"
disable = ["po-requires-module"]
"#,
        )
        .expect("valid config");
        let directives = config.directives();
        assert_eq!(directives.enable.len(), 2);
        assert!(directives.disable.contains("po-requires-module"));
    }

    #[test]
    fn config_file_without_section_specifies_nothing() {
        let config = ConfigFile::parse("[other]\nkey = 1\n").expect("valid config");
        assert!(config.directives().is_empty());
    }

    #[test]
    fn config_file_parse_error() {
        let err = ConfigFile::parse("[MESSAGES_CONTROL\nenable=").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
