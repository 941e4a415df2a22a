//! Configuration system for the linter
//!
//! Reads configuration from, in priority order:
//! - `suitelint.toml`
//! - `.suitelint.yaml` / `.suitelint.yml`
//! - `pyproject.toml` (`[tool.suitelint]` section only)
//!
//! An explicit `--config` file may also be JSON.

use crate::diagnostic::Severity;
use crate::files::FileFilters;
use crate::matcher::RuleSelection;
use crate::rule::{Version, DEFAULT_TARGET_VERSION};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Recognised configuration file names, highest priority first
pub const CONFIG_NAMES: [&str; 4] = [
    "suitelint.toml",
    ".suitelint.yaml",
    ".suitelint.yml",
    "pyproject.toml",
];

/// Section of `pyproject.toml` holding our settings (`[tool.suitelint]`)
pub const PYPROJECT_SECTION: &str = "suitelint";

/// Default format of a printed issue
pub const DEFAULT_ISSUE_FORMAT: &str = "{source}:{line}:{col} [{severity}] {rule_id} {desc} ({name})";

pub const DEFAULT_INCLUDE: [&str; 2] = ["*.robot", "*.resource"];

pub const DEFAULT_EXCLUDE: [&str; 9] = [
    ".direnv", ".eggs", ".git", ".hg", ".nox", ".tox", ".venv", "venv", ".svn",
];

const TOP_LEVEL_KEYS: [&str; 8] = [
    "sources",
    "language",
    "exit_zero",
    "include",
    "exclude",
    "default_include",
    "default_exclude",
    "linter",
];

const LINTER_KEYS: [&str; 9] = [
    "select",
    "ignore",
    "threshold",
    "configure",
    "reports",
    "persistent",
    "compare",
    "issue_format",
    "target_version",
];

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Unknown option '{key}' in configuration file {}", path.display())]
    UnknownKey { path: PathBuf, key: String },

    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("Invalid configure directive '{0}'. Expected format 'name.param=value'")]
    InvalidConfigure(String),

    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("'{target}' does not accept parameter '{param}'. Available parameters: {available}")]
    UnknownParam {
        target: String,
        param: String,
        available: String,
    },

    #[error("Invalid value '{value}' for '{target}.{param}': {message}")]
    InvalidParamValue {
        target: String,
        param: String,
        value: String,
        message: String,
    },

    #[error("Unknown report '{name}'. Available reports: {available}")]
    UnknownReport { name: String, available: String },
}

/// Where a resolved configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Built-in defaults (plus command line options)
    Default,
    /// A configuration file
    File(PathBuf),
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Linter settings as written by the user; `None` means "not set"
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LinterOverlay {
    pub select: Option<Vec<String>>,
    pub ignore: Option<Vec<String>>,
    pub threshold: Option<String>,
    pub configure: Option<Vec<String>>,
    pub reports: Option<Vec<String>>,
    pub persistent: Option<bool>,
    pub compare: Option<bool>,
    pub issue_format: Option<String>,
    pub target_version: Option<String>,
}

/// One configuration layer (a file, or the command line)
///
/// Every field keeps whether it was set at all, so an explicit `false` or
/// empty list still overrides a lower layer.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConfigOverlay {
    pub sources: Option<Vec<String>>,
    pub language: Option<Vec<String>>,
    pub exit_zero: Option<bool>,
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub default_include: Option<Vec<String>>,
    pub default_exclude: Option<Vec<String>>,
    pub linter: LinterOverlay,
}

impl ConfigOverlay {
    /// Layer `self` over `lower`: fields set here win
    pub fn or(self, lower: ConfigOverlay) -> ConfigOverlay {
        ConfigOverlay {
            sources: self.sources.or(lower.sources),
            language: self.language.or(lower.language),
            exit_zero: self.exit_zero.or(lower.exit_zero),
            include: self.include.or(lower.include),
            exclude: self.exclude.or(lower.exclude),
            default_include: self.default_include.or(lower.default_include),
            default_exclude: self.default_exclude.or(lower.default_exclude),
            linter: LinterOverlay {
                select: self.linter.select.or(lower.linter.select),
                ignore: self.linter.ignore.or(lower.linter.ignore),
                threshold: self.linter.threshold.or(lower.linter.threshold),
                configure: self.linter.configure.or(lower.linter.configure),
                reports: self.linter.reports.or(lower.linter.reports),
                persistent: self.linter.persistent.or(lower.linter.persistent),
                compare: self.linter.compare.or(lower.linter.compare),
                issue_format: self.linter.issue_format.or(lower.linter.issue_format),
                target_version: self.linter.target_version.or(lower.linter.target_version),
            },
        }
    }

    /// Load a configuration file
    ///
    /// Returns `Ok(None)` for a `pyproject.toml` without our section.
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Parse configuration content; the format follows the file name
    pub fn parse(content: &str, path: &Path) -> Result<Option<Self>, ConfigError> {
        let parse_err = |message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        };

        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let value = match ext {
            "toml" => {
                let table: toml::Table = toml::from_str(content).map_err(|e| parse_err(e.to_string()))?;
                let table = if file_name == "pyproject.toml" {
                    match table
                        .get("tool")
                        .and_then(|tool| tool.get(PYPROJECT_SECTION))
                        .and_then(|section| section.as_table())
                    {
                        Some(section) => section.clone(),
                        None => return Ok(None),
                    }
                } else {
                    table
                };
                serde_json::to_value(table).map_err(|e| parse_err(e.to_string()))?
            }
            "yaml" | "yml" => {
                serde_yaml::from_str::<Value>(content).map_err(|e| parse_err(e.to_string()))?
            }
            "json" => serde_json::from_str::<Value>(content).map_err(|e| parse_err(e.to_string()))?,
            _ => {
                return Err(parse_err(format!(
                    "Unknown config file format: '{}'",
                    ext
                )))
            }
        };

        let value = match value {
            // An empty YAML document
            Value::Null => Value::Object(Default::default()),
            Value::Object(_) => value,
            _ => return Err(parse_err("expected a key/value mapping".to_string())),
        };

        let value = normalize_keys(value, path)?;
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| parse_err(e.to_string()))
    }
}

/// Rewrite `some-key` as `some_key` and reject unknown keys
fn normalize_keys(value: Value, path: &Path) -> Result<Value, ConfigError> {
    let Value::Object(top) = value else {
        return Ok(value);
    };

    let mut normalized = serde_json::Map::new();
    for (key, value) in top {
        let key = key.replace('-', "_");
        if !TOP_LEVEL_KEYS.contains(&key.as_str()) {
            return Err(ConfigError::UnknownKey {
                path: path.to_path_buf(),
                key,
            });
        }

        let value = if key == "linter" {
            let Value::Object(linter) = value else {
                return Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    message: "'linter' must be a key/value mapping".to_string(),
                });
            };
            let mut section = serde_json::Map::new();
            for (key, value) in linter {
                let key = key.replace('-', "_");
                if !LINTER_KEYS.contains(&key.as_str()) {
                    return Err(ConfigError::UnknownKey {
                        path: path.to_path_buf(),
                        key: format!("linter.{}", key),
                    });
                }
                section.insert(key, value);
            }
            Value::Object(section)
        } else {
            value
        };
        normalized.insert(key, value);
    }
    Ok(Value::Object(normalized))
}

/// Look for a configuration file directly inside `dir`
pub fn find_config_in(dir: &Path) -> Result<Option<(PathBuf, ConfigOverlay)>, ConfigError> {
    for name in CONFIG_NAMES {
        let path = dir.join(name);
        if !path.is_file() {
            continue;
        }
        if let Some(overlay) = ConfigOverlay::load(&path)? {
            return Ok(Some((path, overlay)));
        }
    }
    Ok(None)
}

/// Whether `dir` holds a file that counts as configuration
pub fn has_config_file(dir: &Path) -> bool {
    CONFIG_NAMES.iter().any(|name| {
        let path = dir.join(name);
        if *name == "pyproject.toml" {
            path.is_file()
                && std::fs::read_to_string(&path)
                    .ok()
                    .and_then(|content| content.parse::<toml::Table>().ok())
                    .is_some_and(|table| {
                        table
                            .get("tool")
                            .and_then(|tool| tool.get(PYPROJECT_SECTION))
                            .is_some()
                    })
        } else {
            path.is_file()
        }
    })
}

/// A `name.param=value` directive targeting a rule or a report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigureDirective {
    pub target: String,
    pub param: String,
    pub value: String,
}

impl ConfigureDirective {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidConfigure(raw.to_string());
        let (name, value) = raw.split_once('=').ok_or_else(invalid)?;
        let (target, param) = name.split_once('.').ok_or_else(invalid)?;
        let (target, param) = (target.trim(), param.trim());
        if target.is_empty() || param.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            target: target.to_string(),
            param: param.to_string(),
            value: value.trim().to_string(),
        })
    }
}

impl fmt::Display for ConfigureDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}={}", self.target, self.param, self.value)
    }
}

/// Resolved linter settings
#[derive(Debug, Clone)]
pub struct LinterConfig {
    /// Rules to include (ids, names or globs)
    pub select: Vec<String>,

    /// Rules to exclude (ids, names or globs)
    pub ignore: Vec<String>,

    /// Minimum severity a rule needs to run
    pub threshold: Severity,

    /// Rule and report parameters
    pub configure: Vec<ConfigureDirective>,

    /// Report names to enable
    pub reports: Vec<String>,

    /// Save comparable report results for the next run
    pub persistent: bool,

    /// Compare with the previous run's results
    pub compare: bool,

    /// Format of printed issues
    pub issue_format: String,

    /// Language version the rules are evaluated for
    pub target_version: Version,

    /// Compiled `select` / `ignore`
    pub selection: RuleSelection,
}

/// Resolved configuration governing a set of source files
#[derive(Debug, Clone)]
pub struct Config {
    /// Source paths to lint when none are given
    pub sources: Vec<PathBuf>,

    /// Linter settings
    pub linter: LinterConfig,

    /// Include / exclude filters
    pub file_filters: FileFilters,

    /// Languages used to translate section headers
    pub language: Vec<String>,

    /// Always exit with 0
    pub exit_zero: bool,

    /// Where this configuration came from
    pub source: ConfigSource,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Config {
    /// Build the built-in defaults, with no overlay
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::resolve(ConfigOverlay::default(), ConfigSource::Default, Path::new("."))
    }

    /// Resolve an overlay into a complete configuration
    ///
    /// Relative `sources` are taken relative to `base_dir`.
    pub fn resolve(
        overlay: ConfigOverlay,
        source: ConfigSource,
        base_dir: &Path,
    ) -> Result<Self, ConfigError> {
        let linter = overlay.linter;

        let threshold = match linter.threshold {
            Some(raw) => raw.parse().map_err(|message| ConfigError::InvalidValue {
                key: "threshold".to_string(),
                message,
            })?,
            None => Severity::Info,
        };

        let target_version = match linter.target_version {
            Some(raw) => raw.parse().map_err(|message| ConfigError::InvalidValue {
                key: "target_version".to_string(),
                message,
            })?,
            None => DEFAULT_TARGET_VERSION,
        };

        let configure = linter
            .configure
            .unwrap_or_default()
            .iter()
            .map(|raw| ConfigureDirective::parse(raw))
            .collect::<Result<Vec<_>, _>>()?;

        let select = linter.select.unwrap_or_default();
        let ignore = linter.ignore.unwrap_or_default();
        let selection = RuleSelection::compile(&select, &ignore)?;

        let file_filters = FileFilters::new(
            overlay
                .default_include
                .unwrap_or_else(|| strings(&DEFAULT_INCLUDE)),
            overlay.include.unwrap_or_default(),
            overlay
                .default_exclude
                .unwrap_or_else(|| strings(&DEFAULT_EXCLUDE)),
            overlay.exclude.unwrap_or_default(),
        )?;

        let sources = overlay
            .sources
            .unwrap_or_default()
            .into_iter()
            .map(|s| base_dir.join(s))
            .collect();

        Ok(Self {
            sources,
            linter: LinterConfig {
                select,
                ignore,
                threshold,
                configure,
                reports: linter.reports.unwrap_or_default(),
                persistent: linter.persistent.unwrap_or(false),
                compare: linter.compare.unwrap_or(false),
                issue_format: linter
                    .issue_format
                    .unwrap_or_else(|| DEFAULT_ISSUE_FORMAT.to_string()),
                target_version,
                selection,
            },
            file_filters,
            language: overlay.language.unwrap_or_else(|| vec!["en".to_string()]),
            exit_zero: overlay.exit_zero.unwrap_or(false),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::defaults().unwrap();
        assert_eq!(config.linter.threshold, Severity::Info);
        assert_eq!(config.linter.issue_format, DEFAULT_ISSUE_FORMAT);
        assert_eq!(config.linter.target_version, DEFAULT_TARGET_VERSION);
        assert_eq!(config.language, vec!["en".to_string()]);
        assert_eq!(config.source, ConfigSource::Default);
        assert!(!config.exit_zero);
        assert!(config.linter.reports.is_empty());
    }

    #[test]
    fn test_toml_config() {
        let toml = r#"
exit-zero = true
exclude = ["generated"]

[linter]
select = ["DUP*"]
ignore = ["DUP01"]
threshold = "W"
configure = ["file-too-long.max_lines=100"]
"#;
        let overlay = ConfigOverlay::parse(toml, Path::new("suitelint.toml"))
            .unwrap()
            .unwrap();
        assert_eq!(overlay.exit_zero, Some(true));
        assert_eq!(overlay.exclude, Some(vec!["generated".to_string()]));
        assert_eq!(overlay.linter.threshold.as_deref(), Some("W"));

        let config = Config::resolve(overlay, ConfigSource::Default, Path::new(".")).unwrap();
        assert_eq!(config.linter.threshold, Severity::Warning);
        assert_eq!(
            config.linter.configure,
            vec![ConfigureDirective {
                target: "file-too-long".to_string(),
                param: "max_lines".to_string(),
                value: "100".to_string(),
            }]
        );
    }

    #[test]
    fn test_yaml_config() {
        let yaml = r#"
language: [en, fi]
linter:
  issue-format: "{source}:{line} {rule_id}"
  persistent: false
"#;
        let overlay = ConfigOverlay::parse(yaml, Path::new(".suitelint.yaml"))
            .unwrap()
            .unwrap();
        assert_eq!(
            overlay.language,
            Some(vec!["en".to_string(), "fi".to_string()])
        );
        assert_eq!(overlay.linter.persistent, Some(false));
        assert_eq!(
            overlay.linter.issue_format.as_deref(),
            Some("{source}:{line} {rule_id}")
        );
    }

    #[test]
    fn test_empty_yaml_config() {
        let overlay = ConfigOverlay::parse("", Path::new(".suitelint.yml"))
            .unwrap()
            .unwrap();
        assert_eq!(overlay, ConfigOverlay::default());
    }

    #[test]
    fn test_pyproject_section() {
        let content = r#"
[project]
name = "demo"

[tool.suitelint.linter]
ignore = ["LEN01"]
"#;
        let overlay = ConfigOverlay::parse(content, Path::new("pyproject.toml"))
            .unwrap()
            .unwrap();
        assert_eq!(overlay.linter.ignore, Some(vec!["LEN01".to_string()]));

        let unrelated = "[tool.black]\nline-length = 88\n";
        assert!(ConfigOverlay::parse(unrelated, Path::new("pyproject.toml"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_unknown_key() {
        let err = ConfigOverlay::parse("colour = true\n", Path::new("suitelint.toml")).unwrap_err();
        match err {
            ConfigError::UnknownKey { key, path } => {
                assert_eq!(key, "colour");
                assert_eq!(path, PathBuf::from("suitelint.toml"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = ConfigOverlay::parse("[linter]\nselekt = []\n", Path::new("suitelint.toml"))
            .unwrap_err();
        assert!(err.to_string().contains("linter.selekt"));
    }

    #[test]
    fn test_malformed_config() {
        let err = ConfigOverlay::parse("linter = [", Path::new("suitelint.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("suitelint.toml"));

        let err = ConfigOverlay::parse("exit_zero = \"maybe\"\n", Path::new("suitelint.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_overlay_precedence() {
        let cli = ConfigOverlay {
            exit_zero: Some(false),
            linter: LinterOverlay {
                select: Some(Vec::new()),
                ..Default::default()
            },
            ..Default::default()
        };
        let file = ConfigOverlay {
            exit_zero: Some(true),
            exclude: Some(vec!["out".to_string()]),
            linter: LinterOverlay {
                select: Some(vec!["DUP01".to_string()]),
                compare: Some(true),
                ..Default::default()
            },
            ..Default::default()
        };

        let merged = cli.or(file);
        // Explicit false and empty lists still win
        assert_eq!(merged.exit_zero, Some(false));
        assert_eq!(merged.linter.select, Some(Vec::new()));
        assert_eq!(merged.exclude, Some(vec!["out".to_string()]));
        assert_eq!(merged.linter.compare, Some(true));
    }

    #[test]
    fn test_invalid_threshold() {
        let overlay = ConfigOverlay {
            linter: LinterOverlay {
                threshold: Some("fatal".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let err = Config::resolve(overlay, ConfigSource::Default, Path::new(".")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_configure_directive_parse() {
        let directive = ConfigureDirective::parse("LEN01.severity_threshold=warning=10:error=20").unwrap();
        assert_eq!(directive.target, "LEN01");
        assert_eq!(directive.param, "severity_threshold");
        assert_eq!(directive.value, "warning=10:error=20");

        assert!(matches!(
            ConfigureDirective::parse("no-param=1"),
            Err(ConfigError::InvalidConfigure(_))
        ));
        assert!(ConfigureDirective::parse("rule.param").is_err());
        assert!(ConfigureDirective::parse(".param=1").is_err());
    }

    #[test]
    fn test_find_config_priority() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("pyproject.toml"),
            "[tool.suitelint]\nexit_zero = true\n",
        )
        .unwrap();
        std::fs::write(dir.path().join(".suitelint.yaml"), "exit_zero: false\n").unwrap();

        let (path, overlay) = find_config_in(dir.path()).unwrap().unwrap();
        assert_eq!(path.file_name().unwrap(), ".suitelint.yaml");
        assert_eq!(overlay.exit_zero, Some(false));
        assert!(has_config_file(dir.path()));
    }

    #[test]
    fn test_pyproject_without_section_is_not_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pyproject.toml"), "[project]\nname = \"x\"\n").unwrap();
        assert!(find_config_in(dir.path()).unwrap().is_none());
        assert!(!has_config_file(dir.path()));
    }
}
