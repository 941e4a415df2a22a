//! Rule definition, parameters and the rule set

use crate::config::ConfigError;
use crate::diagnostic::{Diagnostic, Range, RuleRef, Severity};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{(\w+)\}").unwrap());

/// Replace `{key}` placeholders in one pass; unknown keys are kept as written
pub(crate) fn fill_placeholders<'v>(
    template: &str,
    lookup: impl Fn(&str) -> Option<&'v str>,
) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| match lookup(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Language version a rule set is evaluated against
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// Language version assumed when no `target_version` is configured
pub const DEFAULT_TARGET_VERSION: Version = Version {
    major: 7,
    minor: 0,
    patch: 0,
};

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl Default for Version {
    fn default() -> Self {
        DEFAULT_TARGET_VERSION
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl std::str::FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = [0u32; 3];
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("empty version".to_string());
        }
        for (i, part) in trimmed.split('.').enumerate() {
            if i >= 3 {
                return Err(format!("Invalid version '{}'", s));
            }
            parts[i] = part
                .parse()
                .map_err(|_| format!("Invalid version '{}'", s))?;
        }
        Ok(Version::new(parts[0], parts[1], parts[2]))
    }
}

/// Range of language versions a rule applies to
///
/// Written as comma-separated comparisons, e.g. `>=4.0`, `<5`, `>=4,<7`.
/// An empty range matches every version.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VersionRange {
    /// Inclusive lower bound
    pub min: Option<Version>,
    /// Exclusive upper bound
    pub max: Option<Version>,
}

impl VersionRange {
    /// Range matching every version
    pub fn any() -> Self {
        Self::default()
    }

    /// Check whether `version` lies inside the range
    pub fn contains(&self, version: &Version) -> bool {
        self.min.is_none_or(|min| *version >= min) && self.max.is_none_or(|max| *version < max)
    }
}

impl std::str::FromStr for VersionRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut range = VersionRange::any();
        for spec in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if let Some(v) = spec.strip_prefix(">=") {
                range.min = Some(v.parse()?);
            } else if let Some(v) = spec.strip_prefix('<') {
                range.max = Some(v.parse()?);
            } else if let Some(v) = spec.strip_prefix("==") {
                let version: Version = v.parse()?;
                range.min = Some(version);
                range.max = Some(Version::new(version.major, version.minor, version.patch + 1));
            } else {
                return Err(format!("Invalid version range '{}'", s));
            }
        }
        Ok(range)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (None, None) => write!(f, "*"),
            (Some(min), None) => write!(f, ">={}", min),
            (None, Some(max)) => write!(f, "<{}", max),
            (Some(min), Some(max)) => write!(f, ">={},<{}", min, max),
        }
    }
}

/// Per-message severity limits, e.g. `warning=400:error=600`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SeverityThresholds {
    limits: Vec<(Severity, i64)>,
}

impl SeverityThresholds {
    /// Highest severity whose limit is reached by `value`
    pub fn severity_for(&self, value: i64) -> Option<Severity> {
        self.limits
            .iter()
            .filter(|(_, limit)| value >= *limit)
            .map(|(severity, _)| *severity)
            .max()
    }

    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }
}

impl fmt::Display for SeverityThresholds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .limits
            .iter()
            .map(|(severity, limit)| format!("{}={}", severity, limit))
            .collect();
        write!(f, "{}", parts.join(":"))
    }
}

impl std::str::FromStr for SeverityThresholds {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut limits = Vec::new();
        for part in s.split(':').map(str::trim).filter(|p| !p.is_empty()) {
            let (severity, limit) = part
                .split_once('=')
                .ok_or_else(|| format!("Expected '<severity>=<limit>', got '{}'", part))?;
            let severity: Severity = severity.parse()?;
            let limit: i64 = limit
                .trim()
                .parse()
                .map_err(|_| format!("Invalid limit '{}'", limit))?;
            limits.push((severity, limit));
        }
        Ok(Self { limits })
    }
}

/// Kind of value a rule parameter accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Non-negative integer
    Int,
    /// Severity thresholds (`warning=10:error=20`)
    Thresholds,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Int => write!(f, "int"),
            ParamKind::Thresholds => write!(f, "thresholds"),
        }
    }
}

/// Value of a rule parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Int(i64),
    Thresholds(SeverityThresholds),
}

impl ParamValue {
    fn parse(kind: ParamKind, raw: &str) -> Result<Self, String> {
        match kind {
            ParamKind::Int => match raw.trim().parse::<i64>() {
                Ok(value) if value >= 0 => Ok(ParamValue::Int(value)),
                Ok(_) => Err(format!("'{}' must not be negative", raw)),
                Err(_) => Err(format!("'{}' is not an integer", raw)),
            },
            ParamKind::Thresholds => raw.parse().map(ParamValue::Thresholds),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(value) => write!(f, "{}", value),
            ParamValue::Thresholds(thresholds) => write!(f, "{}", thresholds),
        }
    }
}

/// Declared parameter of a rule
#[derive(Debug, Clone)]
pub struct RuleParam {
    pub name: String,
    pub kind: ParamKind,
    pub default: Option<ParamValue>,
    pub description: String,
}

impl RuleParam {
    pub fn int(name: &str, default: i64, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ParamKind::Int,
            default: Some(ParamValue::Int(default)),
            description: description.to_string(),
        }
    }

    /// Optional severity thresholds; unset until configured
    pub fn severity_threshold(description: &str) -> Self {
        Self {
            name: SEVERITY_THRESHOLD_PARAM.to_string(),
            kind: ParamKind::Thresholds,
            default: None,
            description: description.to_string(),
        }
    }
}

/// Parameter every rule accepts
pub const SEVERITY_PARAM: &str = "severity";

/// Parameter that makes severity per-message
pub const SEVERITY_THRESHOLD_PARAM: &str = "severity_threshold";

/// A lint rule: static identity plus the runtime state a configuration sets
#[derive(Debug, Clone)]
pub struct Rule {
    /// Unique rule identifier (e.g. "DUP01")
    pub id: String,

    /// Unique human-readable name (e.g. "duplicated-test-case")
    pub name: String,

    /// Message template
    pub message: String,

    /// Detailed description
    pub description: String,

    /// Severity the rule is declared with
    pub default_severity: Severity,

    /// Language versions the rule applies to
    pub version: VersionRange,

    /// Deprecated rules never run
    pub deprecated: bool,

    /// Whether the rule runs when nothing selects it explicitly
    pub default_enabled: bool,

    /// Declared parameters
    pub params: Vec<RuleParam>,

    /// Current enablement (refreshed per configuration)
    pub enabled: bool,

    /// Current severity (may be reconfigured)
    pub severity: Severity,

    values: BTreeMap<String, ParamValue>,
}

impl Rule {
    /// Create a new rule enabled by default
    pub fn new(id: &str, name: &str, severity: Severity, message: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            message: message.to_string(),
            description: String::new(),
            default_severity: severity,
            version: VersionRange::any(),
            deprecated: false,
            default_enabled: true,
            params: Vec::new(),
            enabled: true,
            severity,
            values: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_version(mut self, version: VersionRange) -> Self {
        self.version = version;
        self
    }

    pub fn with_param(mut self, param: RuleParam) -> Self {
        if let Some(default) = &param.default {
            self.values.insert(param.name.clone(), default.clone());
        }
        self.params.push(param);
        self
    }

    /// Rule only runs when selected explicitly
    pub fn disabled_by_default(mut self) -> Self {
        self.default_enabled = false;
        self.enabled = false;
        self
    }

    /// Mark this rule as deprecated
    pub fn deprecate(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Reference used by diagnostics
    pub fn rule_ref(&self) -> RuleRef {
        RuleRef::new(&self.id, &self.name)
    }

    /// Get the deprecation warning message
    pub fn deprecation_warning(&self) -> Option<String> {
        if !self.deprecated {
            return None;
        }
        Some(format!(
            "Rule '{}' ({}) is deprecated and will not be configured",
            self.name, self.id
        ))
    }

    /// Apply `param=value` from a `configure` directive
    pub fn configure(&mut self, param: &str, value: &str) -> Result<(), ConfigError> {
        if param == SEVERITY_PARAM {
            self.severity = value.parse().map_err(|message| ConfigError::InvalidParamValue {
                target: self.name.clone(),
                param: param.to_string(),
                value: value.to_string(),
                message,
            })?;
            return Ok(());
        }

        let Some(declared) = self.params.iter().find(|p| p.name == param) else {
            let mut available: Vec<&str> = self.params.iter().map(|p| p.name.as_str()).collect();
            available.push(SEVERITY_PARAM);
            return Err(ConfigError::UnknownParam {
                target: self.name.clone(),
                param: param.to_string(),
                available: available.join(", "),
            });
        };

        let parsed = ParamValue::parse(declared.kind, value).map_err(|message| {
            ConfigError::InvalidParamValue {
                target: self.name.clone(),
                param: param.to_string(),
                value: value.to_string(),
                message,
            }
        })?;
        self.values.insert(param.to_string(), parsed);
        Ok(())
    }

    /// Current value of a parameter
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn int_param(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(ParamValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    /// Configured per-message severity thresholds, if any
    pub fn severity_thresholds(&self) -> Option<&SeverityThresholds> {
        match self.values.get(SEVERITY_THRESHOLD_PARAM) {
            Some(ParamValue::Thresholds(t)) if !t.is_empty() => Some(t),
            _ => None,
        }
    }

    /// Rule opted out of threshold-based disabling
    pub fn has_severity_threshold(&self) -> bool {
        self.severity_thresholds().is_some()
    }

    /// Severity for a measured `value`, honouring configured thresholds
    ///
    /// Returns `None` when thresholds are configured and none is reached.
    pub fn severity_for_value(&self, value: i64) -> Option<Severity> {
        match self.severity_thresholds() {
            Some(thresholds) => thresholds.severity_for(value),
            None => Some(self.severity),
        }
    }

    /// Build a diagnostic for this rule
    pub fn diagnostic(&self, source: &Path, range: Range, message: &str) -> Diagnostic {
        Diagnostic::new(self.rule_ref(), source, range, message, self.severity)
    }

    /// Fill `{name}` style placeholders of the message template
    pub fn format_message(&self, values: &[(&str, &str)]) -> String {
        fill_placeholders(&self.message, |key| {
            values.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
        })
    }
}

/// Error registering rules
#[derive(Debug, thiserror::Error)]
pub enum RuleSetError {
    #[error("Rule id or name '{0}' is registered more than once")]
    Duplicate(String),
}

/// Rules addressable by id or by name
///
/// Both keys resolve to the same instance.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
    index: HashMap<String, usize>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule under its id and its name
    pub fn insert(&mut self, rule: Rule) -> Result<(), RuleSetError> {
        for key in [&rule.id, &rule.name] {
            if self.index.contains_key(key.as_str()) {
                return Err(RuleSetError::Duplicate(key.clone()));
            }
        }
        let idx = self.rules.len();
        self.index.insert(rule.id.clone(), idx);
        self.index.insert(rule.name.clone(), idx);
        self.rules.push(rule);
        Ok(())
    }

    /// Look up by id or name
    pub fn get(&self, key: &str) -> Option<&Rule> {
        self.index.get(key).map(|&i| &self.rules[i])
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Rule> {
        self.index.get(key).map(|&i| &mut self.rules[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Rules in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Rule> {
        self.rules.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether the rule behind `key` currently runs
    pub fn is_enabled(&self, key: &str) -> bool {
        self.get(key).is_some_and(|r| r.enabled)
    }

    /// Refresh every rule's `enabled` flag through `decide`
    pub fn refresh_enabled(&mut self, decide: impl Fn(&Rule) -> bool) {
        for rule in &mut self.rules {
            rule.enabled = decide(rule);
        }
    }

    /// Enable or disable every rule at once
    pub fn set_all_enabled(&mut self, enabled: bool) {
        for rule in &mut self.rules {
            rule.enabled = enabled;
        }
    }
}
