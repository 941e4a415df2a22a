//! Rule selection policy

use crate::config::{ConfigError, LinterConfig};
use crate::rule::Rule;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;

/// Compiled `select` / `ignore` lists
///
/// Plain entries match a rule id or name exactly, entries containing glob
/// characters match either of them as a pattern.
#[derive(Debug, Clone)]
pub struct RuleSelection {
    include: HashSet<String>,
    include_patterns: GlobSet,
    exclude: HashSet<String>,
    exclude_patterns: GlobSet,
}

fn is_pattern(entry: &str) -> bool {
    entry.contains(['*', '?', '['])
}

fn compile(entries: &[String]) -> Result<(HashSet<String>, GlobSet), ConfigError> {
    let mut exact = HashSet::new();
    let mut builder = GlobSetBuilder::new();
    for entry in entries.iter().map(|e| e.trim()).filter(|e| !e.is_empty()) {
        if is_pattern(entry) {
            let glob = Glob::new(entry).map_err(|e| ConfigError::InvalidPattern {
                pattern: entry.to_string(),
                message: e.to_string(),
            })?;
            builder.add(glob);
        } else {
            exact.insert(entry.to_string());
        }
    }
    let set = builder.build().map_err(|e| ConfigError::InvalidPattern {
        pattern: entries.join(","),
        message: e.to_string(),
    })?;
    Ok((exact, set))
}

impl RuleSelection {
    pub fn compile(select: &[String], ignore: &[String]) -> Result<Self, ConfigError> {
        let (include, include_patterns) = compile(select)?;
        let (exclude, exclude_patterns) = compile(ignore)?;
        Ok(Self {
            include,
            include_patterns,
            exclude,
            exclude_patterns,
        })
    }

    /// Whether any include entry exists
    pub fn has_include(&self) -> bool {
        !self.include.is_empty() || !self.include_patterns.is_empty()
    }

    pub fn is_included(&self, rule: &Rule) -> bool {
        self.include.contains(&rule.id)
            || self.include.contains(&rule.name)
            || self.include_patterns.is_match(&rule.id)
            || self.include_patterns.is_match(&rule.name)
    }

    pub fn is_excluded(&self, rule: &Rule) -> bool {
        self.exclude.contains(&rule.id)
            || self.exclude.contains(&rule.name)
            || self.exclude_patterns.is_match(&rule.id)
            || self.exclude_patterns.is_match(&rule.name)
    }
}

/// Decides whether a rule runs under a linter configuration
///
/// Pure: the answer depends only on the rule and the configuration.
pub struct RuleMatcher<'a> {
    config: &'a LinterConfig,
}

impl<'a> RuleMatcher<'a> {
    pub fn new(config: &'a LinterConfig) -> Self {
        Self { config }
    }

    /// Check if a rule is enabled
    pub fn is_enabled(&self, rule: &Rule) -> bool {
        if rule.deprecated || !rule.version.contains(&self.config.target_version) {
            return false;
        }

        // Rules with per-message severity are filtered per diagnostic instead
        if rule.severity < self.config.threshold && !rule.has_severity_threshold() {
            return false;
        }

        // Exclude before include
        if self.is_disabled(rule) {
            return false;
        }
        if self.config.selection.has_include() {
            return self.config.selection.is_included(rule);
        }

        rule.default_enabled
    }

    /// Check if a rule is explicitly excluded
    pub fn is_disabled(&self, rule: &Rule) -> bool {
        self.config.selection.is_excluded(rule)
    }
}
