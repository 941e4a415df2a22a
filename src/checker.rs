//! Checker trait and the registry of loaded checkers

use crate::diagnostic::{Diagnostic, Range, Severity};
use crate::matcher::RuleSelection;
use crate::config::ConfigError;
use crate::model::SuiteFile;
use crate::rule::{Rule, RuleSet, RuleSetError};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Failed lookup of a rule or report by name
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Provided rule or report '{0}' does not exist")]
    RuleOrReportNotFound(String),

    #[error("Provided rule '{0}' does not exist")]
    RuleNotFound(String),
}

/// What a checker sees while scanning one file
pub struct ScanContext<'a> {
    /// Rules as configured for this file
    pub rules: &'a RuleSet,
    /// File being scanned
    pub source: &'a Path,
    /// Whether the suite runs its tests from a template
    pub templated: bool,
}

impl<'a> ScanContext<'a> {
    /// The rule behind `key`, if it runs for this file
    pub fn enabled(&self, key: &str) -> Option<&'a Rule> {
        self.rules.get(key).filter(|rule| rule.enabled)
    }

    /// Build a diagnostic using the rule's configured severity
    pub fn report(&self, rule: &Rule, range: Range, message: &str) -> Diagnostic {
        rule.diagnostic(self.source, range, message)
    }

    /// Build a diagnostic with an explicit severity
    pub fn report_with_severity(
        &self,
        rule: &Rule,
        range: Range,
        message: &str,
        severity: Severity,
    ) -> Diagnostic {
        Diagnostic::new(rule.rule_ref(), self.source, range, message, severity)
    }
}

/// A named bundle of rules sharing one scan over the file
pub trait Checker: Send + Sync {
    /// Checker name
    fn name(&self) -> &'static str;

    /// Rules the checker reports, with their defaults
    fn rules(&self) -> Vec<Rule>;

    /// Scan a file; only enabled rules may be reported
    fn scan(&self, file: &SuiteFile, ctx: &ScanContext) -> Vec<Diagnostic>;
}

/// Loaded checkers and the rules they expose
#[derive(Default)]
pub struct CheckerRegistry {
    checkers: Vec<Arc<dyn Checker>>,
    /// Rule ids per checker, same order as `checkers`
    checker_rules: Vec<Vec<String>>,
    rules: RuleSet,
}

impl CheckerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in checkers
    pub fn with_builtin() -> Result<Self, RuleSetError> {
        let mut registry = Self::new();
        for checker in crate::checkers::builtin() {
            registry.register(checker)?;
        }
        Ok(registry)
    }

    /// Register a checker and its rules
    pub fn register(&mut self, checker: Arc<dyn Checker>) -> Result<(), RuleSetError> {
        let rules = checker.rules();
        let ids = rules.iter().map(|r| r.id.clone()).collect();
        for rule in rules {
            self.rules.insert(rule)?;
        }
        log::debug!("Registered checker '{}'", checker.name());
        self.checkers.push(checker);
        self.checker_rules.push(ids);
        Ok(())
    }

    /// Every rule with its default state
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn checkers(&self) -> impl Iterator<Item = &Arc<dyn Checker>> {
        self.checkers.iter()
    }

    /// Look up one rule by id or name
    pub fn describe(&self, key: &str) -> Result<&Rule, LookupError> {
        self.rules
            .get(key)
            .ok_or_else(|| LookupError::RuleNotFound(key.to_string()))
    }

    /// Rules whose id or name matches `pattern` (all rules without one)
    pub fn matching(&self, pattern: Option<&str>) -> Result<Vec<&Rule>, ConfigError> {
        let Some(pattern) = pattern else {
            return Ok(self.rules.iter().collect());
        };
        let selection = RuleSelection::compile(&[pattern.to_string()], &[])?;
        Ok(self
            .rules
            .iter()
            .filter(|rule| selection.is_included(rule))
            .collect())
    }

    /// Names of checkers with no enabled rule in `rules`
    pub fn disabled_checkers(&self, rules: &RuleSet) -> HashSet<&'static str> {
        self.checkers
            .iter()
            .zip(&self.checker_rules)
            .filter(|(_, ids)| !ids.iter().any(|id| rules.is_enabled(id)))
            .map(|(checker, _)| checker.name())
            .collect()
    }
}

/// Rule state prepared for one configuration
#[derive(Debug, Clone)]
pub struct ActiveRules {
    pub rules: RuleSet,
    pub disabled_checkers: HashSet<&'static str>,
    pub threshold: Severity,
}

impl ActiveRules {
    pub fn new(registry: &CheckerRegistry, rules: RuleSet, threshold: Severity) -> Self {
        let disabled_checkers = registry.disabled_checkers(&rules);
        Self {
            rules,
            disabled_checkers,
            threshold,
        }
    }

    pub fn is_checker_disabled(&self, name: &str) -> bool {
        self.disabled_checkers.contains(name)
    }

    /// Whether a diagnostic survives rule enablement and the threshold
    pub fn accepts(&self, diagnostic: &Diagnostic) -> bool {
        self.rules.is_enabled(&diagnostic.rule.id) && diagnostic.severity >= self.threshold
    }
}
