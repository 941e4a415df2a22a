//! Report sinks
//!
//! Every sink receives each diagnostic in order and produces its output once
//! all files are processed. Comparable sinks can also persist a result and
//! compare it with the previous run.

mod cache;
mod file_stats;
mod json_report;
mod print_issues;
mod return_status;
mod rules_by_id;
mod rules_by_severity;
mod sarif;

pub use cache::{ResultsCache, RootResults};
pub use file_stats::FileStatsReport;
pub use json_report::JsonReport;
pub use print_issues::{OutputFormat, PrintIssuesReport};
pub use return_status::ReturnStatusReport;
pub use rules_by_id::RulesByIdReport;
pub use rules_by_severity::RulesBySeverityReport;
pub use sarif::SarifReport;

use crate::config::{Config, ConfigError};
use crate::diagnostic::Diagnostic;
use crate::rule::RuleSet;
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const PRINT_ISSUES: &str = "print_issues";
pub const RETURN_STATUS: &str = "return_status";

/// Error producing a report
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Run-wide data available when reports are generated
pub struct ReportContext<'a> {
    /// Project root
    pub root: &'a Path,
    /// Every known rule
    pub rules: &'a RuleSet,
    /// Default configuration
    pub config: &'a Config,
}

impl ReportContext<'_> {
    /// Path relative to the project root, with `/` separators
    pub fn relative(&self, path: &Path) -> String {
        path.strip_prefix(self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

/// Report sink
pub trait Report: Send {
    /// Report name used by `--reports` and `configure`
    fn name(&self) -> &'static str;

    /// Short description
    fn description(&self) -> &'static str;

    /// Whether `all` enables this report
    fn default_enabled(&self) -> bool {
        true
    }

    /// Apply a `report.param=value` directive
    fn configure(&mut self, param: &str, _value: &str) -> Result<(), ConfigError> {
        Err(unknown_param(self.name(), param, &[]))
    }

    /// A source file is about to be reported
    fn add_file(&mut self, _path: &Path) {}

    /// Record one diagnostic
    fn add_message(&mut self, diagnostic: &Diagnostic);

    /// Produce the report output, if any
    fn get_report(&self, ctx: &ReportContext) -> Result<Option<String>, ReportError>;

    /// Cross-run comparison support
    fn as_comparable(&mut self) -> Option<&mut dyn ComparableReport> {
        None
    }

    /// Exit code computed by the report
    fn exit_code(&self) -> Option<i32> {
        None
    }
}

/// Report whose result can be persisted and compared with the next run
pub trait ComparableReport {
    /// Result to store for the next run
    fn persist_result(&self) -> Option<Value>;

    /// Result stored by the previous run, if any
    fn incorporate_previous(&mut self, previous: Option<Value>);
}

pub(crate) fn unknown_param(report: &str, param: &str, available: &[&str]) -> ConfigError {
    ConfigError::UnknownParam {
        target: report.to_string(),
        param: param.to_string(),
        available: if available.is_empty() {
            "none".to_string()
        } else {
            available.join(", ")
        },
    }
}

pub(crate) fn invalid_value(report: &str, param: &str, value: &str, message: String) -> ConfigError {
    ConfigError::InvalidParamValue {
        target: report.to_string(),
        param: param.to_string(),
        value: value.to_string(),
        message,
    }
}

/// Format a change against the previous run, e.g. ` (+2)`
pub(crate) fn diff_suffix(current: u64, previous: Option<u64>) -> String {
    match previous {
        Some(previous) => format!(" ({:+})", current as i64 - previous as i64),
        None => String::new(),
    }
}

/// Fresh instances of every available report
pub fn available() -> Vec<Box<dyn Report>> {
    vec![
        Box::new(PrintIssuesReport::new()),
        Box::new(RulesByIdReport::new()),
        Box::new(RulesBySeverityReport::new()),
        Box::new(FileStatsReport::new()),
        Box::new(JsonReport::new()),
        Box::new(SarifReport::new()),
        Box::new(ReturnStatusReport::new()),
    ]
}

/// Whether `name` names any available report
pub fn is_known(name: &str) -> bool {
    available().iter().any(|r| r.name() == name)
}

/// Reports enabled for a run, in selection order
pub struct ReportSet {
    reports: Vec<Box<dyn Report>>,
}

impl ReportSet {
    /// Select reports by name
    ///
    /// An empty list selects `print_issues`, `all` adds every default
    /// report and `none` disables everything but `return_status`, which is
    /// always enabled.
    pub fn select(names: &[String]) -> Result<Self, ConfigError> {
        let mut pool: Vec<Option<Box<dyn Report>>> = available().into_iter().map(Some).collect();
        let mut reports: Vec<Box<dyn Report>> = Vec::new();

        let names: Vec<String> = if names.iter().any(|n| n.eq_ignore_ascii_case("none")) {
            Vec::new()
        } else if names.is_empty() {
            vec![PRINT_ISSUES.to_string()]
        } else {
            names.to_vec()
        };

        let mut take = |pool: &mut Vec<Option<Box<dyn Report>>>, name: &str| -> bool {
            match pool.iter_mut().find(|slot| slot.as_ref().is_some_and(|r| r.name() == name)) {
                Some(slot) => {
                    if let Some(report) = slot.take() {
                        reports.push(report);
                    }
                    true
                }
                // Already taken
                None => reports.iter().any(|r| r.name() == name),
            }
        };

        for name in &names {
            let name = name.trim();
            if name == "all" {
                let defaults: Vec<&'static str> = pool
                    .iter()
                    .flatten()
                    .filter(|r| r.default_enabled())
                    .map(|r| r.name())
                    .collect();
                for default in defaults {
                    take(&mut pool, default);
                }
            } else if !take(&mut pool, name) {
                return Err(ConfigError::UnknownReport {
                    name: name.to_string(),
                    available: available()
                        .iter()
                        .map(|r| r.name())
                        .collect::<Vec<_>>()
                        .join(", "),
                });
            }
        }
        take(&mut pool, RETURN_STATUS);

        log::debug!(
            "Enabled reports: {}",
            reports.iter().map(|r| r.name()).collect::<Vec<_>>().join(", ")
        );
        Ok(Self { reports })
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.reports.iter().map(|r| r.name()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.reports.iter().any(|r| r.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Box<dyn Report>> {
        self.reports.iter_mut().find(|r| r.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Box<dyn Report>> {
        self.reports.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Report>> {
        self.reports.iter_mut()
    }

    pub fn add_file(&mut self, path: &Path) {
        for report in &mut self.reports {
            report.add_file(path);
        }
    }

    pub fn add_message(&mut self, diagnostic: &Diagnostic) {
        for report in &mut self.reports {
            report.add_message(diagnostic);
        }
    }

    /// Exit code of the `return_status` report
    pub fn exit_code(&self) -> Option<i32> {
        self.reports
            .iter()
            .find(|r| r.name() == RETURN_STATUS)
            .and_then(|r| r.exit_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_select_default() {
        let reports = ReportSet::select(&[]).unwrap();
        assert_eq!(reports.names(), vec!["print_issues", "return_status"]);
    }

    #[test]
    fn test_select_all() {
        let reports = ReportSet::select(&names(&["all"])).unwrap();
        assert_eq!(
            reports.names(),
            vec![
                "print_issues",
                "rules_by_id",
                "rules_by_severity",
                "file_stats",
                "return_status"
            ]
        );
    }

    #[test]
    fn test_select_all_plus_non_default() {
        let reports = ReportSet::select(&names(&["sarif", "all", "sarif"])).unwrap();
        assert_eq!(reports.names()[0], "sarif");
        assert!(reports.contains("rules_by_id"));
        assert_eq!(reports.names().iter().filter(|n| **n == "sarif").count(), 1);
    }

    #[test]
    fn test_select_none() {
        let reports = ReportSet::select(&names(&["rules_by_id", "None"])).unwrap();
        assert_eq!(reports.names(), vec!["return_status"]);
    }

    #[test]
    fn test_select_unknown() {
        let err = ReportSet::select(&names(&["not_a_report"])).err().unwrap();
        assert!(matches!(err, ConfigError::UnknownReport { .. }));
        assert!(err.to_string().contains("rules_by_id"));
    }

    #[test]
    fn test_is_known() {
        assert!(is_known("sarif"));
        assert!(!is_known("all"));
    }

    #[test]
    fn test_diff_suffix() {
        assert_eq!(diff_suffix(3, Some(1)), " (+2)");
        assert_eq!(diff_suffix(1, Some(3)), " (-2)");
        assert_eq!(diff_suffix(2, Some(2)), " (+0)");
        assert_eq!(diff_suffix(2, None), "");
    }
}
