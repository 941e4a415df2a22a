//! Issue counts per severity

use super::{diff_suffix, ComparableReport, Report, ReportContext, ReportError};
use crate::diagnostic::{Diagnostic, Severity};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Issue totals, persisted between runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub error: u64,
    pub warning: u64,
    pub info: u64,
}

impl SeverityCounts {
    pub fn total(&self) -> u64 {
        self.error + self.warning + self.info
    }

    pub fn get(&self, severity: Severity) -> u64 {
        match severity {
            Severity::Error => self.error,
            Severity::Warning => self.warning,
            Severity::Info => self.info,
        }
    }
}

fn plural(count: u64, word: &str) -> String {
    if count == 1 {
        format!("{} {}", count, word)
    } else {
        format!("{} {}s", count, word)
    }
}

/// Summary line with the number of issues per severity
#[derive(Default)]
pub struct RulesBySeverityReport {
    counts: SeverityCounts,
    previous: Option<SeverityCounts>,
}

impl RulesBySeverityReport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Report for RulesBySeverityReport {
    fn name(&self) -> &'static str {
        "rules_by_severity"
    }

    fn description(&self) -> &'static str {
        "Group issues by severity"
    }

    fn add_message(&mut self, diagnostic: &Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.counts.error += 1,
            Severity::Warning => self.counts.warning += 1,
            Severity::Info => self.counts.info += 1,
        }
    }

    fn get_report(&self, _ctx: &ReportContext) -> Result<Option<String>, ReportError> {
        let previous = self.previous.as_ref();
        let mut output = format!(
            "Found {}{}",
            plural(self.counts.total(), "issue"),
            diff_suffix(self.counts.total(), previous.map(|p| p.total()))
        );

        let parts: Vec<String> = [Severity::Error, Severity::Warning, Severity::Info]
            .into_iter()
            .filter(|severity| self.counts.get(*severity) > 0)
            .map(|severity| {
                let count = self.counts.get(severity);
                format!(
                    "{}{}",
                    plural(count, &severity.to_string()),
                    diff_suffix(count, previous.map(|p| p.get(severity)))
                )
            })
            .collect();

        if parts.is_empty() {
            output.push('.');
        } else {
            output.push_str(": ");
            output.push_str(&parts.join(", "));
            output.push('.');
        }
        Ok(Some(output))
    }

    fn as_comparable(&mut self) -> Option<&mut dyn ComparableReport> {
        Some(self)
    }
}

impl ComparableReport for RulesBySeverityReport {
    fn persist_result(&self) -> Option<Value> {
        serde_json::to_value(self.counts).ok()
    }

    fn incorporate_previous(&mut self, previous: Option<Value>) {
        self.previous = previous.and_then(|value| serde_json::from_value(value).ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::diagnostic::{Range, RuleRef};
    use crate::rule::RuleSet;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::path::Path;

    fn diag(severity: Severity) -> Diagnostic {
        Diagnostic::new(
            RuleRef::new("DUP01", "duplicated-test-case"),
            Path::new("a.robot"),
            Range::on_line(1, 1, 1),
            "message",
            severity,
        )
    }

    fn render(report: &RulesBySeverityReport) -> String {
        let config = Config::defaults().unwrap();
        let rules = RuleSet::new();
        let ctx = ReportContext {
            root: Path::new("/"),
            rules: &rules,
            config: &config,
        };
        report.get_report(&ctx).unwrap().unwrap()
    }

    #[test]
    fn test_summary() {
        let mut report = RulesBySeverityReport::new();
        assert_eq!(render(&report), "Found 0 issues.");

        report.add_message(&diag(Severity::Error));
        report.add_message(&diag(Severity::Warning));
        report.add_message(&diag(Severity::Warning));
        assert_eq!(render(&report), "Found 3 issues: 1 error, 2 warnings.");
    }

    #[test]
    fn test_compare() {
        let mut report = RulesBySeverityReport::new();
        report.add_message(&diag(Severity::Info));
        report.incorporate_previous(Some(json!({"error": 0, "warning": 0, "info": 3})));
        assert_eq!(render(&report), "Found 1 issue (-2): 1 info (-2).");
        assert_eq!(
            report.persist_result(),
            Some(json!({"error": 0, "warning": 0, "info": 1}))
        );
    }

    #[test]
    fn test_corrupt_previous_is_ignored() {
        let mut report = RulesBySeverityReport::new();
        report.incorporate_previous(Some(json!("garbage")));
        assert_eq!(render(&report), "Found 0 issues.");
    }
}
