//! Print every issue using the configured issue format

use super::{invalid_value, unknown_param, Report, ReportContext, ReportError};
use crate::config::ConfigError;
use crate::diagnostic::Diagnostic;
use crate::rule::fill_placeholders;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Layout of the printed issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One formatted line per issue
    #[default]
    Simple,
    /// Issues grouped under their file
    Grouped,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simple" => Ok(OutputFormat::Simple),
            "grouped" => Ok(OutputFormat::Grouped),
            _ => Err(format!(
                "'{}' is not a valid output format, please choose from: simple, grouped",
                s
            )),
        }
    }
}

/// Collects diagnostics per source and prints them at the end of the run
#[derive(Default)]
pub struct PrintIssuesReport {
    output_format: OutputFormat,
    by_source: BTreeMap<PathBuf, Vec<Diagnostic>>,
}

impl PrintIssuesReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill the `{placeholder}`s of an issue format
    pub fn format_issue(format: &str, diagnostic: &Diagnostic, source: &str) -> String {
        let values = [
            ("source_abs", diagnostic.source.display().to_string()),
            ("source", source.to_string()),
            ("end_line", diagnostic.range.end.line.to_string()),
            ("end_col", diagnostic.range.end.col.to_string()),
            ("line", diagnostic.range.start.line.to_string()),
            ("col", diagnostic.range.start.col.to_string()),
            ("severity", diagnostic.severity.code().to_string()),
            ("rule_id", diagnostic.rule.id.clone()),
            ("desc", diagnostic.message.clone()),
            ("name", diagnostic.rule.name.clone()),
        ];
        fill_placeholders(format, |key| {
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
        })
    }
}

impl Report for PrintIssuesReport {
    fn name(&self) -> &'static str {
        super::PRINT_ISSUES
    }

    fn description(&self) -> &'static str {
        "Collect and print rules messages"
    }

    fn configure(&mut self, param: &str, value: &str) -> Result<(), ConfigError> {
        match param {
            "output_format" => {
                self.output_format = value
                    .parse()
                    .map_err(|message| invalid_value(self.name(), param, value, message))?;
                Ok(())
            }
            _ => Err(unknown_param(self.name(), param, &["output_format"])),
        }
    }

    fn add_message(&mut self, diagnostic: &Diagnostic) {
        self.by_source
            .entry(diagnostic.source.clone())
            .or_default()
            .push(diagnostic.clone());
    }

    fn get_report(&self, ctx: &ReportContext) -> Result<Option<String>, ReportError> {
        if self.by_source.is_empty() {
            return Ok(None);
        }

        let mut lines = Vec::new();
        for (source, diagnostics) in &self.by_source {
            let mut diagnostics = diagnostics.clone();
            diagnostics.sort();
            let relative = ctx.relative(source);

            match self.output_format {
                OutputFormat::Simple => {
                    for diagnostic in &diagnostics {
                        lines.push(Self::format_issue(
                            &ctx.config.linter.issue_format,
                            diagnostic,
                            &relative,
                        ));
                    }
                }
                OutputFormat::Grouped => {
                    lines.push(relative.clone());
                    for diagnostic in &diagnostics {
                        lines.push(format!(
                            "  {}:{} [{}] {} {} ({})",
                            diagnostic.range.start.line,
                            diagnostic.range.start.col,
                            diagnostic.severity.code(),
                            diagnostic.rule.id,
                            diagnostic.message,
                            diagnostic.rule.name
                        ));
                    }
                    lines.push(String::new());
                }
            }
        }

        Ok(Some(lines.join("\n").trim_end().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::diagnostic::{Range, RuleRef, Severity};
    use crate::rule::RuleSet;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn diag(source: &str, line: usize, id: &str) -> Diagnostic {
        Diagnostic::new(
            RuleRef::new(id, "duplicated-test-case"),
            Path::new(source),
            Range::on_line(line, 1, 4),
            "Duplicated",
            Severity::Error,
        )
    }

    #[test]
    fn test_simple_output() {
        let config = Config::defaults().unwrap();
        let rules = RuleSet::new();
        let ctx = ReportContext {
            root: Path::new("/project"),
            rules: &rules,
            config: &config,
        };

        let mut report = PrintIssuesReport::new();
        report.add_message(&diag("/project/b.robot", 1, "DUP01"));
        report.add_message(&diag("/project/a.robot", 9, "DUP01"));
        report.add_message(&diag("/project/a.robot", 2, "DUP01"));

        assert_eq!(
            report.get_report(&ctx).unwrap().unwrap(),
            "a.robot:2:1 [E] DUP01 Duplicated (duplicated-test-case)\n\
             a.robot:9:1 [E] DUP01 Duplicated (duplicated-test-case)\n\
             b.robot:1:1 [E] DUP01 Duplicated (duplicated-test-case)"
        );
    }

    #[test]
    fn test_grouped_output() {
        let config = Config::defaults().unwrap();
        let rules = RuleSet::new();
        let ctx = ReportContext {
            root: Path::new("/project"),
            rules: &rules,
            config: &config,
        };

        let mut report = PrintIssuesReport::new();
        report.configure("output_format", "grouped").unwrap();
        report.add_message(&diag("/project/a.robot", 2, "DUP01"));

        assert_eq!(
            report.get_report(&ctx).unwrap().unwrap(),
            "a.robot\n  2:1 [E] DUP01 Duplicated (duplicated-test-case)"
        );
    }

    #[test]
    fn test_configure_errors() {
        let mut report = PrintIssuesReport::new();
        assert!(matches!(
            report.configure("output_format", "fancy"),
            Err(ConfigError::InvalidParamValue { .. })
        ));
        assert!(matches!(
            report.configure("colors", "yes"),
            Err(ConfigError::UnknownParam { .. })
        ));
    }

    #[test]
    fn test_custom_issue_format() {
        let line = PrintIssuesReport::format_issue(
            "{source}|{end_line}:{end_col}|{severity}|{name}",
            &diag("/p/x.robot", 3, "DUP01"),
            "x.robot",
        );
        assert_eq!(line, "x.robot|3:5|E|duplicated-test-case");
    }

    #[test]
    fn test_issue_format_does_not_expand_values() {
        let mut diagnostic = diag("/p/x.robot", 3, "DUP01");
        diagnostic.message = "Multiple test cases with name '{name}' and {line}".to_string();
        let line = PrintIssuesReport::format_issue("{desc} ({name}) {unknown}", &diagnostic, "x.robot");
        assert_eq!(
            line,
            "Multiple test cases with name '{name}' and {line} (duplicated-test-case) {unknown}"
        );
    }

    #[test]
    fn test_no_issues_no_output() {
        let config = Config::defaults().unwrap();
        let rules = RuleSet::new();
        let ctx = ReportContext {
            root: Path::new("/"),
            rules: &rules,
            config: &config,
        };
        assert!(PrintIssuesReport::new().get_report(&ctx).unwrap().is_none());
    }
}
