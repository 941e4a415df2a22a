//! File and suite size limits

use crate::checker::{Checker, ScanContext};
use crate::diagnostic::{Diagnostic, Range, Severity};
use crate::model::SuiteFile;
use crate::rule::{Rule, RuleParam};

pub const FILE_TOO_LONG: &str = "file-too-long";
pub const TOO_MANY_TEST_CASES: &str = "too-many-test-cases";

pub struct LengthsChecker;

impl LengthsChecker {
    fn check_file_length(file: &SuiteFile, ctx: &ScanContext, rule: &Rule) -> Option<Diagnostic> {
        let lines = file.line_count();
        let max_lines = rule.int_param("max_lines").unwrap_or(400);
        if (lines as i64) <= max_lines {
            return None;
        }
        // Thresholds, when configured, decide the severity per file
        let severity = rule.severity_for_value(lines as i64)?;
        let message = rule.format_message(&[
            ("lines_count", &lines.to_string()),
            ("max_allowed_count", &max_lines.to_string()),
        ]);
        let last = file.lines.last().map(|l| l.chars().count()).unwrap_or(0);
        Some(ctx.report_with_severity(
            rule,
            Range::on_line(lines.max(1), 1, last),
            &message,
            severity,
        ))
    }

    fn check_test_count(file: &SuiteFile, ctx: &ScanContext, rule: &Rule) -> Option<Diagnostic> {
        let count = file.test_cases().count();
        let param = if ctx.templated {
            "max_templated_testcases"
        } else {
            "max_testcases"
        };
        let max = rule.int_param(param).unwrap_or(50);
        if (count as i64) <= max {
            return None;
        }
        let section = file.test_cases().nth(max as usize)?;
        let message = rule.format_message(&[
            ("test_count", &count.to_string()),
            ("max_allowed_count", &max.to_string()),
        ]);
        Some(ctx.report(
            rule,
            Range::on_line(section.line, 1, section.name.chars().count()),
            &message,
        ))
    }
}

impl Checker for LengthsChecker {
    fn name(&self) -> &'static str {
        "lengths"
    }

    fn rules(&self) -> Vec<Rule> {
        vec![
            Rule::new(
                "LEN01",
                FILE_TOO_LONG,
                Severity::Warning,
                "File has too many lines ({lines_count}/{max_allowed_count})",
            )
            .with_description("Long files are hard to read and navigate. Split them into smaller suites or resources.")
            .with_param(RuleParam::int("max_lines", 400, "number of lines allowed in a file"))
            .with_param(RuleParam::severity_threshold(
                "severity per line count, e.g. warning=400:error=600",
            )),
            Rule::new(
                "LEN02",
                TOO_MANY_TEST_CASES,
                Severity::Warning,
                "Too many test cases ({test_count}/{max_allowed_count})",
            )
            .with_description("Too many test cases in one suite. Templated suites have a separate limit.")
            .with_param(RuleParam::int("max_testcases", 50, "number of test cases allowed in a suite"))
            .with_param(RuleParam::int(
                "max_templated_testcases",
                100,
                "number of test cases allowed in a templated suite",
            )),
        ]
    }

    fn scan(&self, file: &SuiteFile, ctx: &ScanContext) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        if let Some(rule) = ctx.enabled(FILE_TOO_LONG) {
            diagnostics.extend(Self::check_file_length(file, ctx, rule));
        }
        if let Some(rule) = ctx.enabled(TOO_MANY_TEST_CASES) {
            diagnostics.extend(Self::check_test_count(file, ctx, rule));
        }
        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FileKind;
    use crate::rule::RuleSet;
    use std::path::Path;

    fn rules(configure: &[(&str, &str, &str)]) -> RuleSet {
        let mut rules = RuleSet::new();
        for rule in LengthsChecker.rules() {
            rules.insert(rule).unwrap();
        }
        for (rule, param, value) in configure {
            rules.get_mut(rule).unwrap().configure(param, value).unwrap();
        }
        rules
    }

    fn suite(tests: usize) -> String {
        let mut content = String::from("*** Test Cases ***\n");
        for i in 0..tests {
            content.push_str(&format!("Test {}\n    Log    {}\n", i, i));
        }
        content
    }

    fn scan(content: &str, rules: &RuleSet, templated: bool) -> Vec<Diagnostic> {
        let file = SuiteFile::parse_str(content, Path::new("t.robot"), FileKind::Suite, &[]).unwrap();
        let ctx = ScanContext {
            rules,
            source: Path::new("t.robot"),
            templated,
        };
        LengthsChecker.scan(&file, &ctx)
    }

    #[test]
    fn test_file_too_long() {
        let rules = rules(&[("file-too-long", "max_lines", "5")]);
        let diagnostics = scan(&suite(3), &rules, false);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].rule.id, "LEN01");
        assert_eq!(diagnostics[0].message, "File has too many lines (7/5)");
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert_eq!(diagnostics[0].range.start.line, 7);
    }

    #[test]
    fn test_file_too_long_thresholds() {
        let rules = rules(&[
            ("LEN01", "max_lines", "5"),
            ("LEN01", "severity_threshold", "warning=10:error=20"),
        ]);
        // Above max_lines but below every threshold
        assert!(scan(&suite(3), &rules, false).is_empty());

        let diagnostics = scan(&suite(10), &rules, false);
        assert_eq!(diagnostics[0].severity, Severity::Error);
    }

    #[test]
    fn test_too_many_test_cases() {
        let rules = rules(&[
            ("LEN02", "max_testcases", "2"),
            ("LEN02", "max_templated_testcases", "4"),
        ]);
        let diagnostics = scan(&suite(3), &rules, false);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "Too many test cases (3/2)");
        // Third test is the first one over the limit
        assert_eq!(diagnostics[0].range.start.line, 6);

        assert!(scan(&suite(3), &rules, true).is_empty());
    }

    #[test]
    fn test_negative_limits_rejected() {
        let mut configured = rules(&[]);
        for (rule, param) in [
            ("LEN01", "max_lines"),
            ("LEN02", "max_testcases"),
            ("LEN02", "max_templated_testcases"),
        ] {
            assert!(configured.get_mut(rule).unwrap().configure(param, "-1").is_err());
        }
        // Defaults still apply
        assert!(scan(&suite(3), &configured, false).is_empty());

        let zero = rules(&[("LEN02", "max_testcases", "0")]);
        assert_eq!(scan(&suite(1), &zero, false)[0].range.start.line, 2);
    }
}
