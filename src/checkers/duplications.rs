//! Duplicated names and section headers

use crate::checker::{Checker, ScanContext};
use crate::diagnostic::{Diagnostic, Range, Severity};
use crate::model::{SectionKind, SuiteFile};
use crate::rule::Rule;
use std::collections::HashMap;

pub const DUPLICATED_TEST_CASE: &str = "duplicated-test-case";
pub const DUPLICATED_KEYWORD: &str = "duplicated-keyword";
pub const DUPLICATED_VARIABLE: &str = "duplicated-variable";
pub const SECTION_ALREADY_DEFINED: &str = "section-already-defined";
pub const BOTH_TESTS_AND_TASKS: &str = "both-tests-and-tasks";

/// Case-insensitive name, ignoring spaces and underscores
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != ' ' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Variable name without its `${}`-style decoration
pub fn normalize_variable_name(name: &str) -> String {
    let name = name.trim_end().trim_end_matches('=').trim_end();
    let inner = match (name.find('{'), name.rfind('}')) {
        (Some(open), Some(close)) if open < close => &name[open + 1..close],
        _ => name,
    };
    normalize_name(inner)
}

/// An occurrence of a name: (name, line, col)
type Occurrence<'a> = (&'a str, usize, usize);

fn find_duplicates<'a>(
    occurrences: impl Iterator<Item = Occurrence<'a>>,
    normalize: fn(&str) -> String,
) -> Vec<(Occurrence<'a>, usize)> {
    let mut first_seen: HashMap<String, usize> = HashMap::new();
    let mut duplicates = Vec::new();
    for occurrence in occurrences {
        let key = normalize(occurrence.0);
        match first_seen.get(&key) {
            Some(&first_line) => duplicates.push((occurrence, first_line)),
            None => {
                first_seen.insert(key, occurrence.1);
            }
        }
    }
    duplicates
}

/// Checker for duplicated test case, keyword and variable names
pub struct DuplicationsChecker;

impl DuplicationsChecker {
    fn report_duplicates<'a>(
        ctx: &ScanContext,
        rule: &Rule,
        occurrences: impl Iterator<Item = Occurrence<'a>>,
        normalize: fn(&str) -> String,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        for ((name, line, col), first_line) in find_duplicates(occurrences, normalize) {
            let message = rule.format_message(&[
                ("name", name),
                ("first_occurrence_line", &first_line.to_string()),
            ]);
            diagnostics.push(ctx.report(
                rule,
                Range::on_line(line, col, name.chars().count()),
                &message,
            ));
        }
    }
}

impl Checker for DuplicationsChecker {
    fn name(&self) -> &'static str {
        "duplications"
    }

    fn rules(&self) -> Vec<Rule> {
        vec![
            Rule::new(
                "DUP01",
                DUPLICATED_TEST_CASE,
                Severity::Error,
                "Multiple test cases with name '{name}' (first occurrence in line {first_occurrence_line})",
            )
            .with_description(
                "Test case names must be unique within a suite. Matching ignores case, spaces and underscores.",
            ),
            Rule::new(
                "DUP02",
                DUPLICATED_KEYWORD,
                Severity::Error,
                "Multiple keywords with name '{name}' (first occurrence in line {first_occurrence_line})",
            )
            .with_description(
                "Do not define keywords with the same name inside the same file. Matching ignores case, spaces and underscores.",
            ),
            Rule::new(
                "DUP03",
                DUPLICATED_VARIABLE,
                Severity::Error,
                "Multiple variables with name '{name}' in Variables section (first occurrence in line {first_occurrence_line})",
            )
            .with_description("Variable names are case-insensitive and ignore spaces and underscores."),
        ]
    }

    fn scan(&self, file: &SuiteFile, ctx: &ScanContext) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        if let Some(rule) = ctx.enabled(DUPLICATED_TEST_CASE) {
            Self::report_duplicates(
                ctx,
                rule,
                file.test_cases().map(|b| (b.name.as_str(), b.line, 1)),
                normalize_name,
                &mut diagnostics,
            );
        }

        if let Some(rule) = ctx.enabled(DUPLICATED_KEYWORD) {
            Self::report_duplicates(
                ctx,
                rule,
                file.keywords().map(|b| (b.name.as_str(), b.line, 1)),
                normalize_name,
                &mut diagnostics,
            );
        }

        if let Some(rule) = ctx.enabled(DUPLICATED_VARIABLE) {
            Self::report_duplicates(
                ctx,
                rule,
                file.variables().map(|e| (e.name.as_str(), e.line, e.col)),
                normalize_variable_name,
                &mut diagnostics,
            );
        }

        diagnostics
    }
}

/// Checker for repeated or conflicting section headers
pub struct SectionHeadersChecker;

impl Checker for SectionHeadersChecker {
    fn name(&self) -> &'static str {
        "section-headers"
    }

    fn rules(&self) -> Vec<Rule> {
        vec![
            Rule::new(
                "DUP08",
                SECTION_ALREADY_DEFINED,
                Severity::Warning,
                "'{section_name}' section header already defined in file (first occurrence in line {first_occurrence_line})",
            )
            .with_description("Repeated sections are merged, but it is recommended not to duplicate them."),
            Rule::new(
                "DUP10",
                BOTH_TESTS_AND_TASKS,
                Severity::Error,
                "Both Task(s) and Test Case(s) section headers defined in file",
            )
            .with_description("Use either a Test Cases or a Tasks section, not both."),
        ]
    }

    fn scan(&self, file: &SuiteFile, ctx: &ScanContext) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let mut seen: HashMap<SectionKind, usize> = HashMap::new();

        for section in &file.sections {
            if section.kind == SectionKind::Invalid {
                continue;
            }
            let range = Range::on_line(section.line, 1, file.lines[section.line - 1].trim_end().chars().count());

            if let Some(&first_line) = seen.get(&section.kind) {
                if let Some(rule) = ctx.enabled(SECTION_ALREADY_DEFINED) {
                    let message = rule.format_message(&[
                        ("section_name", &section.header),
                        ("first_occurrence_line", &first_line.to_string()),
                    ]);
                    diagnostics.push(ctx.report(rule, range, &message));
                }
            } else {
                seen.insert(section.kind, section.line);
            }

            let conflicting = match section.kind {
                SectionKind::TestCases => SectionKind::Tasks,
                SectionKind::Tasks => SectionKind::TestCases,
                _ => continue,
            };
            if seen.contains_key(&conflicting) {
                if let Some(rule) = ctx.enabled(BOTH_TESTS_AND_TASKS) {
                    diagnostics.push(ctx.report(rule, range, &rule.message));
                }
            }
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

    fn scan(checker: &dyn Checker, content: &str) -> Vec<Diagnostic> {
        let mut rules = RuleSet::new();
        for rule in checker.rules() {
            rules.insert(rule).unwrap();
        }
        let file = SuiteFile::parse_str(content, Path::new("t.robot"), FileKind::Suite, &[]).unwrap();
        let ctx = ScanContext {
            rules: &rules,
            source: Path::new("t.robot"),
            templated: false,
        };
        checker.scan(&file, &ctx)
    }

    #[test]
    fn test_normalize_names() {
        assert_eq!(normalize_name("Test_with Name"), "testwithname");
        assert_eq!(normalize_variable_name("${v_ariable}="), "variable");
        assert_eq!(normalize_variable_name("@{VARI able}"), "variable");
    }

    #[test]
    fn test_duplicated_test_case() {
        let content = "\
*** Test Cases ***
Test with name
    No Operation
test_with Name
    No Operation
";
        let diagnostics = scan(&DuplicationsChecker, content);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].rule.id, "DUP01");
        assert_eq!(diagnostics[0].range.start.line, 4);
        assert_eq!(
            diagnostics[0].message,
            "Multiple test cases with name 'test_with Name' (first occurrence in line 2)"
        );
    }

    #[test]
    fn test_duplicated_keyword_and_variable() {
        let content = "\
*** Variables ***
${variable}    1
${VARIAble}    a

*** Keywords ***
Keyword
    No Operation
K_eywor d
    No Operation
";
        let ids: Vec<_> = scan(&DuplicationsChecker, content)
            .into_iter()
            .map(|d| (d.rule.id, d.range.start.line))
            .collect();
        assert_eq!(
            ids,
            vec![("DUP02".to_string(), 8), ("DUP03".to_string(), 3)]
        );
    }

    #[test]
    fn test_disabled_rule_is_not_reported() {
        let content = "*** Test Cases ***\nA\n    Log    x\nA\n    Log    x\n";
        let mut rules = RuleSet::new();
        for rule in DuplicationsChecker.rules() {
            rules.insert(rule).unwrap();
        }
        rules.get_mut("DUP01").unwrap().enabled = false;
        let file = SuiteFile::parse_str(content, Path::new("t.robot"), FileKind::Suite, &[]).unwrap();
        let ctx = ScanContext {
            rules: &rules,
            source: Path::new("t.robot"),
            templated: false,
        };
        assert!(DuplicationsChecker.scan(&file, &ctx).is_empty());
    }

    #[test]
    fn test_section_headers() {
        let content = "\
*** Test Cases ***
A
    Log    x
*** Tasks ***
B
    Log    y
*** Test Cases ***
C
    Log    z
";
        let found: Vec<_> = scan(&SectionHeadersChecker, content)
            .into_iter()
            .map(|d| (d.rule.id, d.range.start.line))
            .collect();
        assert_eq!(
            found,
            vec![
                ("DUP10".to_string(), 4),
                ("DUP08".to_string(), 7),
                ("DUP10".to_string(), 7),
            ]
        );
    }
}
