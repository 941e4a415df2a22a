//! Inline suppression directives
//!
//! Syntax, inside a `#` comment:
//! - `# suitelint: off` / `# suitelint: off=DUP01,file-too-long`
//! - `# suitelint: on` / `# suitelint: on=DUP01`
//!
//! A standalone `off` opens a range for the listed rules (or `all`) and the
//! matching `on` closes it. Unterminated ranges run to the end of the file.
//! A directive trailing code disables that line only. `off` without a rule
//! list before any content disables the whole file.
//!
//! Built with a [`RuleSet`], rule names resolve to ids so `off=DUP01` and
//! `on=duplicated-test-case` refer to the same range.

use crate::diagnostic::Diagnostic;
use crate::model::SuiteFile;
use crate::rule::RuleSet;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Rule key covering every rule
pub const ALL_RULES: &str = "all";

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)#\s*suitelint\s*:\s*(off|on)\b(?:\s*=\s*([\w\-]+(?:\s*,\s*[\w\-]+)*))?").unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
struct Directive {
    enable: bool,
    /// `None` when no rule list was given
    rules: Option<Vec<String>>,
}

fn parse_directives(text: &str) -> Vec<Directive> {
    DIRECTIVE
        .captures_iter(text)
        .map(|caps| Directive {
            enable: caps[1].eq_ignore_ascii_case("on"),
            rules: caps.get(2).map(|list| {
                list.as_str()
                    .split(',')
                    .map(|r| r.trim().to_string())
                    .filter(|r| !r.is_empty())
                    .collect()
            }),
        })
        .collect()
}

/// Suppressed line ranges per rule for one file
#[derive(Debug, Clone, Default)]
pub struct DisablerIndex {
    file_disabled: bool,
    /// Rule id, name or `all` -> inclusive line ranges
    ranges: HashMap<String, Vec<(usize, usize)>>,
}

impl DisablerIndex {
    /// Scan a parsed file's comments for directives, keying rules as written
    pub fn from_file(file: &SuiteFile) -> Self {
        Self::build(file, |rule| rule.to_string())
    }

    /// Scan a parsed file's comments, keying known rules by id
    pub fn with_rules(file: &SuiteFile, rules: &RuleSet) -> Self {
        Self::build(file, |rule| match rules.get(rule) {
            Some(known) => known.id.clone(),
            None => rule.to_string(),
        })
    }

    fn build(file: &SuiteFile, key: impl Fn(&str) -> String) -> Self {
        let mut index = Self::default();
        let mut open: HashMap<String, usize> = HashMap::new();

        for comment in &file.comments {
            for directive in parse_directives(&comment.text) {
                let line = comment.line;
                let rules: Vec<String> = match &directive.rules {
                    Some(list) => list.iter().map(|rule| key(rule)).collect(),
                    None => vec![ALL_RULES.to_string()],
                };

                if !comment.standalone {
                    if !directive.enable {
                        for rule in rules {
                            index.add_range(rule, line, line);
                        }
                    }
                    continue;
                }

                if directive.enable {
                    let closes_all = rules.iter().any(|r| r == ALL_RULES);
                    let targets: Vec<String> = if closes_all {
                        open.keys().cloned().collect()
                    } else {
                        rules
                    };
                    for rule in targets {
                        if let Some(start) = open.remove(&rule) {
                            index.add_range(rule, start, line);
                        }
                    }
                    continue;
                }

                let disables_everything = rules.iter().any(|r| r == ALL_RULES);
                let before_content = file.first_content_line.is_none_or(|first| line < first);
                if disables_everything && before_content {
                    index.file_disabled = true;
                }
                for rule in rules {
                    open.entry(rule).or_insert(line);
                }
            }
        }

        for (rule, start) in open {
            index.add_range(rule, start, usize::MAX);
        }
        index
    }

    fn add_range(&mut self, rule: String, start: usize, end: usize) {
        self.ranges.entry(rule).or_default().push((start, end));
    }

    /// Whether the whole file is disabled
    pub fn file_disabled(&self) -> bool {
        self.file_disabled
    }

    /// Check a rule (by id and name) at a line
    pub fn is_rule_disabled(&self, rule_id: &str, rule_name: &str, line: usize) -> bool {
        [rule_id, rule_name, ALL_RULES].iter().any(|key| {
            self.ranges
                .get(*key)
                .is_some_and(|ranges| ranges.iter().any(|&(start, end)| start <= line && line <= end))
        })
    }

    /// Check whether a diagnostic is suppressed
    pub fn is_disabled(&self, diagnostic: &Diagnostic) -> bool {
        self.file_disabled
            || self.is_rule_disabled(
                &diagnostic.rule.id,
                &diagnostic.rule.name,
                diagnostic.range.start.line,
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{Range, RuleRef, Severity};
    use crate::model::FileKind;
    use crate::rule::Rule;
    use std::path::Path;

    fn index(content: &str) -> DisablerIndex {
        let file = SuiteFile::parse_str(content, Path::new("t.robot"), FileKind::Suite, &[]).unwrap();
        DisablerIndex::from_file(&file)
    }

    fn index_with_rules(content: &str) -> DisablerIndex {
        let mut rules = RuleSet::new();
        rules
            .insert(Rule::new("DUP01", "duplicated-test-case", Severity::Error, ""))
            .unwrap();
        rules
            .insert(Rule::new("DUP02", "duplicated-keyword", Severity::Error, ""))
            .unwrap();
        let file = SuiteFile::parse_str(content, Path::new("t.robot"), FileKind::Suite, &[]).unwrap();
        DisablerIndex::with_rules(&file, &rules)
    }

    fn diag(id: &str, name: &str, line: usize) -> Diagnostic {
        Diagnostic::new(
            RuleRef::new(id, name),
            Path::new("t.robot"),
            Range::on_line(line, 1, 1),
            "msg",
            Severity::Warning,
        )
    }

    #[test]
    fn test_file_level_disable() {
        let index = index("# suitelint: off\n*** Test Cases ***\nOne\n    Log    x\n");
        assert!(index.file_disabled());
        assert!(index.is_disabled(&diag("DUP01", "duplicated-test-case", 3)));
    }

    #[test]
    fn test_off_after_content_is_ranged() {
        let index = index("*** Test Cases ***\n# suitelint: off\nOne\n    Log    x\n");
        assert!(!index.file_disabled());
        assert!(!index.is_rule_disabled("DUP01", "duplicated-test-case", 1));
        assert!(index.is_rule_disabled("DUP01", "duplicated-test-case", 3));
    }

    #[test]
    fn test_off_with_rule_list_is_not_file_level() {
        let index = index("# suitelint: off=DUP01\n*** Test Cases ***\n");
        assert!(!index.file_disabled());
        assert!(index.is_rule_disabled("DUP01", "duplicated-test-case", 2));
        assert!(!index.is_rule_disabled("DUP02", "duplicated-keyword", 2));
    }

    #[test]
    fn test_ranged_disable() {
        let content = "\
*** Test Cases ***
One
# suitelint: off=duplicated-test-case,LEN01
    Log    x
# suitelint: on=duplicated-test-case
Two
    Log    y
";
        let index = index(content);
        assert!(!index.is_rule_disabled("DUP01", "duplicated-test-case", 2));
        assert!(index.is_rule_disabled("DUP01", "duplicated-test-case", 4));
        assert!(index.is_rule_disabled("DUP01", "duplicated-test-case", 5));
        assert!(!index.is_rule_disabled("DUP01", "duplicated-test-case", 6));
        // Never closed
        assert!(index.is_rule_disabled("LEN01", "file-too-long", 7));
    }

    #[test]
    fn test_range_closed_by_other_rule_alias() {
        let by_name = "\
*** Test Cases ***
# suitelint: off=DUP01
One
# suitelint: on=duplicated-test-case
One
";
        let index = index_with_rules(by_name);
        assert!(index.is_rule_disabled("DUP01", "duplicated-test-case", 3));
        assert!(!index.is_rule_disabled("DUP01", "duplicated-test-case", 5));

        let by_id = "\
*** Test Cases ***
# suitelint: off=duplicated-keyword
One
# suitelint: on=DUP02
One
";
        let index = index_with_rules(by_id);
        assert!(index.is_rule_disabled("DUP02", "duplicated-keyword", 3));
        assert!(!index.is_rule_disabled("DUP02", "duplicated-keyword", 5));
        // Other rules are untouched
        assert!(!index.is_rule_disabled("DUP01", "duplicated-test-case", 3));
    }

    #[test]
    fn test_on_without_list_closes_everything() {
        let content = "\
*** Test Cases ***
# suitelint: off=DUP01
# suitelint: off=DUP02
One
# suitelint: on
Two
";
        let index = index(content);
        assert!(index.is_rule_disabled("DUP01", "a", 4));
        assert!(index.is_rule_disabled("DUP02", "b", 4));
        assert!(!index.is_rule_disabled("DUP01", "a", 6));
        assert!(!index.is_rule_disabled("DUP02", "b", 6));
    }

    #[test]
    fn test_inline_disable() {
        let content = "\
*** Test Cases ***
One    # suitelint: off=DUP01
One
";
        let index = index(content);
        assert!(!index.file_disabled());
        assert!(index.is_rule_disabled("DUP01", "duplicated-test-case", 2));
        assert!(!index.is_rule_disabled("DUP01", "duplicated-test-case", 3));
    }

    #[test]
    fn test_disabler_order_independence() {
        let forward = "\
*** Test Cases ***
# suitelint: off=R1
# suitelint: off=R2
One
Two
";
        let backward = "\
*** Test Cases ***
# suitelint: off=R2
# suitelint: off=R1
One
Two
";
        let diagnostics = vec![
            diag("R1", "rule-one", 4),
            diag("R2", "rule-two", 5),
            diag("R3", "rule-three", 5),
        ];
        let filter = |index: &DisablerIndex| -> Vec<Diagnostic> {
            diagnostics
                .iter()
                .filter(|d| !index.is_disabled(d))
                .cloned()
                .collect()
        };

        let a = filter(&index(forward));
        let b = filter(&index(backward));
        assert_eq!(a, b);
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].rule.id, "R3");

        // Filtering again changes nothing
        let again: Vec<_> = a.iter().filter(|d| !index(forward).is_disabled(d)).cloned().collect();
        assert_eq!(again, a);
    }

    #[test]
    fn test_parse_directives() {
        assert_eq!(
            parse_directives("# suitelint: off = DUP01, DUP02"),
            vec![Directive {
                enable: false,
                rules: Some(vec!["DUP01".to_string(), "DUP02".to_string()]),
            }]
        );
        assert_eq!(
            parse_directives("#SUITELINT:ON"),
            vec![Directive {
                enable: true,
                rules: None,
            }]
        );
        assert!(parse_directives("# unrelated comment").is_empty());
    }
}
