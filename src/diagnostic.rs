//! Diagnostic types for linting results

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// Severity level for diagnostics
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    #[default]
    Info,
    /// Warning - potential issue
    Warning,
    /// Error - definite problem
    Error,
}

impl Severity {
    /// Single letter code used in issue formats and quality gates
    pub fn code(&self) -> char {
        match self {
            Severity::Info => 'I',
            Severity::Warning => 'W',
            Severity::Error => 'E',
        }
    }

    /// All severities, lowest first
    pub fn all() -> [Severity; 3] {
        [Severity::Info, Severity::Warning, Severity::Error]
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "i" | "info" | "hint" | "note" => Ok(Severity::Info),
            "w" | "warning" | "warn" => Ok(Severity::Warning),
            "e" | "error" | "err" => Ok(Severity::Error),
            _ => Err(format!(
                "Unknown severity '{}' (expected one of: I, W, E, info, warning, error)",
                s
            )),
        }
    }
}

/// A position in a source file (both 1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

/// Start/end span of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Span covering `length` characters of a single line
    pub fn on_line(line: usize, col: usize, length: usize) -> Self {
        Self {
            start: Position::new(line, col),
            end: Position::new(line, col + length),
        }
    }
}

/// Identity of the rule that produced a diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleRef {
    /// Rule id (e.g. "DUP01")
    pub id: String,
    /// Rule name (e.g. "duplicated-test-case")
    pub name: String,
}

impl RuleRef {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}

/// A lint diagnostic
///
/// Diagnostics are immutable once created. They are ordered by
/// `(source, start line, start column, rule id)`; the remaining fields only
/// break ties so the order stays total.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Rule that triggered this diagnostic
    pub rule: RuleRef,
    /// Source file path
    pub source: PathBuf,
    /// Location of the finding
    pub range: Range,
    /// Human-readable message
    pub message: String,
    /// Severity of this particular finding
    pub severity: Severity,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(rule: RuleRef, source: &Path, range: Range, message: &str, severity: Severity) -> Self {
        Self {
            rule,
            source: source.to_path_buf(),
            range,
            message: message.to_string(),
            severity,
        }
    }
}

impl Ord for Diagnostic {
    fn cmp(&self, other: &Self) -> Ordering {
        self.source
            .cmp(&other.source)
            .then(self.range.start.line.cmp(&other.range.start.line))
            .then(self.range.start.col.cmp(&other.range.start.col))
            .then_with(|| self.rule.id.cmp(&other.rule.id))
            .then_with(|| self.range.end.cmp(&other.range.end))
            .then_with(|| self.severity.cmp(&other.severity))
            .then_with(|| self.message.cmp(&other.message))
            .then_with(|| self.rule.name.cmp(&other.rule.name))
    }
}

impl PartialOrd for Diagnostic {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
