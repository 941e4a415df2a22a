//! Exit code computed from issue counts and quality gates

use super::{invalid_value, unknown_param, Report, ReportContext, ReportError};
use crate::config::ConfigError;
use crate::diagnostic::{Diagnostic, Severity};
use std::collections::HashMap;

/// Maximum number of issues allowed per severity; `-1` disables a gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityGates {
    gates: HashMap<Severity, i64>,
}

impl Default for QualityGates {
    fn default() -> Self {
        Self {
            gates: Severity::all().into_iter().map(|s| (s, 0)).collect(),
        }
    }
}

impl QualityGates {
    pub fn gate(&self, severity: Severity) -> i64 {
        self.gates.get(&severity).copied().unwrap_or(0)
    }

    /// Whether `count` issues of `severity` pass the gate
    pub fn passes(&self, severity: Severity, count: u64) -> bool {
        let gate = self.gate(severity);
        gate < 0 || count as i64 <= gate
    }
}

impl std::str::FromStr for QualityGates {
    type Err = String;

    /// Parse `E=0:W=10:I=-1`; missing severities keep their default
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut gates = Self::default();
        for part in s.split(':').map(str::trim).filter(|p| !p.is_empty()) {
            let (severity, limit) = part
                .split_once('=')
                .ok_or_else(|| format!("expected SEVERITY=LIMIT, got '{}'", part))?;
            let severity: Severity = severity.parse()?;
            let limit: i64 = limit
                .trim()
                .parse()
                .map_err(|_| format!("'{}' is not a valid limit", limit.trim()))?;
            gates.gates.insert(severity, limit);
        }
        Ok(gates)
    }
}

/// Always enabled; decides the process exit code
#[derive(Default)]
pub struct ReturnStatusReport {
    quality_gates: QualityGates,
    counts: HashMap<Severity, u64>,
}

impl ReturnStatusReport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Report for ReturnStatusReport {
    fn name(&self) -> &'static str {
        super::RETURN_STATUS
    }

    fn description(&self) -> &'static str {
        "Fail the run when issue counts exceed the quality gates"
    }

    fn configure(&mut self, param: &str, value: &str) -> Result<(), ConfigError> {
        match param {
            "quality_gates" => {
                self.quality_gates = value
                    .parse()
                    .map_err(|message| invalid_value(self.name(), param, value, message))?;
                Ok(())
            }
            _ => Err(unknown_param(self.name(), param, &["quality_gates"])),
        }
    }

    fn add_message(&mut self, diagnostic: &Diagnostic) {
        *self.counts.entry(diagnostic.severity).or_default() += 1;
    }

    fn get_report(&self, _ctx: &ReportContext) -> Result<Option<String>, ReportError> {
        Ok(None)
    }

    fn exit_code(&self) -> Option<i32> {
        let failed = Severity::all().into_iter().any(|severity| {
            let count = self.counts.get(&severity).copied().unwrap_or(0);
            !self.quality_gates.passes(severity, count)
        });
        Some(i32::from(failed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{Range, RuleRef};
    use std::path::Path;

    fn diag(severity: Severity) -> Diagnostic {
        Diagnostic::new(
            RuleRef::new("LEN01", "file-too-long"),
            Path::new("a.robot"),
            Range::on_line(1, 1, 1),
            "message",
            severity,
        )
    }

    #[test]
    fn test_default_gates() {
        let mut report = ReturnStatusReport::new();
        assert_eq!(report.exit_code(), Some(0));
        report.add_message(&diag(Severity::Info));
        assert_eq!(report.exit_code(), Some(1));
    }

    #[test]
    fn test_configured_gates() {
        let mut report = ReturnStatusReport::new();
        report.configure("quality_gates", "E=0:W=2:I=-1").unwrap();
        for _ in 0..5 {
            report.add_message(&diag(Severity::Info));
        }
        report.add_message(&diag(Severity::Warning));
        report.add_message(&diag(Severity::Warning));
        assert_eq!(report.exit_code(), Some(0));

        report.add_message(&diag(Severity::Warning));
        assert_eq!(report.exit_code(), Some(1));
    }

    #[test]
    fn test_invalid_gates() {
        let mut report = ReturnStatusReport::new();
        assert!(report.configure("quality_gates", "E0").is_err());
        assert!(report.configure("quality_gates", "X=1").is_err());
        assert!(report.configure("quality_gates", "E=many").is_err());
    }
}
