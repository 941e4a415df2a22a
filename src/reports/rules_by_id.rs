//! Issue counts per rule

use super::{diff_suffix, ComparableReport, Report, ReportContext, ReportError};
use crate::diagnostic::Diagnostic;
use serde_json::Value;
use std::collections::BTreeMap;

/// Counts issues per rule id
#[derive(Default)]
pub struct RulesByIdReport {
    counts: BTreeMap<String, u64>,
    previous: Option<BTreeMap<String, u64>>,
}

impl RulesByIdReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counts(&self) -> &BTreeMap<String, u64> {
        &self.counts
    }
}

impl Report for RulesByIdReport {
    fn name(&self) -> &'static str {
        "rules_by_id"
    }

    fn description(&self) -> &'static str {
        "Group issues by rule id and print the counts"
    }

    fn add_message(&mut self, diagnostic: &Diagnostic) {
        *self.counts.entry(diagnostic.rule.id.clone()).or_default() += 1;
    }

    fn get_report(&self, ctx: &ReportContext) -> Result<Option<String>, ReportError> {
        // Rules present in either run, most frequent first
        let mut ids: Vec<&String> = self.counts.keys().collect();
        if let Some(previous) = &self.previous {
            ids.extend(previous.keys().filter(|id| !self.counts.contains_key(*id)));
        }
        let count_of = |id: &str| self.counts.get(id).copied().unwrap_or(0);
        ids.sort_by(|a, b| count_of(b).cmp(&count_of(a)).then_with(|| a.cmp(b)));

        let mut lines = vec!["Issues by ID:".to_string()];
        if ids.is_empty() {
            lines.push("No issues found.".to_string());
        }
        for id in ids {
            let (severity, name) = match ctx.rules.get(id) {
                Some(rule) => (rule.severity.code(), rule.name.as_str()),
                None => ('?', ""),
            };
            let previous = self
                .previous
                .as_ref()
                .map(|p| p.get(id.as_str()).copied().unwrap_or(0));
            lines.push(format!(
                "{} [{}] {} : {}{}",
                id,
                severity,
                name,
                count_of(id),
                diff_suffix(count_of(id), previous)
            ));
        }
        Ok(Some(lines.join("\n")))
    }

    fn as_comparable(&mut self) -> Option<&mut dyn ComparableReport> {
        Some(self)
    }
}

impl ComparableReport for RulesByIdReport {
    fn persist_result(&self) -> Option<Value> {
        serde_json::to_value(&self.counts).ok()
    }

    fn incorporate_previous(&mut self, previous: Option<Value>) {
        self.previous = previous.and_then(|value| serde_json::from_value(value).ok());
    }
}
