//! JSON file report

use super::{unknown_param, Report, ReportContext, ReportError};
use crate::config::ConfigError;
use crate::diagnostic::Diagnostic;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct JsonIssue {
    source: String,
    line: usize,
    column: usize,
    end_line: usize,
    end_column: usize,
    severity: String,
    rule_id: String,
    rule_name: String,
    description: String,
}

/// Write every issue to a JSON file
pub struct JsonReport {
    output_dir: PathBuf,
    report_filename: String,
    issues: Vec<Diagnostic>,
}

impl Default for JsonReport {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            report_filename: "suitelint.json".to_string(),
            issues: Vec::new(),
        }
    }
}

impl JsonReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues serialized as a pretty JSON array
    pub fn render(&self, ctx: &ReportContext) -> Result<String, ReportError> {
        let issues: Vec<JsonIssue> = self
            .issues
            .iter()
            .map(|d| JsonIssue {
                source: ctx.relative(&d.source),
                line: d.range.start.line,
                column: d.range.start.col,
                end_line: d.range.end.line,
                end_column: d.range.end.col,
                severity: d.severity.code().to_string(),
                rule_id: d.rule.id.clone(),
                rule_name: d.rule.name.clone(),
                description: d.message.clone(),
            })
            .collect();
        Ok(serde_json::to_string_pretty(&issues)?)
    }
}

/// Write `content` to `output_dir/filename`, creating the directory
pub(crate) fn write_report_file(
    output_dir: &Path,
    filename: &str,
    content: &str,
) -> Result<PathBuf, ReportError> {
    let path = output_dir.join(filename);
    fs::create_dir_all(output_dir).map_err(|source| ReportError::Io {
        path: path.clone(),
        source,
    })?;
    fs::write(&path, content).map_err(|source| ReportError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

impl Report for JsonReport {
    fn name(&self) -> &'static str {
        "json_report"
    }

    fn description(&self) -> &'static str {
        "Produce JSON file with found issues"
    }

    fn default_enabled(&self) -> bool {
        false
    }

    fn configure(&mut self, param: &str, value: &str) -> Result<(), ConfigError> {
        match param {
            "output_dir" => self.output_dir = PathBuf::from(value),
            "report_filename" => self.report_filename = value.to_string(),
            _ => {
                return Err(unknown_param(
                    self.name(),
                    param,
                    &["output_dir", "report_filename"],
                ))
            }
        }
        Ok(())
    }

    fn add_message(&mut self, diagnostic: &Diagnostic) {
        self.issues.push(diagnostic.clone());
    }

    fn get_report(&self, ctx: &ReportContext) -> Result<Option<String>, ReportError> {
        let content = self.render(ctx)?;
        let path = write_report_file(&self.output_dir, &self.report_filename, &content)?;
        Ok(Some(format!("Generated JSON report at {}", path.display())))
    }
}
