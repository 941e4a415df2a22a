//! SARIF (Static Analysis Results Interchange Format) report
//!
//! Written to a file, for CI systems that display SARIF results.

use super::json_report::write_report_file;
use super::{unknown_param, Report, ReportContext, ReportError};
use crate::config::ConfigError;
use crate::diagnostic::{Diagnostic, Severity};
use crate::rule::Rule;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

const SARIF_SCHEMA: &str = "https://json.schemastore.org/sarif-2.1.0.json";

#[derive(Serialize)]
struct SarifLog {
    #[serde(rename = "$schema")]
    schema: &'static str,
    version: &'static str,
    runs: Vec<SarifRun>,
}

#[derive(Serialize)]
struct SarifRun {
    tool: SarifTool,
    #[serde(rename = "automationDetails")]
    automation_details: SarifAutomation,
    results: Vec<SarifResult>,
}

#[derive(Serialize)]
struct SarifAutomation {
    id: &'static str,
}

#[derive(Serialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Serialize)]
struct SarifDriver {
    name: &'static str,
    version: &'static str,
    #[serde(rename = "informationUri")]
    information_uri: &'static str,
    rules: Vec<SarifRule>,
}

#[derive(Serialize)]
struct SarifRule {
    id: String,
    name: String,
    #[serde(rename = "shortDescription")]
    short_description: SarifMessage,
    #[serde(rename = "fullDescription")]
    full_description: SarifMessage,
    #[serde(rename = "defaultConfiguration")]
    default_configuration: SarifConfiguration,
}

#[derive(Serialize)]
struct SarifConfiguration {
    level: &'static str,
}

#[derive(Serialize)]
struct SarifResult {
    #[serde(rename = "ruleId")]
    rule_id: String,
    level: &'static str,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
}

#[derive(Serialize)]
struct SarifMessage {
    text: String,
}

#[derive(Serialize)]
struct SarifLocation {
    #[serde(rename = "physicalLocation")]
    physical_location: SarifPhysicalLocation,
}

#[derive(Serialize)]
struct SarifPhysicalLocation {
    #[serde(rename = "artifactLocation")]
    artifact_location: SarifArtifactLocation,
    region: SarifRegion,
}

#[derive(Serialize)]
struct SarifArtifactLocation {
    uri: String,
    #[serde(rename = "uriBaseId")]
    uri_base_id: &'static str,
}

#[derive(Serialize)]
struct SarifRegion {
    #[serde(rename = "startLine")]
    start_line: usize,
    #[serde(rename = "startColumn")]
    start_column: usize,
    #[serde(rename = "endLine")]
    end_line: usize,
    #[serde(rename = "endColumn")]
    end_column: usize,
}

fn severity_to_level(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "note",
    }
}

fn sarif_rule(rule: &Rule) -> SarifRule {
    SarifRule {
        id: rule.id.clone(),
        name: rule.name.clone(),
        short_description: SarifMessage {
            text: rule.message.clone(),
        },
        full_description: SarifMessage {
            text: rule.description.clone(),
        },
        default_configuration: SarifConfiguration {
            level: severity_to_level(rule.severity),
        },
    }
}

/// Write every issue to a SARIF file
pub struct SarifReport {
    output_dir: PathBuf,
    report_filename: String,
    issues: Vec<Diagnostic>,
}

impl Default for SarifReport {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            report_filename: "suitelint.sarif.json".to_string(),
            issues: Vec::new(),
        }
    }
}

impl SarifReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// SARIF document for the collected issues
    pub fn render(&self, ctx: &ReportContext) -> Result<String, ReportError> {
        // Enabled rules plus any rule that produced an issue
        let mut rules: BTreeMap<&str, SarifRule> = ctx
            .rules
            .iter()
            .filter(|rule| rule.enabled)
            .map(|rule| (rule.id.as_str(), sarif_rule(rule)))
            .collect();
        for issue in &self.issues {
            if let Some(rule) = ctx.rules.get(&issue.rule.id) {
                rules
                    .entry(rule.id.as_str())
                    .or_insert_with(|| sarif_rule(rule));
            }
        }

        let results = self
            .issues
            .iter()
            .map(|d| SarifResult {
                rule_id: d.rule.id.clone(),
                level: severity_to_level(d.severity),
                message: SarifMessage {
                    text: d.message.clone(),
                },
                locations: vec![SarifLocation {
                    physical_location: SarifPhysicalLocation {
                        artifact_location: SarifArtifactLocation {
                            uri: ctx.relative(&d.source),
                            uri_base_id: "%SRCROOT%",
                        },
                        region: SarifRegion {
                            start_line: d.range.start.line,
                            start_column: d.range.start.col,
                            end_line: d.range.end.line,
                            end_column: d.range.end.col,
                        },
                    },
                }],
            })
            .collect();

        let log = SarifLog {
            schema: SARIF_SCHEMA,
            version: "2.1.0",
            runs: vec![SarifRun {
                tool: SarifTool {
                    driver: SarifDriver {
                        name: env!("CARGO_PKG_NAME"),
                        version: env!("CARGO_PKG_VERSION"),
                        information_uri: env!("CARGO_PKG_REPOSITORY"),
                        rules: rules.into_values().collect(),
                    },
                },
                automation_details: SarifAutomation {
                    id: "suitelint/",
                },
                results,
            }],
        };

        Ok(serde_json::to_string_pretty(&log)?)
    }
}

impl Report for SarifReport {
    fn name(&self) -> &'static str {
        "sarif"
    }

    fn description(&self) -> &'static str {
        "Generate SARIF output file"
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
        Ok(Some(format!("Generated SARIF report at {}", path.display())))
    }
}
