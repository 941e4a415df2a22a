//! Processed files statistics

use super::{diff_suffix, ComparableReport, Report, ReportContext, ReportError};
use crate::diagnostic::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
struct FileCounts {
    files_count: u64,
    files_with_issues: u64,
}

/// Counts processed files and files with at least one issue
#[derive(Default)]
pub struct FileStatsReport {
    files_count: u64,
    files_with_issues: HashSet<PathBuf>,
    previous: Option<FileCounts>,
}

impl FileStatsReport {
    pub fn new() -> Self {
        Self::default()
    }

    fn counts(&self) -> FileCounts {
        FileCounts {
            files_count: self.files_count,
            files_with_issues: self.files_with_issues.len() as u64,
        }
    }
}

impl Report for FileStatsReport {
    fn name(&self) -> &'static str {
        "file_stats"
    }

    fn description(&self) -> &'static str {
        "Print files count and number of files with issues"
    }

    fn add_file(&mut self, _path: &Path) {
        self.files_count += 1;
    }

    fn add_message(&mut self, diagnostic: &Diagnostic) {
        self.files_with_issues.insert(diagnostic.source.clone());
    }

    fn get_report(&self, _ctx: &ReportContext) -> Result<Option<String>, ReportError> {
        let counts = self.counts();
        let previous = self.previous;

        if counts.files_count == 0 {
            return Ok(Some(format!(
                "No files were processed{}.",
                diff_suffix(0, previous.map(|p| p.files_count))
            )));
        }

        let processed = format!(
            "Processed {} file{}{}",
            counts.files_count,
            if counts.files_count == 1 { "" } else { "s" },
            diff_suffix(counts.files_count, previous.map(|p| p.files_count))
        );
        let with_issues = if counts.files_with_issues == 0 {
            "but no files contained issues".to_string()
        } else {
            format!(
                "from which {} file{} contained issues{}",
                counts.files_with_issues,
                if counts.files_with_issues == 1 { "" } else { "s" },
                diff_suffix(counts.files_with_issues, previous.map(|p| p.files_with_issues))
            )
        };
        Ok(Some(format!("{} {}", processed, with_issues)))
    }

    fn as_comparable(&mut self) -> Option<&mut dyn ComparableReport> {
        Some(self)
    }
}

impl ComparableReport for FileStatsReport {
    fn persist_result(&self) -> Option<Value> {
        serde_json::to_value(self.counts()).ok()
    }

    fn incorporate_previous(&mut self, previous: Option<Value>) {
        self.previous = previous.and_then(|value| serde_json::from_value(value).ok());
    }
}
