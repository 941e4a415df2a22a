//! Results cache for comparing report results across runs
//!
//! One JSON file maps an absolute project root to the persisted result of
//! every comparable report.

use super::ReportError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted results of one project: report name -> result
pub type RootResults = BTreeMap<String, Value>;

/// Results cache stored as a single JSON file
pub struct ResultsCache {
    path: PathBuf,
}

impl ResultsCache {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// `<cache dir>/suitelint/results.json`, falling back to the working directory
    pub fn default_location() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("suitelint")
            .join("results.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the whole cache; a missing or corrupt file is an empty cache
    pub fn load(&self) -> BTreeMap<String, RootResults> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return BTreeMap::new(),
        };
        match serde_json::from_str(&content) {
            Ok(results) => results,
            Err(e) => {
                log::warn!(
                    "Ignoring corrupt results cache {}: {}",
                    self.path.display(),
                    e
                );
                BTreeMap::new()
            }
        }
    }

    /// Results previously saved for `root`
    pub fn load_for_root(&self, root: &Path) -> RootResults {
        let key = root.to_string_lossy().to_string();
        self.load().remove(&key).unwrap_or_default()
    }

    /// Replace the results of `root`, keeping every other root
    pub fn save_for_root(&self, root: &Path, results: RootResults) -> Result<(), ReportError> {
        let mut all = self.load();
        all.insert(root.to_string_lossy().to_string(), results);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| ReportError::Io {
                path: self.path.clone(),
                source,
            })?;
        }
        let content = serde_json::to_string_pretty(&all)?;
        fs::write(&self.path, content).map_err(|source| ReportError::Io {
            path: self.path.clone(),
            source,
        })?;
        log::debug!("Saved report results to {}", self.path.display());
        Ok(())
    }
}
