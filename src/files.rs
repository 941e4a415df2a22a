//! Source file discovery
//!
//! Directories are walked recursively. Excluded and gitignored directories
//! are pruned before descending; include patterns apply to files. Paths given
//! explicitly are always linted.

use crate::config::{has_config_file, ConfigError};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Source discovery error
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Source path does not exist: {}", .0.display())]
    MissingSource(PathBuf),

    #[error("IO error for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Include / exclude glob patterns for candidate source files
///
/// Patterns are matched against the entry name and against the path
/// relative to the project root.
#[derive(Debug, Clone)]
pub struct FileFilters {
    pub default_include: Vec<String>,
    pub include: Vec<String>,
    pub default_exclude: Vec<String>,
    pub exclude: Vec<String>,
    include_set: GlobSet,
    exclude_set: GlobSet,
}

fn build_set<'a>(patterns: impl Iterator<Item = &'a String>) -> Result<GlobSet, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| ConfigError::InvalidPattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| ConfigError::InvalidPattern {
        pattern: String::new(),
        message: e.to_string(),
    })
}

impl FileFilters {
    pub fn new(
        default_include: Vec<String>,
        include: Vec<String>,
        default_exclude: Vec<String>,
        exclude: Vec<String>,
    ) -> Result<Self, ConfigError> {
        let include_set = build_set(default_include.iter().chain(include.iter()))?;
        let exclude_set = build_set(default_exclude.iter().chain(exclude.iter()))?;
        Ok(Self {
            default_include,
            include,
            default_exclude,
            exclude,
            include_set,
            exclude_set,
        })
    }

    fn matches(set: &GlobSet, path: &Path, relative: &Path) -> bool {
        path.file_name().is_some_and(|name| set.is_match(name)) || set.is_match(relative)
    }

    pub fn is_included(&self, path: &Path, relative: &Path) -> bool {
        Self::matches(&self.include_set, path, relative)
    }

    pub fn is_excluded(&self, path: &Path, relative: &Path) -> bool {
        Self::matches(&self.exclude_set, path, relative)
    }
}

/// Make a path absolute and drop `.` / `..` components without touching
/// the filesystem
pub fn absolute(path: &Path) -> PathBuf {
    let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

fn common_ancestor(paths: &[PathBuf]) -> Option<PathBuf> {
    let mut iter = paths.iter();
    let mut common = iter.next()?.clone();
    for path in iter {
        while !path.starts_with(&common) {
            if !common.pop() {
                return None;
            }
        }
    }
    Some(common)
}

/// Find the project root for a set of sources
///
/// Walks up from the sources' common ancestor to the first directory holding
/// `.git` (unless `ignore_git_dir`) or a configuration file. Falls back to the
/// common ancestor itself.
pub fn find_project_root(sources: &[PathBuf], ignore_git_dir: bool) -> PathBuf {
    let dirs: Vec<PathBuf> = if sources.is_empty() {
        vec![absolute(Path::new("."))]
    } else {
        sources
            .iter()
            .map(|s| {
                let path = absolute(s);
                if path.is_dir() {
                    path
                } else {
                    path.parent().map(Path::to_path_buf).unwrap_or(path)
                }
            })
            .collect()
    };

    let Some(common) = common_ancestor(&dirs) else {
        return absolute(Path::new("/"));
    };

    for dir in common.ancestors() {
        if !ignore_git_dir && dir.join(".git").exists() {
            return dir.to_path_buf();
        }
        if has_config_file(dir) {
            return dir.to_path_buf();
        }
    }
    common
}

/// Walks requested sources and yields candidate files
pub struct SourceDiscovery<'a> {
    root: &'a Path,
    filters: &'a FileFilters,
    gitignore: Option<Gitignore>,
}

impl<'a> SourceDiscovery<'a> {
    /// Create a discovery rooted at the project root
    ///
    /// The root `.gitignore` is honoured unless `skip_gitignore` is set.
    pub fn new(root: &'a Path, filters: &'a FileFilters, skip_gitignore: bool) -> Self {
        let gitignore = if skip_gitignore {
            None
        } else {
            load_gitignore(root)
        };
        Self {
            root,
            filters,
            gitignore,
        }
    }

    fn relative<'p>(&self, path: &'p Path) -> &'p Path {
        path.strip_prefix(self.root).unwrap_or(path)
    }

    fn is_gitignored(&self, path: &Path, is_dir: bool) -> bool {
        self.gitignore
            .as_ref()
            .is_some_and(|gi| gi.matched(path, is_dir).is_ignore())
    }

    fn is_pruned(&self, entry: &DirEntry) -> bool {
        let path = entry.path();
        self.filters.is_excluded(path, self.relative(path))
            || self.is_gitignored(path, entry.file_type().is_dir())
    }

    /// Discover source files; the result is absolute, sorted and deduplicated
    pub fn discover(&self, sources: &[PathBuf]) -> Result<Vec<PathBuf>, DiscoveryError> {
        let mut files = Vec::new();

        for source in sources {
            let source = absolute(source);
            if !source.exists() {
                return Err(DiscoveryError::MissingSource(source));
            }

            if source.is_file() {
                files.push(source);
                continue;
            }

            let walker = WalkDir::new(&source)
                .follow_links(true)
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !self.is_pruned(e));

            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        log::warn!("Skipping unreadable entry: {}", e);
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.path();
                if self.filters.is_included(path, self.relative(path)) {
                    files.push(path.to_path_buf());
                }
            }
        }

        files.sort();
        files.dedup();
        log::debug!("Discovered {} source file(s)", files.len());
        Ok(files)
    }
}

fn load_gitignore(root: &Path) -> Option<Gitignore> {
    let path = root.join(".gitignore");
    if !path.is_file() {
        return None;
    }
    let mut builder = GitignoreBuilder::new(root);
    if let Some(err) = builder.add(&path) {
        log::warn!("Failed to read {}: {}", path.display(), err);
        return None;
    }
    match builder.build() {
        Ok(gitignore) => Some(gitignore),
        Err(err) => {
            log::warn!("Failed to parse {}: {}", path.display(), err);
            None
        }
    }
}
