//! Closest-configuration resolution
//!
//! Every source file is governed by the configuration file closest to it.
//! The walk from a file's directory upwards stops at the first directory
//! holding a configuration file, at the project root, at a directory
//! holding `.git` or at the filesystem root. All directories visited on the
//! way share one cached `Arc<Config>`.

use crate::config::{find_config_in, Config, ConfigError, ConfigOverlay, ConfigSource};
use crate::files::{absolute, find_project_root, DiscoveryError, SourceDiscovery};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Inputs of a [`ConfigManager`]
#[derive(Debug, Clone, Default)]
pub struct ConfigManagerOptions {
    /// Sources requested on the command line
    pub sources: Vec<PathBuf>,

    /// Explicit configuration file; disables discovery
    pub config: Option<PathBuf>,

    /// Explicit project root
    pub root: Option<PathBuf>,

    /// Do not stop at directories holding `.git`
    pub ignore_git_dir: bool,

    /// Do not honour the root `.gitignore`
    pub skip_gitignore: bool,

    /// Command line layer, wins over every file
    pub overlay: ConfigOverlay,
}

/// Maps source paths to the configuration governing them
pub struct ConfigManager {
    root: PathBuf,
    sources: Vec<PathBuf>,
    overlay: ConfigOverlay,
    default: Arc<Config>,
    overridden_config: bool,
    ignore_git_dir: bool,
    skip_gitignore: bool,
    cache: HashMap<PathBuf, Arc<Config>>,
    probes: usize,
}

impl ConfigManager {
    /// Resolve the project root and the default configuration
    pub fn new(options: ConfigManagerOptions) -> Result<Self, ConfigError> {
        let sources: Vec<PathBuf> = options.sources.iter().map(|s| absolute(s)).collect();
        let root = match &options.root {
            Some(root) => absolute(root),
            None => find_project_root(&sources, options.ignore_git_dir),
        };

        let (default, overridden_config) = match &options.config {
            Some(path) => {
                let path = absolute(path);
                let file = ConfigOverlay::load(&path)?.unwrap_or_default();
                let base_dir = path.parent().unwrap_or(&root).to_path_buf();
                let config = Config::resolve(
                    options.overlay.clone().or(file),
                    ConfigSource::File(path),
                    &base_dir,
                )?;
                (config, true)
            }
            None => match find_config_in(&root)? {
                Some((path, file)) => (
                    Config::resolve(
                        options.overlay.clone().or(file),
                        ConfigSource::File(path),
                        &root,
                    )?,
                    false,
                ),
                None => (
                    Config::resolve(options.overlay.clone(), ConfigSource::Default, &root)?,
                    false,
                ),
            },
        };

        log::debug!(
            "Project root: {}, default configuration: {}",
            root.display(),
            default.source
        );

        Ok(Self {
            root,
            sources,
            overlay: options.overlay,
            default: Arc::new(default),
            overridden_config,
            ignore_git_dir: options.ignore_git_dir,
            skip_gitignore: options.skip_gitignore,
            cache: HashMap::new(),
            probes: 0,
        })
    }

    /// Project root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Configuration of the project root (or the explicit `--config`)
    pub fn default_config(&self) -> Arc<Config> {
        Arc::clone(&self.default)
    }

    /// Whether an explicit configuration file governs every source
    pub fn is_overridden(&self) -> bool {
        self.overridden_config
    }

    /// Number of directories probed for configuration files so far
    pub fn probe_count(&self) -> usize {
        self.probes
    }

    /// Sources to lint: command line, then configuration, then the
    /// working directory
    pub fn sources(&self) -> Vec<PathBuf> {
        if !self.sources.is_empty() {
            return self.sources.clone();
        }
        if !self.default.sources.is_empty() {
            return self.default.sources.iter().map(|s| absolute(s)).collect();
        }
        vec![absolute(Path::new("."))]
    }

    /// Discover candidate source files using the default configuration's filters
    pub fn discover(&self) -> Result<Vec<PathBuf>, DiscoveryError> {
        SourceDiscovery::new(&self.root, &self.default.file_filters, self.skip_gitignore)
            .discover(&self.sources())
    }

    /// Configuration governing `path`
    ///
    /// Failed loads are not cached.
    pub fn config_for(&mut self, path: &Path) -> Result<Arc<Config>, ConfigError> {
        if self.overridden_config {
            return Ok(Arc::clone(&self.default));
        }

        let path = absolute(path);
        let start = if path.is_dir() {
            path
        } else {
            path.parent().map(Path::to_path_buf).unwrap_or(path)
        };

        let mut visited = Vec::new();
        let mut found = None;
        let mut current = Some(start.as_path());

        while let Some(dir) = current {
            if let Some(cached) = self.cache.get(dir) {
                log::debug!("Configuration cache hit for {}", dir.display());
                found = Some(Arc::clone(cached));
                break;
            }

            visited.push(dir.to_path_buf());
            self.probes += 1;

            if let Some((config_path, file)) = find_config_in(dir)? {
                found = Some(self.resolve_file(dir, config_path, file)?);
                break;
            }
            if dir == self.root || (!self.ignore_git_dir && dir.join(".git").exists()) {
                break;
            }
            current = dir.parent();
        }

        let config = found.unwrap_or_else(|| Arc::clone(&self.default));
        for dir in visited {
            self.cache.insert(dir, Arc::clone(&config));
        }
        Ok(config)
    }

    fn resolve_file(
        &self,
        dir: &Path,
        config_path: PathBuf,
        file: ConfigOverlay,
    ) -> Result<Arc<Config>, ConfigError> {
        if self.default.source == ConfigSource::File(config_path.clone()) {
            return Ok(Arc::clone(&self.default));
        }
        log::debug!("Loaded configuration {}", config_path.display());
        let config = Config::resolve(
            self.overlay.clone().or(file),
            ConfigSource::File(config_path),
            dir,
        )?;
        Ok(Arc::new(config))
    }
}
