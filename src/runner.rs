//! Diagnostic pipeline
//!
//! Configurations are resolved for every discovered file first, so any
//! setup error aborts the run before a single file is scanned. Files are
//! then scanned (optionally in parallel) and their diagnostics are handed
//! to the report sinks in discovery order.

use crate::checker::{ActiveRules, CheckerRegistry, LookupError, ScanContext};
use crate::config::{Config, ConfigError};
use crate::config_manager::ConfigManager;
use crate::diagnostic::Diagnostic;
use crate::disablers::DisablerIndex;
use crate::files::DiscoveryError;
use crate::matcher::RuleMatcher;
use crate::model::{FileKind, ParseError, SourceParser, TextParser};
use crate::reports::{self, ReportContext, ReportSet, ResultsCache};
use crate::rule::RuleSetError;
use rayon::prelude::*;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Fatal error of a lint run
#[derive(Debug, Error)]
pub enum LintError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Registry(#[from] RuleSetError),

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

impl LintError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Execution settings of a [`Linter`]
#[derive(Debug, Clone, Default)]
pub struct LinterOptions {
    /// Scan files in parallel
    pub parallel: bool,

    /// Number of worker threads (0 = number of CPUs)
    pub jobs: usize,

    /// Results cache file, defaults to the user cache directory
    pub results_cache: Option<PathBuf>,
}

/// Outcome of a lint run
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Process exit code
    pub exit_code: i32,

    /// Number of reported issues
    pub issues: usize,

    /// Files scanned successfully
    pub files_scanned: usize,

    /// Files skipped because they could not be parsed
    pub skipped: Vec<PathBuf>,

    /// Every reported diagnostic, in reporting order
    pub diagnostics: Vec<Diagnostic>,
}

/// A file with its resolved configuration and rule state
struct ScanJob {
    path: PathBuf,
    config: Arc<Config>,
    rules: Arc<ActiveRules>,
}

/// Runs the checkers over the discovered sources
pub struct Linter {
    registry: CheckerRegistry,
    parser: Box<dyn SourceParser>,
    options: LinterOptions,
}

impl Linter {
    pub fn new(registry: CheckerRegistry) -> Self {
        Self {
            registry,
            parser: Box::new(TextParser),
            options: LinterOptions::default(),
        }
    }

    /// Linter with the built-in checkers
    pub fn with_builtin() -> Result<Self, LintError> {
        Ok(Self::new(CheckerRegistry::with_builtin()?))
    }

    pub fn with_parser(mut self, parser: Box<dyn SourceParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_options(mut self, options: LinterOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &CheckerRegistry {
        &self.registry
    }

    /// Lint every source of `manager` and write report output to `out`
    pub fn run(
        &self,
        manager: &mut ConfigManager,
        out: &mut dyn Write,
    ) -> Result<RunSummary, LintError> {
        let default = manager.default_config();
        let mut reports = Self::prepare_reports(&default)?;
        let report_names = reports.names();
        let files = manager.discover()?;
        log::debug!("Discovered {} file(s)", files.len());

        // Resolve every configuration before scanning
        let mut prepared: Vec<(Arc<Config>, Arc<ActiveRules>)> = Vec::new();
        let default_rules = self.active_rules_for(&default, &report_names, &mut prepared)?;
        let mut jobs = Vec::with_capacity(files.len());
        for path in files {
            let config = manager.config_for(&path)?;
            let rules = self.active_rules_for(&config, &report_names, &mut prepared)?;
            jobs.push(ScanJob {
                path,
                config,
                rules,
            });
        }

        let outcomes: Vec<Result<Vec<Diagnostic>, ParseError>> = if self.options.parallel {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(if self.options.jobs > 0 {
                    self.options.jobs
                } else {
                    num_cpus::get()
                })
                .build();
            match pool {
                Ok(pool) => pool.install(|| jobs.par_iter().map(|job| self.scan(job)).collect()),
                Err(e) => {
                    log::warn!("Failed to start worker threads, scanning sequentially: {}", e);
                    jobs.iter().map(|job| self.scan(job)).collect()
                }
            }
        } else {
            jobs.iter().map(|job| self.scan(job)).collect()
        };

        let mut summary = RunSummary::default();
        for (job, outcome) in jobs.iter().zip(outcomes) {
            match outcome {
                Ok(diagnostics) => {
                    summary.files_scanned += 1;
                    reports.add_file(&job.path);
                    for diagnostic in &diagnostics {
                        reports.add_message(diagnostic);
                    }
                    summary.issues += diagnostics.len();
                    summary.diagnostics.extend(diagnostics);
                }
                Err(e) => {
                    log::warn!("{}. Skipping file", e);
                    summary.skipped.push(job.path.clone());
                }
            }
        }

        let cache = ResultsCache::new(
            self.options
                .results_cache
                .clone()
                .unwrap_or_else(ResultsCache::default_location),
        );

        if default.linter.compare {
            let mut previous = cache.load_for_root(manager.root());
            for report in reports.iter_mut() {
                let name = report.name();
                if let Some(comparable) = report.as_comparable() {
                    comparable.incorporate_previous(previous.remove(name));
                }
            }
        }

        let ctx = ReportContext {
            root: manager.root(),
            rules: &default_rules.rules,
            config: &default,
        };
        for report in reports.iter() {
            match report.get_report(&ctx) {
                Ok(Some(output)) => writeln!(out, "{}", output)?,
                Ok(None) => {}
                Err(e) => log::error!("Report '{}' failed: {}", report.name(), e),
            }
        }

        if default.linter.persistent {
            let mut results = reports::RootResults::new();
            for report in reports.iter_mut() {
                let name = report.name();
                if let Some(value) = report.as_comparable().and_then(|c| c.persist_result()) {
                    results.insert(name.to_string(), value);
                }
            }
            if let Err(e) = cache.save_for_root(manager.root(), results) {
                log::warn!("Failed to save report results: {}", e);
            }
        }

        summary.exit_code = if default.exit_zero {
            0
        } else if let Some(code) = reports.exit_code() {
            code
        } else {
            i32::from(summary.issues > 0)
        };
        Ok(summary)
    }

    /// Rule state for `config`, prepared once per configuration
    fn active_rules_for(
        &self,
        config: &Arc<Config>,
        reports: &[&str],
        prepared: &mut Vec<(Arc<Config>, Arc<ActiveRules>)>,
    ) -> Result<Arc<ActiveRules>, LintError> {
        if let Some((_, rules)) = prepared.iter().find(|(c, _)| Arc::ptr_eq(c, config)) {
            return Ok(Arc::clone(rules));
        }
        let rules = Arc::new(self.prepare_rules(config, reports)?);
        prepared.push((Arc::clone(config), Arc::clone(&rules)));
        Ok(rules)
    }

    /// Apply `configure` directives and refresh rule enablement
    ///
    /// Directives aimed at one of the selected `reports` are left to
    /// [`Linter::run`]; any other unknown target is an error.
    pub fn prepare_rules(&self, config: &Config, reports: &[&str]) -> Result<ActiveRules, LintError> {
        let mut rules = self.registry.rules().clone();

        for directive in &config.linter.configure {
            match rules.get_mut(&directive.target) {
                Some(rule) => {
                    if let Some(warning) = rule.deprecation_warning() {
                        log::warn!("{}", warning);
                        continue;
                    }
                    rule.configure(&directive.param, &directive.value)?;
                }
                // Reports are configured once, from the default configuration
                None if reports.contains(&directive.target.as_str()) => {}
                None => {
                    return Err(LookupError::RuleOrReportNotFound(directive.target.clone()).into())
                }
            }
        }

        let matcher = RuleMatcher::new(&config.linter);
        rules.refresh_enabled(|rule| matcher.is_enabled(rule));
        log::debug!(
            "Configuration {}: {} of {} rules enabled",
            config.source,
            rules.iter().filter(|r| r.enabled).count(),
            rules.len()
        );

        Ok(ActiveRules::new(
            &self.registry,
            rules,
            config.linter.threshold,
        ))
    }

    /// Select the report sinks and apply report-targeted directives
    fn prepare_reports(config: &Config) -> Result<ReportSet, LintError> {
        let mut reports = ReportSet::select(&config.linter.reports)?;
        for directive in &config.linter.configure {
            // Rules are configured in `prepare_rules`
            if !reports::is_known(&directive.target) {
                continue;
            }
            match reports.get_mut(&directive.target) {
                Some(report) => report.configure(&directive.param, &directive.value)?,
                None => {
                    return Err(LookupError::RuleOrReportNotFound(directive.target.clone()).into())
                }
            }
        }
        Ok(reports)
    }

    /// Diagnostics of one file, filtered and sorted
    fn scan(&self, job: &ScanJob) -> Result<Vec<Diagnostic>, ParseError> {
        let kind = FileKind::from_path(&job.path);
        let file = self.parser.parse(&job.path, kind, &job.config.language)?;

        let disablers = DisablerIndex::with_rules(&file, &job.rules.rules);
        if disablers.file_disabled() {
            log::debug!("{} is disabled by a directive", job.path.display());
            return Ok(Vec::new());
        }

        let ctx = ScanContext {
            rules: &job.rules.rules,
            source: &job.path,
            templated: file.is_templated(),
        };
        let mut diagnostics: Vec<Diagnostic> = self
            .registry
            .checkers()
            .filter(|checker| !job.rules.is_checker_disabled(checker.name()))
            .flat_map(|checker| checker.scan(&file, &ctx))
            .filter(|d| !disablers.is_disabled(d) && job.rules.accepts(d))
            .collect();
        diagnostics.sort();
        Ok(diagnostics)
    }
}
