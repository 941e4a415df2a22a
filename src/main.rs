//! Suitelint CLI
//!
//! Lints space separated test suite files and lists or describes the
//! available rules and reports.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;
use suitelint::config::{ConfigOverlay, LinterOverlay};
use suitelint::reports;
use suitelint::{
    CheckerRegistry, ConfigManager, ConfigManagerOptions, LintError, Linter, LinterOptions,
    ReportSet, Rule, Severity,
};

#[derive(Parser)]
#[command(
    name = "suitelint",
    version,
    about = "Test suite linter",
    long_about = "A configurable linter for space separated test suite and resource files."
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lint files
    Check(CheckArgs),

    /// List rules or reports
    List {
        #[command(subcommand)]
        what: ListCommand,
    },

    /// Show details of a rule
    Describe {
        /// Rule id or name
        rule: String,
    },
}

#[derive(Subcommand)]
enum ListCommand {
    /// List rules, optionally filtered by an id/name pattern
    Rules {
        /// Pattern such as `DUP*` or `*-too-long`
        pattern: Option<String>,

        /// Configuration file used for the enabled state
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List available reports
    Reports,
}

#[derive(Args)]
struct CheckArgs {
    /// Files or directories to lint
    sources: Vec<PathBuf>,

    /// Configuration file; disables closest-configuration discovery
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Project root (default: detected from the sources)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Do not stop at directories holding .git
    #[arg(long)]
    ignore_git_dir: bool,

    /// Do not honour .gitignore
    #[arg(long)]
    skip_gitignore: bool,

    /// Rules to include (ids, names or globs, comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    select: Option<Vec<String>>,

    /// Rules to exclude (ids, names or globs, comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    ignore: Option<Vec<String>>,

    /// Minimum severity: I, W or E
    #[arg(short, long)]
    threshold: Option<String>,

    /// Rule or report parameter, e.g. file-too-long.max_lines=500
    #[arg(long = "configure", value_name = "NAME.PARAM=VALUE")]
    configure: Option<Vec<String>>,

    /// Reports to enable (comma-separated, `all` or `None`)
    #[arg(short, long, value_delimiter = ',')]
    reports: Option<Vec<String>>,

    /// Save comparable report results for the next run
    #[arg(long)]
    persistent: bool,

    /// Compare report results with the previous run
    #[arg(long)]
    compare: bool,

    /// Format of printed issues
    #[arg(long)]
    issue_format: Option<String>,

    /// Language version to evaluate rules for, e.g. 7.0
    #[arg(long)]
    target_version: Option<String>,

    /// Languages of section headers (comma-separated)
    #[arg(long, value_delimiter = ',')]
    language: Option<Vec<String>>,

    /// Additional include patterns
    #[arg(long, value_delimiter = ',')]
    include: Option<Vec<String>>,

    /// Additional exclude patterns
    #[arg(long, value_delimiter = ',')]
    exclude: Option<Vec<String>>,

    /// Always exit with 0
    #[arg(long)]
    exit_zero: bool,

    /// Scan files in parallel
    #[arg(long)]
    parallel: bool,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long, default_value = "0")]
    jobs: usize,

    /// Results cache file used by --persistent and --compare
    #[arg(long)]
    cache_file: Option<PathBuf>,
}

impl CheckArgs {
    /// Command line layer; unset flags leave file values alone
    fn overlay(&self) -> ConfigOverlay {
        ConfigOverlay {
            language: self.language.clone(),
            exit_zero: self.exit_zero.then_some(true),
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            linter: LinterOverlay {
                select: self.select.clone(),
                ignore: self.ignore.clone(),
                threshold: self.threshold.clone(),
                configure: self.configure.clone(),
                reports: self.reports.clone(),
                persistent: self.persistent.then_some(true),
                compare: self.compare.then_some(true),
                issue_format: self.issue_format.clone(),
                target_version: self.target_version.clone(),
            },
            ..Default::default()
        }
    }
}

fn severity_colored(severity: Severity) -> colored::ColoredString {
    match severity {
        Severity::Error => "E".red(),
        Severity::Warning => "W".yellow(),
        Severity::Info => "I".blue(),
    }
}

fn check(args: CheckArgs) -> Result<i32> {
    let mut manager = ConfigManager::new(ConfigManagerOptions {
        sources: args.sources.clone(),
        config: args.config.clone(),
        root: args.root.clone(),
        ignore_git_dir: args.ignore_git_dir,
        skip_gitignore: args.skip_gitignore,
        overlay: args.overlay(),
    })
    .map_err(LintError::from)?;

    let linter = Linter::with_builtin()?.with_options(LinterOptions {
        parallel: args.parallel,
        jobs: args.jobs,
        results_cache: args.cache_file.clone(),
    });

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let summary = linter.run(&mut manager, &mut out)?;
    out.flush()?;

    log::debug!(
        "Scanned {} file(s), skipped {}, {} issue(s)",
        summary.files_scanned,
        summary.skipped.len(),
        summary.issues
    );
    Ok(summary.exit_code)
}

fn list_rules(pattern: Option<&str>, config: Option<PathBuf>) -> Result<i32> {
    let linter = Linter::with_builtin()?;
    let manager = ConfigManager::new(ConfigManagerOptions {
        sources: vec![PathBuf::from(".")],
        config,
        ..Default::default()
    })
    .map_err(LintError::from)?;
    let default = manager.default_config();
    let selected = ReportSet::select(&default.linter.reports).map_err(LintError::from)?;
    let active = linter.prepare_rules(&default, &selected.names())?;

    let matching = linter
        .registry()
        .matching(pattern)
        .map_err(LintError::from)?;
    let mut enabled = 0;
    for rule in &matching {
        let state = match active.rules.get(&rule.id) {
            Some(rule) if rule.enabled => {
                enabled += 1;
                "enabled".green()
            }
            _ => "disabled".red(),
        };
        println!(
            "{} [{}] {}: {} ({})",
            rule.id.cyan(),
            severity_colored(rule.severity),
            rule.name,
            rule.message,
            state
        );
    }
    println!(
        "\nAltogether {} rule(s), {} enabled.",
        matching.len(),
        enabled
    );
    Ok(0)
}

fn list_reports() -> Result<i32> {
    for report in reports::available() {
        let state = if report.name() == reports::RETURN_STATUS {
            "always enabled".green()
        } else if report.default_enabled() {
            "included in 'all'".normal()
        } else {
            "enable explicitly".yellow()
        };
        println!(
            "{} - {} ({})",
            report.name().cyan(),
            report.description(),
            state
        );
    }
    Ok(0)
}

fn print_rule(rule: &Rule) {
    println!("{}", "Rule Details".bold());
    println!();
    println!("  {}: {}", "ID".bold(), rule.id.cyan());
    println!("  {}: {}", "Name".bold(), rule.name);
    println!("  {}: {}", "Severity".bold(), severity_colored(rule.severity));
    println!("  {}: {}", "Versions".bold(), rule.version);
    if !rule.default_enabled {
        println!("  {}: {}", "Enabled".bold(), "only when selected".yellow());
    }
    if rule.deprecated {
        println!("  {}: {}", "Status".bold(), "deprecated".red());
    }
    println!("  {}: {}", "Message".bold(), rule.message);
    if !rule.description.is_empty() {
        println!();
        println!("  {}", "Description".bold());
        println!("    {}", rule.description);
    }
    if !rule.params.is_empty() {
        println!();
        println!("  {}", "Parameters".bold());
        for param in &rule.params {
            let default = param
                .default
                .as_ref()
                .map(|value| value.to_string())
                .unwrap_or_else(|| "unset".to_string());
            println!(
                "    {} ({}, default: {}): {}",
                param.name.cyan(),
                param.kind,
                default,
                param.description
            );
        }
    }
}

fn describe(rule: &str) -> Result<i32> {
    let registry = CheckerRegistry::with_builtin().map_err(LintError::from)?;
    let rule = registry.describe(rule).map_err(LintError::from)?;
    print_rule(rule);
    Ok(0)
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Check(args) => check(args),
        Commands::List { what } => match what {
            ListCommand::Rules { pattern, config } => list_rules(pattern.as_deref(), config),
            ListCommand::Reports => list_reports(),
        },
        Commands::Describe { rule } => describe(&rule),
    }
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            e.downcast_ref::<LintError>()
                .map(LintError::exit_code)
                .unwrap_or(2)
        }
    };
    std::process::exit(code);
}
