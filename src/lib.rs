//! Suitelint - configurable linter for space separated test suite files
//!
//! Discovers suite and resource files, resolves the configuration closest to
//! each of them, runs the registered checkers, drops findings suppressed by
//! inline directives and routes the rest to report sinks.
//!
//! # Architecture
//!
//! ```text
//! CLI -> ConfigManager -> Linter -> Checker -> SuiteFile
//!                            \-> ReportSet -> output / results cache
//! ```
//!
//! # Inline directives
//!
//! ```text
//! # suitelint: off=duplicated-keyword
//! *** Keywords ***
//! ...
//! # suitelint: on
//! ```

pub mod checker;
pub mod checkers;
pub mod config;
pub mod config_manager;
pub mod diagnostic;
pub mod disablers;
pub mod files;
pub mod matcher;
pub mod model;
pub mod reports;
pub mod rule;
pub mod runner;

// Re-export main types
pub use checker::{ActiveRules, Checker, CheckerRegistry, LookupError, ScanContext};
pub use config::{Config, ConfigError, ConfigOverlay, ConfigSource, LinterOverlay};
pub use config_manager::{ConfigManager, ConfigManagerOptions};
pub use diagnostic::{Diagnostic, Position, Range, RuleRef, Severity};
pub use disablers::DisablerIndex;
pub use files::DiscoveryError;
pub use matcher::{RuleMatcher, RuleSelection};
pub use model::{FileKind, ParseError, SourceParser, SuiteFile, TextParser};
pub use reports::{Report, ReportSet};
pub use rule::{Rule, RuleParam, RuleSet, Version, VersionRange};
pub use runner::{LintError, Linter, LinterOptions, RunSummary};
