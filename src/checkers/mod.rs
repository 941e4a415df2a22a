//! Built-in checkers

pub mod duplications;
pub mod lengths;

use crate::checker::Checker;
use std::sync::Arc;

/// Every built-in checker
pub fn builtin() -> Vec<Arc<dyn Checker>> {
    vec![
        Arc::new(duplications::DuplicationsChecker),
        Arc::new(duplications::SectionHeadersChecker),
        Arc::new(lengths::LengthsChecker),
    ]
}
