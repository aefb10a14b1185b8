//! Report generation
//!
//! Renders matching results as CSV for review in a spreadsheet: a
//! validation table with one row per invoice case and a financial summary
//! that reconciles the matcher's filtered view against the raw bookkeeping
//! totals. Amounts use the Swedish decimal-comma convention.

mod summary;
mod validation;

pub use summary::*;
pub use validation::*;
