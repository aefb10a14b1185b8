//! # Invoice Recon
//!
//! A reconciliation library for supplier-invoice bookkeeping: given a
//! double-entry ledger exported in the SIE interchange format, it determines
//! for every invoice-liability posting whether and when it was paid, and
//! flags anomalies for review.
//!
//! ## Features
//!
//! - **SIE reading**: transaction-level parsing of type 4 ledger exports
//! - **Event classification**: receipts, bank clearings and corrections
//!   derived from raw vouchers
//! - **Matching engine**: exact and heuristic pairing with bulk-payment
//!   balance tracking and cross-year settlement
//! - **Correction handling**: correction pairs and out-of-band payment
//!   corrections excluded or resolved from free-text cross-references
//! - **Reporting**: CSV validation table and bookkeeping summary
//!
//! ## Quick Start
//!
//! ```rust
//! use invoice_recon::{InvoiceMatcher, Transaction, Voucher};
//! use bigdecimal::BigDecimal;
//! use chrono::NaiveDate;
//! use std::str::FromStr;
//!
//! let mut invoice = Voucher::new(
//!     "A",
//!     110,
//!     NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
//!     "Leverantörsfaktura - Mottagen - Nibe AB - 49620108",
//! );
//! invoice.add_transaction(Transaction::new(
//!     "2440",
//!     BigDecimal::from_str("-2636.00").unwrap(),
//! ));
//! invoice.add_transaction(Transaction::new(
//!     "4010",
//!     BigDecimal::from_str("2636.00").unwrap(),
//! ));
//!
//! let cases = InvoiceMatcher::new().match_all(&[invoice], Some(2024));
//! assert_eq!(cases.len(), 1);
//! ```

pub mod matching;
pub mod report;
pub mod sie;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use matching::*;
pub use report::*;
pub use types::*;
