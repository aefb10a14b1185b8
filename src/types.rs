//! Core types and data structures for the reconciliation system

use bigdecimal::BigDecimal;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::utils::amounts::approx_zero;

/// Account code holding unpaid supplier-invoice balances (Leverantörsskulder).
pub const LIABILITY_ACCOUNT: &str = "2440";

/// Account code representing settled bank funds (Företagskonto).
pub const CASH_ACCOUNT: &str = "1930";

/// A single posting line within a voucher.
///
/// Amounts follow the ledger sign convention: negative is a credit, positive
/// is a debit. A transaction is immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Ledger account code (e.g. "2440")
    pub account: String,
    /// Signed amount; negative = credit, positive = debit
    pub amount: BigDecimal,
    /// Optional posting date (the voucher date applies when absent)
    pub date: Option<NaiveDate>,
    /// Free-text line description
    pub description: String,
}

impl Transaction {
    /// Create a new transaction line.
    pub fn new(account: impl Into<String>, amount: BigDecimal) -> Self {
        Self {
            account: account.into(),
            amount,
            date: None,
            description: String::new(),
        }
    }

    /// Create a new transaction line with a description.
    pub fn with_description(
        account: impl Into<String>,
        amount: BigDecimal,
        description: impl Into<String>,
    ) -> Self {
        Self {
            account: account.into(),
            amount,
            date: None,
            description: description.into(),
        }
    }

    /// True when the amount is a credit (negative).
    pub fn is_credit(&self) -> bool {
        self.amount < BigDecimal::from(0)
    }

    /// True when the amount is a debit (positive).
    pub fn is_debit(&self) -> bool {
        self.amount > BigDecimal::from(0)
    }
}

/// A voucher: a dated group of postings that should balance to zero.
///
/// The identity key `series + number` (e.g. `A110`) is unique within one
/// accounting period but **not** across periods — two different years may
/// reuse the same id, which the matcher has to respect whenever it merges
/// multi-year data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voucher {
    /// Voucher series letter(s) (e.g. "A")
    pub series: String,
    /// Voucher number within the series
    pub number: u32,
    /// Voucher date
    pub date: NaiveDate,
    /// Free-text voucher description
    pub description: String,
    /// Posting lines in source order
    pub transactions: Vec<Transaction>,
}

impl Voucher {
    /// Create a new voucher without transactions.
    pub fn new(
        series: impl Into<String>,
        number: u32,
        date: NaiveDate,
        description: impl Into<String>,
    ) -> Self {
        Self {
            series: series.into(),
            number,
            date,
            description: description.into(),
            transactions: Vec::new(),
        }
    }

    /// The voucher identifier (e.g. `A110`).
    pub fn voucher_id(&self) -> String {
        format!("{}{}", self.series, self.number)
    }

    /// The accounting year of the voucher date.
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    /// Append a posting line.
    pub fn add_transaction(&mut self, transaction: Transaction) {
        self.transactions.push(transaction);
    }

    /// Whether any posting line touches the given account.
    pub fn has_account(&self, account: &str) -> bool {
        self.transactions.iter().any(|t| t.account == account)
    }

    /// All posting lines for the given account, in source order.
    pub fn transactions_for(&self, account: &str) -> Vec<&Transaction> {
        self.transactions
            .iter()
            .filter(|t| t.account == account)
            .collect()
    }

    /// Sum of all posting amounts for the given account.
    pub fn total_for_account(&self, account: &str) -> BigDecimal {
        self.transactions
            .iter()
            .filter(|t| t.account == account)
            .map(|t| &t.amount)
            .sum()
    }

    /// Whether the voucher balances to zero across all posting lines.
    ///
    /// Informational only — unbalanced vouchers are tolerated everywhere.
    pub fn is_balanced(&self) -> bool {
        let total: BigDecimal = self.transactions.iter().map(|t| &t.amount).sum();
        approx_zero(&total)
    }
}

/// Errors produced by the surrounding reader and report stages.
///
/// The matching engine itself never fails: malformed input surfaces as
/// annotated cases instead (see [`crate::matching`]).
#[derive(Debug, thiserror::Error)]
pub enum ReconError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Report error: {0}")]
    Report(#[from] csv::Error),
}

/// Result type for reconciliation operations.
pub type ReconResult<T> = Result<T, ReconError>;
