//! Invoice case model
//!
//! The output unit of a matching run: one case per classified receipt plus
//! synthetic cases for payments no receipt ever claimed.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::matching::classify::{ClearingEvent, ReceiptEvent};

/// Validation outcome of one invoice case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchStatus {
    /// Receipt and clearing reconciled with full confidence
    Ok,
    /// A candidate was accepted but the amounts do not line up exactly
    NeedsReview,
    /// No acceptable clearing was found for the receipt
    MissingClearing,
    /// A clearing was never claimed by any receipt
    MissingReceipt,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MatchStatus::Ok => "OK",
            MatchStatus::NeedsReview => "Needs review",
            MatchStatus::MissingClearing => "Missing clearing",
            MatchStatus::MissingReceipt => "Missing receipt",
        };
        f.write_str(label)
    }
}

/// One row of the final validation table.
///
/// A case carries a receipt (absent for synthetic payment-without-receipt
/// cases), the clearing it was matched to (absent when none was accepted),
/// a status, a 0-100 confidence score and a free-text rationale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceCase {
    /// The matched receipt, if any
    pub receipt: Option<ReceiptEvent>,
    /// The matched clearing, if any
    pub clearing: Option<ClearingEvent>,
    /// Validation outcome
    pub status: MatchStatus,
    /// Confidence score, 0-100
    pub confidence: u8,
    /// Free-text rationale for the outcome
    pub comment: String,
}

impl InvoiceCase {
    /// Days between receipt and clearing, when both sides are present.
    pub fn days_to_clearing(&self) -> Option<i64> {
        match (&self.receipt, &self.clearing) {
            (Some(receipt), Some(clearing)) => {
                Some((clearing.date() - receipt.date()).num_days())
            }
            _ => None,
        }
    }

    /// Whether the case should be surfaced for manual review.
    pub fn needs_review(&self) -> bool {
        self.status != MatchStatus::Ok
    }
}
