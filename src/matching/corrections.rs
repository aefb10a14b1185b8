//! Correction-voucher detection
//!
//! Correction pairs cancel each other out in the books and must not be
//! matched as ordinary invoices or payments. Detection is best-effort text
//! scanning: a reference that cannot be resolved, or that violates the
//! same-year constraint, is silently dropped rather than reported.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::matching::heuristics;
use crate::types::Voucher;

/// A correction that clears a liability whose payment bypassed the liability
/// account entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BypassCorrection {
    /// The correction voucher carrying the narrative
    pub correction_id: String,
    /// The voucher that paid the invoice against the wrong account
    pub payment_id: String,
    /// The voucher that recognized the original receipt
    pub receipt_id: String,
}

/// Result of a correction scan over the full voucher set.
#[derive(Debug, Clone, Default)]
pub struct CorrectionScan {
    /// Voucher ids to exclude from ordinary classification
    pub excluded: HashSet<String>,
    /// Out-of-band payment corrections, in scan order
    pub bypasses: Vec<BypassCorrection>,
}

/// Scan vouchers for correction pairs and out-of-band payment corrections.
///
/// Cross-reference pairs (`korrigerad …` / `korrigering …`) are mutually
/// excluded, but only when the referenced voucher exists and — if a target
/// year is given — both vouchers fall in that year. The year guard protects
/// against voucher-id collisions across periods (`2024-A53` vs `2025-A53`).
///
/// The mis-posted-payment narrative is honored regardless of the year filter
/// since that correction intentionally crosses years.
pub fn scan_corrections(vouchers: &[Voucher], target_year: Option<i32>) -> CorrectionScan {
    let mut scan = CorrectionScan::default();

    for voucher in vouchers {
        // The bypass narrative also carries a generic correction marker, so
        // it has to be recognized before the pair rule gets a chance.
        if let Some(bypass) = heuristics::extract_bypass_correction(&voucher.description) {
            info!(
                correction = %voucher.voucher_id(),
                payment = %bypass.payment_id,
                receipt = %bypass.receipt_id,
                year = bypass.corrected_year,
                "excluding out-of-band payment correction"
            );
            scan.excluded.insert(voucher.voucher_id());
            scan.bypasses.push(BypassCorrection {
                correction_id: voucher.voucher_id(),
                payment_id: bypass.payment_id,
                receipt_id: bypass.receipt_id,
            });
            continue;
        }

        if let Some(year) = target_year {
            if voucher.year() != year {
                continue;
            }
        }

        let Some(referenced_id) = heuristics::extract_correction_ref(&voucher.description) else {
            continue;
        };

        let Some(referenced) = vouchers.iter().find(|v| v.voucher_id() == referenced_id) else {
            debug!(
                voucher = %voucher.voucher_id(),
                referenced = %referenced_id,
                "dropping correction reference to unknown voucher"
            );
            continue;
        };

        if let Some(year) = target_year {
            if referenced.year() != year {
                debug!(
                    voucher = %voucher.voucher_id(),
                    referenced = %referenced_id,
                    "dropping correction reference outside target year"
                );
                continue;
            }
        }

        info!(
            voucher = %voucher.voucher_id(),
            referenced = %referenced_id,
            "excluding correction pair"
        );
        scan.excluded.insert(voucher.voucher_id());
        scan.excluded.insert(referenced_id);
    }

    if !scan.excluded.is_empty() {
        let mut ids: Vec<&String> = scan.excluded.iter().collect();
        ids.sort();
        info!(count = scan.excluded.len(), ?ids, "correction vouchers excluded");
    }

    scan
}
