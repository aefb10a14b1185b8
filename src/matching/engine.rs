//! The matching engine
//!
//! Pairs receipt events with clearing events under a layered rule set:
//! exact-amount candidates first, explicit invoice-reference candidates for
//! lump-sum payments, ranked by match evidence and day gap. A per-clearing
//! remaining-balance table lets one bulk payment settle several receipts.
//! The run never fails; uncertainty lands in each case's status and comment.

use bigdecimal::BigDecimal;
use tracing::info;

use crate::matching::case::{InvoiceCase, MatchStatus};
use crate::matching::classify::{
    classify_clearings, classify_corrections, classify_receipts, ClearingEvent, ReceiptEvent,
};
use crate::matching::corrections::scan_corrections;
use crate::matching::heuristics;
use crate::types::{Voucher, CASH_ACCOUNT, LIABILITY_ACCOUNT};
use crate::utils::amounts::approx_eq;

/// Default maximum day gap between a receipt and its clearing.
pub const DEFAULT_MAX_DAYS: i64 = 120;

/// Day gap within which a clearing counts as settled on time.
const NORMAL_DAYS: i64 = 40;

/// Matches receipts with clearing vouchers across one or more periods.
#[derive(Debug, Clone)]
pub struct InvoiceMatcher {
    max_days: i64,
    liability_account: String,
    cash_account: String,
}

impl Default for InvoiceMatcher {
    fn default() -> Self {
        Self {
            max_days: DEFAULT_MAX_DAYS,
            liability_account: LIABILITY_ACCOUNT.to_string(),
            cash_account: CASH_ACCOUNT.to_string(),
        }
    }
}

/// A scored candidate clearing for one receipt.
struct Candidate {
    idx: usize,
    day_gap: i64,
    exact: bool,
    from_reference: bool,
    invoice_match: bool,
    supplier_match: bool,
}

enum SearchOutcome {
    Accepted {
        idx: usize,
        comment: String,
        invoice_evidence: bool,
    },
    Rejected {
        comment: String,
    },
}

impl InvoiceMatcher {
    /// Create a matcher with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a matcher with a custom maximum day gap.
    pub fn with_max_days(max_days: i64) -> Self {
        Self {
            max_days,
            ..Self::default()
        }
    }

    /// Override the liability and cash account codes.
    pub fn accounts(mut self, liability: impl Into<String>, cash: impl Into<String>) -> Self {
        self.liability_account = liability.into();
        self.cash_account = cash.into();
        self
    }

    /// Run the complete matching pass over the supplied vouchers.
    ///
    /// The voucher set may span multiple accounting years; `receipt_year`
    /// selects which year's receipts are reported on while clearings from
    /// all years stay available for cross-year settlement. Returns one case
    /// per receipt plus a synthetic case for every target-year clearing no
    /// receipt ever claimed.
    pub fn match_all(&self, vouchers: &[Voucher], receipt_year: Option<i32>) -> Vec<InvoiceCase> {
        info!(
            vouchers = vouchers.len(),
            receipt_year, "starting matching run"
        );

        let scan = scan_corrections(vouchers, receipt_year);
        let filtered: Vec<&Voucher> = vouchers
            .iter()
            .filter(|v| !scan.excluded.contains(&v.voucher_id()))
            .collect();

        let receipts = classify_receipts(
            filtered
                .iter()
                .copied()
                .filter(|v| receipt_year.map_or(true, |year| v.year() == year)),
            &self.liability_account,
            &self.cash_account,
        );
        let clearings = classify_clearings(
            filtered.iter().copied(),
            &self.liability_account,
            &self.cash_account,
        );
        let corrections = classify_corrections(vouchers, &scan.bypasses, &self.liability_account);

        // Remaining settlement capacity per clearing, keyed by position in
        // `clearings`. Bulk payments are consumed from this table one
        // receipt at a time.
        let mut remaining: Vec<BigDecimal> = clearings
            .iter()
            .map(|c| c.liability_amount.abs())
            .collect();
        let mut touched = vec![false; clearings.len()];

        let mut cases = Vec::with_capacity(receipts.len());
        for receipt in receipts {
            match self.search_clearing(&receipt, &clearings, &remaining) {
                SearchOutcome::Accepted {
                    idx,
                    comment,
                    invoice_evidence,
                } => {
                    let abs_amount = receipt.amount.abs();
                    let clearing = &clearings[idx];

                    let zero = BigDecimal::from(0);
                    let balance = &remaining[idx] - &abs_amount;
                    remaining[idx] = if balance < zero { zero } else { balance };
                    touched[idx] = true;

                    let (status, confidence, comment) =
                        if clearing.voucher_id() == receipt.voucher_id() {
                            (
                                MatchStatus::Ok,
                                100,
                                "Receipt and clearing in same voucher".to_string(),
                            )
                        } else if approx_eq(&clearing.liability_amount.abs(), &abs_amount)
                            || invoice_evidence
                        {
                            (MatchStatus::Ok, 100, comment)
                        } else {
                            (
                                MatchStatus::NeedsReview,
                                50,
                                format!("Amount mismatch: {comment}"),
                            )
                        };

                    cases.push(InvoiceCase {
                        receipt: Some(receipt),
                        clearing: Some(clearing.clone()),
                        status,
                        confidence,
                        comment,
                    });
                }
                SearchOutcome::Rejected { comment } => {
                    cases.push(InvoiceCase {
                        receipt: Some(receipt),
                        clearing: None,
                        status: MatchStatus::MissingClearing,
                        confidence: 0,
                        comment,
                    });
                }
            }
        }

        // Out-of-band corrections settle receipts the clearing search left
        // open, provided the amounts agree.
        for correction in &corrections {
            let Some(case) = cases.iter_mut().find(|c| {
                c.clearing.is_none()
                    && c.receipt
                        .as_ref()
                        .map_or(false, |r| r.voucher_id() == correction.receipt_id)
            }) else {
                continue;
            };

            let amounts_agree = case
                .receipt
                .as_ref()
                .map_or(false, |r| approx_eq(&correction.amount.abs(), &r.amount.abs()));
            if !amounts_agree {
                continue;
            }

            case.status = MatchStatus::Ok;
            case.confidence = 100;
            case.comment = format!(
                "Cleared by correction {}; payment in {} bypassed account {}",
                correction.voucher_id(),
                correction.payment_id,
                self.liability_account
            );
        }

        // Clearings nothing ever claimed become synthetic cases, unless a
        // prior-year receipt explains them as a cross-year settlement.
        let prior_receipts: Vec<ReceiptEvent> = match receipt_year {
            Some(year) => classify_receipts(
                filtered.iter().copied().filter(|v| v.year() < year),
                &self.liability_account,
                &self.cash_account,
            ),
            None => Vec::new(),
        };

        for (idx, clearing) in clearings.iter().enumerate() {
            if touched[idx] {
                continue;
            }
            if let Some(year) = receipt_year {
                if clearing.year() != year {
                    continue;
                }
            }

            let abs_amount = clearing.liability_amount.abs();
            let prior = prior_receipts
                .iter()
                .find(|r| approx_eq(&r.amount.abs(), &abs_amount));

            match prior {
                Some(prior_receipt) => cases.push(InvoiceCase {
                    receipt: None,
                    clearing: Some(clearing.clone()),
                    status: MatchStatus::Ok,
                    confidence: 100,
                    comment: format!(
                        "Settles prior-year receipt {} [CROSS-YEAR: {} invoice paid in {}]",
                        prior_receipt.voucher_id(),
                        prior_receipt.year(),
                        clearing.year()
                    ),
                }),
                None => cases.push(InvoiceCase {
                    receipt: None,
                    clearing: Some(clearing.clone()),
                    status: MatchStatus::MissingReceipt,
                    confidence: 0,
                    comment: "Payment without matching receipt".to_string(),
                }),
            }
        }

        let count = |status: MatchStatus| cases.iter().filter(|c| c.status == status).count();
        info!(
            total = cases.len(),
            ok = count(MatchStatus::Ok),
            needs_review = count(MatchStatus::NeedsReview),
            missing_clearing = count(MatchStatus::MissingClearing),
            missing_receipt = count(MatchStatus::MissingReceipt),
            "matching complete"
        );

        cases
    }

    /// Search for the best clearing candidate for one receipt.
    ///
    /// Candidates come from two strategies: clearings whose remaining
    /// balance matches the receipt amount, and — when the receipt text
    /// yields an invoice number — clearings whose free text lists that
    /// number with enough balance left (lump-sum payments). The combined
    /// set is ranked by match evidence, then day gap; the winner is pushed
    /// through the day-gap acceptance ladder.
    fn search_clearing(
        &self,
        receipt: &ReceiptEvent,
        clearings: &[ClearingEvent],
        remaining: &[BigDecimal],
    ) -> SearchOutcome {
        let abs_amount = receipt.amount.abs();
        let receipt_invoice = heuristics::extract_invoice_number(receipt.description());
        let receipt_supplier = heuristics::extract_supplier(receipt.description());

        let build = |idx: usize, clearing: &ClearingEvent, from_reference: bool| {
            let day_gap = (clearing.date() - receipt.date()).num_days().max(0);
            let invoice_match = receipt_invoice
                .as_deref()
                .map_or(false, |n| heuristics::mentions_invoice_number(clearing.description(), n));
            let supplier_match = match (
                receipt_supplier.as_deref(),
                heuristics::extract_supplier(clearing.description()),
            ) {
                (Some(a), Some(b)) => a.to_lowercase() == b.to_lowercase(),
                _ => false,
            };
            Candidate {
                idx,
                day_gap,
                exact: approx_eq(&remaining[idx], &abs_amount),
                from_reference,
                invoice_match,
                supplier_match,
            }
        };

        let mut candidates: Vec<Candidate> = Vec::new();
        let mut seen = vec![false; clearings.len()];

        // Exact-amount strategy: the remaining balance lines up with the
        // receipt, covering both untouched 1:1 clearings and partially
        // consumed bulk clearings. Clearings dated before the receipt do
        // not qualify here.
        for (idx, clearing) in clearings.iter().enumerate() {
            if clearing.date() < receipt.date() {
                continue;
            }
            if !approx_eq(&remaining[idx], &abs_amount) {
                continue;
            }
            seen[idx] = true;
            candidates.push(build(idx, clearing, false));
        }

        // Explicit-reference strategy: the clearing text lists the invoice
        // number and has enough balance left. Used for lump-sum payments
        // where amounts never match 1:1.
        if let Some(invoice_no) = &receipt_invoice {
            for (idx, clearing) in clearings.iter().enumerate() {
                if seen[idx] {
                    continue;
                }
                if remaining[idx] < abs_amount && !approx_eq(&remaining[idx], &abs_amount) {
                    continue;
                }
                if !heuristics::mentions_invoice_number(clearing.description(), invoice_no) {
                    continue;
                }
                candidates.push(build(idx, clearing, true));
            }
        }

        // Rank: exact amount, then supplier+invoice evidence, then explicit
        // reference, then invoice number alone, then smallest day gap. The
        // sort is stable, so encounter order decides remaining ties.
        candidates.sort_by_key(|c| {
            (
                !c.exact,
                !(c.supplier_match && c.invoice_match),
                !c.from_reference,
                !c.invoice_match,
                c.day_gap,
            )
        });

        let Some(winner) = candidates.first() else {
            return SearchOutcome::Rejected {
                comment: "No clearing found with matching amount".to_string(),
            };
        };

        let days = winner.day_gap;
        let mut comment = if days == 0 {
            "Receipt and clearing in same voucher date".to_string()
        } else if days <= NORMAL_DAYS {
            format!(
                "Clearing found {} day{} after receipt",
                days,
                if days == 1 { "" } else { "s" }
            )
        } else if days <= self.max_days {
            format!("Late clearing: {days} days after receipt")
        } else if winner.from_reference {
            format!("Bulk payment: {days} days after receipt, tolerance relaxed by invoice reference")
        } else {
            return SearchOutcome::Rejected {
                comment: format!(
                    "Clearing found but {} days after receipt (exceeds max {} days)",
                    days, self.max_days
                ),
            };
        };

        if winner.invoice_match {
            comment.push_str(" (invoice# match)");
        }

        let clearing = &clearings[winner.idx];
        if clearing.year() != receipt.year() {
            comment.push_str(&format!(
                " [CROSS-YEAR: {} invoice paid in {}]",
                receipt.year(),
                clearing.year()
            ));
        }

        let same_gap = candidates.iter().filter(|c| c.day_gap == days).count();
        if same_gap > 1 {
            comment.push_str(&format!(
                " (Warning: {same_gap} candidates with same date)"
            ));
        }

        SearchOutcome::Accepted {
            idx: winner.idx,
            comment,
            invoice_evidence: winner.invoice_match || winner.from_reference,
        }
    }
}
