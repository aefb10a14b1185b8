//! Financial summary and bookkeeping reconciliation

use std::path::Path;

use bigdecimal::BigDecimal;
use tracing::info;

use crate::matching::{InvoiceCase, MatchStatus};
use crate::types::{ReconResult, Voucher};
use crate::utils::amounts::format_sek;

/// Aggregated counts and amounts over a case list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseSummary {
    /// Total number of cases
    pub total: usize,
    /// Cases reconciled as OK
    pub ok: usize,
    /// Receipts with no accepted clearing
    pub missing_clearing: usize,
    /// Payments no receipt ever claimed
    pub missing_receipt: usize,
    /// Accepted matches needing manual review
    pub needs_review: usize,
    /// Sum of absolute receipt amounts across all receipt-bearing cases
    pub total_receipt_amount: BigDecimal,
    /// Sum of absolute receipt amounts still unpaid
    pub unpaid_amount: BigDecimal,
    /// Sum of absolute receipt amounts under review
    pub review_amount: BigDecimal,
}

/// Aggregate a case list into counts and amounts per status.
pub fn summarize(cases: &[InvoiceCase]) -> CaseSummary {
    let mut summary = CaseSummary {
        total: cases.len(),
        ..Default::default()
    };

    for case in cases {
        match case.status {
            MatchStatus::Ok => summary.ok += 1,
            MatchStatus::NeedsReview => summary.needs_review += 1,
            MatchStatus::MissingClearing => summary.missing_clearing += 1,
            MatchStatus::MissingReceipt => summary.missing_receipt += 1,
        }

        if let Some(receipt) = &case.receipt {
            let amount = receipt.amount.abs();
            match case.status {
                MatchStatus::MissingClearing => summary.unpaid_amount += &amount,
                MatchStatus::NeedsReview => summary.review_amount += &amount,
                _ => {}
            }
            summary.total_receipt_amount += amount;
        }
    }

    summary
}

/// Write the financial summary.
///
/// The top block reconciles against the raw books: total liability credit
/// (receipts) and debit (clearings) over the **unfiltered** voucher set —
/// excluded corrections included — so the outstanding balance agrees with
/// the ledger's closing balance. The bottom block breaks down the matcher's
/// filtered view.
pub fn write_summary_report(
    cases: &[InvoiceCase],
    all_vouchers: &[Voucher],
    liability_account: &str,
    path: impl AsRef<Path>,
) -> ReconResult<()> {
    let path = path.as_ref();

    let mut total_credit = BigDecimal::from(0);
    let mut total_debit = BigDecimal::from(0);
    for voucher in all_vouchers {
        for leg in voucher.transactions_for(liability_account) {
            if leg.is_credit() {
                total_credit += leg.amount.abs();
            } else {
                total_debit += leg.amount.abs();
            }
        }
    }
    let outstanding = &total_credit - &total_debit;

    let summary = summarize(cases);

    let row = |category: &str, count: &str, amount: &str| {
        [category.to_string(), count.to_string(), amount.to_string()]
    };
    let records = [
        row("Category", "Count", "Amount (SEK)"),
        row(
            &format!("Account {liability_account} - Bookkeeping Totals"),
            "",
            "",
        ),
        row("Total Credit (Receipts)", "", &format_sek(&total_credit)),
        row("Total Debit (Clearings)", "", &format_sek(&total_debit)),
        row("Outstanding Balance", "", &format_sek(&outstanding)),
        row("", "", ""),
        row("Validation Summary (After Excluding Corrections)", "", ""),
        row("Total Invoice Cases", &summary.total.to_string(), ""),
        row("  - Paid (OK)", &summary.ok.to_string(), ""),
        row(
            "  - Unpaid (Missing clearing)",
            &summary.missing_clearing.to_string(),
            &format_sek(&summary.unpaid_amount),
        ),
        row(
            "  - Payments without receipt",
            &summary.missing_receipt.to_string(),
            "",
        ),
        row(
            "  - Needs Review",
            &summary.needs_review.to_string(),
            &format_sek(&summary.review_amount),
        ),
    ];

    let mut writer = csv::Writer::from_path(path)?;
    for record in &records {
        writer.write_record(record)?;
    }
    writer.flush()?;

    info!(
        file = %path.display(),
        credit = %total_credit,
        debit = %total_debit,
        outstanding = %outstanding,
        "summary report written"
    );
    Ok(())
}
