//! Event classification
//!
//! Splits vouchers into the semantic financial events the matcher operates
//! on: receipts (recognized debt), clearings (bank-settled payments or
//! refunds) and corrections (liability clearings without a bank leg). Events
//! are derived fresh on every run and own their data.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::matching::corrections::BypassCorrection;
use crate::types::Voucher;
use crate::utils::amounts::{approx_eq, approx_zero};

/// Recognition of a new invoice or credit-note liability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptEvent {
    /// The carrying voucher
    pub voucher: Voucher,
    /// Signed liability-account amount of the qualifying leg
    pub amount: BigDecimal,
    /// True for a credit note (liability debit without a bank leg)
    pub is_credit_note: bool,
}

impl ReceiptEvent {
    /// The carrying voucher's identifier.
    pub fn voucher_id(&self) -> String {
        self.voucher.voucher_id()
    }

    /// The carrying voucher's date.
    pub fn date(&self) -> NaiveDate {
        self.voucher.date
    }

    /// The carrying voucher's accounting year.
    pub fn year(&self) -> i32 {
        self.voucher.year()
    }

    /// The carrying voucher's free-text description.
    pub fn description(&self) -> &str {
        &self.voucher.description
    }
}

/// Recognition of a bank-settled payment or refund against the liability
/// account: one liability leg paired with the best-matching cash leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearingEvent {
    /// The carrying voucher
    pub voucher: Voucher,
    /// Signed liability-account amount of the paired leg
    pub liability_amount: BigDecimal,
    /// Signed cash-account amount of the paired leg
    pub cash_amount: BigDecimal,
}

impl ClearingEvent {
    /// The carrying voucher's identifier.
    pub fn voucher_id(&self) -> String {
        self.voucher.voucher_id()
    }

    /// The carrying voucher's date.
    pub fn date(&self) -> NaiveDate {
        self.voucher.date
    }

    /// The carrying voucher's accounting year.
    pub fn year(&self) -> i32 {
        self.voucher.year()
    }

    /// The carrying voucher's free-text description.
    pub fn description(&self) -> &str {
        &self.voucher.description
    }
}

/// An adjustment voucher clearing a liability without a bank leg, referencing
/// an out-of-band payment and the original receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionEvent {
    /// The correction voucher
    pub voucher: Voucher,
    /// Amount of the voucher's debit liability leg
    pub amount: BigDecimal,
    /// The voucher that paid the invoice against the wrong account
    pub payment_id: String,
    /// The voucher that recognized the original receipt
    pub receipt_id: String,
}

impl CorrectionEvent {
    /// The correction voucher's identifier.
    pub fn voucher_id(&self) -> String {
        self.voucher.voucher_id()
    }
}

/// Classify receipt events from vouchers carrying the liability account.
///
/// Per liability leg: a credit leg is a receipt unless the voucher has
/// exactly one liability leg alongside a cash leg (that shape is a payment
/// of a previously recognized credit); a debit leg without any cash leg in
/// the voucher is a credit-note receipt. A voucher whose liability legs sum
/// to zero with no cash leg is a self-cancelling invoice/credit-note pair
/// and yields nothing.
pub fn classify_receipts<'a, I>(vouchers: I, liability: &str, cash: &str) -> Vec<ReceiptEvent>
where
    I: IntoIterator<Item = &'a Voucher>,
{
    let mut receipts = Vec::new();

    for voucher in vouchers {
        if !voucher.has_account(liability) {
            continue;
        }

        let legs = voucher.transactions_for(liability);
        let has_cash = voucher.has_account(cash);

        let total: BigDecimal = legs.iter().map(|t| &t.amount).sum();
        if approx_zero(&total) && !has_cash {
            debug!(
                voucher = %voucher.voucher_id(),
                "skipping self-cancelling voucher without payment"
            );
            continue;
        }

        let single_leg = legs.len() == 1;
        for leg in legs {
            if leg.is_credit() {
                if single_leg && has_cash {
                    // Payment of a previously recognized credit, not new debt.
                    continue;
                }
                receipts.push(ReceiptEvent {
                    voucher: voucher.clone(),
                    amount: leg.amount.clone(),
                    is_credit_note: false,
                });
            } else if leg.is_debit() && !has_cash {
                receipts.push(ReceiptEvent {
                    voucher: voucher.clone(),
                    amount: leg.amount.clone(),
                    is_credit_note: true,
                });
            }
        }
    }

    let credit_notes = receipts.iter().filter(|r| r.is_credit_note).count();
    info!(
        total = receipts.len(),
        invoices = receipts.len() - credit_notes,
        credit_notes,
        "classified receipt events"
    );

    receipts
}

/// Classify clearing events from vouchers carrying both the liability and
/// the cash account.
///
/// For each liability leg the best-matching cash leg is selected: a cash leg
/// is eligible only when the signs form a payment (liability debit + cash
/// credit) or a refund (liability credit + cash debit); eligible legs score
/// 2 on an exact absolute-amount match and 1 otherwise, highest score wins
/// with ties broken by encounter order. One event per liability leg with any
/// eligible cash leg.
pub fn classify_clearings<'a, I>(vouchers: I, liability: &str, cash: &str) -> Vec<ClearingEvent>
where
    I: IntoIterator<Item = &'a Voucher>,
{
    let mut clearings = Vec::new();

    for voucher in vouchers {
        if !(voucher.has_account(liability) && voucher.has_account(cash)) {
            continue;
        }

        let cash_legs = voucher.transactions_for(cash);
        for liability_leg in voucher.transactions_for(liability) {
            let mut best: Option<(&crate::types::Transaction, u8)> = None;

            for &cash_leg in &cash_legs {
                let valid_pair = (liability_leg.is_debit() && cash_leg.is_credit())
                    || (liability_leg.is_credit() && cash_leg.is_debit());
                if !valid_pair {
                    continue;
                }

                let score = if approx_eq(&liability_leg.amount.abs(), &cash_leg.amount.abs()) {
                    2
                } else {
                    1
                };
                if best.map_or(true, |(_, s)| score > s) {
                    best = Some((cash_leg, score));
                }
            }

            if let Some((cash_leg, _)) = best {
                clearings.push(ClearingEvent {
                    voucher: voucher.clone(),
                    liability_amount: liability_leg.amount.clone(),
                    cash_amount: cash_leg.amount.clone(),
                });
            }
        }
    }

    info!(total = clearings.len(), "classified clearing events");
    clearings
}

/// Materialize correction events for the given bypass mappings.
///
/// The first debit liability leg of each correction voucher carries the
/// amount; a mapping whose voucher is missing or has no such leg silently
/// yields nothing.
pub fn classify_corrections(
    vouchers: &[Voucher],
    bypasses: &[BypassCorrection],
    liability: &str,
) -> Vec<CorrectionEvent> {
    let mut corrections = Vec::new();

    for bypass in bypasses {
        let Some(voucher) = vouchers
            .iter()
            .find(|v| v.voucher_id() == bypass.correction_id)
        else {
            continue;
        };

        let Some(debit_leg) = voucher
            .transactions_for(liability)
            .into_iter()
            .find(|t| t.is_debit())
        else {
            debug!(
                voucher = %voucher.voucher_id(),
                "correction voucher has no debit liability leg"
            );
            continue;
        };

        corrections.push(CorrectionEvent {
            voucher: voucher.clone(),
            amount: debit_leg.amount.clone(),
            payment_id: bypass.payment_id.clone(),
            receipt_id: bypass.receipt_id.clone(),
        });
    }

    corrections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Transaction, CASH_ACCOUNT, LIABILITY_ACCOUNT};
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn amount(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn voucher_with(series: &str, number: u32, legs: &[(&str, &str)]) -> Voucher {
        let mut voucher = Voucher::new(
            series,
            number,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            "Leverantörsfaktura - Mottagen - Nibe AB - 12345678",
        );
        for (account, value) in legs {
            voucher.add_transaction(Transaction::new(*account, amount(value)));
        }
        voucher
    }

    #[test]
    fn test_credit_leg_is_a_receipt() {
        let vouchers = vec![voucher_with(
            "A",
            1,
            &[(LIABILITY_ACCOUNT, "-1000.00"), ("4010", "1000.00")],
        )];

        let receipts = classify_receipts(&vouchers, LIABILITY_ACCOUNT, CASH_ACCOUNT);
        assert_eq!(receipts.len(), 1);
        assert!(!receipts[0].is_credit_note);
        assert_eq!(receipts[0].amount, amount("-1000.00"));
    }

    #[test]
    fn test_debit_leg_without_cash_is_a_credit_note() {
        let vouchers = vec![voucher_with(
            "A",
            2,
            &[(LIABILITY_ACCOUNT, "500.00"), ("4010", "-500.00")],
        )];

        let receipts = classify_receipts(&vouchers, LIABILITY_ACCOUNT, CASH_ACCOUNT);
        assert_eq!(receipts.len(), 1);
        assert!(receipts[0].is_credit_note);
    }

    #[test]
    fn test_self_cancelling_voucher_yields_nothing() {
        // Invoice and credit note recorded in the same voucher, no payment.
        let vouchers = vec![voucher_with(
            "A",
            111,
            &[
                (LIABILITY_ACCOUNT, "-2636.00"),
                ("4010", "2636.00"),
                (LIABILITY_ACCOUNT, "2636.00"),
                ("4010", "-2636.00"),
            ],
        )];

        let receipts = classify_receipts(&vouchers, LIABILITY_ACCOUNT, CASH_ACCOUNT);
        assert!(receipts.is_empty());
    }

    #[test]
    fn test_single_credit_leg_with_cash_is_not_a_receipt() {
        // Refund of a previously recognized credit, not new debt.
        let vouchers = vec![voucher_with(
            "A",
            3,
            &[(LIABILITY_ACCOUNT, "-300.00"), (CASH_ACCOUNT, "300.00")],
        )];

        let receipts = classify_receipts(&vouchers, LIABILITY_ACCOUNT, CASH_ACCOUNT);
        assert!(receipts.is_empty());
    }

    #[test]
    fn test_same_voucher_receipt_and_payment_yields_both() {
        // Multi-leg voucher: invoice recognized and paid in one voucher.
        let vouchers = vec![voucher_with(
            "A",
            4,
            &[
                (LIABILITY_ACCOUNT, "-1000.00"),
                ("4010", "1000.00"),
                (LIABILITY_ACCOUNT, "1000.00"),
                (CASH_ACCOUNT, "-1000.00"),
            ],
        )];

        let receipts = classify_receipts(&vouchers, LIABILITY_ACCOUNT, CASH_ACCOUNT);
        let clearings = classify_clearings(&vouchers, LIABILITY_ACCOUNT, CASH_ACCOUNT);
        assert_eq!(receipts.len(), 1);
        assert_eq!(clearings.len(), 1);
        assert_eq!(clearings[0].liability_amount, amount("1000.00"));
    }

    #[test]
    fn test_clearing_picks_exact_cash_leg() {
        let vouchers = vec![voucher_with(
            "A",
            5,
            &[
                (LIABILITY_ACCOUNT, "1000.00"),
                (CASH_ACCOUNT, "-750.00"),
                (CASH_ACCOUNT, "-1000.00"),
            ],
        )];

        let clearings = classify_clearings(&vouchers, LIABILITY_ACCOUNT, CASH_ACCOUNT);
        assert_eq!(clearings.len(), 1);
        assert_eq!(clearings[0].cash_amount, amount("-1000.00"));
    }

    #[test]
    fn test_clearing_requires_valid_sign_pair() {
        // Liability debit with cash debit is not a settlement shape.
        let vouchers = vec![voucher_with(
            "A",
            6,
            &[(LIABILITY_ACCOUNT, "1000.00"), (CASH_ACCOUNT, "1000.00")],
        )];

        let clearings = classify_clearings(&vouchers, LIABILITY_ACCOUNT, CASH_ACCOUNT);
        assert!(clearings.is_empty());
    }

    #[test]
    fn test_refund_pairing() {
        let vouchers = vec![voucher_with(
            "A",
            7,
            &[(LIABILITY_ACCOUNT, "-400.00"), (CASH_ACCOUNT, "400.00")],
        )];

        let clearings = classify_clearings(&vouchers, LIABILITY_ACCOUNT, CASH_ACCOUNT);
        assert_eq!(clearings.len(), 1);
        assert_eq!(clearings[0].liability_amount, amount("-400.00"));
        assert_eq!(clearings[0].cash_amount, amount("400.00"));
    }

    #[test]
    fn test_correction_event_from_first_debit_leg() {
        let voucher = voucher_with(
            "A",
            90,
            &[(LIABILITY_ACCOUNT, "1500.00"), ("6570", "-1500.00")],
        );
        let vouchers = vec![voucher];
        let bypasses = vec![BypassCorrection {
            correction_id: "A90".to_string(),
            payment_id: "A77".to_string(),
            receipt_id: "A54".to_string(),
        }];

        let corrections = classify_corrections(&vouchers, &bypasses, LIABILITY_ACCOUNT);
        assert_eq!(corrections.len(), 1);
        assert_eq!(corrections[0].amount, amount("1500.00"));
        assert_eq!(corrections[0].payment_id, "A77");
    }

    #[test]
    fn test_correction_without_debit_leg_is_skipped() {
        let voucher = voucher_with("A", 91, &[(LIABILITY_ACCOUNT, "-1500.00")]);
        let vouchers = vec![voucher];
        let bypasses = vec![BypassCorrection {
            correction_id: "A91".to_string(),
            payment_id: "A77".to_string(),
            receipt_id: "A54".to_string(),
        }];

        let corrections = classify_corrections(&vouchers, &bypasses, LIABILITY_ACCOUNT);
        assert!(corrections.is_empty());
    }
}
