//! Bulk payment example: one lump-sum bank payment settling several
//! invoices via explicit invoice-number references.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use invoice_recon::{InvoiceMatcher, Transaction, Voucher, CASH_ACCOUNT, LIABILITY_ACCOUNT};
use std::str::FromStr;

fn invoice(number: u32, date: NaiveDate, text: &str, value: &str) -> Voucher {
    let mut voucher = Voucher::new("A", number, date, text);
    voucher.add_transaction(Transaction::new(
        LIABILITY_ACCOUNT,
        BigDecimal::from_str(&format!("-{value}")).unwrap(),
    ));
    voucher.add_transaction(Transaction::new(
        "4010",
        BigDecimal::from_str(value).unwrap(),
    ));
    voucher
}

fn main() {
    tracing_subscriber::fmt().with_target(false).init();

    println!("💸 Invoice Recon - Bulk Payment Example\n");

    let date = |m, d| NaiveDate::from_ymd_opt(2024, m, d).unwrap();

    let mut lump_sum = Voucher::new(
        "A",
        9,
        date(2, 25),
        "Leverantörsfaktura - Betalt - Nibe AB - 11110001, 11110002, 11110003 klumpsumma",
    );
    lump_sum.add_transaction(Transaction::new(
        LIABILITY_ACCOUNT,
        BigDecimal::from_str("6000.00").unwrap(),
    ));
    lump_sum.add_transaction(Transaction::new(
        CASH_ACCOUNT,
        BigDecimal::from_str("-6000.00").unwrap(),
    ));

    let vouchers = vec![
        invoice(1, date(2, 1), "Leverantörsfaktura - Mottagen - Nibe AB - 11110001", "1000.00"),
        invoice(2, date(2, 5), "Leverantörsfaktura - Mottagen - Nibe AB - 11110002", "2000.00"),
        invoice(3, date(2, 8), "Leverantörsfaktura - Mottagen - Nibe AB - 11110003", "3000.00"),
        lump_sum,
    ];

    let cases = InvoiceMatcher::new().match_all(&vouchers, Some(2024));

    for case in &cases {
        println!(
            "  {} -> {} [{}] confidence {}: {}",
            case.receipt.as_ref().map(|r| r.voucher_id()).unwrap_or_default(),
            case.clearing.as_ref().map(|c| c.voucher_id()).unwrap_or_default(),
            case.status,
            case.confidence,
            case.comment
        );
    }

    let settled = cases
        .iter()
        .filter(|c| c.clearing.as_ref().is_some_and(|c| c.voucher_id() == "A9"))
        .count();
    println!("\n✅ {settled} invoices settled by the single lump-sum payment A9");
}
