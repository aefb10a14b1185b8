//! End-to-end validation example: parse a two-year ledger, match one year's
//! receipts and write the review reports.

use invoice_recon::{
    sie, summarize, write_summary_report, write_validation_report, InvoiceMatcher,
    LIABILITY_ACCOUNT,
};

const LEDGER_2024: &str = r#"
#SIETYP 4
#VER A 110 20240301 "Leverantörsfaktura - Mottagen - Nibe AB - 49620108"
{
#TRANS 2440 {} -2636.00
#TRANS 2641 {} 527.20
#TRANS 4010 {} 2108.80
}
#VER A 115 20240315 "Leverantörsfaktura - Betalt - Nibe AB - 49620108"
{
#TRANS 2440 {} 2636.00
#TRANS 1930 {} -2636.00
}
#VER A 190 20241201 "Leverantörsfaktura - Mottagen - Bauhaus - 55001234"
{
#TRANS 2440 {} -5000.00
#TRANS 4010 {} 5000.00
}
"#;

const LEDGER_2025: &str = r#"
#SIETYP 4
#VER B 3 20250120 "Leverantörsfaktura - Betalt - Bauhaus - 55001234"
{
#TRANS 2440 {} 5000.00
#TRANS 1930 {} -5000.00
}
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_target(false).init();

    println!("🧾 Invoice Recon - Year Validation Example\n");

    // Both years are loaded so cross-year settlements can be discovered.
    let mut vouchers = sie::parse_str(LEDGER_2024);
    vouchers.extend(sie::parse_str(LEDGER_2025));
    println!("📖 Parsed {} vouchers across two years\n", vouchers.len());

    let cases = InvoiceMatcher::new().match_all(&vouchers, Some(2024));

    println!("🔍 Matching results for 2024:\n");
    for case in &cases {
        let receipt = case
            .receipt
            .as_ref()
            .map(|r| r.voucher_id())
            .unwrap_or_else(|| "-".to_string());
        let clearing = case
            .clearing
            .as_ref()
            .map(|c| c.voucher_id())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {} -> {} [{}] {}",
            receipt, clearing, case.status, case.comment
        );
    }

    let summary = summarize(&cases);
    println!(
        "\n📊 Summary: {} cases, {} OK, {} unpaid, {} without receipt, {} to review",
        summary.total,
        summary.ok,
        summary.missing_clearing,
        summary.missing_receipt,
        summary.needs_review
    );

    let out_dir = std::env::temp_dir().join("invoice-recon-demo");
    std::fs::create_dir_all(&out_dir)?;
    let validation_path = out_dir.join("invoice_validation_2024.csv");
    let summary_path = out_dir.join("summary_2024.csv");

    write_validation_report(&cases, &validation_path)?;
    write_summary_report(&cases, &vouchers, LIABILITY_ACCOUNT, &summary_path)?;

    println!("\n💾 Reports written:");
    println!("  {}", validation_path.display());
    println!("  {}", summary_path.display());

    Ok(())
}
