//! Free-text heuristics over voucher descriptions
//!
//! Supplier names, invoice numbers and correction cross-references live in
//! semi-structured description text rather than typed fields. Everything in
//! this module is a pure function from a description string to optional
//! structured fields, so the patterns can be hardened against new ledger data
//! without touching the matching rules.

use regex::Regex;
use std::sync::LazyLock;

/// Standardized narrative prefix written by the bookkeeping routine:
/// `"Leverantörsfaktura - Mottagen - <Supplier> - <Invoice#> ..."` for
/// receipts and `"Leverantörsfaktura - Betalt - <Supplier> - <Invoice#> ..."`
/// for payments.
const NARRATIVE_PREFIX: &str = "Leverantörsfaktura";

static CORRECTED_BY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i:korrigerad).*?([A-Z]\d+)").expect("valid pattern"));

static CORRECTION_OF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i:korrigering).*?([A-Z]\d+)").expect("valid pattern"));

// Mis-posted payment narrative: names the payment voucher, the account the
// payment hit instead of the liability account, the original receipt voucher
// and the year the books were corrected.
static BYPASS_CORRECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)felbokförd betalning.*?ver(?:ifikation)?\.?\s*([A-Za-z]\d+).*?istället för konto\s*(\d+).*?avser.*?ver(?:ifikation)?\.?\s*([A-Za-z]\d+).*?korrigerad\s+(\d{4})",
    )
    .expect("valid pattern")
});

static LEADING_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)").expect("valid pattern"));

static LONG_DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{8,}").expect("valid pattern"));

static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid pattern"));

/// An out-of-band payment correction extracted from a voucher description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BypassRef {
    /// Voucher that carried the mis-posted payment
    pub payment_id: String,
    /// Voucher that recognized the original receipt
    pub receipt_id: String,
    /// Year in which the books were corrected
    pub corrected_year: i32,
}

/// Split a standardized narrative into its ` - ` separated fields, or None
/// when the text does not follow the convention.
fn narrative_fields(description: &str) -> Option<Vec<&str>> {
    let parts: Vec<&str> = description.split(" - ").map(str::trim).collect();
    if parts.len() >= 3
        && parts[0] == NARRATIVE_PREFIX
        && matches!(parts[1], "Mottagen" | "Betalt")
    {
        Some(parts)
    } else {
        None
    }
}

/// Extract the supplier name from a voucher description.
///
/// The standardized narrative yields the third field. Older free-form texts
/// fall back to a dash-split scan that skips date fragments, bare numbers and
/// generic "Faktura"/"Invoice" prefixes.
pub fn extract_supplier(description: &str) -> Option<String> {
    if let Some(parts) = narrative_fields(description) {
        return Some(parts[2].to_string());
    }

    description
        .split('-')
        .map(str::trim)
        .skip(1)
        .find(|part| {
            !part.is_empty()
                && part.len() > 2
                && !part.chars().all(|c| c.is_ascii_digit())
                && !part.to_lowercase().starts_with("faktura")
                && !part.to_lowercase().starts_with("invoice")
        })
        .map(str::to_string)
}

/// Extract the invoice number from a voucher description.
///
/// The standardized narrative carries it as the leading digit run of the
/// fourth field (which may be followed by correction notes in parentheses).
/// Free-form texts fall back to the first run of eight or more digits.
pub fn extract_invoice_number(description: &str) -> Option<String> {
    if let Some(parts) = narrative_fields(description) {
        if parts.len() >= 4 {
            if let Some(caps) = LEADING_DIGITS.captures(parts[3]) {
                return Some(caps[1].to_string());
            }
        }
    }

    LONG_DIGIT_RUN
        .find(description)
        .map(|m| m.as_str().to_string())
}

/// Whether the free text lists the given invoice number as a standalone
/// digit run (used by the bulk-payment reference strategy, where one payment
/// text enumerates several invoice numbers).
pub fn mentions_invoice_number(description: &str, invoice_number: &str) -> bool {
    DIGIT_RUN
        .find_iter(description)
        .any(|m| m.as_str() == invoice_number)
}

/// Extract a correction cross-reference from a voucher description.
///
/// Both marker directions are recognized: `korrigerad … <ID>` ("corrected by
/// voucher <ID>") and `korrigering … <ID>` ("correction of voucher <ID>").
/// Returns the referenced voucher id.
pub fn extract_correction_ref(description: &str) -> Option<String> {
    CORRECTED_BY
        .captures(description)
        .or_else(|| CORRECTION_OF.captures(description))
        .map(|caps| caps[1].to_string())
}

/// Extract the fixed mis-posted-payment narrative, if present.
///
/// Recognized wording: `felbokförd betalning … ver <P> … istället för konto
/// <N> … avser … ver <R> … korrigerad <YYYY>`. Such corrections clear a
/// liability without a bank leg and intentionally cross accounting years.
pub fn extract_bypass_correction(description: &str) -> Option<BypassRef> {
    let caps = BYPASS_CORRECTION.captures(description)?;
    let corrected_year = caps[4].parse().ok()?;
    Some(BypassRef {
        payment_id: caps[1].to_uppercase(),
        receipt_id: caps[3].to_uppercase(),
        corrected_year,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_supplier_standardized() {
        let desc = "Leverantörsfaktura - Mottagen - Nibe AB - 4962010809";
        assert_eq!(extract_supplier(desc), Some("Nibe AB".to_string()));

        let paid = "Leverantörsfaktura - Betalt - Bauhaus - 5500123499 del av klumpsumma";
        assert_eq!(extract_supplier(paid), Some("Bauhaus".to_string()));
    }

    #[test]
    fn test_extract_supplier_fallback_skips_dates_and_numbers() {
        let desc = "Leverantörsfaktura - 2024-03-01 - Ahlsell Sverige - Faktura 88123";
        assert_eq!(extract_supplier(desc), Some("Ahlsell Sverige".to_string()));
    }

    #[test]
    fn test_extract_supplier_none_for_plain_text() {
        assert_eq!(extract_supplier("Hyra mars"), None);
    }

    #[test]
    fn test_extract_invoice_number_standardized_with_trailing_note() {
        let desc =
            "Leverantörsfaktura - Mottagen - Nibe AB - 4962010809 (korrigerad med verifikation A532)";
        assert_eq!(extract_invoice_number(desc), Some("4962010809".to_string()));
    }

    #[test]
    fn test_extract_invoice_number_fallback_long_run() {
        assert_eq!(
            extract_invoice_number("Betalning faktura 55001234 Ahlsell"),
            Some("55001234".to_string())
        );
        assert_eq!(extract_invoice_number("Betalning faktura 1234"), None);
    }

    #[test]
    fn test_mentions_invoice_number_in_bulk_text() {
        let desc = "Leverantörsfaktura - Betalt - Nibe AB - 4962010809, 4962010810 klumpsumma";
        assert!(mentions_invoice_number(desc, "4962010809"));
        assert!(mentions_invoice_number(desc, "4962010810"));
        assert!(!mentions_invoice_number(desc, "4962010811"));
        // partial runs must not count
        assert!(!mentions_invoice_number(desc, "496201080"));
    }

    #[test]
    fn test_extract_correction_ref_both_directions() {
        assert_eq!(
            extract_correction_ref("Felaktig kontering, korrigerad med verifikation A131"),
            Some("A131".to_string())
        );
        assert_eq!(
            extract_correction_ref("Korrigering av ver.nr. A120"),
            Some("A120".to_string())
        );
        assert_eq!(extract_correction_ref("Leverantörsfaktura - Mottagen"), None);
    }

    #[test]
    fn test_extract_bypass_correction_narrative() {
        let desc = "Korrigering: felbokförd betalning ver A77 bokförd på konto 6570 \
                    istället för konto 2440, avser faktura ver A54, korrigerad 2025";
        let bypass = extract_bypass_correction(desc).unwrap();
        assert_eq!(bypass.payment_id, "A77");
        assert_eq!(bypass.receipt_id, "A54");
        assert_eq!(bypass.corrected_year, 2025);
    }

    #[test]
    fn test_extract_bypass_correction_requires_full_narrative() {
        assert_eq!(
            extract_bypass_correction("Korrigering av ver.nr. A120"),
            None
        );
    }
}
