//! Amount comparison and formatting helpers

use bigdecimal::{BigDecimal, RoundingMode};
use std::sync::LazyLock;

/// Amounts closer than this are considered equal (one öre).
pub static AMOUNT_TOLERANCE: LazyLock<BigDecimal> =
    LazyLock::new(|| BigDecimal::new(1.into(), 2));

/// Check whether two amounts are equal within [`AMOUNT_TOLERANCE`].
pub fn approx_eq(a: &BigDecimal, b: &BigDecimal) -> bool {
    (a - b).abs() < *AMOUNT_TOLERANCE
}

/// Check whether an amount is zero within [`AMOUNT_TOLERANCE`].
pub fn approx_zero(amount: &BigDecimal) -> bool {
    amount.abs() < *AMOUNT_TOLERANCE
}

/// Format an amount with two decimals and a decimal comma ("1234,56"),
/// the convention used by the exported reports.
pub fn format_sek(amount: &BigDecimal) -> String {
    amount
        .with_scale_round(2, RoundingMode::HalfUp)
        .to_string()
        .replace('.', ",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_approx_eq_within_tolerance() {
        let a = BigDecimal::from_str("100.00").unwrap();
        let b = BigDecimal::from_str("100.005").unwrap();
        let c = BigDecimal::from_str("100.02").unwrap();

        assert!(approx_eq(&a, &b));
        assert!(!approx_eq(&a, &c));
    }

    #[test]
    fn test_approx_zero() {
        assert!(approx_zero(&BigDecimal::from_str("0.005").unwrap()));
        assert!(approx_zero(&BigDecimal::from_str("-0.005").unwrap()));
        assert!(!approx_zero(&BigDecimal::from_str("0.02").unwrap()));
    }

    #[test]
    fn test_format_sek() {
        assert_eq!(format_sek(&BigDecimal::from_str("1234.5").unwrap()), "1234,50");
        assert_eq!(format_sek(&BigDecimal::from_str("-2636").unwrap()), "-2636,00");
    }
}
