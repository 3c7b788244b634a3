//! Money display formatting.
//!
//! The backend computes all totals server-side and returns decimal amounts
//! with a lowercase ISO 4217 currency code on the owning aggregate. Nothing
//! here does arithmetic; this is display only.

use rust_decimal::Decimal;

/// Format an amount for display, e.g. `$19.99` or `42.00 SEK`.
///
/// Known currency codes render with their symbol; anything else falls back
/// to the amount followed by the uppercased code.
#[must_use]
pub fn format_amount(amount: Decimal, currency_code: &str) -> String {
    match currency_code.to_ascii_lowercase().as_str() {
        "usd" | "cad" | "aud" => format!("${amount:.2}"),
        "eur" => format!("€{amount:.2}"),
        "gbp" => format!("£{amount:.2}"),
        other => format!("{amount:.2} {}", other.to_ascii_uppercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_symbol_currencies() {
        assert_eq!(format_amount(Decimal::new(1999, 2), "usd"), "$19.99");
        assert_eq!(format_amount(Decimal::new(5, 0), "eur"), "€5.00");
        assert_eq!(format_amount(Decimal::new(50, 2), "gbp"), "£0.50");
    }

    #[test]
    fn test_format_uppercase_code_accepted() {
        assert_eq!(format_amount(Decimal::new(12, 0), "USD"), "$12.00");
    }

    #[test]
    fn test_format_unknown_code_falls_back() {
        assert_eq!(format_amount(Decimal::new(42, 0), "sek"), "42.00 SEK");
    }
}
