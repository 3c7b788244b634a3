//! Shipping option types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ShippingOptionId;

/// A delivery option offered for a cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingOption {
    /// Unique identifier for the option.
    pub id: ShippingOptionId,
    /// Display name, e.g. "Standard Shipping".
    pub name: String,
    /// How the option is priced.
    pub price_type: ShippingPriceType,
    /// Price of the option. Absent for calculated options until the
    /// per-cart calculation endpoint has been called.
    #[serde(default)]
    pub amount: Option<Decimal>,
}

/// Pricing mode of a shipping option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingPriceType {
    /// Fixed price, returned with the option listing.
    Flat,
    /// Priced per cart via a separate calculation call.
    Calculated,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_calculated_option_decodes_without_amount() {
        let json = r#"{"id": "so_01", "name": "Courier", "price_type": "calculated"}"#;
        let option: ShippingOption = serde_json::from_str(json).unwrap();
        assert_eq!(option.price_type, ShippingPriceType::Calculated);
        assert!(option.amount.is_none());
    }
}
