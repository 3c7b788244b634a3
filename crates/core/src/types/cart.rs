//! Cart snapshot types.
//!
//! A [`Cart`] is a server-owned aggregate. The client never computes totals
//! or merges fields locally: every mutating call returns the full updated
//! cart and the caller swaps it in wholesale.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CartId, LineItemId, RegionId, ShippingMethodId, ShippingOptionId, VariantId};
use super::order::Order;
use super::payment::{PaymentCollection, PaymentSession, PaymentSessionStatus};

/// An in-progress purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    /// Unique identifier for the cart.
    pub id: CartId,
    /// Region the cart belongs to. A cart always belongs to exactly one
    /// region; if it disagrees with the selected region the cart is stale.
    pub region_id: RegionId,
    /// Customer email, once captured at the address step.
    #[serde(default)]
    pub email: Option<String>,
    /// Lowercase ISO 4217 currency code, inherited from the region.
    pub currency_code: String,
    /// Line items in the cart.
    #[serde(default)]
    pub items: Vec<LineItem>,
    /// Shipping address, once captured.
    #[serde(default)]
    pub shipping_address: Option<Address>,
    /// Billing address, once captured.
    #[serde(default)]
    pub billing_address: Option<Address>,
    /// Selected shipping methods. The storefront only ever selects one;
    /// the backend models it as a list.
    #[serde(default)]
    pub shipping_methods: Vec<ShippingMethod>,
    /// Payment collection, created when a payment session is initiated.
    #[serde(default)]
    pub payment_collection: Option<PaymentCollection>,
    /// Promotions applied to the cart, including automatic ones.
    #[serde(default)]
    pub promotions: Vec<Promotion>,
    /// Item subtotal before shipping, taxes and discounts.
    #[serde(default)]
    pub subtotal: Decimal,
    /// Shipping total.
    #[serde(default)]
    pub shipping_total: Decimal,
    /// Tax total.
    #[serde(default)]
    pub tax_total: Decimal,
    /// Discount total.
    #[serde(default)]
    pub discount_total: Decimal,
    /// Grand total payable.
    #[serde(default)]
    pub total: Decimal,
}

impl Cart {
    /// The shipping option selected on the cart, read from the first
    /// shipping method.
    #[must_use]
    pub fn selected_shipping_option(&self) -> Option<&ShippingOptionId> {
        self.shipping_methods
            .first()
            .and_then(|method| method.shipping_option_id.as_ref())
    }

    /// The pending payment session, if one has been initiated.
    #[must_use]
    pub fn pending_payment_session(&self) -> Option<&PaymentSession> {
        self.payment_collection.as_ref().and_then(|collection| {
            collection
                .payment_sessions
                .iter()
                .find(|session| session.status == PaymentSessionStatus::Pending)
        })
    }

    /// Codes of manually applied promotions (automatic promotions carry no
    /// user-entered code and are never re-submitted).
    #[must_use]
    pub fn applied_promo_codes(&self) -> Vec<String> {
        self.promotions
            .iter()
            .filter(|promotion| !promotion.is_automatic)
            .filter_map(|promotion| promotion.code.clone())
            .collect()
    }

    /// Whether the given promotion code is reflected on the cart.
    #[must_use]
    pub fn has_promo_code(&self, code: &str) -> bool {
        self.promotions
            .iter()
            .any(|promotion| promotion.code.as_deref() == Some(code))
    }
}

/// A shipping or billing address as stored on a cart.
///
/// Every field is optional on the wire; forms normalize absent fields to
/// empty strings via [`AddressFields`].
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Address {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub address_1: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Address fields as captured by forms and sent in cart updates.
///
/// `company` and `province` may be left empty; everything else is required
/// by form validation before submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressFields {
    pub first_name: String,
    pub last_name: String,
    pub address_1: String,
    #[serde(default)]
    pub company: String,
    pub postal_code: String,
    pub city: String,
    pub country_code: String,
    #[serde(default)]
    pub province: String,
    pub phone: String,
}

impl From<&Address> for AddressFields {
    fn from(address: &Address) -> Self {
        Self {
            first_name: address.first_name.clone().unwrap_or_default(),
            last_name: address.last_name.clone().unwrap_or_default(),
            address_1: address.address_1.clone().unwrap_or_default(),
            company: address.company.clone().unwrap_or_default(),
            postal_code: address.postal_code.clone().unwrap_or_default(),
            city: address.city.clone().unwrap_or_default(),
            country_code: address.country_code.clone().unwrap_or_default(),
            province: address.province.clone().unwrap_or_default(),
            phone: address.phone.clone().unwrap_or_default(),
        }
    }
}

impl From<&AddressFields> for Address {
    fn from(fields: &AddressFields) -> Self {
        fn non_empty(value: &str) -> Option<String> {
            if value.is_empty() {
                None
            } else {
                Some(value.to_owned())
            }
        }

        Self {
            first_name: non_empty(&fields.first_name),
            last_name: non_empty(&fields.last_name),
            address_1: non_empty(&fields.address_1),
            company: non_empty(&fields.company),
            postal_code: non_empty(&fields.postal_code),
            city: non_empty(&fields.city),
            country_code: non_empty(&fields.country_code),
            province: non_empty(&fields.province),
            phone: non_empty(&fields.phone),
        }
    }
}

/// One product variant + quantity entry within a cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    /// Unique identifier for the line.
    pub id: LineItemId,
    /// Display title (variant title on the backend).
    pub title: String,
    /// Parent product title.
    #[serde(default)]
    pub product_title: Option<String>,
    /// Thumbnail image URL.
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// Variant this line refers to.
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    /// Quantity ordered.
    pub quantity: u32,
    /// Unit price.
    #[serde(default)]
    pub unit_price: Decimal,
    /// Line total.
    #[serde(default)]
    pub total: Decimal,
}

/// The selected delivery option and its price for a cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingMethod {
    /// Unique identifier for the method.
    pub id: ShippingMethodId,
    /// Shipping option this method was created from.
    #[serde(default)]
    pub shipping_option_id: Option<ShippingOptionId>,
    /// Display name. Only present when requested as an additional field.
    #[serde(default)]
    pub name: Option<String>,
    /// Price of the method.
    #[serde(default)]
    pub amount: Decimal,
}

/// A promotion applied to a cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Promotion {
    /// Unique identifier for the promotion.
    pub id: String,
    /// The user-entered code, absent for automatic promotions.
    #[serde(default)]
    pub code: Option<String>,
    /// Whether the backend applied this promotion automatically.
    #[serde(default)]
    pub is_automatic: bool,
}

/// Partial cart patch. Only set fields are serialized.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CartUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_id: Option<RegionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<AddressFields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<AddressFields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo_codes: Option<Vec<String>>,
}

/// Result of completing a cart.
///
/// The completion endpoint is polymorphic: success carries the placed
/// order; failure carries the unchanged cart plus the error that stopped
/// completion. Decoded by the `type` tag, never shape-sniffed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CartCompletion {
    /// The order was placed; the cart no longer exists server-side.
    Order { order: Box<Order> },
    /// Completion failed; the cart survives with the failure attached.
    Cart {
        cart: Box<Cart>,
        #[serde(default)]
        error: Option<CompletionError>,
    },
}

/// Error payload attached to a failed completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionError {
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::payment::PaymentSessionStatus;
    use super::*;

    fn cart_json(extra: &str) -> String {
        format!(
            r#"{{
                "id": "cart_01",
                "region_id": "reg_01",
                "currency_code": "usd"
                {extra}
            }}"#
        )
    }

    #[test]
    fn test_minimal_cart_decodes_with_defaults() {
        let cart: Cart = serde_json::from_str(&cart_json("")).unwrap();
        assert!(cart.email.is_none());
        assert!(cart.items.is_empty());
        assert!(cart.shipping_methods.is_empty());
        assert_eq!(cart.total, Decimal::ZERO);
    }

    #[test]
    fn test_selected_shipping_option_reads_first_method() {
        let json = cart_json(
            r#", "shipping_methods": [
                {"id": "sm_02", "shipping_option_id": "so_express", "amount": 15},
                {"id": "sm_01", "shipping_option_id": "so_standard", "amount": 5}
            ]"#,
        );
        let cart: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(
            cart.selected_shipping_option().map(ShippingOptionId::as_str),
            Some("so_express")
        );
    }

    #[test]
    fn test_pending_payment_session_skips_other_statuses() {
        let json = cart_json(
            r#", "payment_collection": {
                "id": "paycol_01",
                "payment_sessions": [
                    {"id": "payses_01", "provider_id": "pp_stripe_stripe", "status": "canceled"},
                    {"id": "payses_02", "provider_id": "pp_system_default", "status": "pending"}
                ]
            }"#,
        );
        let cart: Cart = serde_json::from_str(&json).unwrap();
        let session = cart.pending_payment_session().unwrap();
        assert_eq!(session.provider_id, "pp_system_default");
        assert_eq!(session.status, PaymentSessionStatus::Pending);
    }

    #[test]
    fn test_applied_promo_codes_excludes_automatic() {
        let json = cart_json(
            r#", "promotions": [
                {"id": "promo_01", "code": "SUMMER10", "is_automatic": false},
                {"id": "promo_02", "code": "SITEWIDE", "is_automatic": true},
                {"id": "promo_03", "is_automatic": false}
            ]"#,
        );
        let cart: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(cart.applied_promo_codes(), vec!["SUMMER10".to_owned()]);
        assert!(cart.has_promo_code("SITEWIDE"));
        assert!(!cart.has_promo_code("WINTER20"));
    }

    #[test]
    fn test_address_fields_normalize_missing_to_empty() {
        let address = Address {
            first_name: Some("Ada".to_owned()),
            address_1: Some("1 Sea Lane".to_owned()),
            ..Address::default()
        };
        let fields = AddressFields::from(&address);
        assert_eq!(fields.first_name, "Ada");
        assert_eq!(fields.address_1, "1 Sea Lane");
        assert_eq!(fields.last_name, "");
        assert_eq!(fields.country_code, "");
    }

    #[test]
    fn test_address_from_fields_drops_empty_strings() {
        let fields = AddressFields {
            first_name: "Ada".to_owned(),
            address_1: "1 Sea Lane".to_owned(),
            ..AddressFields::default()
        };
        let address = Address::from(&fields);
        assert_eq!(address.first_name.as_deref(), Some("Ada"));
        assert_eq!(address.address_1.as_deref(), Some("1 Sea Lane"));
        assert!(address.company.is_none());
        assert!(address.country_code.is_none());
    }

    #[test]
    fn test_cart_update_serializes_only_set_fields() {
        let update = CartUpdate {
            email: Some("customer@example.com".to_owned()),
            ..CartUpdate::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"email": "customer@example.com"})
        );
    }

    #[test]
    fn test_completion_decodes_order_variant() {
        let json = r#"{
            "type": "order",
            "order": {
                "id": "order_01",
                "display_id": 42,
                "currency_code": "usd",
                "total": 19.99
            }
        }"#;
        let completion: CartCompletion = serde_json::from_str(json).unwrap();
        match completion {
            CartCompletion::Order { order } => assert_eq!(order.display_id, 42),
            CartCompletion::Cart { .. } => panic!("expected order variant"),
        }
    }

    #[test]
    fn test_completion_decodes_cart_variant_with_error() {
        let json = format!(
            r#"{{
                "type": "cart",
                "cart": {},
                "error": {{"message": "card declined"}}
            }}"#,
            cart_json("")
        );
        let completion: CartCompletion = serde_json::from_str(&json).unwrap();
        match completion {
            CartCompletion::Cart { cart, error } => {
                assert_eq!(cart.id.as_str(), "cart_01");
                assert_eq!(error.unwrap().message.as_deref(), Some("card declined"));
            }
            CartCompletion::Order { .. } => panic!("expected cart variant"),
        }
    }
}
