//! Checkout form validation.
//!
//! Validation runs client-side before the address step submits; a failed
//! form never reaches the network. Messages here are user-facing copy and
//! must stay stable.

use serde::{Deserialize, Serialize};

use crate::types::cart::{AddressFields, Cart};
use crate::types::email::Email;

/// One failed form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Dotted field path, e.g. `shipping_address.city`.
    pub field: String,
    /// User-facing message.
    pub message: &'static str,
}

/// Validation failure: one entry per failed field.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{}", .errors.iter().map(|e| e.message).collect::<Vec<_>>().join("; "))]
pub struct FormErrors {
    pub errors: Vec<FieldError>,
}

impl FormErrors {
    /// Messages in field order.
    #[must_use]
    pub fn messages(&self) -> Vec<&'static str> {
        self.errors.iter().map(|error| error.message).collect()
    }
}

/// The checkout address form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutForm {
    pub email: String,
    pub shipping_address: AddressFields,
    pub billing_address: AddressFields,
    /// When set, the billing address is replaced by the shipping address at
    /// submission time; the billing fields are neither validated nor sent
    /// as entered.
    pub use_same_billing: bool,
}

impl Default for CheckoutForm {
    fn default() -> Self {
        Self {
            email: String::new(),
            shipping_address: AddressFields::default(),
            billing_address: AddressFields::default(),
            use_same_billing: true,
        }
    }
}

impl CheckoutForm {
    /// Prefill from a cart: existing email and addresses, with "use same
    /// billing" set when billing matches shipping (or neither is captured
    /// yet).
    #[must_use]
    pub fn from_cart(cart: &Cart) -> Self {
        let shipping = cart
            .shipping_address
            .as_ref()
            .map(AddressFields::from)
            .unwrap_or_default();
        let billing = cart
            .billing_address
            .as_ref()
            .map(AddressFields::from)
            .unwrap_or_default();
        let use_same_billing = match (&cart.billing_address, &cart.shipping_address) {
            (Some(_), Some(_)) => billing == shipping,
            _ => true,
        };
        Self {
            email: cart.email.clone().unwrap_or_default(),
            shipping_address: shipping,
            billing_address: billing,
            use_same_billing,
        }
    }

    /// Validate the form and produce the submission payload.
    ///
    /// Billing fields are only validated when they will actually be sent;
    /// with `use_same_billing` set they are replaced by the shipping
    /// address instead.
    ///
    /// # Errors
    ///
    /// Returns every failed field with its user-facing message.
    pub fn validated(&self) -> Result<CheckoutSubmission, FormErrors> {
        let mut errors = Vec::new();

        if Email::parse(&self.email).is_err() {
            errors.push(FieldError {
                field: "email".to_owned(),
                message: "Please enter a valid email",
            });
        }

        validate_address("shipping_address", &self.shipping_address, &mut errors);
        if !self.use_same_billing {
            validate_address("billing_address", &self.billing_address, &mut errors);
        }

        if !errors.is_empty() {
            return Err(FormErrors { errors });
        }

        let billing_address = if self.use_same_billing {
            self.shipping_address.clone()
        } else {
            self.billing_address.clone()
        };

        Ok(CheckoutSubmission {
            email: self.email.clone(),
            shipping_address: self.shipping_address.clone(),
            billing_address,
        })
    }
}

/// Validated form data ready for the address-step cart update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSubmission {
    pub email: String,
    pub shipping_address: AddressFields,
    pub billing_address: AddressFields,
}

fn validate_address(prefix: &str, address: &AddressFields, errors: &mut Vec<FieldError>) {
    let mut require = |name: &str, value: &str, message: &'static str| {
        if value.is_empty() {
            errors.push(FieldError {
                field: format!("{prefix}.{name}"),
                message,
            });
        }
    };

    require("first_name", &address.first_name, "First name is required");
    require("last_name", &address.last_name, "Last name is required");
    require("address_1", &address.address_1, "Address is required");
    require("postal_code", &address.postal_code, "Postal code is required");
    require("city", &address.city, "City is required");
    require("country_code", &address.country_code, "Country is required");
    require("phone", &address.phone, "Phone is required");
    // company and province are optional
}
