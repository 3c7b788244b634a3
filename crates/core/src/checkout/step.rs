//! Checkout steps and the step deriver.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::types::cart::Cart;

/// One of the four ordered checkout steps.
///
/// Steps are never persisted. The current required step is re-derived from
/// the cart snapshot via [`CheckoutStep::derive`]; the orchestrator holds a
/// separate UI cursor so a buyer revisiting an earlier step is not snapped
/// forward after every field edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStep {
    Address,
    Delivery,
    Payment,
    Review,
}

impl CheckoutStep {
    /// All steps, in checkout order.
    pub const ALL: [Self; 4] = [Self::Address, Self::Delivery, Self::Payment, Self::Review];

    /// Derive the lowest-numbered step the cart has not yet satisfied.
    ///
    /// Precedence:
    /// 1. `Address` while the shipping address line or the email is empty.
    /// 2. `Delivery` while no shipping method carries a shipping option.
    /// 3. `Payment` while the total is exactly zero, or while no pending
    ///    payment session exists.
    /// 4. `Review` otherwise.
    ///
    /// Pure and idempotent: the same snapshot always derives the same step.
    #[must_use]
    pub fn derive(cart: &Cart) -> Self {
        let has_address_line = cart
            .shipping_address
            .as_ref()
            .and_then(|address| address.address_1.as_deref())
            .is_some_and(|line| !line.is_empty());
        let has_email = cart.email.as_deref().is_some_and(|email| !email.is_empty());

        if !has_address_line || !has_email {
            return Self::Address;
        }

        if cart.selected_shipping_option().is_none() {
            return Self::Delivery;
        }

        if cart.total.is_zero() || cart.pending_payment_session().is_none() {
            return Self::Payment;
        }

        Self::Review
    }

    /// Position of this step in checkout order, starting at 0.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Address => 0,
            Self::Delivery => 1,
            Self::Payment => 2,
            Self::Review => 3,
        }
    }

    /// The step after this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Address => Some(Self::Delivery),
            Self::Delivery => Some(Self::Payment),
            Self::Payment => Some(Self::Review),
            Self::Review => None,
        }
    }

    /// Display title shown in the step indicator.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Address => "Address",
            Self::Delivery => "Delivery",
            Self::Payment => "Payment",
            Self::Review => "Review",
        }
    }

    /// Wire/lowercase name of the step.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Address => "address",
            Self::Delivery => "delivery",
            Self::Payment => "payment",
            Self::Review => "review",
        }
    }
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
