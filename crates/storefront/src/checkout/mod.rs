//! The checkout orchestrator.
//!
//! Checkout is a four-step walk over one cart: address, delivery, payment,
//! review. The pure step logic (deriver, form validation, provider table)
//! lives in `moonjelly_core::checkout`; this module adds the stateful
//! orchestration that talks to the backend.
//!
//! The orchestrator holds a UI cursor that starts at the derived step and
//! only ever moves through [`CheckoutFlow::advance`] and
//! [`CheckoutFlow::go_to_step`]. The cursor may sit ahead of the derived
//! step (a buyer reviewing their order) but never behind it at
//! initialization.

use moonjelly_core::{CheckoutStep, FormErrors, Order};
use thiserror::Error;

use crate::api::ApiError;
use crate::stores::StoreError;

mod flow;

pub use flow::{CheckoutFlow, ReviewSummary};

/// Errors surfaced while walking the checkout steps.
///
/// Every variant's `Display` output is buyer-facing copy; the orchestrator
/// records it as the transient error message for the current step.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The address form failed client-side validation; nothing was sent.
    #[error(transparent)]
    Form(#[from] FormErrors),

    /// Advancing past the payment step without a chosen provider.
    #[error("Please select a payment method")]
    NoPaymentMethod,

    /// The chosen provider needs an external flow this client does not
    /// implement.
    #[error("Payment provider not supported")]
    UnsupportedProvider,

    /// Selecting a delivery option failed server-side; the previous
    /// selection stands.
    #[error("Failed to update shipping method")]
    ShippingMethodUpdate(#[source] StoreError),

    /// The completion call succeeded transport-wise but returned the cart
    /// with an error instead of an order.
    #[error("{message}")]
    CompletionRejected { message: String },

    /// Step navigation may only go backward.
    #[error("Cannot skip ahead to the {0} step")]
    ForwardNavigation(CheckoutStep),

    /// A store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A direct API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// What happened when the current step was submitted.
#[derive(Debug)]
pub enum AdvanceOutcome {
    /// The cursor moved to the given step.
    MovedTo(CheckoutStep),

    /// The chosen provider requires finishing payment in an external,
    /// provider-specific flow before the cart can be completed.
    ExternalPaymentRequired {
        /// Provider to hand control to.
        provider_id: String,
    },

    /// The order was placed. The cart has been reset; checkout is over.
    OrderPlaced(Box<Order>),
}
