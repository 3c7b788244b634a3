//! Checkout domain: the step deriver, form validation and the payment
//! provider table.
//!
//! Everything in this module is pure. The orchestration that talks to the
//! backend lives in the storefront crate; it leans on these types so the
//! step logic stays testable without any I/O.

pub mod form;
pub mod provider;
pub mod step;

pub use form::{CheckoutForm, CheckoutSubmission, FieldError, FormErrors};
pub use provider::{
    ProviderDetails, STRIPE_PROVIDER, SYSTEM_DEFAULT_PROVIDER, provider_details,
    provider_display_name,
};
pub use step::CheckoutStep;
