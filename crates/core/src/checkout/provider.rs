//! Payment provider display table.
//!
//! Provider ids come from the backend; display names and the external-step
//! flag are client knowledge, kept in one static table.

/// Identifier of the manual/system-default payment provider.
pub const SYSTEM_DEFAULT_PROVIDER: &str = "pp_system_default";

/// Identifier of the Stripe payment provider.
pub const STRIPE_PROVIDER: &str = "pp_stripe_stripe";

/// Static details for a known payment provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderDetails {
    /// Display name.
    pub name: &'static str,
    /// Whether completing checkout requires an external provider-specific
    /// step (e.g. a hosted payment flow) instead of immediate server-side
    /// completion.
    pub has_external_step: bool,
}

/// Look up details for a provider id. Unknown providers return `None`.
#[must_use]
pub fn provider_details(provider_id: &str) -> Option<ProviderDetails> {
    match provider_id {
        SYSTEM_DEFAULT_PROVIDER => Some(ProviderDetails {
            name: "Manual",
            has_external_step: false,
        }),
        STRIPE_PROVIDER => Some(ProviderDetails {
            name: "Stripe",
            has_external_step: true,
        }),
        _ => None,
    }
}

/// Display name for a provider id, falling back to the raw id.
#[must_use]
pub fn provider_display_name(provider_id: &str) -> &str {
    provider_details(provider_id).map_or(provider_id, |details| details.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_providers_have_details() {
        let manual = provider_details(SYSTEM_DEFAULT_PROVIDER).expect("known provider");
        assert_eq!(manual.name, "Manual");
        assert!(!manual.has_external_step);

        let stripe = provider_details(STRIPE_PROVIDER).expect("known provider");
        assert_eq!(stripe.name, "Stripe");
        assert!(stripe.has_external_step);
    }

    #[test]
    fn unknown_provider_falls_back_to_raw_id() {
        assert!(provider_details("pp_paypal_paypal").is_none());
        assert_eq!(provider_display_name("pp_paypal_paypal"), "pp_paypal_paypal");
        assert_eq!(provider_display_name(STRIPE_PROVIDER), "Stripe");
    }
}
