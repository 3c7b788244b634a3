//! Payment collection, session and provider types.

use serde::{Deserialize, Serialize};

use super::id::{PaymentCollectionId, PaymentSessionId};

/// The payment container attached to a cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCollection {
    /// Unique identifier for the collection.
    pub id: PaymentCollectionId,
    /// Sessions created against this collection, one per provider attempt.
    #[serde(default)]
    pub payment_sessions: Vec<PaymentSession>,
}

/// A server-side record tracking a chosen payment provider's state for a
/// cart's payment collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSession {
    /// Unique identifier for the session.
    pub id: PaymentSessionId,
    /// Provider the session was initiated with, e.g. `pp_system_default`.
    pub provider_id: String,
    /// Lifecycle status of the session.
    pub status: PaymentSessionStatus,
}

/// Payment session lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentSessionStatus {
    #[default]
    Pending,
    Authorized,
    Captured,
    Canceled,
    RequiresMore,
    Error,
}

/// A payment provider available in a region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentProvider {
    /// Provider identifier, e.g. `pp_stripe_stripe`.
    pub id: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_session_status_uses_snake_case() {
        let json = r#"{"id": "payses_01", "provider_id": "pp_stripe_stripe", "status": "requires_more"}"#;
        let session: PaymentSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.status, PaymentSessionStatus::RequiresMore);
    }
}
