//! Unified error handling.
//!
//! Provides a single `AppError` that front ends can hold when they do not
//! care which layer failed. Store and checkout errors pass through
//! transparently because their `Display` output is buyer-facing copy that
//! must reach the screen unchanged.

use thiserror::Error;

use crate::api::ApiError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::storage::StorageError;
use crate::stores::StoreError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A backend API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A session store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A checkout transition failed.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// Durable storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_keep_user_facing_copy() {
        let err = AppError::from(StoreError::NoCart);
        assert_eq!(err.to_string(), "No cart found");
    }

    #[test]
    fn test_checkout_errors_keep_user_facing_copy() {
        let err = AppError::from(CheckoutError::NoPaymentMethod);
        assert_eq!(err.to_string(), "Please select a payment method");
    }
}
