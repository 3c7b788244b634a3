//! Integration tests for Moonjelly.
//!
//! These tests drive the storefront stores against a live Medusa backend
//! and are `#[ignore]`d by default so `cargo test` stays hermetic.
//!
//! # Running Tests
//!
//! ```bash
//! # Point the tests at a seeded Medusa backend
//! export MEDUSA_BACKEND_URL=http://localhost:9000
//! export MEDUSA_PUBLISHABLE_KEY=pk_...
//!
//! cargo test -p moonjelly-integration-tests -- --ignored
//! ```
//!
//! The backend must be seeded with at least one region and one published
//! product. Tests that register customers or place orders create data on
//! the backend, so point them at a disposable store.
//!
//! # Test Categories
//!
//! - `storefront_session` - Region selection, cart bootstrap, persistence
//! - `storefront_cart` - Cart line item and promotion lifecycle
//! - `storefront_auth` - Customer registration, login, address book
//! - `storefront_checkout` - Checkout flow against live shipping/payment

use std::path::PathBuf;

use moonjelly_core::{Product, Region};
use moonjelly_storefront::config::Config;
use moonjelly_storefront::state::AppState;
use url::Url;
use uuid::Uuid;

/// Harness for tests that need a wired storefront over a live backend.
///
/// Each context gets its own throwaway data directory so persisted state
/// (cart id, region id, auth token) never leaks between tests. The
/// directory is removed on drop.
pub struct TestContext {
    pub state: AppState,
    config: Config,
    data_dir: PathBuf,
}

impl TestContext {
    /// Build a context from `MEDUSA_BACKEND_URL` / `MEDUSA_PUBLISHABLE_KEY`.
    ///
    /// # Panics
    ///
    /// Panics when the publishable key is missing or the backend URL does
    /// not parse; integration tests require explicit setup.
    pub async fn from_env() -> Self {
        let backend_url = std::env::var("MEDUSA_BACKEND_URL")
            .unwrap_or_else(|_| "http://localhost:9000".to_string())
            .parse::<Url>()
            .expect("MEDUSA_BACKEND_URL must be a valid URL");
        let publishable_key = std::env::var("MEDUSA_PUBLISHABLE_KEY")
            .expect("MEDUSA_PUBLISHABLE_KEY must be set for integration tests");
        let data_dir = std::env::temp_dir().join(format!("moonjelly-itest-{}", Uuid::new_v4()));

        let config = Config {
            backend_url,
            publishable_key,
            data_dir: data_dir.clone(),
        };
        let state = AppState::from_config(&config)
            .await
            .expect("Failed to open storefront state");

        Self {
            state,
            config,
            data_dir,
        }
    }

    /// Open a second state over the same data directory, as an app restart
    /// would.
    pub async fn reopen(&self) -> AppState {
        AppState::from_config(&self.config)
            .await
            .expect("Failed to reopen storefront state")
    }

    /// Build a context and run the startup sequence, returning the active
    /// region alongside it.
    pub async fn bootstrapped() -> (Self, Region) {
        let ctx = Self::from_env().await;
        let region = ctx
            .state
            .bootstrap()
            .await
            .expect("Failed to bootstrap against live backend");
        (ctx, region)
    }

    /// First published product in the given region.
    ///
    /// # Panics
    ///
    /// Panics when the catalog is empty; cart tests need something to buy.
    pub async fn any_product(&self, region: &Region) -> Product {
        self.state
            .api()
            .list_products(&region.id)
            .await
            .expect("Failed to list products")
            .into_iter()
            .next()
            .expect("Backend must be seeded with at least one product")
    }

    /// Unique email for registration tests.
    #[must_use]
    pub fn unique_email() -> String {
        format!("it-{}@moonjelly.test", Uuid::new_v4().simple())
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.data_dir);
    }
}
