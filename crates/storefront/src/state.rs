//! Application state wiring the stores together.

use std::sync::Arc;

use moonjelly_core::Region;
use tracing::instrument;

use crate::api::StoreApi;
use crate::checkout::{CheckoutError, CheckoutFlow};
use crate::config::Config;
use crate::medusa::MedusaClient;
use crate::storage::{JsonFileStorage, KeyValueStorage, StorageError};
use crate::stores::{CartStore, CustomerStore, RegionStore, StoreError};

/// Application state shared across all front ends.
///
/// This struct is cheaply cloneable via `Arc` and is the composition root:
/// it owns the API client, durable storage and the three session stores,
/// wired together once at startup. Front ends read and mutate session
/// state exclusively through it.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    api: Arc<dyn StoreApi>,
    regions: Arc<RegionStore>,
    cart: Arc<CartStore>,
    customer: Arc<CustomerStore>,
}

impl AppState {
    /// Wire the stores over the given API client and storage.
    #[must_use]
    pub fn new(api: Arc<dyn StoreApi>, storage: Arc<dyn KeyValueStorage>) -> Self {
        let regions = Arc::new(RegionStore::new(api.clone(), storage.clone()));
        let cart = Arc::new(CartStore::new(api.clone(), storage.clone()));
        let customer = Arc::new(CustomerStore::new(api.clone(), storage, cart.clone()));

        Self {
            inner: Arc::new(AppStateInner {
                api,
                regions,
                cart,
                customer,
            }),
        }
    }

    /// Production wiring: a Medusa client plus JSON-file storage under the
    /// configured data directory.
    ///
    /// # Errors
    ///
    /// Returns an error when the state file exists but cannot be read.
    pub async fn from_config(config: &Config) -> Result<Self, StorageError> {
        let api = Arc::new(MedusaClient::new(config));
        let storage = Arc::new(JsonFileStorage::open(config.state_file()).await?);
        Ok(Self::new(api, storage))
    }

    /// Prepare the session for use: pick a region, restore any persisted
    /// customer session, then ensure a cart exists in that region.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend has no regions or a call fails.
    #[instrument(skip(self))]
    pub async fn bootstrap(&self) -> Result<Region, StoreError> {
        let region = self.inner.regions.initialize().await?;
        self.inner.customer.restore().await?;
        self.inner.cart.ensure(&region).await?;
        Ok(region)
    }

    /// Begin a checkout over the active cart.
    ///
    /// # Errors
    ///
    /// Returns an error when no cart is active.
    pub async fn checkout(&self) -> Result<CheckoutFlow, CheckoutError> {
        CheckoutFlow::start(self.inner.api.clone(), self.inner.cart.clone()).await
    }

    /// The backend API client.
    #[must_use]
    pub fn api(&self) -> &Arc<dyn StoreApi> {
        &self.inner.api
    }

    /// The region store.
    #[must_use]
    pub fn regions(&self) -> &RegionStore {
        &self.inner.regions
    }

    /// The cart store.
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    /// The customer store.
    #[must_use]
    pub fn customer(&self) -> &CustomerStore {
        &self.inner.customer
    }
}
