//! Region selection.
//!
//! A region anchors currency and country choices, so one must be selected
//! before any cart exists. Selection is sticky: the chosen region id is
//! persisted and restored on the next launch.

use std::sync::Arc;

use moonjelly_core::{Country, Region, RegionId};
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::api::StoreApi;
use crate::storage::{KeyValueStorage, keys};

use super::StoreError;

/// Holds the selected region and keeps the stored id in sync.
pub struct RegionStore {
    api: Arc<dyn StoreApi>,
    storage: Arc<dyn KeyValueStorage>,
    region: RwLock<Option<Region>>,
}

impl RegionStore {
    pub fn new(api: Arc<dyn StoreApi>, storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            api,
            storage,
            region: RwLock::new(None),
        }
    }

    /// The selected region, if initialization has run.
    pub async fn current(&self) -> Option<Region> {
        self.region.read().await.clone()
    }

    /// Restore the persisted region, falling back to the store's first
    /// region when nothing usable is stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoRegion`] when the backend lists no regions,
    /// or an API/storage error.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<Region, StoreError> {
        if let Some(stored_id) = self.storage.get(keys::REGION_ID).await? {
            match self.api.get_region(&RegionId::new(stored_id)).await {
                Ok(region) => {
                    *self.region.write().await = Some(region.clone());
                    return Ok(region);
                }
                Err(err) if err.is_not_found() => {
                    warn!("stored region no longer exists, falling back to the first region");
                }
                Err(err) => return Err(err.into()),
            }
        }

        let regions = self.api.list_regions().await?;
        let region = regions.into_iter().next().ok_or(StoreError::NoRegion)?;
        self.storage.set(keys::REGION_ID, region.id.as_str()).await?;
        *self.region.write().await = Some(region.clone());
        info!(region_id = %region.id, "selected default region");
        Ok(region)
    }

    /// All regions the store sells to, for pickers.
    ///
    /// # Errors
    ///
    /// Returns an API error if the listing fails.
    pub async fn list(&self) -> Result<Vec<Region>, StoreError> {
        Ok(self.api.list_regions().await?)
    }

    /// Select a region and persist the choice.
    ///
    /// The caller is responsible for reconciling the active cart
    /// afterwards (see [`super::CartStore::ensure`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the region does not exist or persisting fails.
    #[instrument(skip(self), fields(region_id = %region_id))]
    pub async fn select(&self, region_id: &RegionId) -> Result<Region, StoreError> {
        let region = self.api.get_region(region_id).await?;
        self.storage.set(keys::REGION_ID, region.id.as_str()).await?;
        *self.region.write().await = Some(region.clone());
        Ok(region)
    }

    /// Countries of the selected region, for address forms.
    pub async fn countries(&self) -> Vec<Country> {
        self.region
            .read()
            .await
            .as_ref()
            .map(|region| region.countries.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::InMemoryStore;
    use crate::storage::MemoryStorage;

    fn store() -> (RegionStore, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let api = Arc::new(InMemoryStore::new());
        (RegionStore::new(api, storage.clone()), storage)
    }

    #[tokio::test]
    async fn test_initialize_picks_first_region_and_persists() {
        let (regions, storage) = store();
        let region = regions.initialize().await.unwrap();
        assert_eq!(region.id.as_str(), InMemoryStore::REGION_ATLANTIC);
        assert_eq!(
            storage.get(keys::REGION_ID).await.unwrap().as_deref(),
            Some(InMemoryStore::REGION_ATLANTIC)
        );
    }

    #[tokio::test]
    async fn test_initialize_restores_stored_region() {
        let (regions, storage) = store();
        storage
            .set(keys::REGION_ID, InMemoryStore::REGION_BALTIC)
            .await
            .unwrap();
        let region = regions.initialize().await.unwrap();
        assert_eq!(region.id.as_str(), InMemoryStore::REGION_BALTIC);
        assert_eq!(region.currency_code, "eur");
    }

    #[tokio::test]
    async fn test_initialize_falls_back_when_stored_region_is_gone() {
        let (regions, storage) = store();
        storage.set(keys::REGION_ID, "reg_retired").await.unwrap();
        let region = regions.initialize().await.unwrap();
        assert_eq!(region.id.as_str(), InMemoryStore::REGION_ATLANTIC);
        // The fallback choice replaces the stale stored id.
        assert_eq!(
            storage.get(keys::REGION_ID).await.unwrap().as_deref(),
            Some(InMemoryStore::REGION_ATLANTIC)
        );
    }

    #[tokio::test]
    async fn test_select_persists_and_updates_snapshot() {
        let (regions, storage) = store();
        regions.initialize().await.unwrap();
        let region = regions
            .select(&RegionId::new(InMemoryStore::REGION_BALTIC))
            .await
            .unwrap();
        assert_eq!(region.currency_code, "eur");
        assert_eq!(
            storage.get(keys::REGION_ID).await.unwrap().as_deref(),
            Some(InMemoryStore::REGION_BALTIC)
        );
        assert_eq!(
            regions.current().await.unwrap().id.as_str(),
            InMemoryStore::REGION_BALTIC
        );
    }

    #[tokio::test]
    async fn test_countries_come_from_selected_region() {
        let (regions, _storage) = store();
        assert!(regions.countries().await.is_empty());
        regions.initialize().await.unwrap();
        let countries = regions.countries().await;
        assert!(countries.iter().any(|country| country.iso_2 == "us"));
    }
}
