//! The active cart.
//!
//! One cart is active at a time. Its id is persisted so the cart survives
//! restarts; the snapshot itself is never persisted and is re-fetched from
//! the backend. Every mutation swaps the full server-returned cart into
//! the snapshot - nothing is patched locally, so totals, promotions and
//! payment state always match the backend.

use std::sync::Arc;

use moonjelly_core::{Cart, CartId, CartUpdate, LineItemId, Region, ShippingOptionId, VariantId};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::api::StoreApi;
use crate::storage::{KeyValueStorage, keys};

use super::StoreError;

/// Holds the active cart and keeps the stored cart id in sync.
pub struct CartStore {
    api: Arc<dyn StoreApi>,
    storage: Arc<dyn KeyValueStorage>,
    cart: RwLock<Option<Cart>>,
}

impl CartStore {
    pub fn new(api: Arc<dyn StoreApi>, storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            api,
            storage,
            cart: RwLock::new(None),
        }
    }

    /// The current cart snapshot, if one is active.
    pub async fn current(&self) -> Option<Cart> {
        self.cart.read().await.clone()
    }

    /// The current cart, or an error when none is active.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoCart`] without an active cart.
    pub async fn require(&self) -> Result<Cart, StoreError> {
        self.current().await.ok_or(StoreError::NoCart)
    }

    async fn swap_in(&self, cart: Cart) -> Cart {
        *self.cart.write().await = Some(cart.clone());
        cart
    }

    /// Make sure an active cart exists in the given region.
    ///
    /// Restores the stored cart when there is one, creates a new cart
    /// otherwise, and moves a cart left in a different region over to the
    /// selected one. A stored id pointing at a cart the backend no longer
    /// knows is discarded and replaced.
    ///
    /// # Errors
    ///
    /// Returns an API or storage error. Region mismatch repair failures
    /// are not errors; the cart is reset and recreated instead.
    #[instrument(skip(self, region), fields(region_id = %region.id))]
    pub async fn ensure(&self, region: &Region) -> Result<Cart, StoreError> {
        if let Some(cart) = self.current().await {
            return self.reconcile_region(cart, region).await;
        }

        if let Some(stored_id) = self.storage.get(keys::CART_ID).await? {
            match self.api.get_cart(&CartId::new(stored_id)).await {
                Ok(cart) => return self.reconcile_region(cart, region).await,
                Err(err) if err.is_not_found() => {
                    warn!("stored cart no longer exists, creating a new one");
                    self.storage.remove(keys::CART_ID).await?;
                }
                Err(err) => return Err(err.into()),
            }
        }

        let cart = self.api.create_cart(&region.id).await?;
        self.storage.set(keys::CART_ID, cart.id.as_str()).await?;
        info!(cart_id = %cart.id, "created cart");
        Ok(self.swap_in(cart).await)
    }

    /// Move a cart into the selected region when they disagree. A cart
    /// that cannot be moved is abandoned and replaced by a fresh one.
    async fn reconcile_region(&self, cart: Cart, region: &Region) -> Result<Cart, StoreError> {
        if cart.region_id == region.id {
            return Ok(self.swap_in(cart).await);
        }

        let update = CartUpdate {
            region_id: Some(region.id.clone()),
            ..CartUpdate::default()
        };
        match self.api.update_cart(&cart.id, update).await {
            Ok(updated) => {
                info!(cart_id = %updated.id, "moved cart to selected region");
                Ok(self.swap_in(updated).await)
            }
            Err(err) => {
                warn!(error = %err, "failed to move cart to selected region, resetting");
                self.reset().await?;
                let cart = self.api.create_cart(&region.id).await?;
                self.storage.set(keys::CART_ID, cart.id.as_str()).await?;
                Ok(self.swap_in(cart).await)
            }
        }
    }

    /// Drop the active cart and its stored id.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the stored id cannot be removed.
    pub async fn reset(&self) -> Result<(), StoreError> {
        self.storage.remove(keys::CART_ID).await?;
        *self.cart.write().await = None;
        Ok(())
    }

    /// Re-fetch the active cart from the backend.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoCart`] without an active cart.
    pub async fn refresh(&self) -> Result<Cart, StoreError> {
        let cart = self.require().await?;
        let updated = self.api.get_cart(&cart.id).await?;
        Ok(self.swap_in(updated).await)
    }

    /// Apply a partial update to the active cart.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoCart`] without an active cart, or the API
    /// error when the backend rejects the update.
    #[instrument(skip(self, update))]
    pub async fn update(&self, update: CartUpdate) -> Result<Cart, StoreError> {
        let cart = self.require().await?;
        let updated = self.api.update_cart(&cart.id, update).await?;
        Ok(self.swap_in(updated).await)
    }

    /// Add a variant to the active cart.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoCart`] without an active cart.
    #[instrument(skip(self), fields(variant_id = %variant_id, quantity))]
    pub async fn add_item(&self, variant_id: &VariantId, quantity: u32) -> Result<Cart, StoreError> {
        let cart = self.require().await?;
        let updated = self.api.add_line_item(&cart.id, variant_id, quantity).await?;
        Ok(self.swap_in(updated).await)
    }

    /// Set a line's quantity. Zero removes the line; because the deletion
    /// response carries no cart, the snapshot comes from a follow-up fetch.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoCart`] without an active cart.
    #[instrument(skip(self), fields(line_item_id = %line_item_id, quantity))]
    pub async fn update_quantity(
        &self,
        line_item_id: &LineItemId,
        quantity: u32,
    ) -> Result<Cart, StoreError> {
        let cart = self.require().await?;
        let updated = if quantity == 0 {
            self.api.delete_line_item(&cart.id, line_item_id).await?;
            self.api.get_cart(&cart.id).await?
        } else {
            self.api
                .update_line_item(&cart.id, line_item_id, quantity)
                .await?
        };
        Ok(self.swap_in(updated).await)
    }

    /// Try to apply a promotion code.
    ///
    /// Returns whether the code is reflected on the updated cart: the
    /// backend accepts unknown codes without error and simply drops them,
    /// so acceptance can only be read off the returned snapshot. A failed
    /// update call also reports `false` rather than an error; the buyer
    /// retypes the code either way.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoCart`] without an active cart.
    #[instrument(skip(self), fields(code = %code))]
    pub async fn apply_promo_code(&self, code: &str) -> Result<bool, StoreError> {
        let cart = self.require().await?;
        let mut codes = cart.applied_promo_codes();
        codes.push(code.to_owned());

        let update = CartUpdate {
            promo_codes: Some(codes),
            ..CartUpdate::default()
        };
        match self.api.update_cart(&cart.id, update).await {
            Ok(updated) => {
                let accepted = updated.has_promo_code(code);
                self.swap_in(updated).await;
                Ok(accepted)
            }
            Err(err) => {
                debug!(error = %err, "promo code update failed");
                Ok(false)
            }
        }
    }

    /// Remove a promotion code by resubmitting the remaining codes.
    ///
    /// # Errors
    ///
    /// Unlike application, removal failures propagate: silently keeping a
    /// discount the buyer asked to drop is worse than showing an error.
    #[instrument(skip(self), fields(code = %code))]
    pub async fn remove_promo_code(&self, code: &str) -> Result<Cart, StoreError> {
        let cart = self.require().await?;
        let codes: Vec<String> = cart
            .applied_promo_codes()
            .into_iter()
            .filter(|applied| applied != code)
            .collect();

        let update = CartUpdate {
            promo_codes: Some(codes),
            ..CartUpdate::default()
        };
        let updated = self.api.update_cart(&cart.id, update).await?;
        Ok(self.swap_in(updated).await)
    }

    /// Select a shipping option for the active cart.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoCart`] without an active cart. On failure
    /// the snapshot keeps its previous selection.
    #[instrument(skip(self), fields(option_id = %option_id))]
    pub async fn set_shipping_method(
        &self,
        option_id: &ShippingOptionId,
    ) -> Result<Cart, StoreError> {
        let cart = self.require().await?;
        let updated = self.api.add_shipping_method(&cart.id, option_id).await?;
        Ok(self.swap_in(updated).await)
    }

    /// Attach the active cart to the authenticated customer.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoCart`] without an active cart.
    #[instrument(skip(self))]
    pub async fn link_to_customer(&self) -> Result<Cart, StoreError> {
        let cart = self.require().await?;
        let updated = self.api.transfer_cart(&cart.id).await?;
        Ok(self.swap_in(updated).await)
    }

    /// Create a payment session for the given provider, then re-fetch the
    /// cart so the snapshot carries the pending session.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoCart`] without an active cart.
    #[instrument(skip(self), fields(provider_id = %provider_id))]
    pub async fn initiate_payment_session(&self, provider_id: &str) -> Result<Cart, StoreError> {
        let cart = self.require().await?;
        self.api.initiate_payment_session(&cart, provider_id).await?;
        let updated = self.api.get_cart(&cart.id).await?;
        Ok(self.swap_in(updated).await)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use moonjelly_core::RegionId;

    use super::*;
    use crate::api::InMemoryStore;
    use crate::storage::MemoryStorage;

    struct Fixture {
        api: Arc<InMemoryStore>,
        storage: Arc<MemoryStorage>,
        cart: CartStore,
    }

    impl Fixture {
        fn new() -> Self {
            let api = Arc::new(InMemoryStore::new());
            let storage = Arc::new(MemoryStorage::new());
            let cart = CartStore::new(api.clone(), storage.clone());
            Self { api, storage, cart }
        }

        async fn atlantic(&self) -> Region {
            self.api
                .get_region(&RegionId::new(InMemoryStore::REGION_ATLANTIC))
                .await
                .unwrap()
        }

        async fn baltic(&self) -> Region {
            self.api
                .get_region(&RegionId::new(InMemoryStore::REGION_BALTIC))
                .await
                .unwrap()
        }
    }

    fn tee_small() -> VariantId {
        VariantId::new(InMemoryStore::VARIANT_TEE_S)
    }

    #[tokio::test]
    async fn test_ensure_creates_and_persists_cart() {
        let fx = Fixture::new();
        let region = fx.atlantic().await;
        let cart = fx.cart.ensure(&region).await.unwrap();
        assert_eq!(
            fx.storage.get(keys::CART_ID).await.unwrap().as_deref(),
            Some(cart.id.as_str())
        );
        assert_eq!(fx.cart.current().await.unwrap().id, cart.id);
    }

    #[tokio::test]
    async fn test_ensure_restores_stored_cart() {
        let fx = Fixture::new();
        let region = fx.atlantic().await;
        let cart = fx.cart.ensure(&region).await.unwrap();
        fx.cart.add_item(&tee_small(), 1).await.unwrap();

        // Fresh store over the same storage and backend: same cart.
        let restored_store = CartStore::new(fx.api.clone(), fx.storage.clone());
        let restored = restored_store.ensure(&region).await.unwrap();
        assert_eq!(restored.id, cart.id);
        assert_eq!(restored.items.len(), 1);
    }

    #[tokio::test]
    async fn test_ensure_recreates_when_stored_cart_is_gone() {
        let fx = Fixture::new();
        fx.storage.set(keys::CART_ID, "cart_stale").await.unwrap();
        let region = fx.atlantic().await;
        let cart = fx.cart.ensure(&region).await.unwrap();
        assert_ne!(cart.id.as_str(), "cart_stale");
        assert_eq!(
            fx.storage.get(keys::CART_ID).await.unwrap().as_deref(),
            Some(cart.id.as_str())
        );
    }

    #[tokio::test]
    async fn test_ensure_moves_cart_to_selected_region() {
        let fx = Fixture::new();
        let cart = fx.cart.ensure(&fx.atlantic().await).await.unwrap();
        assert_eq!(cart.currency_code, "usd");

        let moved = fx.cart.ensure(&fx.baltic().await).await.unwrap();
        assert_eq!(moved.id, cart.id);
        assert_eq!(moved.region_id.as_str(), InMemoryStore::REGION_BALTIC);
        assert_eq!(moved.currency_code, "eur");
    }

    #[tokio::test]
    async fn test_ensure_replaces_cart_when_region_move_fails() {
        let fx = Fixture::new();
        let cart = fx.cart.ensure(&fx.atlantic().await).await.unwrap();

        fx.api.set_fail_next_cart_update(true).await;
        let replacement = fx.cart.ensure(&fx.baltic().await).await.unwrap();
        assert_ne!(replacement.id, cart.id);
        assert_eq!(replacement.region_id.as_str(), InMemoryStore::REGION_BALTIC);
        assert_eq!(
            fx.storage.get(keys::CART_ID).await.unwrap().as_deref(),
            Some(replacement.id.as_str())
        );
    }

    #[tokio::test]
    async fn test_operations_without_cart_report_no_cart() {
        let fx = Fixture::new();
        let err = fx.cart.add_item(&tee_small(), 1).await.unwrap_err();
        assert!(matches!(err, StoreError::NoCart));
        assert_eq!(err.to_string(), "No cart found");
    }

    #[tokio::test]
    async fn test_quantity_zero_deletes_line_and_refetches() {
        let fx = Fixture::new();
        fx.cart.ensure(&fx.atlantic().await).await.unwrap();
        let cart = fx.cart.add_item(&tee_small(), 2).await.unwrap();
        let line_id = cart.items.first().unwrap().id.clone();

        let updated = fx.cart.update_quantity(&line_id, 0).await.unwrap();
        assert!(updated.items.is_empty());
        assert_eq!(updated.subtotal, rust_decimal::Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_update_quantity_swaps_server_snapshot() {
        let fx = Fixture::new();
        fx.cart.ensure(&fx.atlantic().await).await.unwrap();
        let cart = fx.cart.add_item(&tee_small(), 1).await.unwrap();
        let line_id = cart.items.first().unwrap().id.clone();

        let updated = fx.cart.update_quantity(&line_id, 3).await.unwrap();
        assert_eq!(updated.items.first().unwrap().quantity, 3);
        assert_eq!(updated.subtotal, rust_decimal::Decimal::new(75, 0));
        assert_eq!(fx.cart.current().await.unwrap().subtotal, updated.subtotal);
    }

    #[tokio::test]
    async fn test_apply_promo_code_reports_acceptance() {
        let fx = Fixture::new();
        fx.cart.ensure(&fx.atlantic().await).await.unwrap();
        fx.cart.add_item(&tee_small(), 1).await.unwrap();

        assert!(fx
            .cart
            .apply_promo_code(InMemoryStore::PROMO_TENOFF)
            .await
            .unwrap());
        // Unknown codes are dropped server-side without an error.
        assert!(!fx.cart.apply_promo_code("BOGUS").await.unwrap());
        // The earlier code survives the failed attempt.
        assert!(fx
            .cart
            .current()
            .await
            .unwrap()
            .has_promo_code(InMemoryStore::PROMO_TENOFF));
    }

    #[tokio::test]
    async fn test_apply_promo_code_failure_reports_false() {
        let fx = Fixture::new();
        fx.cart.ensure(&fx.atlantic().await).await.unwrap();
        fx.api.set_fail_next_cart_update(true).await;
        assert!(!fx
            .cart
            .apply_promo_code(InMemoryStore::PROMO_TENOFF)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_apply_promo_code_without_cart_is_an_error() {
        let fx = Fixture::new();
        let err = fx
            .cart
            .apply_promo_code(InMemoryStore::PROMO_TENOFF)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NoCart));
    }

    #[tokio::test]
    async fn test_remove_promo_code_resubmits_remaining() {
        let fx = Fixture::new();
        fx.cart.ensure(&fx.atlantic().await).await.unwrap();
        fx.cart.add_item(&tee_small(), 1).await.unwrap();
        fx.cart
            .apply_promo_code(InMemoryStore::PROMO_TENOFF)
            .await
            .unwrap();

        let updated = fx
            .cart
            .remove_promo_code(InMemoryStore::PROMO_TENOFF)
            .await
            .unwrap();
        assert!(!updated.has_promo_code(InMemoryStore::PROMO_TENOFF));
        assert_eq!(updated.discount_total, rust_decimal::Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_remove_promo_code_failure_propagates() {
        let fx = Fixture::new();
        fx.cart.ensure(&fx.atlantic().await).await.unwrap();
        fx.cart
            .apply_promo_code(InMemoryStore::PROMO_TENOFF)
            .await
            .unwrap();

        fx.api.set_fail_next_cart_update(true).await;
        let err = fx
            .cart
            .remove_promo_code(InMemoryStore::PROMO_TENOFF)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Api(_)));
    }

    #[tokio::test]
    async fn test_set_shipping_method_swaps_snapshot() {
        let fx = Fixture::new();
        fx.cart.ensure(&fx.atlantic().await).await.unwrap();
        fx.cart.add_item(&tee_small(), 1).await.unwrap();

        let updated = fx
            .cart
            .set_shipping_method(&ShippingOptionId::new(InMemoryStore::OPTION_EXPRESS))
            .await
            .unwrap();
        assert_eq!(
            updated.selected_shipping_option().map(ShippingOptionId::as_str),
            Some(InMemoryStore::OPTION_EXPRESS)
        );
        assert_eq!(updated.shipping_total, rust_decimal::Decimal::new(15, 0));
    }

    #[tokio::test]
    async fn test_initiate_payment_session_refreshes_snapshot() {
        let fx = Fixture::new();
        fx.cart.ensure(&fx.atlantic().await).await.unwrap();
        fx.cart.add_item(&tee_small(), 1).await.unwrap();

        let updated = fx
            .cart
            .initiate_payment_session(moonjelly_core::SYSTEM_DEFAULT_PROVIDER)
            .await
            .unwrap();
        let session = updated.pending_payment_session().unwrap();
        assert_eq!(session.provider_id, moonjelly_core::SYSTEM_DEFAULT_PROVIDER);
    }

    #[tokio::test]
    async fn test_reset_clears_snapshot_and_storage() {
        let fx = Fixture::new();
        fx.cart.ensure(&fx.atlantic().await).await.unwrap();
        fx.cart.reset().await.unwrap();
        assert!(fx.cart.current().await.is_none());
        assert!(fx.storage.get(keys::CART_ID).await.unwrap().is_none());
    }
}
