//! The authenticated customer.
//!
//! Auth is token-based: login/registration produce a token that is
//! installed on the API client, persisted, and restored on launch. The
//! profile snapshot is replaced by the server's returned customer after
//! every mutation, like the cart.

use std::sync::Arc;

use moonjelly_core::{AddressFields, AddressId, Customer, CustomerAddress, CustomerUpdate, NewCustomer};
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::api::StoreApi;
use crate::storage::{KeyValueStorage, keys};

use super::{CartStore, StoreError};

/// Holds the authenticated customer and keeps the stored token in sync.
///
/// Login and logout touch the cart: a guest cart is attached to the
/// account on login, and the cart is reset on logout so the next session
/// starts clean.
pub struct CustomerStore {
    api: Arc<dyn StoreApi>,
    storage: Arc<dyn KeyValueStorage>,
    cart: Arc<CartStore>,
    customer: RwLock<Option<Customer>>,
}

impl CustomerStore {
    pub fn new(
        api: Arc<dyn StoreApi>,
        storage: Arc<dyn KeyValueStorage>,
        cart: Arc<CartStore>,
    ) -> Self {
        Self {
            api,
            storage,
            cart,
            customer: RwLock::new(None),
        }
    }

    /// The authenticated customer, if a session is active.
    pub async fn current(&self) -> Option<Customer> {
        self.customer.read().await.clone()
    }

    async fn swap_in(&self, customer: Customer) -> Customer {
        *self.customer.write().await = Some(customer.clone());
        customer
    }

    /// Restore the session from a stored token, clearing the token if the
    /// backend no longer accepts it.
    ///
    /// # Errors
    ///
    /// Returns an error for API failures other than an invalid token, or
    /// for storage failures. Returns `Ok(None)` when no session exists.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> Result<Option<Customer>, StoreError> {
        let Some(token) = self.storage.get(keys::AUTH_TOKEN).await? else {
            return Ok(None);
        };

        self.api.set_auth_token(Some(token)).await;
        match self.api.get_customer().await {
            Ok(customer) => {
                info!(customer_id = %customer.id, "restored customer session");
                Ok(Some(self.swap_in(customer).await))
            }
            Err(err) if err.is_unauthorized() => {
                warn!("stored auth token is no longer valid, clearing it");
                self.api.set_auth_token(None).await;
                self.storage.remove(keys::AUTH_TOKEN).await?;
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Log in with email/password credentials.
    ///
    /// Persists and installs the token, loads the profile, then attaches
    /// the active cart to the account. Cart attachment is best-effort: a
    /// failure is logged, not surfaced, because the session itself is
    /// already established.
    ///
    /// # Errors
    ///
    /// Returns the API error when the credentials are rejected.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Customer, StoreError> {
        let token = self.api.login(email, password).await?;
        self.storage.set(keys::AUTH_TOKEN, &token).await?;
        self.api.set_auth_token(Some(token)).await;

        let customer = self.api.get_customer().await?;
        let customer = self.swap_in(customer).await;

        if self.cart.current().await.is_some()
            && let Err(err) = self.cart.link_to_customer().await
        {
            warn!(error = %err, "failed to attach cart to customer after login");
        }

        Ok(customer)
    }

    /// Register a new account and log it in.
    ///
    /// The registration token is single-purpose: it authorizes creating
    /// the profile, after which a normal login establishes the session.
    ///
    /// # Errors
    ///
    /// Returns the API error when the email is already registered or
    /// profile creation fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<Customer, StoreError> {
        let registration_token = self.api.register(email, password).await?;
        self.api.set_auth_token(Some(registration_token)).await;
        self.api
            .create_customer(NewCustomer {
                email: email.to_owned(),
                first_name: first_name.to_owned(),
                last_name: last_name.to_owned(),
            })
            .await?;

        self.login(email, password).await
    }

    /// End the session: invalidate it server-side, clear the token and the
    /// profile, and reset the cart.
    ///
    /// Local cleanup runs even when the server-side logout fails; an
    /// unreachable backend must not leave the device logged in.
    ///
    /// # Errors
    ///
    /// Returns a storage error if clearing persisted state fails.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), StoreError> {
        if let Err(err) = self.api.logout().await {
            warn!(error = %err, "server-side logout failed");
        }
        self.api.set_auth_token(None).await;
        self.storage.remove(keys::AUTH_TOKEN).await?;
        *self.customer.write().await = None;
        self.cart.reset().await?;
        Ok(())
    }

    /// Apply a partial profile update.
    ///
    /// # Errors
    ///
    /// Returns the API error when no session is active.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: CustomerUpdate) -> Result<Customer, StoreError> {
        let customer = self.api.update_customer(update).await?;
        Ok(self.swap_in(customer).await)
    }

    /// Saved addresses of the authenticated customer.
    ///
    /// # Errors
    ///
    /// Returns the API error when no session is active.
    pub async fn addresses(&self) -> Result<Vec<CustomerAddress>, StoreError> {
        Ok(self.api.list_addresses().await?)
    }

    /// Add an address book entry.
    ///
    /// # Errors
    ///
    /// Returns the API error when no session is active.
    #[instrument(skip(self, fields))]
    pub async fn add_address(&self, fields: AddressFields) -> Result<Customer, StoreError> {
        let customer = self.api.create_address(fields).await?;
        Ok(self.swap_in(customer).await)
    }

    /// Update an address book entry.
    ///
    /// # Errors
    ///
    /// Returns the API error when the entry does not exist.
    #[instrument(skip(self, fields), fields(address_id = %address_id))]
    pub async fn update_address(
        &self,
        address_id: &AddressId,
        fields: AddressFields,
    ) -> Result<Customer, StoreError> {
        let customer = self.api.update_address(address_id, fields).await?;
        Ok(self.swap_in(customer).await)
    }

    /// Remove an address book entry.
    ///
    /// # Errors
    ///
    /// Returns the API error when no session is active.
    #[instrument(skip(self), fields(address_id = %address_id))]
    pub async fn remove_address(&self, address_id: &AddressId) -> Result<Customer, StoreError> {
        let customer = self.api.delete_address(address_id).await?;
        Ok(self.swap_in(customer).await)
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
        cart: Arc<CartStore>,
        customer: CustomerStore,
    }

    impl Fixture {
        fn new() -> Self {
            let api: Arc<InMemoryStore> = Arc::new(InMemoryStore::new());
            let storage = Arc::new(MemoryStorage::new());
            let cart = Arc::new(CartStore::new(api.clone(), storage.clone()));
            let customer = CustomerStore::new(api.clone(), storage.clone(), cart.clone());
            Self {
                api,
                storage,
                cart,
                customer,
            }
        }

        async fn with_cart(self) -> Self {
            let region = self
                .api
                .get_region(&RegionId::new(InMemoryStore::REGION_ATLANTIC))
                .await
                .unwrap();
            self.cart.ensure(&region).await.unwrap();
            self
        }

        async fn registered(self) -> Self {
            self.customer
                .register("ada@example.com", "hunter2", "Ada", "Byron")
                .await
                .unwrap();
            self
        }
    }

    #[tokio::test]
    async fn test_register_creates_profile_and_logs_in() {
        let fx = Fixture::new().registered().await;
        let customer = fx.customer.current().await.unwrap();
        assert_eq!(customer.email, "ada@example.com");
        assert_eq!(customer.display_name(), "Ada Byron");
        assert!(fx.storage.get(keys::AUTH_TOKEN).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_login_attaches_active_cart() {
        let fx = Fixture::new().with_cart().await.registered().await;
        // Registration flows into login which links the guest cart.
        let cart = fx.cart.current().await.unwrap();
        assert_eq!(cart.email.as_deref(), Some("ada@example.com"));
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let fx = Fixture::new().registered().await;
        fx.customer.logout().await.unwrap();

        let err = fx
            .customer
            .login("ada@example.com", "wrong")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Api(api) if api.is_unauthorized()));
        assert!(fx.customer.current().await.is_none());
        assert!(fx.storage.get(keys::AUTH_TOKEN).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_restore_reestablishes_session_from_stored_token() {
        let fx = Fixture::new().registered().await;

        // A new store over the same storage sees the persisted token.
        let restored_store =
            CustomerStore::new(fx.api.clone(), fx.storage.clone(), fx.cart.clone());
        let restored = restored_store.restore().await.unwrap().unwrap();
        assert_eq!(restored.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_restore_without_token_is_none() {
        let fx = Fixture::new();
        assert!(fx.customer.restore().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_restore_clears_rejected_token() {
        let fx = Fixture::new();
        fx.storage.set(keys::AUTH_TOKEN, "tok_expired").await.unwrap();

        assert!(fx.customer.restore().await.unwrap().is_none());
        assert!(fx.storage.get(keys::AUTH_TOKEN).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_session_and_resets_cart() {
        let fx = Fixture::new().with_cart().await.registered().await;
        fx.customer.logout().await.unwrap();

        assert!(fx.customer.current().await.is_none());
        assert!(fx.cart.current().await.is_none());
        assert!(fx.storage.get(keys::AUTH_TOKEN).await.unwrap().is_none());
        assert!(fx.storage.get(keys::CART_ID).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_profile_swaps_snapshot() {
        let fx = Fixture::new().registered().await;
        let updated = fx
            .customer
            .update_profile(CustomerUpdate {
                phone: Some("+45 12 34 56 78".to_owned()),
                ..CustomerUpdate::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.phone.as_deref(), Some("+45 12 34 56 78"));
        assert_eq!(
            fx.customer.current().await.unwrap().phone.as_deref(),
            Some("+45 12 34 56 78")
        );
    }

    #[tokio::test]
    async fn test_address_book_roundtrip() {
        let fx = Fixture::new().registered().await;

        let fields = AddressFields {
            first_name: "Ada".to_owned(),
            last_name: "Byron".to_owned(),
            address_1: "1 Sea Lane".to_owned(),
            postal_code: "12345".to_owned(),
            city: "Brighton".to_owned(),
            country_code: "gb".to_owned(),
            phone: "+44 1234 567890".to_owned(),
            ..AddressFields::default()
        };
        let customer = fx.customer.add_address(fields.clone()).await.unwrap();
        let address_id = customer.addresses.first().unwrap().id.clone();

        let mut moved = fields;
        moved.city = "Hove".to_owned();
        let customer = fx.customer.update_address(&address_id, moved).await.unwrap();
        assert_eq!(
            customer.addresses.first().unwrap().city.as_deref(),
            Some("Hove")
        );

        let customer = fx.customer.remove_address(&address_id).await.unwrap();
        assert!(customer.addresses.is_empty());
        assert!(fx.customer.addresses().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_addresses_without_session_fail() {
        let fx = Fixture::new();
        let err = fx.customer.addresses().await.unwrap_err();
        assert!(matches!(err, StoreError::Api(api) if api.is_unauthorized()));
    }
}
