//! The store API surface.
//!
//! [`StoreApi`] is the seam between the stores and the wire: the HTTP
//! client in [`crate::medusa`] implements it against a real backend, and
//! [`InMemoryStore`] implements it against seeded in-process state for
//! tests and offline development. Stores and the checkout flow only ever
//! see `Arc<dyn StoreApi>`.

use async_trait::async_trait;
use moonjelly_core::{
    AddressFields, AddressId, Cart, CartCompletion, CartId, CartUpdate, Category, Collection,
    Customer, CustomerAddress, CustomerUpdate, LineItemId, NewCustomer, Order, OrderId,
    PaymentCollection, PaymentProvider, Product, ProductId, Region, RegionId, ShippingOption,
    ShippingOptionId, VariantId,
};
use thiserror::Error;

mod memory;

pub use memory::InMemoryStore;

/// Errors from store API calls.
///
/// `Api`, `NotFound` and `Unauthorized` display the backend's own message
/// because that message is what gets shown to the buyer.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, TLS).
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the request.
    #[error("{message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message from the response body.
        message: String,
    },

    /// The resource does not exist (HTTP 404).
    #[error("{0}")]
    NotFound(String),

    /// The request needs a valid customer session (HTTP 401).
    #[error("{0}")]
    Unauthorized(String),

    /// The backend is rate limiting us (HTTP 429).
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds to wait, from the Retry-After header (0 if absent).
        retry_after_secs: u64,
    },

    /// The response body did not decode as the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Whether this error means the resource is gone (stale stored id).
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether this error means the auth token is missing or expired.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

/// Typed access to the commerce backend's store-scoped API.
///
/// Mutating cart calls return the full updated cart so callers can swap
/// their snapshot wholesale; nothing is ever patched client-side.
#[async_trait]
pub trait StoreApi: Send + Sync {
    // --- Carts ---

    /// Create an empty cart in the given region.
    async fn create_cart(&self, region_id: &RegionId) -> Result<Cart, ApiError>;

    /// Fetch a cart by id.
    async fn get_cart(&self, cart_id: &CartId) -> Result<Cart, ApiError>;

    /// Apply a partial update (email, addresses, region, promo codes).
    async fn update_cart(&self, cart_id: &CartId, update: CartUpdate) -> Result<Cart, ApiError>;

    /// Add a variant to the cart.
    async fn add_line_item(
        &self,
        cart_id: &CartId,
        variant_id: &VariantId,
        quantity: u32,
    ) -> Result<Cart, ApiError>;

    /// Change a line's quantity. Quantity must be at least 1; removal goes
    /// through [`StoreApi::delete_line_item`].
    async fn update_line_item(
        &self,
        cart_id: &CartId,
        line_item_id: &LineItemId,
        quantity: u32,
    ) -> Result<Cart, ApiError>;

    /// Remove a line from the cart. The response carries no cart; callers
    /// re-fetch.
    async fn delete_line_item(
        &self,
        cart_id: &CartId,
        line_item_id: &LineItemId,
    ) -> Result<(), ApiError>;

    /// Select a shipping option for the cart.
    async fn add_shipping_method(
        &self,
        cart_id: &CartId,
        option_id: &ShippingOptionId,
    ) -> Result<Cart, ApiError>;

    /// Associate the cart with the authenticated customer.
    async fn transfer_cart(&self, cart_id: &CartId) -> Result<Cart, ApiError>;

    /// Attempt to place the order.
    async fn complete_cart(&self, cart_id: &CartId) -> Result<CartCompletion, ApiError>;

    // --- Fulfillment ---

    /// Shipping options available for a cart. Calculated options come back
    /// without an amount.
    async fn list_shipping_options(
        &self,
        cart_id: &CartId,
    ) -> Result<Vec<ShippingOption>, ApiError>;

    /// Price a calculated shipping option for a specific cart.
    async fn calculate_shipping_option(
        &self,
        option_id: &ShippingOptionId,
        cart_id: &CartId,
    ) -> Result<ShippingOption, ApiError>;

    // --- Payment ---

    /// Payment providers enabled for a region.
    async fn list_payment_providers(
        &self,
        region_id: &RegionId,
    ) -> Result<Vec<PaymentProvider>, ApiError>;

    /// Create a payment session for the given provider, creating the
    /// cart's payment collection first when it has none. Initiating a
    /// session for a new provider supersedes any previous pending session.
    async fn initiate_payment_session(
        &self,
        cart: &Cart,
        provider_id: &str,
    ) -> Result<PaymentCollection, ApiError>;

    // --- Regions ---

    /// All regions the store sells to.
    async fn list_regions(&self) -> Result<Vec<Region>, ApiError>;

    /// Fetch a region by id.
    async fn get_region(&self, region_id: &RegionId) -> Result<Region, ApiError>;

    // --- Auth ---

    /// Exchange email/password credentials for an auth token.
    async fn login(&self, email: &str, password: &str) -> Result<String, ApiError>;

    /// Register a new auth identity, returning the registration token used
    /// to create the customer profile.
    async fn register(&self, email: &str, password: &str) -> Result<String, ApiError>;

    /// Invalidate the server-side session.
    async fn logout(&self) -> Result<(), ApiError>;

    /// Install (or clear) the auth token sent with customer-scoped calls.
    async fn set_auth_token(&self, token: Option<String>);

    // --- Customers ---

    /// Profile of the authenticated customer.
    async fn get_customer(&self) -> Result<Customer, ApiError>;

    /// Create the customer profile after registration.
    async fn create_customer(&self, new_customer: NewCustomer) -> Result<Customer, ApiError>;

    /// Apply a partial profile update.
    async fn update_customer(&self, update: CustomerUpdate) -> Result<Customer, ApiError>;

    /// Saved addresses of the authenticated customer.
    async fn list_addresses(&self) -> Result<Vec<CustomerAddress>, ApiError>;

    /// Add an address book entry; returns the updated customer.
    async fn create_address(&self, address: AddressFields) -> Result<Customer, ApiError>;

    /// Update an address book entry; returns the updated customer.
    async fn update_address(
        &self,
        address_id: &AddressId,
        address: AddressFields,
    ) -> Result<Customer, ApiError>;

    /// Delete an address book entry; returns the updated customer.
    async fn delete_address(&self, address_id: &AddressId) -> Result<Customer, ApiError>;

    // --- Orders ---

    /// Past orders of the authenticated customer, newest first.
    async fn list_orders(&self) -> Result<Vec<Order>, ApiError>;

    /// Fetch an order by id.
    async fn get_order(&self, order_id: &OrderId) -> Result<Order, ApiError>;

    // --- Catalog ---

    /// Products priced for a region.
    async fn list_products(&self, region_id: &RegionId) -> Result<Vec<Product>, ApiError>;

    /// Fetch a product by id, priced for a region.
    async fn get_product(
        &self,
        product_id: &ProductId,
        region_id: &RegionId,
    ) -> Result<Product, ApiError>;

    /// All product categories.
    async fn list_categories(&self) -> Result<Vec<Category>, ApiError>;

    /// All curated collections.
    async fn list_collections(&self) -> Result<Vec<Collection>, ApiError>;
}
