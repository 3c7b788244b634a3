//! Medusa store API client implementation.
//!
//! Uses `reqwest` 0.13 for HTTP with typed envelope structs per endpoint.
//! Caches regions and catalog responses using `moka` (5-minute TTL).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use moonjelly_core::{
    AddressFields, AddressId, Cart, CartCompletion, CartId, CartUpdate, Category, Collection,
    Customer, CustomerAddress, CustomerUpdate, LineItemId, NewCustomer, Order, OrderId,
    PaymentCollection, PaymentProvider, Product, ProductId, Region, RegionId, ShippingOption,
    ShippingOptionId, VariantId,
};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use url::Url;

use crate::api::{ApiError, StoreApi};
use crate::config::Config;

use super::cache::CacheValue;

/// Additional fields requested on every cart read/write so the shipping
/// method display name comes back with the snapshot.
const CART_FIELDS: &str = "+shipping_methods.name";

/// Fields requested on product reads so variants carry region prices.
const PRODUCT_FIELDS: &str = "*variants.calculated_price";

// =============================================================================
// MedusaClient
// =============================================================================

/// Client for the Medusa store API.
///
/// Cheap to clone; all clones share the HTTP connection pool, the response
/// cache and the installed auth token.
#[derive(Clone)]
pub struct MedusaClient {
    inner: Arc<MedusaClientInner>,
}

struct MedusaClientInner {
    client: reqwest::Client,
    base_url: Url,
    publishable_key: String,
    /// Customer auth token, installed after login and cleared on logout.
    auth_token: RwLock<Option<SecretString>>,
    cache: Cache<String, CacheValue>,
}

impl MedusaClient {
    /// Create a new store API client.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(MedusaClientInner {
                client: reqwest::Client::new(),
                base_url: config.backend_url.clone(),
                publishable_key: config.publishable_key.clone(),
                auth_token: RwLock::new(None),
                cache,
            }),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        let base = self.inner.base_url.as_str().trim_end_matches('/');
        format!("{base}{path}")
    }

    /// Execute a request and decode the response body.
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<serde_json::Value>,
    ) -> Result<T, ApiError> {
        let mut builder = self
            .inner
            .client
            .request(method, self.endpoint(path))
            .header("x-publishable-api-key", &self.inner.publishable_key);

        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(token) = self.inner.auth_token.read().await.as_ref() {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited { retry_after_secs });
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                path = %path,
                body = %response_text.chars().take(500).collect::<String>(),
                "store API returned non-success status"
            );
            let message = extract_error_message(status, &response_text);
            return Err(match status {
                StatusCode::NOT_FOUND => ApiError::NotFound(message),
                StatusCode::UNAUTHORIZED => ApiError::Unauthorized(message),
                _ => ApiError::Api {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        match serde_json::from_str(&response_text) {
            Ok(decoded) => Ok(decoded),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    path = %path,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "failed to decode store API response"
                );
                Err(ApiError::Decode(e))
            }
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        self.request(Method::GET, path, query, None).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: serde_json::Value,
    ) -> Result<T, ApiError> {
        self.request(Method::POST, path, query, Some(body)).await
    }
}

/// Pull the backend's own message out of an error body, falling back to
/// the status line plus a body snippet.
fn extract_error_message(status: StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|decoded| decoded.message)
        .unwrap_or_else(|| {
            format!(
                "HTTP {status}: {}",
                body.chars().take(200).collect::<String>()
            )
        })
}

// =============================================================================
// Response envelopes
// =============================================================================

// The backend wraps every resource in a keyed object; completion is the one
// exception (a tagged union decoded directly as `CartCompletion`).

#[derive(Deserialize)]
struct CartEnvelope {
    cart: Cart,
}

#[derive(Deserialize)]
struct RegionEnvelope {
    region: Region,
}

#[derive(Deserialize)]
struct RegionsEnvelope {
    regions: Vec<Region>,
}

#[derive(Deserialize)]
struct ShippingOptionEnvelope {
    shipping_option: ShippingOption,
}

#[derive(Deserialize)]
struct ShippingOptionsEnvelope {
    shipping_options: Vec<ShippingOption>,
}

#[derive(Deserialize)]
struct PaymentProvidersEnvelope {
    payment_providers: Vec<PaymentProvider>,
}

#[derive(Deserialize)]
struct PaymentCollectionEnvelope {
    payment_collection: PaymentCollection,
}

#[derive(Deserialize)]
struct TokenEnvelope {
    token: String,
}

#[derive(Deserialize)]
struct CustomerEnvelope {
    customer: Customer,
}

#[derive(Deserialize)]
struct AddressesEnvelope {
    addresses: Vec<CustomerAddress>,
}

/// Address deletion returns the tombstone plus the owning customer.
#[derive(Deserialize)]
struct DeletedAddressEnvelope {
    parent: Customer,
}

#[derive(Deserialize)]
struct OrderEnvelope {
    order: Order,
}

#[derive(Deserialize)]
struct OrdersEnvelope {
    orders: Vec<Order>,
}

#[derive(Deserialize)]
struct ProductEnvelope {
    product: Product,
}

#[derive(Deserialize)]
struct ProductsEnvelope {
    products: Vec<Product>,
}

#[derive(Deserialize)]
struct CategoriesEnvelope {
    product_categories: Vec<Category>,
}

#[derive(Deserialize)]
struct CollectionsEnvelope {
    collections: Vec<Collection>,
}

// =============================================================================
// StoreApi implementation
// =============================================================================

#[async_trait]
impl StoreApi for MedusaClient {
    #[instrument(skip(self), fields(region_id = %region_id))]
    async fn create_cart(&self, region_id: &RegionId) -> Result<Cart, ApiError> {
        let envelope: CartEnvelope = self
            .post(
                "/store/carts",
                &[("fields", CART_FIELDS)],
                json!({ "region_id": region_id }),
            )
            .await?;
        Ok(envelope.cart)
    }

    #[instrument(skip(self), fields(cart_id = %cart_id))]
    async fn get_cart(&self, cart_id: &CartId) -> Result<Cart, ApiError> {
        let envelope: CartEnvelope = self
            .get(
                &format!("/store/carts/{cart_id}"),
                &[("fields", CART_FIELDS)],
            )
            .await?;
        Ok(envelope.cart)
    }

    #[instrument(skip(self, update), fields(cart_id = %cart_id))]
    async fn update_cart(&self, cart_id: &CartId, update: CartUpdate) -> Result<Cart, ApiError> {
        let envelope: CartEnvelope = self
            .post(
                &format!("/store/carts/{cart_id}"),
                &[("fields", CART_FIELDS)],
                serde_json::to_value(update)?,
            )
            .await?;
        Ok(envelope.cart)
    }

    #[instrument(skip(self), fields(cart_id = %cart_id, variant_id = %variant_id, quantity))]
    async fn add_line_item(
        &self,
        cart_id: &CartId,
        variant_id: &VariantId,
        quantity: u32,
    ) -> Result<Cart, ApiError> {
        let envelope: CartEnvelope = self
            .post(
                &format!("/store/carts/{cart_id}/line-items"),
                &[("fields", CART_FIELDS)],
                json!({ "variant_id": variant_id, "quantity": quantity }),
            )
            .await?;
        Ok(envelope.cart)
    }

    #[instrument(skip(self), fields(cart_id = %cart_id, line_item_id = %line_item_id, quantity))]
    async fn update_line_item(
        &self,
        cart_id: &CartId,
        line_item_id: &LineItemId,
        quantity: u32,
    ) -> Result<Cart, ApiError> {
        let envelope: CartEnvelope = self
            .post(
                &format!("/store/carts/{cart_id}/line-items/{line_item_id}"),
                &[("fields", CART_FIELDS)],
                json!({ "quantity": quantity }),
            )
            .await?;
        Ok(envelope.cart)
    }

    #[instrument(skip(self), fields(cart_id = %cart_id, line_item_id = %line_item_id))]
    async fn delete_line_item(
        &self,
        cart_id: &CartId,
        line_item_id: &LineItemId,
    ) -> Result<(), ApiError> {
        // The deletion response carries a tombstone, not a cart; callers
        // re-fetch the cart afterwards.
        let _: serde_json::Value = self
            .request(
                Method::DELETE,
                &format!("/store/carts/{cart_id}/line-items/{line_item_id}"),
                &[],
                None,
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(cart_id = %cart_id, option_id = %option_id))]
    async fn add_shipping_method(
        &self,
        cart_id: &CartId,
        option_id: &ShippingOptionId,
    ) -> Result<Cart, ApiError> {
        let envelope: CartEnvelope = self
            .post(
                &format!("/store/carts/{cart_id}/shipping-methods"),
                &[("fields", CART_FIELDS)],
                json!({ "option_id": option_id }),
            )
            .await?;
        Ok(envelope.cart)
    }

    #[instrument(skip(self), fields(cart_id = %cart_id))]
    async fn transfer_cart(&self, cart_id: &CartId) -> Result<Cart, ApiError> {
        let envelope: CartEnvelope = self
            .post(
                &format!("/store/carts/{cart_id}/customer"),
                &[("fields", CART_FIELDS)],
                json!({}),
            )
            .await?;
        Ok(envelope.cart)
    }

    #[instrument(skip(self), fields(cart_id = %cart_id))]
    async fn complete_cart(&self, cart_id: &CartId) -> Result<CartCompletion, ApiError> {
        self.post(&format!("/store/carts/{cart_id}/complete"), &[], json!({}))
            .await
    }

    #[instrument(skip(self), fields(cart_id = %cart_id))]
    async fn list_shipping_options(
        &self,
        cart_id: &CartId,
    ) -> Result<Vec<ShippingOption>, ApiError> {
        let envelope: ShippingOptionsEnvelope = self
            .get("/store/shipping-options", &[("cart_id", cart_id.as_str())])
            .await?;
        Ok(envelope.shipping_options)
    }

    #[instrument(skip(self), fields(option_id = %option_id, cart_id = %cart_id))]
    async fn calculate_shipping_option(
        &self,
        option_id: &ShippingOptionId,
        cart_id: &CartId,
    ) -> Result<ShippingOption, ApiError> {
        let envelope: ShippingOptionEnvelope = self
            .post(
                &format!("/store/shipping-options/{option_id}/calculate"),
                &[],
                json!({ "cart_id": cart_id }),
            )
            .await?;
        Ok(envelope.shipping_option)
    }

    #[instrument(skip(self), fields(region_id = %region_id))]
    async fn list_payment_providers(
        &self,
        region_id: &RegionId,
    ) -> Result<Vec<PaymentProvider>, ApiError> {
        let envelope: PaymentProvidersEnvelope = self
            .get(
                "/store/payment-providers",
                &[("region_id", region_id.as_str())],
            )
            .await?;
        Ok(envelope.payment_providers)
    }

    #[instrument(skip(self, cart), fields(cart_id = %cart.id, provider_id = %provider_id))]
    async fn initiate_payment_session(
        &self,
        cart: &Cart,
        provider_id: &str,
    ) -> Result<PaymentCollection, ApiError> {
        // A cart gets its payment collection lazily, on the first session.
        let collection_id = match &cart.payment_collection {
            Some(collection) => collection.id.clone(),
            None => {
                let envelope: PaymentCollectionEnvelope = self
                    .post(
                        "/store/payment-collections",
                        &[],
                        json!({ "cart_id": cart.id }),
                    )
                    .await?;
                envelope.payment_collection.id
            }
        };

        let envelope: PaymentCollectionEnvelope = self
            .post(
                &format!("/store/payment-collections/{collection_id}/payment-sessions"),
                &[],
                json!({ "provider_id": provider_id }),
            )
            .await?;
        Ok(envelope.payment_collection)
    }

    #[instrument(skip(self))]
    async fn list_regions(&self) -> Result<Vec<Region>, ApiError> {
        let cache_key = "regions".to_owned();

        if let Some(CacheValue::Regions(regions)) = self.inner.cache.get(&cache_key).await {
            debug!("cache hit for regions");
            return Ok(regions);
        }

        let envelope: RegionsEnvelope = self.get("/store/regions", &[]).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Regions(envelope.regions.clone()))
            .await;

        Ok(envelope.regions)
    }

    #[instrument(skip(self), fields(region_id = %region_id))]
    async fn get_region(&self, region_id: &RegionId) -> Result<Region, ApiError> {
        let cache_key = format!("region:{region_id}");

        if let Some(CacheValue::Region(region)) = self.inner.cache.get(&cache_key).await {
            debug!("cache hit for region");
            return Ok(*region);
        }

        let envelope: RegionEnvelope = self
            .get(&format!("/store/regions/{region_id}"), &[])
            .await?;

        self.inner
            .cache
            .insert(
                cache_key,
                CacheValue::Region(Box::new(envelope.region.clone())),
            )
            .await;

        Ok(envelope.region)
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let envelope: TokenEnvelope = self
            .post(
                "/auth/customer/emailpass",
                &[],
                json!({ "email": email, "password": password }),
            )
            .await?;
        Ok(envelope.token)
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn register(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let envelope: TokenEnvelope = self
            .post(
                "/auth/customer/emailpass/register",
                &[],
                json!({ "email": email, "password": password }),
            )
            .await?;
        Ok(envelope.token)
    }

    #[instrument(skip(self))]
    async fn logout(&self) -> Result<(), ApiError> {
        let _: serde_json::Value = self.request(Method::DELETE, "/auth/session", &[], None).await?;
        Ok(())
    }

    async fn set_auth_token(&self, token: Option<String>) {
        *self.inner.auth_token.write().await = token.map(SecretString::from);
    }

    #[instrument(skip(self))]
    async fn get_customer(&self) -> Result<Customer, ApiError> {
        let envelope: CustomerEnvelope = self.get("/store/customers/me", &[]).await?;
        Ok(envelope.customer)
    }

    #[instrument(skip(self, new_customer))]
    async fn create_customer(&self, new_customer: NewCustomer) -> Result<Customer, ApiError> {
        let envelope: CustomerEnvelope = self
            .post("/store/customers", &[], serde_json::to_value(new_customer)?)
            .await?;
        Ok(envelope.customer)
    }

    #[instrument(skip(self, update))]
    async fn update_customer(&self, update: CustomerUpdate) -> Result<Customer, ApiError> {
        let envelope: CustomerEnvelope = self
            .post("/store/customers/me", &[], serde_json::to_value(update)?)
            .await?;
        Ok(envelope.customer)
    }

    #[instrument(skip(self))]
    async fn list_addresses(&self) -> Result<Vec<CustomerAddress>, ApiError> {
        let envelope: AddressesEnvelope = self.get("/store/customers/me/addresses", &[]).await?;
        Ok(envelope.addresses)
    }

    #[instrument(skip(self, address))]
    async fn create_address(&self, address: AddressFields) -> Result<Customer, ApiError> {
        let envelope: CustomerEnvelope = self
            .post(
                "/store/customers/me/addresses",
                &[],
                serde_json::to_value(address)?,
            )
            .await?;
        Ok(envelope.customer)
    }

    #[instrument(skip(self, address), fields(address_id = %address_id))]
    async fn update_address(
        &self,
        address_id: &AddressId,
        address: AddressFields,
    ) -> Result<Customer, ApiError> {
        let envelope: CustomerEnvelope = self
            .post(
                &format!("/store/customers/me/addresses/{address_id}"),
                &[],
                serde_json::to_value(address)?,
            )
            .await?;
        Ok(envelope.customer)
    }

    #[instrument(skip(self), fields(address_id = %address_id))]
    async fn delete_address(&self, address_id: &AddressId) -> Result<Customer, ApiError> {
        let envelope: DeletedAddressEnvelope = self
            .request(
                Method::DELETE,
                &format!("/store/customers/me/addresses/{address_id}"),
                &[],
                None,
            )
            .await?;
        Ok(envelope.parent)
    }

    #[instrument(skip(self))]
    async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        let envelope: OrdersEnvelope = self
            .get("/store/orders", &[("order", "-created_at")])
            .await?;
        Ok(envelope.orders)
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    async fn get_order(&self, order_id: &OrderId) -> Result<Order, ApiError> {
        let envelope: OrderEnvelope = self.get(&format!("/store/orders/{order_id}"), &[]).await?;
        Ok(envelope.order)
    }

    #[instrument(skip(self), fields(region_id = %region_id))]
    async fn list_products(&self, region_id: &RegionId) -> Result<Vec<Product>, ApiError> {
        let cache_key = format!("products:{region_id}");

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("cache hit for products");
            return Ok(products);
        }

        let envelope: ProductsEnvelope = self
            .get(
                "/store/products",
                &[
                    ("region_id", region_id.as_str()),
                    ("fields", PRODUCT_FIELDS),
                ],
            )
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(envelope.products.clone()))
            .await;

        Ok(envelope.products)
    }

    #[instrument(skip(self), fields(product_id = %product_id, region_id = %region_id))]
    async fn get_product(
        &self,
        product_id: &ProductId,
        region_id: &RegionId,
    ) -> Result<Product, ApiError> {
        let cache_key = format!("product:{product_id}:{region_id}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("cache hit for product");
            return Ok(*product);
        }

        let envelope: ProductEnvelope = self
            .get(
                &format!("/store/products/{product_id}"),
                &[
                    ("region_id", region_id.as_str()),
                    ("fields", PRODUCT_FIELDS),
                ],
            )
            .await?;

        self.inner
            .cache
            .insert(
                cache_key,
                CacheValue::Product(Box::new(envelope.product.clone())),
            )
            .await;

        Ok(envelope.product)
    }

    #[instrument(skip(self))]
    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        let cache_key = "categories".to_owned();

        if let Some(CacheValue::Categories(categories)) = self.inner.cache.get(&cache_key).await {
            debug!("cache hit for categories");
            return Ok(categories);
        }

        let envelope: CategoriesEnvelope = self.get("/store/product-categories", &[]).await?;

        self.inner
            .cache
            .insert(
                cache_key,
                CacheValue::Categories(envelope.product_categories.clone()),
            )
            .await;

        Ok(envelope.product_categories)
    }

    #[instrument(skip(self))]
    async fn list_collections(&self) -> Result<Vec<Collection>, ApiError> {
        let cache_key = "collections".to_owned();

        if let Some(CacheValue::Collections(collections)) = self.inner.cache.get(&cache_key).await
        {
            debug!("cache hit for collections");
            return Ok(collections);
        }

        let envelope: CollectionsEnvelope = self.get("/store/collections", &[]).await?;

        self.inner
            .cache
            .insert(
                cache_key,
                CacheValue::Collections(envelope.collections.clone()),
            )
            .await;

        Ok(envelope.collections)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> MedusaClient {
        MedusaClient::new(&Config {
            backend_url: base.parse().unwrap(),
            publishable_key: "pk_9f2c4d1ab37e".to_owned(),
            data_dir: std::path::PathBuf::from(".moonjelly"),
        })
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        assert_eq!(
            client("http://localhost:9000").endpoint("/store/carts"),
            "http://localhost:9000/store/carts"
        );
        assert_eq!(
            client("http://localhost:9000/").endpoint("/store/carts"),
            "http://localhost:9000/store/carts"
        );
    }

    #[test]
    fn test_extract_error_message_prefers_backend_message() {
        let message = extract_error_message(
            StatusCode::BAD_REQUEST,
            r#"{"message": "Cart cart_01 was not found", "type": "not_found"}"#,
        );
        assert_eq!(message, "Cart cart_01 was not found");
    }

    #[test]
    fn test_extract_error_message_falls_back_to_snippet() {
        let message = extract_error_message(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert!(message.starts_with("HTTP 502"));
        assert!(message.contains("bad gateway"));
    }

    #[test]
    fn test_extract_error_message_truncates_long_bodies() {
        let long_body = "x".repeat(1000);
        let message = extract_error_message(StatusCode::INTERNAL_SERVER_ERROR, &long_body);
        assert!(message.len() < 250);
    }
}
