//! In-process [`StoreApi`] implementation.
//!
//! Backs the store and checkout tests and offline development. State lives
//! behind one async mutex; ids are handed out from a single sequence so
//! test assertions stay stable.
//!
//! Failure injection mirrors how a real backend misbehaves: one-shot
//! switches make the next cart update or shipping-method call fail, and a
//! queued completion error makes the next completion return the cart
//! variant instead of an order.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use moonjelly_core::{
    Address, AddressFields, AddressId, CalculatedPrice, Cart, CartCompletion, CartId, CartUpdate,
    Category, CategoryId, Collection, CollectionId, CompletionError, Customer, CustomerAddress,
    CustomerId, CustomerUpdate, LineItem, LineItemId, NewCustomer, Order, OrderId, OrderItem,
    PaymentCollection, PaymentCollectionId, PaymentProvider, PaymentSession, PaymentSessionId,
    PaymentSessionStatus, Product, ProductId, ProductVariant, Promotion, Region, RegionId,
    STRIPE_PROVIDER, SYSTEM_DEFAULT_PROVIDER, ShippingMethod, ShippingMethodId, ShippingOption,
    ShippingOptionId, ShippingPriceType, VariantId,
};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use super::{ApiError, StoreApi};

/// Seeded store with two regions, a small catalog, three shipping options
/// and both known payment providers.
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    regions: Vec<Region>,
    products: Vec<Product>,
    categories: Vec<Category>,
    collections: Vec<Collection>,
    shipping_options: Vec<ShippingOption>,
    calculated_amounts: HashMap<ShippingOptionId, Decimal>,
    providers: Vec<PaymentProvider>,
    /// Accepted promo codes with their flat discount. Unknown codes are
    /// silently dropped from updates, the way the real backend drops them.
    promo_discounts: HashMap<String, Decimal>,
    variant_prices: HashMap<VariantId, Decimal>,
    carts: HashMap<CartId, Cart>,
    orders: Vec<Order>,
    credentials: HashMap<String, String>,
    customers: HashMap<CustomerId, Customer>,
    session_tokens: HashMap<String, CustomerId>,
    registration_emails: HashMap<String, String>,
    active_token: Option<String>,
    fail_next_cart_update: bool,
    fail_next_shipping_method: bool,
    fail_shipping_calculation: bool,
    next_completion_error: Option<String>,
    shipping_method_calls: usize,
    seq: u64,
}

impl InMemoryStore {
    /// Seeded region ids.
    pub const REGION_ATLANTIC: &'static str = "reg_atlantic";
    pub const REGION_BALTIC: &'static str = "reg_baltic";

    /// Seeded variant ids.
    pub const VARIANT_TEE_S: &'static str = "variant_tee_s";
    pub const VARIANT_TEE_M: &'static str = "variant_tee_m";
    pub const VARIANT_LANTERN: &'static str = "variant_lantern";

    /// Seeded shipping option ids.
    pub const OPTION_STANDARD: &'static str = "so_standard";
    pub const OPTION_EXPRESS: &'static str = "so_express";
    pub const OPTION_COURIER: &'static str = "so_courier";

    /// Seeded promo code worth a flat 10 off.
    pub const PROMO_TENOFF: &'static str = "TENOFF";

    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState::seeded()),
        }
    }

    /// Make the next `update_cart` call fail with a 400.
    pub async fn set_fail_next_cart_update(&self, fail: bool) {
        self.state.lock().await.fail_next_cart_update = fail;
    }

    /// Make the next `add_shipping_method` call fail with a 400.
    pub async fn set_fail_next_shipping_method(&self, fail: bool) {
        self.state.lock().await.fail_next_shipping_method = fail;
    }

    /// Make every `calculate_shipping_option` call fail with a 500.
    pub async fn set_fail_shipping_calculation(&self, fail: bool) {
        self.state.lock().await.fail_shipping_calculation = fail;
    }

    /// Make the next `complete_cart` call return the cart variant carrying
    /// this error message.
    pub async fn set_next_completion_error(&self, message: &str) {
        self.state.lock().await.next_completion_error = Some(message.to_owned());
    }

    /// Number of `add_shipping_method` calls served so far.
    pub async fn shipping_method_calls(&self) -> usize {
        self.state.lock().await.shipping_method_calls
    }

    /// Orders placed through `complete_cart`, oldest first.
    pub async fn placed_orders(&self) -> Vec<Order> {
        self.state.lock().await.orders.clone()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryState {
    fn seeded() -> Self {
        let mut state = Self::default();

        state.regions = vec![
            Region {
                id: RegionId::new(InMemoryStore::REGION_ATLANTIC),
                name: "Atlantic".to_owned(),
                currency_code: "usd".to_owned(),
                countries: vec![country("us", "United States"), country("ca", "Canada")],
            },
            Region {
                id: RegionId::new(InMemoryStore::REGION_BALTIC),
                name: "Baltic".to_owned(),
                currency_code: "eur".to_owned(),
                countries: vec![
                    country("de", "Germany"),
                    country("dk", "Denmark"),
                    country("se", "Sweden"),
                ],
            },
        ];

        state.products = vec![
            Product {
                id: ProductId::new("prod_tee"),
                title: "Tide Pool Tee".to_owned(),
                handle: Some("tide-pool-tee".to_owned()),
                description: Some("Soft cotton tee in rock-pool green.".to_owned()),
                thumbnail: None,
                variants: vec![
                    variant(InMemoryStore::VARIANT_TEE_S, "S"),
                    variant(InMemoryStore::VARIANT_TEE_M, "M"),
                ],
            },
            Product {
                id: ProductId::new("prod_lantern"),
                title: "Glass Float Lantern".to_owned(),
                handle: Some("glass-float-lantern".to_owned()),
                description: None,
                thumbnail: None,
                variants: vec![variant(InMemoryStore::VARIANT_LANTERN, "One Size")],
            },
        ];
        state.variant_prices = HashMap::from([
            (VariantId::new(InMemoryStore::VARIANT_TEE_S), Decimal::new(25, 0)),
            (VariantId::new(InMemoryStore::VARIANT_TEE_M), Decimal::new(25, 0)),
            (VariantId::new(InMemoryStore::VARIANT_LANTERN), Decimal::new(40, 0)),
        ]);

        state.categories = vec![
            Category {
                id: CategoryId::new("cat_apparel"),
                name: "Apparel".to_owned(),
                handle: Some("apparel".to_owned()),
            },
            Category {
                id: CategoryId::new("cat_home"),
                name: "Home".to_owned(),
                handle: Some("home".to_owned()),
            },
        ];
        state.collections = vec![Collection {
            id: CollectionId::new("col_new"),
            title: "New Arrivals".to_owned(),
            handle: Some("new-arrivals".to_owned()),
        }];

        state.shipping_options = vec![
            ShippingOption {
                id: ShippingOptionId::new(InMemoryStore::OPTION_STANDARD),
                name: "Standard Shipping".to_owned(),
                price_type: ShippingPriceType::Flat,
                amount: Some(Decimal::new(5, 0)),
            },
            ShippingOption {
                id: ShippingOptionId::new(InMemoryStore::OPTION_EXPRESS),
                name: "Express Shipping".to_owned(),
                price_type: ShippingPriceType::Flat,
                amount: Some(Decimal::new(15, 0)),
            },
            ShippingOption {
                id: ShippingOptionId::new(InMemoryStore::OPTION_COURIER),
                name: "Local Courier".to_owned(),
                price_type: ShippingPriceType::Calculated,
                amount: None,
            },
        ];
        state.calculated_amounts = HashMap::from([(
            ShippingOptionId::new(InMemoryStore::OPTION_COURIER),
            Decimal::new(750, 2),
        )]);

        state.providers = vec![
            PaymentProvider {
                id: SYSTEM_DEFAULT_PROVIDER.to_owned(),
            },
            PaymentProvider {
                id: STRIPE_PROVIDER.to_owned(),
            },
        ];

        state.promo_discounts = HashMap::from([(
            InMemoryStore::PROMO_TENOFF.to_owned(),
            Decimal::new(10, 0),
        )]);

        state
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.seq += 1;
        format!("{prefix}_{:04}", self.seq)
    }

    fn region(&self, region_id: &RegionId) -> Result<Region, ApiError> {
        self.regions
            .iter()
            .find(|region| &region.id == region_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("Region {region_id} was not found")))
    }

    fn cart_mut(&mut self, cart_id: &CartId) -> Result<&mut Cart, ApiError> {
        self.carts
            .get_mut(cart_id)
            .ok_or_else(|| ApiError::NotFound(format!("Cart {cart_id} was not found")))
    }

    fn authenticated_customer_id(&self) -> Result<CustomerId, ApiError> {
        self.active_token
            .as_ref()
            .and_then(|token| self.session_tokens.get(token))
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_owned()))
    }

    fn customer_mut(&mut self) -> Result<&mut Customer, ApiError> {
        let customer_id = self.authenticated_customer_id()?;
        self.customers
            .get_mut(&customer_id)
            .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_owned()))
    }

    fn priced_product(&self, product: &Product, region: &Region) -> Product {
        let mut priced = product.clone();
        for variant in &mut priced.variants {
            variant.calculated_price = self.variant_prices.get(&variant.id).map(|amount| {
                CalculatedPrice {
                    calculated_amount: *amount,
                    currency_code: region.currency_code.clone(),
                }
            });
        }
        priced
    }

    fn recompute_totals(&mut self, cart_id: &CartId) -> Result<Cart, ApiError> {
        let discounts = self.promo_discounts.clone();
        let cart = self.cart_mut(cart_id)?;
        for item in &mut cart.items {
            item.total = item.unit_price * Decimal::from(item.quantity);
        }
        cart.subtotal = cart.items.iter().map(|item| item.total).sum();
        cart.shipping_total = cart.shipping_methods.iter().map(|method| method.amount).sum();
        cart.discount_total = cart
            .promotions
            .iter()
            .filter_map(|promotion| promotion.code.as_deref())
            .filter_map(|code| discounts.get(code))
            .sum();
        cart.total =
            (cart.subtotal + cart.shipping_total - cart.discount_total).max(Decimal::ZERO);
        Ok(cart.clone())
    }
}

fn country(iso_2: &str, name: &str) -> moonjelly_core::Country {
    moonjelly_core::Country {
        iso_2: iso_2.to_owned(),
        display_name: Some(name.to_owned()),
    }
}

fn variant(id: &str, title: &str) -> ProductVariant {
    ProductVariant {
        id: VariantId::new(id),
        title: title.to_owned(),
        calculated_price: None,
    }
}

#[async_trait]
impl StoreApi for InMemoryStore {
    async fn create_cart(&self, region_id: &RegionId) -> Result<Cart, ApiError> {
        let mut state = self.state.lock().await;
        let region = state.region(region_id)?;
        let id = CartId::new(state.next_id("cart"));
        let cart = Cart {
            id: id.clone(),
            region_id: region.id,
            email: None,
            currency_code: region.currency_code,
            items: Vec::new(),
            shipping_address: None,
            billing_address: None,
            shipping_methods: Vec::new(),
            payment_collection: None,
            promotions: Vec::new(),
            subtotal: Decimal::ZERO,
            shipping_total: Decimal::ZERO,
            tax_total: Decimal::ZERO,
            discount_total: Decimal::ZERO,
            total: Decimal::ZERO,
        };
        state.carts.insert(id, cart.clone());
        Ok(cart)
    }

    async fn get_cart(&self, cart_id: &CartId) -> Result<Cart, ApiError> {
        let mut state = self.state.lock().await;
        state.cart_mut(cart_id).map(|cart| cart.clone())
    }

    async fn update_cart(&self, cart_id: &CartId, update: CartUpdate) -> Result<Cart, ApiError> {
        let mut state = self.state.lock().await;
        if state.fail_next_cart_update {
            state.fail_next_cart_update = false;
            return Err(ApiError::Api {
                status: 400,
                message: "Simulated cart update failure".to_owned(),
            });
        }

        let region = match &update.region_id {
            Some(region_id) => Some(state.region(region_id)?),
            None => None,
        };
        let accepted_codes: Option<Vec<String>> = update.promo_codes.map(|codes| {
            codes
                .into_iter()
                .filter(|code| state.promo_discounts.contains_key(code))
                .collect()
        });

        let cart = state.cart_mut(cart_id)?;
        if let Some(email) = update.email {
            cart.email = Some(email);
        }
        if let Some(region) = region {
            cart.region_id = region.id;
            cart.currency_code = region.currency_code;
        }
        if let Some(fields) = &update.shipping_address {
            cart.shipping_address = Some(Address::from(fields));
        }
        if let Some(fields) = &update.billing_address {
            cart.billing_address = Some(Address::from(fields));
        }
        if let Some(codes) = accepted_codes {
            let mut promotions: Vec<Promotion> = cart
                .promotions
                .iter()
                .filter(|promotion| promotion.is_automatic)
                .cloned()
                .collect();
            promotions.extend(codes.into_iter().map(|code| Promotion {
                id: format!("promo_{}", code.to_ascii_lowercase()),
                code: Some(code),
                is_automatic: false,
            }));
            cart.promotions = promotions;
        }
        state.recompute_totals(cart_id)
    }

    async fn add_line_item(
        &self,
        cart_id: &CartId,
        variant_id: &VariantId,
        quantity: u32,
    ) -> Result<Cart, ApiError> {
        let mut state = self.state.lock().await;
        let unit_price = *state
            .variant_prices
            .get(variant_id)
            .ok_or_else(|| ApiError::NotFound(format!("Variant {variant_id} was not found")))?;
        let (variant_title, product_title) = state
            .products
            .iter()
            .find_map(|product| {
                product
                    .variants
                    .iter()
                    .find(|variant| &variant.id == variant_id)
                    .map(|variant| (variant.title.clone(), product.title.clone()))
            })
            .ok_or_else(|| ApiError::NotFound(format!("Variant {variant_id} was not found")))?;

        let line_id = LineItemId::new(state.next_id("li"));
        let cart = state.cart_mut(cart_id)?;
        if let Some(line) = cart
            .items
            .iter_mut()
            .find(|line| line.variant_id.as_ref() == Some(variant_id))
        {
            line.quantity += quantity;
        } else {
            cart.items.push(LineItem {
                id: line_id,
                title: variant_title,
                product_title: Some(product_title),
                thumbnail: None,
                variant_id: Some(variant_id.clone()),
                quantity,
                unit_price,
                total: Decimal::ZERO,
            });
        }
        state.recompute_totals(cart_id)
    }

    async fn update_line_item(
        &self,
        cart_id: &CartId,
        line_item_id: &LineItemId,
        quantity: u32,
    ) -> Result<Cart, ApiError> {
        let mut state = self.state.lock().await;
        let cart = state.cart_mut(cart_id)?;
        let line = cart
            .items
            .iter_mut()
            .find(|line| &line.id == line_item_id)
            .ok_or_else(|| {
                ApiError::NotFound(format!("Line item {line_item_id} was not found"))
            })?;
        line.quantity = quantity;
        state.recompute_totals(cart_id)
    }

    async fn delete_line_item(
        &self,
        cart_id: &CartId,
        line_item_id: &LineItemId,
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock().await;
        let cart = state.cart_mut(cart_id)?;
        cart.items.retain(|line| &line.id != line_item_id);
        state.recompute_totals(cart_id)?;
        Ok(())
    }

    async fn add_shipping_method(
        &self,
        cart_id: &CartId,
        option_id: &ShippingOptionId,
    ) -> Result<Cart, ApiError> {
        let mut state = self.state.lock().await;
        state.shipping_method_calls += 1;
        if state.fail_next_shipping_method {
            state.fail_next_shipping_method = false;
            return Err(ApiError::Api {
                status: 400,
                message: "Simulated shipping method failure".to_owned(),
            });
        }

        let option = state
            .shipping_options
            .iter()
            .find(|option| &option.id == option_id)
            .cloned()
            .ok_or_else(|| {
                ApiError::NotFound(format!("Shipping option {option_id} was not found"))
            })?;
        let amount = match option.price_type {
            ShippingPriceType::Flat => option.amount.unwrap_or_default(),
            ShippingPriceType::Calculated => state
                .calculated_amounts
                .get(option_id)
                .copied()
                .unwrap_or_default(),
        };

        let method_id = ShippingMethodId::new(state.next_id("sm"));
        let cart = state.cart_mut(cart_id)?;
        cart.shipping_methods = vec![ShippingMethod {
            id: method_id,
            shipping_option_id: Some(option.id),
            name: Some(option.name),
            amount,
        }];
        state.recompute_totals(cart_id)
    }

    async fn transfer_cart(&self, cart_id: &CartId) -> Result<Cart, ApiError> {
        let mut state = self.state.lock().await;
        let customer_id = state.authenticated_customer_id()?;
        let email = state
            .customers
            .get(&customer_id)
            .map(|customer| customer.email.clone())
            .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_owned()))?;
        let cart = state.cart_mut(cart_id)?;
        if cart.email.is_none() {
            cart.email = Some(email);
        }
        Ok(cart.clone())
    }

    async fn complete_cart(&self, cart_id: &CartId) -> Result<CartCompletion, ApiError> {
        let mut state = self.state.lock().await;

        if let Some(message) = state.next_completion_error.take() {
            let cart = state.cart_mut(cart_id)?.clone();
            return Ok(CartCompletion::Cart {
                cart: Box::new(cart),
                error: Some(CompletionError {
                    message: Some(message),
                }),
            });
        }

        let cart = state.cart_mut(cart_id)?.clone();
        if cart.pending_payment_session().is_none() && !cart.total.is_zero() {
            return Ok(CartCompletion::Cart {
                cart: Box::new(cart),
                error: Some(CompletionError {
                    message: Some(
                        "Payment collection has not been initiated for cart".to_owned(),
                    ),
                }),
            });
        }

        let order_id = OrderId::new(state.next_id("order"));
        let display_id = state.seq;
        let order = Order {
            id: order_id,
            display_id,
            email: cart.email.clone(),
            currency_code: cart.currency_code.clone(),
            total: cart.total,
            fulfillment_status: moonjelly_core::FulfillmentStatus::default(),
            created_at: Some(Utc::now()),
            items: cart
                .items
                .iter()
                .map(|line| OrderItem {
                    id: line.id.as_str().to_owned(),
                    title: line.title.clone(),
                    quantity: line.quantity,
                    thumbnail: line.thumbnail.clone(),
                    total: line.total,
                })
                .collect(),
        };
        state.carts.remove(cart_id);
        state.orders.push(order.clone());
        Ok(CartCompletion::Order {
            order: Box::new(order),
        })
    }

    async fn list_shipping_options(
        &self,
        cart_id: &CartId,
    ) -> Result<Vec<ShippingOption>, ApiError> {
        let mut state = self.state.lock().await;
        state.cart_mut(cart_id)?;
        Ok(state.shipping_options.clone())
    }

    async fn calculate_shipping_option(
        &self,
        option_id: &ShippingOptionId,
        cart_id: &CartId,
    ) -> Result<ShippingOption, ApiError> {
        let mut state = self.state.lock().await;
        if state.fail_shipping_calculation {
            return Err(ApiError::Api {
                status: 500,
                message: "Simulated shipping calculation failure".to_owned(),
            });
        }
        state.cart_mut(cart_id)?;
        let mut option = state
            .shipping_options
            .iter()
            .find(|option| &option.id == option_id)
            .cloned()
            .ok_or_else(|| {
                ApiError::NotFound(format!("Shipping option {option_id} was not found"))
            })?;
        option.amount = state.calculated_amounts.get(option_id).copied();
        Ok(option)
    }

    async fn list_payment_providers(
        &self,
        _region_id: &RegionId,
    ) -> Result<Vec<PaymentProvider>, ApiError> {
        Ok(self.state.lock().await.providers.clone())
    }

    async fn initiate_payment_session(
        &self,
        cart: &Cart,
        provider_id: &str,
    ) -> Result<PaymentCollection, ApiError> {
        let mut state = self.state.lock().await;
        let existing_id = state
            .cart_mut(&cart.id)?
            .payment_collection
            .as_ref()
            .map(|collection| collection.id.clone());
        let collection_id = existing_id
            .unwrap_or_else(|| PaymentCollectionId::new(state.next_id("paycol")));
        let session_id = PaymentSessionId::new(state.next_id("payses"));
        let stored = state.cart_mut(&cart.id)?;
        let collection = PaymentCollection {
            id: collection_id,
            // A new session supersedes any previous one.
            payment_sessions: vec![PaymentSession {
                id: session_id,
                provider_id: provider_id.to_owned(),
                status: PaymentSessionStatus::Pending,
            }],
        };
        stored.payment_collection = Some(collection.clone());
        Ok(collection)
    }

    async fn list_regions(&self) -> Result<Vec<Region>, ApiError> {
        Ok(self.state.lock().await.regions.clone())
    }

    async fn get_region(&self, region_id: &RegionId) -> Result<Region, ApiError> {
        self.state.lock().await.region(region_id)
    }

    async fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let mut state = self.state.lock().await;
        let stored = state.credentials.get(email);
        if stored.map(String::as_str) != Some(password) {
            return Err(ApiError::Unauthorized(
                "Invalid email or password".to_owned(),
            ));
        }
        let customer_id = state
            .customers
            .values()
            .find(|customer| customer.email == email)
            .map(|customer| customer.id.clone())
            .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_owned()))?;
        let token = state.next_id("tok");
        state.session_tokens.insert(token.clone(), customer_id);
        Ok(token)
    }

    async fn register(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let mut state = self.state.lock().await;
        if state.credentials.contains_key(email) {
            return Err(ApiError::Api {
                status: 401,
                message: "Identity with email already exists".to_owned(),
            });
        }
        state
            .credentials
            .insert(email.to_owned(), password.to_owned());
        let token = state.next_id("regtok");
        state
            .registration_emails
            .insert(token.clone(), email.to_owned());
        Ok(token)
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let mut state = self.state.lock().await;
        if let Some(token) = state.active_token.clone() {
            state.session_tokens.remove(&token);
        }
        Ok(())
    }

    async fn set_auth_token(&self, token: Option<String>) {
        self.state.lock().await.active_token = token;
    }

    async fn get_customer(&self) -> Result<Customer, ApiError> {
        let mut state = self.state.lock().await;
        state.customer_mut().map(|customer| customer.clone())
    }

    async fn create_customer(&self, new_customer: NewCustomer) -> Result<Customer, ApiError> {
        let mut state = self.state.lock().await;
        let token = state
            .active_token
            .clone()
            .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_owned()))?;
        if !state.registration_emails.contains_key(&token) {
            return Err(ApiError::Unauthorized("Unauthorized".to_owned()));
        }

        let id = CustomerId::new(state.next_id("cus"));
        let customer = Customer {
            id: id.clone(),
            email: new_customer.email,
            first_name: Some(new_customer.first_name),
            last_name: Some(new_customer.last_name),
            phone: None,
            addresses: Vec::new(),
        };
        state.customers.insert(id.clone(), customer.clone());
        // The registration token now resolves as a session for this
        // customer, so profile reads work before the follow-up login.
        state.session_tokens.insert(token, id);
        Ok(customer)
    }

    async fn update_customer(&self, update: CustomerUpdate) -> Result<Customer, ApiError> {
        let mut state = self.state.lock().await;
        let customer = state.customer_mut()?;
        if let Some(first_name) = update.first_name {
            customer.first_name = Some(first_name);
        }
        if let Some(last_name) = update.last_name {
            customer.last_name = Some(last_name);
        }
        if let Some(phone) = update.phone {
            customer.phone = Some(phone);
        }
        Ok(customer.clone())
    }

    async fn list_addresses(&self) -> Result<Vec<CustomerAddress>, ApiError> {
        let mut state = self.state.lock().await;
        state.customer_mut().map(|customer| customer.addresses.clone())
    }

    async fn create_address(&self, address: AddressFields) -> Result<Customer, ApiError> {
        let mut state = self.state.lock().await;
        let id = AddressId::new(state.next_id("addr"));
        let customer = state.customer_mut()?;
        customer.addresses.push(customer_address(id, &address));
        Ok(customer.clone())
    }

    async fn update_address(
        &self,
        address_id: &AddressId,
        address: AddressFields,
    ) -> Result<Customer, ApiError> {
        let mut state = self.state.lock().await;
        let customer = state.customer_mut()?;
        let entry = customer
            .addresses
            .iter_mut()
            .find(|entry| &entry.id == address_id)
            .ok_or_else(|| ApiError::NotFound(format!("Address {address_id} was not found")))?;
        *entry = customer_address(address_id.clone(), &address);
        Ok(customer.clone())
    }

    async fn delete_address(&self, address_id: &AddressId) -> Result<Customer, ApiError> {
        let mut state = self.state.lock().await;
        let customer = state.customer_mut()?;
        customer.addresses.retain(|entry| &entry.id != address_id);
        Ok(customer.clone())
    }

    async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        let mut state = self.state.lock().await;
        let email = state.customer_mut()?.email.clone();
        let mut orders: Vec<Order> = state
            .orders
            .iter()
            .filter(|order| order.email.as_deref() == Some(email.as_str()))
            .cloned()
            .collect();
        orders.reverse();
        Ok(orders)
    }

    async fn get_order(&self, order_id: &OrderId) -> Result<Order, ApiError> {
        let state = self.state.lock().await;
        state
            .orders
            .iter()
            .find(|order| &order.id == order_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("Order {order_id} was not found")))
    }

    async fn list_products(&self, region_id: &RegionId) -> Result<Vec<Product>, ApiError> {
        let state = self.state.lock().await;
        let region = state.region(region_id)?;
        Ok(state
            .products
            .iter()
            .map(|product| state.priced_product(product, &region))
            .collect())
    }

    async fn get_product(
        &self,
        product_id: &ProductId,
        region_id: &RegionId,
    ) -> Result<Product, ApiError> {
        let state = self.state.lock().await;
        let region = state.region(region_id)?;
        state
            .products
            .iter()
            .find(|product| &product.id == product_id)
            .map(|product| state.priced_product(product, &region))
            .ok_or_else(|| ApiError::NotFound(format!("Product {product_id} was not found")))
    }

    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        Ok(self.state.lock().await.categories.clone())
    }

    async fn list_collections(&self) -> Result<Vec<Collection>, ApiError> {
        Ok(self.state.lock().await.collections.clone())
    }
}

fn customer_address(id: AddressId, fields: &AddressFields) -> CustomerAddress {
    let address = Address::from(fields);
    CustomerAddress {
        id,
        first_name: address.first_name,
        last_name: address.last_name,
        address_1: address.address_1,
        company: address.company,
        postal_code: address.postal_code,
        city: address.city,
        country_code: address.country_code,
        province: address.province,
        phone: address.phone,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn region_id() -> RegionId {
        RegionId::new(InMemoryStore::REGION_ATLANTIC)
    }

    #[tokio::test]
    async fn test_cart_totals_follow_items_and_shipping() {
        let store = InMemoryStore::new();
        let cart = store.create_cart(&region_id()).await.unwrap();
        assert_eq!(cart.currency_code, "usd");
        assert_eq!(cart.total, Decimal::ZERO);

        let cart = store
            .add_line_item(&cart.id, &VariantId::new(InMemoryStore::VARIANT_TEE_S), 2)
            .await
            .unwrap();
        assert_eq!(cart.subtotal, Decimal::new(50, 0));

        let cart = store
            .add_shipping_method(&cart.id, &ShippingOptionId::new(InMemoryStore::OPTION_STANDARD))
            .await
            .unwrap();
        assert_eq!(cart.shipping_total, Decimal::new(5, 0));
        assert_eq!(cart.total, Decimal::new(55, 0));
        assert_eq!(
            cart.shipping_methods.first().and_then(|m| m.name.as_deref()),
            Some("Standard Shipping")
        );
    }

    #[tokio::test]
    async fn test_adding_same_variant_merges_lines() {
        let store = InMemoryStore::new();
        let cart = store.create_cart(&region_id()).await.unwrap();
        let variant = VariantId::new(InMemoryStore::VARIANT_TEE_M);
        store.add_line_item(&cart.id, &variant, 1).await.unwrap();
        let cart = store.add_line_item(&cart.id, &variant, 2).await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items.first().unwrap().quantity, 3);
    }

    #[tokio::test]
    async fn test_unknown_promo_code_is_dropped_silently() {
        let store = InMemoryStore::new();
        let cart = store.create_cart(&region_id()).await.unwrap();
        let updated = store
            .update_cart(
                &cart.id,
                CartUpdate {
                    promo_codes: Some(vec!["BOGUS".to_owned()]),
                    ..CartUpdate::default()
                },
            )
            .await
            .unwrap();
        assert!(!updated.has_promo_code("BOGUS"));
    }

    #[tokio::test]
    async fn test_accepted_promo_code_discounts_total() {
        let store = InMemoryStore::new();
        let cart = store.create_cart(&region_id()).await.unwrap();
        store
            .add_line_item(&cart.id, &VariantId::new(InMemoryStore::VARIANT_LANTERN), 1)
            .await
            .unwrap();
        let updated = store
            .update_cart(
                &cart.id,
                CartUpdate {
                    promo_codes: Some(vec![InMemoryStore::PROMO_TENOFF.to_owned()]),
                    ..CartUpdate::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.has_promo_code(InMemoryStore::PROMO_TENOFF));
        assert_eq!(updated.discount_total, Decimal::new(10, 0));
        assert_eq!(updated.total, Decimal::new(30, 0));
    }

    #[tokio::test]
    async fn test_initiating_session_supersedes_previous_one() {
        let store = InMemoryStore::new();
        let cart = store.create_cart(&region_id()).await.unwrap();
        store
            .initiate_payment_session(&cart, SYSTEM_DEFAULT_PROVIDER)
            .await
            .unwrap();
        let cart = store.get_cart(&cart.id).await.unwrap();
        let collection = store
            .initiate_payment_session(&cart, STRIPE_PROVIDER)
            .await
            .unwrap();
        assert_eq!(collection.payment_sessions.len(), 1);
        assert_eq!(
            collection.payment_sessions.first().unwrap().provider_id,
            STRIPE_PROVIDER
        );
        // Collection id survives; only the session is replaced.
        let updated = store.get_cart(&cart.id).await.unwrap();
        assert_eq!(
            updated.payment_collection.unwrap().id,
            cart.payment_collection.unwrap().id
        );
    }

    #[tokio::test]
    async fn test_completion_without_session_returns_cart_variant() {
        let store = InMemoryStore::new();
        let cart = store.create_cart(&region_id()).await.unwrap();
        store
            .add_line_item(&cart.id, &VariantId::new(InMemoryStore::VARIANT_TEE_S), 1)
            .await
            .unwrap();
        match store.complete_cart(&cart.id).await.unwrap() {
            CartCompletion::Cart { error, .. } => {
                assert!(error.unwrap().message.unwrap().contains("Payment collection"));
            }
            CartCompletion::Order { .. } => panic!("expected cart variant"),
        }
    }

    #[tokio::test]
    async fn test_completion_removes_cart_and_records_order() {
        let store = InMemoryStore::new();
        let cart = store.create_cart(&region_id()).await.unwrap();
        store
            .add_line_item(&cart.id, &VariantId::new(InMemoryStore::VARIANT_TEE_S), 1)
            .await
            .unwrap();
        let cart = store.get_cart(&cart.id).await.unwrap();
        store
            .initiate_payment_session(&cart, SYSTEM_DEFAULT_PROVIDER)
            .await
            .unwrap();

        let completion = store.complete_cart(&cart.id).await.unwrap();
        let order = match completion {
            CartCompletion::Order { order } => order,
            CartCompletion::Cart { .. } => panic!("expected order variant"),
        };
        assert_eq!(order.total, Decimal::new(25, 0));
        assert!(store.get_cart(&cart.id).await.unwrap_err().is_not_found());
        assert_eq!(store.placed_orders().await.len(), 1);
    }

    #[tokio::test]
    async fn test_register_create_login_roundtrip() {
        let store = InMemoryStore::new();
        let reg_token = store
            .register("ada@example.com", "hunter2")
            .await
            .unwrap();
        store.set_auth_token(Some(reg_token)).await;
        store
            .create_customer(NewCustomer {
                email: "ada@example.com".to_owned(),
                first_name: "Ada".to_owned(),
                last_name: "Byron".to_owned(),
            })
            .await
            .unwrap();

        let token = store.login("ada@example.com", "hunter2").await.unwrap();
        store.set_auth_token(Some(token)).await;
        let customer = store.get_customer().await.unwrap();
        assert_eq!(customer.display_name(), "Ada Byron");

        store.set_auth_token(None).await;
        assert!(store.get_customer().await.unwrap_err().is_unauthorized());
    }

    #[tokio::test]
    async fn test_login_rejects_bad_password() {
        let store = InMemoryStore::new();
        let reg_token = store.register("ada@example.com", "hunter2").await.unwrap();
        store.set_auth_token(Some(reg_token)).await;
        store
            .create_customer(NewCustomer {
                email: "ada@example.com".to_owned(),
                first_name: "Ada".to_owned(),
                last_name: "Byron".to_owned(),
            })
            .await
            .unwrap();

        let err = store.login("ada@example.com", "wrong").await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "Invalid email or password");
    }

    #[tokio::test]
    async fn test_calculated_option_lists_without_amount() {
        let store = InMemoryStore::new();
        let cart = store.create_cart(&region_id()).await.unwrap();
        let options = store.list_shipping_options(&cart.id).await.unwrap();
        let courier = options
            .iter()
            .find(|option| option.id.as_str() == InMemoryStore::OPTION_COURIER)
            .unwrap();
        assert!(courier.amount.is_none());

        let calculated = store
            .calculate_shipping_option(&courier.id, &cart.id)
            .await
            .unwrap();
        assert_eq!(calculated.amount, Some(Decimal::new(750, 2)));
    }

    #[tokio::test]
    async fn test_products_are_priced_in_region_currency() {
        let store = InMemoryStore::new();
        let products = store
            .list_products(&RegionId::new(InMemoryStore::REGION_BALTIC))
            .await
            .unwrap();
        let price = products
            .first()
            .and_then(|product| product.variants.first())
            .and_then(|variant| variant.calculated_price.as_ref())
            .unwrap();
        assert_eq!(price.currency_code, "eur");
    }
}
