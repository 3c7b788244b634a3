//! Core types for Moonjelly.
//!
//! Snapshot structs mirror what the commerce backend returns; they are
//! deserialized as-is and never patched locally.

pub mod cart;
pub mod catalog;
pub mod customer;
pub mod email;
pub mod fulfillment;
pub mod id;
pub mod money;
pub mod order;
pub mod payment;
pub mod region;

pub use cart::{
    Address, AddressFields, Cart, CartCompletion, CartUpdate, CompletionError, LineItem, Promotion,
    ShippingMethod,
};
pub use catalog::{CalculatedPrice, Category, Collection, Product, ProductVariant};
pub use customer::{Customer, CustomerAddress, CustomerUpdate, NewCustomer};
pub use email::{Email, EmailError};
pub use fulfillment::{ShippingOption, ShippingPriceType};
pub use id::*;
pub use money::format_amount;
pub use order::{FulfillmentStatus, Order, OrderItem};
pub use payment::{PaymentCollection, PaymentProvider, PaymentSession, PaymentSessionStatus};
pub use region::{Country, Region};
