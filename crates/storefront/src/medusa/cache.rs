//! Cache types for store API responses.
//!
//! Only region and catalog reads are cached. Carts, customers and orders
//! are session state and always hit the backend.

use moonjelly_core::{Category, Collection, Product, Region};

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Region(Box<Region>),
    Regions(Vec<Region>),
    Product(Box<Product>),
    Products(Vec<Product>),
    Categories(Vec<Category>),
    Collections(Vec<Collection>),
}
