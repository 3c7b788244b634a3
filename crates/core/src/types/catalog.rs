//! Catalog types for browse surfaces.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CategoryId, CollectionId, ProductId, VariantId};

/// A product listing entry or detail page payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier for the product.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// URL slug.
    #[serde(default)]
    pub handle: Option<String>,
    /// Long-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Thumbnail image URL.
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// Purchasable variants.
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
}

/// A purchasable variant of a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductVariant {
    /// Unique identifier for the variant.
    pub id: VariantId,
    /// Display title, e.g. "Small / Blue".
    pub title: String,
    /// Region-priced amount, present when the listing was requested with a
    /// region context.
    #[serde(default)]
    pub calculated_price: Option<CalculatedPrice>,
}

/// The region-resolved price of a variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculatedPrice {
    #[serde(default)]
    pub calculated_amount: Decimal,
    #[serde(default)]
    pub currency_code: String,
}

/// A product category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier for the category.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
    /// URL slug.
    #[serde(default)]
    pub handle: Option<String>,
}

/// A curated product collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    /// Unique identifier for the collection.
    pub id: CollectionId,
    /// Display title.
    pub title: String,
    /// URL slug.
    #[serde(default)]
    pub handle: Option<String>,
}
