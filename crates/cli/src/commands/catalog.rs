//! Catalog browsing commands.

use moonjelly_core::{ProductId, Region, format_amount};
use moonjelly_storefront::error::AppError;
use moonjelly_storefront::state::AppState;
use moonjelly_storefront::stores::StoreError;

async fn active_region(state: &AppState) -> Result<Region, StoreError> {
    state
        .regions()
        .current()
        .await
        .ok_or(StoreError::NoRegion)
}

/// List products with prices in the active region.
pub async fn products(state: &AppState) -> Result<(), AppError> {
    let region = active_region(state).await?;
    let products = state.api().list_products(&region.id).await?;

    println!("{} products in {}:", products.len(), region.name);
    for product in &products {
        let cheapest = product
            .variants
            .iter()
            .filter_map(|variant| variant.calculated_price.as_ref())
            .map(|price| price.calculated_amount)
            .min();
        let price = cheapest.map_or_else(
            || "price unavailable".to_owned(),
            |amount| format!("from {}", format_amount(amount, &region.currency_code)),
        );
        println!("  {} - {price} [{}]", product.title, product.id);
    }
    Ok(())
}

/// Show one product with its variants.
pub async fn product(state: &AppState, id: &str) -> Result<(), AppError> {
    let region = active_region(state).await?;
    let product = state
        .api()
        .get_product(&ProductId::new(id), &region.id)
        .await?;

    println!("{} [{}]", product.title, product.id);
    if let Some(description) = &product.description {
        println!("{description}");
    }
    println!("Variants:");
    for variant in &product.variants {
        let price = variant.calculated_price.as_ref().map_or_else(
            || "price unavailable".to_owned(),
            |price| format_amount(price.calculated_amount, &price.currency_code),
        );
        println!("  {} - {price} [{}]", variant.title, variant.id);
    }
    Ok(())
}

/// List product categories.
pub async fn categories(state: &AppState) -> Result<(), AppError> {
    let categories = state.api().list_categories().await?;
    for category in &categories {
        println!("  {} [{}]", category.name, category.id);
    }
    Ok(())
}

/// List collections.
pub async fn collections(state: &AppState) -> Result<(), AppError> {
    let collections = state.api().list_collections().await?;
    for collection in &collections {
        println!("  {} [{}]", collection.title, collection.id);
    }
    Ok(())
}
