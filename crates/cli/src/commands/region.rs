//! Region commands.

use moonjelly_core::RegionId;
use moonjelly_storefront::error::AppError;
use moonjelly_storefront::state::AppState;

/// List regions, marking the active one.
pub async fn list(state: &AppState) -> Result<(), AppError> {
    let regions = state.regions().list().await?;
    let active = state.regions().current().await;

    for region in &regions {
        let marker = if active.as_ref().is_some_and(|current| current.id == region.id) {
            "*"
        } else {
            " "
        };
        let countries: Vec<&str> = region.countries.iter().map(|country| country.label()).collect();
        println!(
            "{marker} {} ({}) - {} [{}]",
            region.name,
            region.currency_code.to_ascii_uppercase(),
            countries.join(", "),
            region.id,
        );
    }
    Ok(())
}

/// Switch the active region and move the cart along with it.
pub async fn select(state: &AppState, region_id: &str) -> Result<(), AppError> {
    let region = state.regions().select(&RegionId::new(region_id)).await?;
    state.cart().ensure(&region).await?;
    println!(
        "Active region is now {} ({}).",
        region.name,
        region.currency_code.to_ascii_uppercase(),
    );
    Ok(())
}
