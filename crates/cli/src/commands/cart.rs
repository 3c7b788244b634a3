//! Cart commands.

use moonjelly_core::{Cart, LineItemId, VariantId, format_amount};
use moonjelly_storefront::error::AppError;
use moonjelly_storefront::state::AppState;

/// Print the active cart.
pub async fn show(state: &AppState) -> Result<(), AppError> {
    let cart = state.cart().require().await?;
    print_cart(&cart);
    Ok(())
}

/// Add a variant to the cart.
pub async fn add(state: &AppState, variant_id: &str, quantity: u32) -> Result<(), AppError> {
    let variant_id = VariantId::new(variant_id);
    let cart = state.cart().add_item(&variant_id, quantity).await?;
    println!("Added {quantity} x {variant_id}.");
    print_cart(&cart);
    Ok(())
}

/// Change a line's quantity; zero removes the line.
pub async fn set_quantity(
    state: &AppState,
    line_item_id: &str,
    quantity: u32,
) -> Result<(), AppError> {
    let line_item_id = LineItemId::new(line_item_id);
    let cart = state.cart().update_quantity(&line_item_id, quantity).await?;
    if quantity == 0 {
        println!("Removed {line_item_id}.");
    } else {
        println!("Set {line_item_id} to {quantity}.");
    }
    print_cart(&cart);
    Ok(())
}

/// Apply a promotion code. Rejection is reported, not an error.
pub async fn apply_promo(state: &AppState, code: &str) -> Result<(), AppError> {
    if state.cart().apply_promo_code(code).await? {
        println!("Promotion {code} applied.");
        print_cart(&state.cart().require().await?);
    } else {
        println!("Promotion {code} was not accepted.");
    }
    Ok(())
}

/// Remove an applied promotion code.
pub async fn remove_promo(state: &AppState, code: &str) -> Result<(), AppError> {
    let cart = state.cart().remove_promo_code(code).await?;
    println!("Promotion {code} removed.");
    print_cart(&cart);
    Ok(())
}

/// Discard the active cart.
pub async fn reset(state: &AppState) -> Result<(), AppError> {
    state.cart().reset().await?;
    println!("Cart discarded. A new one is created on next use.");
    Ok(())
}

/// Render a cart as an itemized block.
pub(crate) fn print_cart(cart: &Cart) {
    let currency = &cart.currency_code;
    println!();
    println!("Cart {} ({})", cart.id, currency.to_ascii_uppercase());

    if cart.items.is_empty() {
        println!("  (empty)");
    }
    for item in &cart.items {
        let title = item.product_title.as_deref().map_or_else(
            || item.title.clone(),
            |product| format!("{product} - {}", item.title),
        );
        println!(
            "  {title} x{} - {} [{}]",
            item.quantity,
            format_amount(item.total, currency),
            item.id,
        );
    }

    let codes = cart.applied_promo_codes();
    if !codes.is_empty() {
        println!("  Promotions: {}", codes.join(", "));
    }

    println!("  Subtotal: {}", format_amount(cart.subtotal, currency));
    println!(
        "  Shipping: {}",
        format_amount(cart.shipping_total, currency)
    );
    if !cart.tax_total.is_zero() {
        println!("  Tax:      {}", format_amount(cart.tax_total, currency));
    }
    if !cart.discount_total.is_zero() {
        println!(
            "  Discount: -{}",
            format_amount(cart.discount_total, currency)
        );
    }
    println!("  Total:    {}", format_amount(cart.total, currency));
}
