//! Order history commands.

use moonjelly_core::{OrderId, format_amount};
use moonjelly_storefront::error::AppError;
use moonjelly_storefront::state::AppState;

/// List past orders, newest first.
pub async fn list(state: &AppState) -> Result<(), AppError> {
    let orders = state.api().list_orders().await?;
    if orders.is_empty() {
        println!("No orders yet.");
        return Ok(());
    }

    for order in &orders {
        let placed = order
            .created_at
            .map_or_else(|| "-".to_owned(), |at| at.format("%Y-%m-%d").to_string());
        println!(
            "  #{} - {placed} - {} - {} [{}]",
            order.display_id,
            format_amount(order.total, &order.currency_code),
            order.fulfillment_status.label(),
            order.id,
        );
    }
    Ok(())
}

/// Show one order with its lines.
pub async fn show(state: &AppState, order_id: &str) -> Result<(), AppError> {
    let order = state.api().get_order(&OrderId::new(order_id)).await?;

    println!(
        "Order #{} - {} [{}]",
        order.display_id,
        order.fulfillment_status.label(),
        order.id,
    );
    if let Some(placed) = order.created_at {
        println!("Placed: {}", placed.format("%Y-%m-%d %H:%M UTC"));
    }
    for item in &order.items {
        println!(
            "  {} x{} - {}",
            item.title,
            item.quantity,
            format_amount(item.total, &order.currency_code),
        );
    }
    println!("  Total: {}", format_amount(order.total, &order.currency_code));
    Ok(())
}
