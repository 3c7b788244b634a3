//! Integration tests for the cart lifecycle: line items, promotions and
//! reset against a live backend.
//!
//! These tests require a seeded catalog (at least one published product
//! with a priced variant in the default region).

use moonjelly_integration_tests::TestContext;
use rust_decimal::Decimal;

// ============================================================================
// Line Item Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires a running Medusa backend"]
async fn test_add_item_creates_priced_line() {
    let (ctx, region) = TestContext::bootstrapped().await;
    let product = ctx.any_product(&region).await;
    let variant = product.variants.first().expect("Product should have a variant");

    let cart = ctx
        .state
        .cart()
        .add_item(&variant.id, 1)
        .await
        .expect("Add item");

    assert_eq!(cart.items.len(), 1);
    let line = cart.items.first().expect("One line");
    assert_eq!(line.quantity, 1);
    assert_eq!(line.variant_id.as_ref(), Some(&variant.id));
    assert!(cart.total > Decimal::ZERO, "Seeded variants carry a price");
}

#[tokio::test]
#[ignore = "Requires a running Medusa backend"]
async fn test_adding_same_variant_merges_quantity() {
    let (ctx, region) = TestContext::bootstrapped().await;
    let product = ctx.any_product(&region).await;
    let variant = product.variants.first().expect("Product should have a variant");

    ctx.state.cart().add_item(&variant.id, 1).await.expect("First add");
    let cart = ctx
        .state
        .cart()
        .add_item(&variant.id, 2)
        .await
        .expect("Second add");

    // Medusa merges repeat adds of the same variant into one line.
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items.first().expect("One line").quantity, 3);
}

#[tokio::test]
#[ignore = "Requires a running Medusa backend"]
async fn test_quantity_update_and_zero_removal() {
    let (ctx, region) = TestContext::bootstrapped().await;
    let product = ctx.any_product(&region).await;
    let variant = product.variants.first().expect("Product should have a variant");

    let cart = ctx.state.cart().add_item(&variant.id, 1).await.expect("Add item");
    let line_id = cart.items.first().expect("One line").id.clone();

    let cart = ctx
        .state
        .cart()
        .update_quantity(&line_id, 3)
        .await
        .expect("Update quantity");
    assert_eq!(cart.items.first().expect("One line").quantity, 3);

    let cart = ctx
        .state
        .cart()
        .update_quantity(&line_id, 0)
        .await
        .expect("Zero quantity removes the line");
    assert!(cart.items.is_empty());
    assert_eq!(cart.total, Decimal::ZERO);
}

// ============================================================================
// Promotion Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires a running Medusa backend"]
async fn test_unknown_promo_code_is_reported_not_fatal() {
    let (ctx, region) = TestContext::bootstrapped().await;
    let product = ctx.any_product(&region).await;
    let variant = product.variants.first().expect("Product should have a variant");
    ctx.state.cart().add_item(&variant.id, 1).await.expect("Add item");

    let accepted = ctx
        .state
        .cart()
        .apply_promo_code("MOONJELLY-DOES-NOT-EXIST")
        .await
        .expect("Unknown codes are dropped, not errors");

    assert!(!accepted);
    let cart = ctx.state.cart().current().await.expect("Cart still active");
    assert!(!cart.has_promo_code("MOONJELLY-DOES-NOT-EXIST"));
}

// ============================================================================
// Reset Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires a running Medusa backend"]
async fn test_reset_forgets_cart_and_ensure_mints_a_new_one() {
    let (ctx, region) = TestContext::bootstrapped().await;
    let original = ctx
        .state
        .cart()
        .current()
        .await
        .expect("Bootstrap should create a cart");

    ctx.state.cart().reset().await.expect("Reset cart");
    assert!(ctx.state.cart().current().await.is_none());

    let fresh = ctx.state.cart().ensure(&region).await.expect("Ensure after reset");
    assert_ne!(fresh.id, original.id);
    assert!(fresh.items.is_empty());
}
