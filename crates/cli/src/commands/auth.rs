//! Customer session commands.

use moonjelly_core::CustomerAddress;
use moonjelly_storefront::error::AppError;
use moonjelly_storefront::state::AppState;

/// Log in with email and password.
pub async fn login(state: &AppState, email: &str, password: &str) -> Result<(), AppError> {
    let customer = state.customer().login(email, password).await?;
    println!("Signed in as {} ({}).", customer.display_name(), customer.email);
    Ok(())
}

/// Register a new account and sign it in.
pub async fn register(
    state: &AppState,
    email: &str,
    password: &str,
    first_name: &str,
    last_name: &str,
) -> Result<(), AppError> {
    let customer = state
        .customer()
        .register(email, password, first_name, last_name)
        .await?;
    println!(
        "Account created. Signed in as {} ({}).",
        customer.display_name(),
        customer.email,
    );
    Ok(())
}

/// End the session.
pub async fn logout(state: &AppState) -> Result<(), AppError> {
    state.customer().logout().await?;
    println!("Signed out. The cart has been reset.");
    Ok(())
}

/// Show the signed-in customer and their address book.
pub async fn me(state: &AppState) -> Result<(), AppError> {
    let Some(customer) = state.customer().current().await else {
        println!("Not signed in.");
        return Ok(());
    };

    println!("{} ({})", customer.display_name(), customer.email);
    if let Some(phone) = &customer.phone {
        println!("Phone: {phone}");
    }

    if customer.addresses.is_empty() {
        println!("No saved addresses.");
    } else {
        println!("Addresses:");
        for address in &customer.addresses {
            println!("  {} [{}]", address_line(address), address.id);
        }
    }
    Ok(())
}

fn address_line(address: &CustomerAddress) -> String {
    let parts: Vec<&str> = [
        address.address_1.as_deref(),
        address.city.as_deref(),
        address.postal_code.as_deref(),
        address.country_code.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect();
    parts.join(", ")
}
