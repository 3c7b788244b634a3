//! Interactive checkout wizard.
//!
//! Walks the four checkout steps in the terminal, prompting for whatever
//! the current step needs and advancing until an order is placed or the
//! buyer backs out. The wizard resumes wherever a previous run stopped
//! because the step is re-derived from the cart.

use std::io::Write as _;

use moonjelly_core::{AddressFields, CheckoutStep, format_amount, provider_display_name};
use moonjelly_storefront::checkout::{AdvanceOutcome, CheckoutFlow};
use moonjelly_storefront::state::AppState;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

type Input = Lines<BufReader<Stdin>>;

/// Run the wizard over the active cart.
pub async fn run(state: &AppState) -> Result<(), Box<dyn std::error::Error>> {
    let mut flow = state.checkout().await?;
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        println!();
        println!(
            "== Checkout: {} (step {} of {}) ==",
            flow.step().title(),
            flow.step().index() + 1,
            CheckoutStep::ALL.len(),
        );

        match flow.step() {
            CheckoutStep::Address => fill_form(&mut flow, &mut input).await?,
            CheckoutStep::Delivery => choose_shipping(state, &mut flow, &mut input).await?,
            CheckoutStep::Payment => choose_provider(&mut flow, &mut input).await?,
            CheckoutStep::Review => {
                let summary = flow.review_summary().await?;
                println!("Deliver via: {}", summary.shipping_method);
                println!("Pay with:    {}", summary.payment_method);
                super::cart::print_cart(&state.cart().require().await?);
                if !confirm(&mut input, &flow.action_label()).await? {
                    println!("Checkout left open; run `mj-cli checkout` to resume.");
                    return Ok(());
                }
            }
        }

        match flow.advance().await {
            Ok(AdvanceOutcome::MovedTo(_)) => {}
            Ok(AdvanceOutcome::OrderPlaced(order)) => {
                println!(
                    "Order #{} placed - {}. Thank you!",
                    order.display_id,
                    format_amount(order.total, &order.currency_code),
                );
                return Ok(());
            }
            Ok(AdvanceOutcome::ExternalPaymentRequired { provider_id }) => {
                println!(
                    "Finish paying with {} in the provider's flow, then run `mj-cli checkout` again.",
                    provider_display_name(&provider_id),
                );
                return Ok(());
            }
            Err(err) => {
                println!("! {err}");
                if !confirm(&mut input, "Try this step again?").await? {
                    return Ok(());
                }
            }
        }
    }
}

async fn fill_form(
    flow: &mut CheckoutFlow,
    input: &mut Input,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut form = flow.form().clone();

    form.email = prompt_with_default(input, "Email", &form.email).await?;
    println!("Shipping address:");
    edit_address(&mut form.shipping_address, input).await?;
    form.use_same_billing = confirm(input, "Bill to the same address?").await?;
    if !form.use_same_billing {
        println!("Billing address:");
        edit_address(&mut form.billing_address, input).await?;
    }

    *flow.form_mut() = form;
    Ok(())
}

async fn edit_address(fields: &mut AddressFields, input: &mut Input) -> std::io::Result<()> {
    fields.first_name = prompt_with_default(input, "First name", &fields.first_name).await?;
    fields.last_name = prompt_with_default(input, "Last name", &fields.last_name).await?;
    fields.address_1 = prompt_with_default(input, "Address", &fields.address_1).await?;
    fields.postal_code = prompt_with_default(input, "Postal code", &fields.postal_code).await?;
    fields.city = prompt_with_default(input, "City", &fields.city).await?;
    fields.country_code =
        prompt_with_default(input, "Country code (ISO-2)", &fields.country_code).await?;
    fields.phone = prompt_with_default(input, "Phone", &fields.phone).await?;
    Ok(())
}

async fn choose_shipping(
    state: &AppState,
    flow: &mut CheckoutFlow,
    input: &mut Input,
) -> Result<(), Box<dyn std::error::Error>> {
    let cart = state.cart().require().await?;
    let options = flow.shipping_options().await?;

    println!("Delivery options:");
    for (index, option) in options.iter().enumerate() {
        let marker = if flow.selected_shipping_option() == Some(&option.id) {
            "*"
        } else {
            " "
        };
        let price = option.amount.map_or_else(
            || "price on request".to_owned(),
            |amount| format_amount(amount, &cart.currency_code),
        );
        println!("{marker} {}. {} - {price}", index + 1, option.name);
    }

    let choice = prompt(input, "Choose an option (blank keeps the current one)").await?;
    let chosen = choice
        .parse::<usize>()
        .ok()
        .and_then(|number| number.checked_sub(1))
        .and_then(|index| options.get(index));
    if let Some(option) = chosen {
        if let Err(err) = flow.select_shipping_option(&option.id).await {
            println!("! {err}");
        }
    } else if !choice.is_empty() {
        println!("No such option; keeping the current selection.");
    }
    Ok(())
}

async fn choose_provider(
    flow: &mut CheckoutFlow,
    input: &mut Input,
) -> Result<(), Box<dyn std::error::Error>> {
    let providers = flow.payment_providers().await?;

    println!("Payment methods:");
    for (index, provider) in providers.iter().enumerate() {
        let marker = if flow.selected_provider() == Some(provider.id.as_str()) {
            "*"
        } else {
            " "
        };
        println!(
            "{marker} {}. {}",
            index + 1,
            provider_display_name(&provider.id),
        );
    }

    let choice = prompt(input, "Choose a payment method").await?;
    let chosen = choice
        .parse::<usize>()
        .ok()
        .and_then(|number| number.checked_sub(1))
        .and_then(|index| providers.get(index));
    if let Some(provider) = chosen {
        flow.select_provider(&provider.id);
    } else if !choice.is_empty() {
        println!("No such payment method.");
    }
    Ok(())
}

async fn prompt(input: &mut Input, label: &str) -> std::io::Result<String> {
    print!("{label}: ");
    std::io::stdout().flush()?;
    let line = input.next_line().await?.unwrap_or_default();
    Ok(line.trim().to_owned())
}

async fn prompt_with_default(
    input: &mut Input,
    label: &str,
    current: &str,
) -> std::io::Result<String> {
    if current.is_empty() {
        return prompt(input, label).await;
    }
    let entered = prompt(input, &format!("{label} [{current}]")).await?;
    Ok(if entered.is_empty() {
        current.to_owned()
    } else {
        entered
    })
}

async fn confirm(input: &mut Input, label: &str) -> std::io::Result<bool> {
    let answer = prompt(input, &format!("{label} (y/n)")).await?;
    Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
}
