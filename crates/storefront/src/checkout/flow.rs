//! Stateful checkout walk over the active cart.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::try_join_all;
use moonjelly_core::{
    Cart, CartCompletion, CartUpdate, CheckoutForm, CheckoutStep, PaymentProvider,
    ShippingOption, ShippingOptionId, ShippingPriceType, provider_details,
    provider_display_name,
};
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use crate::api::StoreApi;
use crate::stores::CartStore;

use super::{AdvanceOutcome, CheckoutError};

/// What the review step shows for the two buyer choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSummary {
    /// Chosen delivery method, or placeholder copy when none is set.
    pub shipping_method: String,
    /// Chosen payment method, or placeholder copy when none is set.
    pub payment_method: String,
}

/// Drives one checkout attempt from the current step to a placed order.
///
/// The flow is single-writer by construction: every transition takes
/// `&mut self`, so at most one backend call driven by the flow is in
/// flight at a time. Errors from a transition are recorded as
/// [`last_error`](Self::last_error) and cleared on the next attempt.
pub struct CheckoutFlow {
    api: Arc<dyn StoreApi>,
    cart: Arc<CartStore>,
    step: CheckoutStep,
    form: CheckoutForm,
    selected_option: Option<ShippingOptionId>,
    selected_provider: Option<String>,
    last_error: Option<String>,
}

impl std::fmt::Debug for CheckoutFlow {
    // The api and cart handles are not Debug; show the walk state only.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutFlow")
            .field("step", &self.step)
            .field("form", &self.form)
            .field("selected_option", &self.selected_option)
            .field("selected_provider", &self.selected_provider)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

impl CheckoutFlow {
    /// Begin checkout for the active cart.
    ///
    /// The cursor starts at the derived step, the form is prefilled from
    /// the cart, and any previously chosen shipping option or payment
    /// session preselects the matching control.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoCart`](crate::stores::StoreError::NoCart)
    /// when no cart is active.
    pub async fn start(api: Arc<dyn StoreApi>, cart: Arc<CartStore>) -> Result<Self, CheckoutError> {
        let snapshot = cart.require().await?;
        let step = CheckoutStep::derive(&snapshot);
        let form = CheckoutForm::from_cart(&snapshot);
        let selected_option = snapshot.selected_shipping_option().cloned();
        let selected_provider = snapshot
            .pending_payment_session()
            .map(|session| session.provider_id.clone());
        info!(cart_id = %snapshot.id, step = %step, "starting checkout");

        Ok(Self {
            api,
            cart,
            step,
            form,
            selected_option,
            selected_provider,
            last_error: None,
        })
    }

    /// The step the UI cursor is on.
    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    /// The address form, prefilled at start.
    #[must_use]
    pub const fn form(&self) -> &CheckoutForm {
        &self.form
    }

    /// Mutable access to the address form for field edits.
    pub const fn form_mut(&mut self) -> &mut CheckoutForm {
        &mut self.form
    }

    /// The shipping option confirmed on the cart, if any.
    #[must_use]
    pub const fn selected_shipping_option(&self) -> Option<&ShippingOptionId> {
        self.selected_option.as_ref()
    }

    /// The payment provider chosen for this attempt, if any.
    #[must_use]
    pub fn selected_provider(&self) -> Option<&str> {
        self.selected_provider.as_deref()
    }

    /// The transient error from the last failed attempt, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Move the cursor back to an earlier step.
    ///
    /// Re-selecting the current step is a no-op. Forward jumps are
    /// rejected so an incomplete step cannot be skipped by tapping the
    /// indicator.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::ForwardNavigation`] for a forward jump.
    pub fn go_to_step(&mut self, step: CheckoutStep) -> Result<(), CheckoutError> {
        if step == self.step {
            return Ok(());
        }
        if step.index() > self.step.index() {
            return Err(CheckoutError::ForwardNavigation(step));
        }
        self.last_error = None;
        self.step = step;
        Ok(())
    }

    /// Submit the current step and move the cursor forward.
    ///
    /// On failure nothing moves: the cursor stays put and the error text
    /// is kept in [`last_error`](Self::last_error) until the next attempt.
    ///
    /// # Errors
    ///
    /// Returns validation errors from the address form, missing-choice
    /// errors from the payment step, completion rejections from the
    /// review step and API errors from the backend calls in between.
    #[instrument(skip(self), fields(step = %self.step))]
    pub async fn advance(&mut self) -> Result<AdvanceOutcome, CheckoutError> {
        self.last_error = None;
        let outcome = match self.step {
            CheckoutStep::Address => self.submit_address().await,
            // Shipping options already hit the server per selection; this
            // boundary is local.
            CheckoutStep::Delivery => {
                self.step = CheckoutStep::Payment;
                Ok(AdvanceOutcome::MovedTo(self.step))
            }
            CheckoutStep::Payment => self.submit_payment().await,
            CheckoutStep::Review => self.complete().await,
        };
        if let Err(err) = &outcome {
            self.last_error = Some(err.to_string());
        }
        outcome
    }

    /// Validate the form, then push email and addresses to the cart in one
    /// update. A validation failure never reaches the network.
    async fn submit_address(&mut self) -> Result<AdvanceOutcome, CheckoutError> {
        let submission = self.form.validated()?;
        self.cart
            .update(CartUpdate {
                email: Some(submission.email),
                shipping_address: Some(submission.shipping_address),
                billing_address: Some(submission.billing_address),
                ..CartUpdate::default()
            })
            .await?;
        self.step = CheckoutStep::Delivery;
        Ok(AdvanceOutcome::MovedTo(self.step))
    }

    /// Create a payment session for the chosen provider. The session may
    /// only exist after this succeeds; a failure leaves the step put.
    async fn submit_payment(&mut self) -> Result<AdvanceOutcome, CheckoutError> {
        let provider_id = self
            .selected_provider
            .clone()
            .ok_or(CheckoutError::NoPaymentMethod)?;
        self.cart.initiate_payment_session(&provider_id).await?;
        self.step = CheckoutStep::Review;
        Ok(AdvanceOutcome::MovedTo(self.step))
    }

    /// Finish checkout, branching on the active provider.
    async fn complete(&mut self) -> Result<AdvanceOutcome, CheckoutError> {
        let cart = self.cart.require().await?;
        let provider_id = cart
            .pending_payment_session()
            .map(|session| session.provider_id.clone())
            .or_else(|| self.selected_provider.clone())
            .ok_or(CheckoutError::NoPaymentMethod)?;

        match provider_details(&provider_id) {
            Some(details) if details.has_external_step => {
                info!(provider_id = %provider_id, "handing off to external payment flow");
                Ok(AdvanceOutcome::ExternalPaymentRequired { provider_id })
            }
            Some(_) => self.place_order(&cart).await,
            None => {
                warn!(provider_id = %provider_id, "no completion flow for provider");
                Err(CheckoutError::UnsupportedProvider)
            }
        }
    }

    /// Complete the cart server-side. The response is polymorphic: an
    /// order ends checkout and resets the cart; a cart-with-error is a
    /// failure even though the call itself succeeded.
    async fn place_order(&mut self, cart: &Cart) -> Result<AdvanceOutcome, CheckoutError> {
        match self.api.complete_cart(&cart.id).await? {
            CartCompletion::Order { order } => {
                info!(order_id = %order.id, display_id = order.display_id, "order placed");
                self.cart.reset().await?;
                Ok(AdvanceOutcome::OrderPlaced(order))
            }
            CartCompletion::Cart { error, .. } => {
                let message = error
                    .and_then(|error| error.message)
                    .unwrap_or_else(|| "Failed to complete order".to_owned());
                warn!(cart_id = %cart.id, message = %message, "completion rejected");
                Err(CheckoutError::CompletionRejected { message })
            }
        }
    }

    /// Shipping options for the active cart, with calculated options
    /// priced concurrently.
    ///
    /// Pricing is best-effort: when any lookup fails, the options are
    /// returned without calculated amounts instead of failing the step.
    ///
    /// # Errors
    ///
    /// Returns an API error when the option listing itself fails.
    pub async fn shipping_options(&self) -> Result<Vec<ShippingOption>, CheckoutError> {
        let cart = self.cart.require().await?;
        let mut options = self.api.list_shipping_options(&cart.id).await?;

        let calculated: Vec<ShippingOptionId> = options
            .iter()
            .filter(|option| option.price_type == ShippingPriceType::Calculated)
            .map(|option| option.id.clone())
            .collect();
        if calculated.is_empty() {
            return Ok(options);
        }

        let lookups = calculated
            .iter()
            .map(|option_id| self.api.calculate_shipping_option(option_id, &cart.id));
        match try_join_all(lookups).await {
            Ok(priced) => {
                let amounts: HashMap<ShippingOptionId, Option<Decimal>> = priced
                    .into_iter()
                    .map(|option| (option.id, option.amount))
                    .collect();
                for option in &mut options {
                    if let Some(amount) = amounts.get(&option.id) {
                        option.amount = *amount;
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to price calculated shipping options");
            }
        }
        Ok(options)
    }

    /// Select a shipping option, pushing it to the cart immediately.
    ///
    /// Re-selecting the confirmed option skips the call. On failure the
    /// previous selection stands and the error is kept for display.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::ShippingMethodUpdate`] when the backend
    /// rejects the option.
    #[instrument(skip(self), fields(option_id = %option_id))]
    pub async fn select_shipping_option(
        &mut self,
        option_id: &ShippingOptionId,
    ) -> Result<(), CheckoutError> {
        if self.selected_option.as_ref() == Some(option_id) {
            return Ok(());
        }
        self.last_error = None;
        match self.cart.set_shipping_method(option_id).await {
            Ok(_) => {
                self.selected_option = Some(option_id.clone());
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "shipping method update failed");
                let err = CheckoutError::ShippingMethodUpdate(err);
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Payment providers available in the cart's region.
    ///
    /// # Errors
    ///
    /// Returns an API error when the listing fails.
    pub async fn payment_providers(&self) -> Result<Vec<PaymentProvider>, CheckoutError> {
        let cart = self.cart.require().await?;
        Ok(self.api.list_payment_providers(&cart.region_id).await?)
    }

    /// Choose a payment provider. Local only; the session is created when
    /// the payment step is submitted.
    pub fn select_provider(&mut self, provider_id: &str) {
        if self.selected_provider.as_deref() == Some(provider_id) {
            return;
        }
        self.selected_provider = Some(provider_id.to_owned());
        self.last_error = None;
    }

    /// Label for the primary action button on the current step.
    #[must_use]
    pub fn action_label(&self) -> String {
        match self.step {
            CheckoutStep::Address => "Continue to delivery".to_owned(),
            CheckoutStep::Delivery => "Continue to payment".to_owned(),
            CheckoutStep::Payment => "Review order".to_owned(),
            CheckoutStep::Review => match self.selected_provider.as_deref().and_then(provider_details) {
                Some(details) if details.has_external_step => {
                    format!("Pay using {}", details.name)
                }
                _ => "Place order".to_owned(),
            },
        }
    }

    /// The delivery and payment choices as shown on the review step.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoCart`](crate::stores::StoreError::NoCart)
    /// when no cart is active.
    pub async fn review_summary(&self) -> Result<ReviewSummary, CheckoutError> {
        let cart = self.cart.require().await?;
        // Carts keep one method per option swap; the last entry is the
        // active one.
        let shipping_method = cart.shipping_methods.last().map_or_else(
            || "No shipping method selected".to_owned(),
            |method| {
                method.name.clone().unwrap_or_else(|| {
                    method
                        .shipping_option_id
                        .as_ref()
                        .map_or_else(|| method.id.as_str().to_owned(), |id| id.as_str().to_owned())
                })
            },
        );
        let payment_method = cart.pending_payment_session().map_or_else(
            || "No payment method selected".to_owned(),
            |session| provider_display_name(&session.provider_id).to_owned(),
        );
        Ok(ReviewSummary {
            shipping_method,
            payment_method,
        })
    }
}
