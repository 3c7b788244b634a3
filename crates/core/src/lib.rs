//! Moonjelly Core - Shared domain types.
//!
//! This crate provides the types used across all Moonjelly components:
//! - `storefront` - Commerce client library (stores, checkout orchestration)
//! - `cli` - Command-line front end
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. Everything here can be constructed and inspected without a
//! backend, which is what makes the checkout step deriver and form
//! validation unit-testable in isolation.
//!
//! # Modules
//!
//! - [`types`] - Cart, region, customer, order and catalog snapshots plus
//!   newtype IDs, emails and money formatting
//! - [`checkout`] - Checkout steps, the step deriver, form validation and
//!   the payment provider table

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod types;

pub use checkout::*;
pub use types::*;
