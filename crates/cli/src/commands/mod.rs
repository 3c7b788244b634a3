//! CLI command implementations.
//!
//! Command output goes to stdout; diagnostics go to tracing.

#![allow(clippy::print_stdout)]

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;
pub mod region;
