//! Moonjelly Storefront library.
//!
//! The headless commerce client: a typed Medusa API client, durable
//! session storage, the cart/region/customer stores and the checkout
//! orchestrator. Front ends (the CLI, an app shell) embed [`state::AppState`]
//! and drive everything through it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod checkout;
pub mod config;
pub mod error;
pub mod medusa;
pub mod state;
pub mod storage;
pub mod stores;
