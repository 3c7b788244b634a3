//! Medusa store API client.
//!
//! # Architecture
//!
//! - Plain REST + JSON against the backend's `/store` and `/auth` routes;
//!   every resource arrives wrapped in a keyed envelope (`{"cart": ...}`)
//! - The backend is the source of truth - no local totals, no local merges
//! - In-memory caching via `moka` for region and catalog responses
//!   (5 minute TTL); session state is never cached
//! - The publishable key rides on every request; the customer auth token
//!   is installed after login and sent as a bearer token
//!
//! # Example
//!
//! ```rust,ignore
//! use moonjelly_storefront::config::Config;
//! use moonjelly_storefront::medusa::MedusaClient;
//!
//! let client = MedusaClient::new(&Config::from_env()?);
//!
//! let regions = client.list_regions().await?;
//! let cart = client.create_cart(&regions[0].id).await?;
//! ```

mod cache;
mod client;

pub use client::MedusaClient;
