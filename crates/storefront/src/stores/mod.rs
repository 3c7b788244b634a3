//! Client-side session stores.
//!
//! Each store owns one slice of session state behind an async `RwLock`:
//! the active cart, the selected region and the authenticated customer.
//! Stores never compute domain state locally; every mutation goes to the
//! backend and the returned snapshot is swapped in wholesale.
//!
//! Snapshot reads (`current()`) are cheap clones; callers get a consistent
//! point-in-time view, never a lock.

use thiserror::Error;

use crate::api::ApiError;
use crate::storage::StorageError;

pub mod cart;
pub mod customer;
pub mod region;

pub use cart::CartStore;
pub use customer::CustomerStore;
pub use region::RegionStore;

/// Errors from store operations.
///
/// `NoCart` carries the exact copy buyers see when an operation needs a
/// cart and none is active.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An operation that needs an active cart found none.
    #[error("No cart found")]
    NoCart,

    /// The backend lists no regions, so no cart can be anchored anywhere.
    #[error("No regions configured for this store")]
    NoRegion,

    /// The backend rejected or failed a call; displays the backend's
    /// message.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Durable storage failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
