//! Order types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::OrderId;

/// A placed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique identifier for the order.
    pub id: OrderId,
    /// Short numeric id shown to customers ("Order #42").
    pub display_id: u64,
    /// Email the order confirmation was sent to.
    #[serde(default)]
    pub email: Option<String>,
    /// Lowercase ISO 4217 currency code.
    pub currency_code: String,
    /// Grand total charged.
    #[serde(default)]
    pub total: Decimal,
    /// Delivery progress.
    #[serde(default)]
    pub fulfillment_status: FulfillmentStatus,
    /// When the order was placed.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Items on the order.
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// One line of a placed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    /// Unique identifier for the order line.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Quantity ordered.
    pub quantity: u32,
    /// Thumbnail image URL.
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// Line total.
    #[serde(default)]
    pub total: Decimal,
}

/// Order fulfillment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStatus {
    Canceled,
    #[default]
    NotFulfilled,
    PartiallyFulfilled,
    Fulfilled,
    PartiallyShipped,
    Shipped,
    PartiallyDelivered,
    Delivered,
}

impl FulfillmentStatus {
    /// Display label, e.g. "Partially Shipped".
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Canceled => "Canceled",
            Self::NotFulfilled => "Not Fulfilled",
            Self::PartiallyFulfilled => "Partially Fulfilled",
            Self::Fulfilled => "Fulfilled",
            Self::PartiallyShipped => "Partially Shipped",
            Self::Shipped => "Shipped",
            Self::PartiallyDelivered => "Partially Delivered",
            Self::Delivered => "Delivered",
        }
    }
}
