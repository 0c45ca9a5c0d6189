// vendbot/core/src/model/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::product::StockItem;
use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
  Pending,
  Paid,
}

impl OrderStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "PENDING",
      OrderStatus::Paid => "PAID",
    }
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = StoreError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "PENDING" => Ok(OrderStatus::Pending),
      "PAID" => Ok(OrderStatus::Paid),
      other => Err(StoreError::Corrupt(format!("order status '{}'", other))),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
  pub external_id: String,
  pub user_id: i64,
  pub product_id: String,
  /// Captured when the order is created; never re-read from the catalog.
  pub price: u64,
  pub status: OrderStatus,
  /// Set only when the order is paid and a stock item was available.
  #[serde(default)]
  pub stock_item_id: Option<u64>,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub paid_at: Option<DateTime<Utc>>,
}

impl Order {
  pub fn is_paid(&self) -> bool {
    self.status == OrderStatus::Paid
  }
}

/// Input of `OrderLedger::create_order`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
  pub external_id: String,
  pub user_id: i64,
  pub product_id: String,
  pub price: u64,
}

/// Builds the correlation token sent to the payment provider.
///
/// The token is only ever used as an opaque lookup key; the product id is
/// recovered through the stored order, never by splitting this string.
pub fn generate_external_id(prefix: &str, product_id: &str, user_id: i64, at: DateTime<Utc>) -> String {
  format!("{}-{}-{}-{}", prefix, product_id, user_id, at.timestamp())
}

/// Result of the guarded PENDING -> PAID transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkPaid {
  Paid(Order),
  AlreadyPaid,
  NotFound,
}

/// Result of settling an order: lookup, reservation and transition as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
  /// Order moved to PAID with `item` attached.
  Fulfilled { order: Order, item: StockItem },
  /// Order moved to PAID but no stock was left to attach.
  SoldOut { order: Order },
  AlreadyPaid,
  NotFound,
}
