// storefront/src/models/order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Order {
  pub id: Uuid,
  pub purchaser_id: Uuid,
  pub subtotal: Decimal,
  pub total_paid: Decimal,
  pub created_at: DateTime<Utc>,
  pub modified_at: DateTime<Utc>,
}

impl Order {
  pub fn new(purchaser_id: Uuid, subtotal: Decimal) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      purchaser_id,
      subtotal,
      total_paid: subtotal,
      created_at: now,
      modified_at: now,
    }
  }
}

/// One purchased module. Price is a snapshot taken when the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct OrderLine {
  pub id: Uuid,
  pub order_id: Uuid,
  pub module_id: Uuid,
  pub seats: i32,
  pub price_without_tax: Decimal,
  pub line_total: Decimal,
  pub created_at: DateTime<Utc>,
  pub modified_at: DateTime<Utc>,
}

impl OrderLine {
  pub fn new(order_id: Uuid, module_id: Uuid, seats: i32, price_without_tax: Decimal) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      order_id,
      module_id,
      seats,
      price_without_tax,
      line_total: price_without_tax * Decimal::from(seats),
      created_at: now,
      modified_at: now,
    }
  }
}
