// storefront/src/models/module.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Module {
  pub id: Uuid,
  pub uuid: String,
  pub title: String,
  /// `None` means not for sale; zero is a valid price.
  pub price_without_tax: Option<Decimal>,
  pub locator_id: Option<String>,
  pub subchapters: Vec<String>,
  pub course_id: Uuid,
  #[sqlx(rename = "sort_order")]
  pub order: i32,
  pub created_at: DateTime<Utc>,
  pub modified_at: DateTime<Utc>,
}

impl Module {
  pub fn new(uuid: String, course_id: Uuid, title: String, order: i32) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      uuid,
      title,
      price_without_tax: None,
      locator_id: None,
      subchapters: Vec::new(),
      course_id,
      order,
      created_at: now,
      modified_at: now,
    }
  }

  pub fn touch(&mut self) {
    self.modified_at = Utc::now();
  }
}
