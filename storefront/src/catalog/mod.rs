// storefront/src/catalog/mod.rs

//! Persistence for the catalog and for placed orders.
//!
//! All reads and writes go through a [`CatalogTx`] unit of work opened with
//! [`CatalogStore::begin`]. Nothing is visible to other units of work until
//! [`CatalogTx::commit`]; dropping an uncommitted unit of work rolls it back.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{BackingInstance, Course, Module, Order, OrderLine};

pub use memory::MemoryCatalogStore;
pub use postgres::PgCatalogStore;

#[derive(Debug, Error)]
pub enum CatalogError {
  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Migration error: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),

  /// A uniqueness or reference constraint would be broken.
  #[error("Integrity violation: {0}")]
  Integrity(String),
}

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

#[async_trait]
pub trait CatalogStore: Send + Sync {
  async fn begin(&self) -> CatalogResult<Box<dyn CatalogTx>>;

  /// Key under which the status endpoint reports this backend.
  fn backend_name(&self) -> &'static str;

  /// Cheapest round trip that proves the backend answers.
  async fn ping(&self) -> CatalogResult<()>;
}

#[async_trait]
pub trait CatalogTx: Send {
  async fn find_course_by_uuid(&mut self, uuid: &str) -> CatalogResult<Option<Course>>;
  async fn find_course_by_edx_id(&mut self, edx_course_id: &str) -> CatalogResult<Option<Course>>;
  async fn find_course(&mut self, id: Uuid) -> CatalogResult<Option<Course>>;
  /// Oldest first.
  async fn list_courses(&mut self) -> CatalogResult<Vec<Course>>;
  async fn insert_course(&mut self, course: &Course) -> CatalogResult<()>;
  async fn update_course(&mut self, course: &Course) -> CatalogResult<()>;
  /// Deletes the course and its modules. Returns the number of courses removed.
  async fn delete_course_by_uuid(&mut self, uuid: &str) -> CatalogResult<u64>;

  async fn get_or_create_instance(&mut self, instance_url: &str) -> CatalogResult<BackingInstance>;
  async fn find_instance(&mut self, id: Uuid) -> CatalogResult<Option<BackingInstance>>;

  async fn find_module_by_uuid(&mut self, uuid: &str) -> CatalogResult<Option<Module>>;
  async fn find_module_by_locator(&mut self, course_id: Uuid, locator_id: &str) -> CatalogResult<Option<Module>>;
  /// Sorted by `(order, created_at)`.
  async fn list_modules_for_course(&mut self, course_id: Uuid) -> CatalogResult<Vec<Module>>;
  async fn insert_module(&mut self, module: &Module) -> CatalogResult<()>;
  async fn update_module(&mut self, module: &Module) -> CatalogResult<()>;
  async fn delete_module_by_uuid(&mut self, uuid: &str) -> CatalogResult<u64>;
  async fn delete_module(&mut self, id: Uuid) -> CatalogResult<u64>;

  async fn insert_order(&mut self, order: &Order) -> CatalogResult<()>;
  async fn insert_order_line(&mut self, line: &OrderLine) -> CatalogResult<()>;
  /// Oldest first.
  async fn list_orders_for_purchaser(&mut self, purchaser_id: Uuid) -> CatalogResult<Vec<Order>>;
  async fn count_orders(&mut self) -> CatalogResult<i64>;
  async fn count_order_lines(&mut self) -> CatalogResult<i64>;
  async fn list_order_lines(&mut self, order_id: Uuid) -> CatalogResult<Vec<OrderLine>>;

  async fn commit(self: Box<Self>) -> CatalogResult<()>;
}
