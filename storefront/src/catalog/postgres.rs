// storefront/src/catalog/postgres.rs

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use super::{CatalogResult, CatalogStore, CatalogTx};
use crate::models::{BackingInstance, Course, Module, Order, OrderLine};

const COURSE_COLUMNS: &str = "id, uuid, title, description, live, author_name, overview, image_url, course_id, \
   edx_course_id, instructors, owners, instance_id, created_at, modified_at";

const MODULE_COLUMNS: &str =
  "id, uuid, title, price_without_tax, locator_id, subchapters, course_id, sort_order, created_at, modified_at";

#[derive(Debug, Clone)]
pub struct PgCatalogStore {
  pool: PgPool,
}

impl PgCatalogStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  /// Connects and brings the schema up to date.
  pub async fn connect(database_url: &str) -> CatalogResult<Self> {
    let pool = PgPoolOptions::new().max_connections(10).connect(database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Catalog database connected and migrated.");
    Ok(Self::new(pool))
  }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
  async fn begin(&self) -> CatalogResult<Box<dyn CatalogTx>> {
    let tx = self.pool.begin().await?;
    Ok(Box::new(PgTx { tx }))
  }

  fn backend_name(&self) -> &'static str {
    "postgresql"
  }

  async fn ping(&self) -> CatalogResult<()> {
    sqlx::query("SELECT 1").execute(&self.pool).await?;
    Ok(())
  }
}

struct PgTx {
  tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CatalogTx for PgTx {
  async fn find_course_by_uuid(&mut self, uuid: &str) -> CatalogResult<Option<Course>> {
    let sql = format!("SELECT {} FROM courses WHERE uuid = $1", COURSE_COLUMNS);
    Ok(sqlx::query_as::<_, Course>(&sql).bind(uuid).fetch_optional(&mut *self.tx).await?)
  }

  async fn find_course_by_edx_id(&mut self, edx_course_id: &str) -> CatalogResult<Option<Course>> {
    let sql = format!(
      "SELECT {} FROM courses WHERE edx_course_id = $1 ORDER BY created_at LIMIT 1",
      COURSE_COLUMNS
    );
    Ok(
      sqlx::query_as::<_, Course>(&sql)
        .bind(edx_course_id)
        .fetch_optional(&mut *self.tx)
        .await?,
    )
  }

  async fn find_course(&mut self, id: Uuid) -> CatalogResult<Option<Course>> {
    let sql = format!("SELECT {} FROM courses WHERE id = $1", COURSE_COLUMNS);
    Ok(sqlx::query_as::<_, Course>(&sql).bind(id).fetch_optional(&mut *self.tx).await?)
  }

  async fn list_courses(&mut self) -> CatalogResult<Vec<Course>> {
    let sql = format!("SELECT {} FROM courses ORDER BY created_at, id", COURSE_COLUMNS);
    Ok(sqlx::query_as::<_, Course>(&sql).fetch_all(&mut *self.tx).await?)
  }

  async fn insert_course(&mut self, c: &Course) -> CatalogResult<()> {
    sqlx::query(
      "INSERT INTO courses (id, uuid, title, description, live, author_name, overview, image_url, course_id, \
       edx_course_id, instructors, owners, instance_id, created_at, modified_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
    )
    .bind(c.id)
    .bind(&c.uuid)
    .bind(&c.title)
    .bind(&c.description)
    .bind(c.live)
    .bind(&c.author_name)
    .bind(&c.overview)
    .bind(&c.image_url)
    .bind(&c.course_id)
    .bind(&c.edx_course_id)
    .bind(&c.instructors)
    .bind(&c.owners)
    .bind(c.instance_id)
    .bind(c.created_at)
    .bind(c.modified_at)
    .execute(&mut *self.tx)
    .await?;
    Ok(())
  }

  async fn update_course(&mut self, c: &Course) -> CatalogResult<()> {
    sqlx::query(
      "UPDATE courses SET uuid = $2, title = $3, description = $4, live = $5, author_name = $6, overview = $7, \
       image_url = $8, course_id = $9, edx_course_id = $10, instructors = $11, owners = $12, instance_id = $13, \
       modified_at = $14 WHERE id = $1",
    )
    .bind(c.id)
    .bind(&c.uuid)
    .bind(&c.title)
    .bind(&c.description)
    .bind(c.live)
    .bind(&c.author_name)
    .bind(&c.overview)
    .bind(&c.image_url)
    .bind(&c.course_id)
    .bind(&c.edx_course_id)
    .bind(&c.instructors)
    .bind(&c.owners)
    .bind(c.instance_id)
    .bind(c.modified_at)
    .execute(&mut *self.tx)
    .await?;
    Ok(())
  }

  async fn delete_course_by_uuid(&mut self, uuid: &str) -> CatalogResult<u64> {
    let result = sqlx::query("DELETE FROM courses WHERE uuid = $1")
      .bind(uuid)
      .execute(&mut *self.tx)
      .await?;
    Ok(result.rows_affected())
  }

  async fn get_or_create_instance(&mut self, instance_url: &str) -> CatalogResult<BackingInstance> {
    sqlx::query(
      "INSERT INTO backing_instances (id, instance_url) VALUES ($1, $2) ON CONFLICT (instance_url) DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(instance_url)
    .execute(&mut *self.tx)
    .await?;

    Ok(
      sqlx::query_as::<_, BackingInstance>(
        "SELECT id, instance_url, username, created_at FROM backing_instances WHERE instance_url = $1",
      )
      .bind(instance_url)
      .fetch_one(&mut *self.tx)
      .await?,
    )
  }

  async fn find_instance(&mut self, id: Uuid) -> CatalogResult<Option<BackingInstance>> {
    Ok(
      sqlx::query_as::<_, BackingInstance>(
        "SELECT id, instance_url, username, created_at FROM backing_instances WHERE id = $1",
      )
      .bind(id)
      .fetch_optional(&mut *self.tx)
      .await?,
    )
  }

  async fn find_module_by_uuid(&mut self, uuid: &str) -> CatalogResult<Option<Module>> {
    let sql = format!("SELECT {} FROM modules WHERE uuid = $1", MODULE_COLUMNS);
    Ok(sqlx::query_as::<_, Module>(&sql).bind(uuid).fetch_optional(&mut *self.tx).await?)
  }

  async fn find_module_by_locator(&mut self, course_id: Uuid, locator_id: &str) -> CatalogResult<Option<Module>> {
    let sql = format!(
      "SELECT {} FROM modules WHERE course_id = $1 AND locator_id = $2 LIMIT 1",
      MODULE_COLUMNS
    );
    Ok(
      sqlx::query_as::<_, Module>(&sql)
        .bind(course_id)
        .bind(locator_id)
        .fetch_optional(&mut *self.tx)
        .await?,
    )
  }

  async fn list_modules_for_course(&mut self, course_id: Uuid) -> CatalogResult<Vec<Module>> {
    let sql = format!(
      "SELECT {} FROM modules WHERE course_id = $1 ORDER BY sort_order, created_at",
      MODULE_COLUMNS
    );
    Ok(sqlx::query_as::<_, Module>(&sql).bind(course_id).fetch_all(&mut *self.tx).await?)
  }

  async fn insert_module(&mut self, m: &Module) -> CatalogResult<()> {
    sqlx::query(
      "INSERT INTO modules (id, uuid, title, price_without_tax, locator_id, subchapters, course_id, sort_order, \
       created_at, modified_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(m.id)
    .bind(&m.uuid)
    .bind(&m.title)
    .bind(m.price_without_tax)
    .bind(&m.locator_id)
    .bind(&m.subchapters)
    .bind(m.course_id)
    .bind(m.order)
    .bind(m.created_at)
    .bind(m.modified_at)
    .execute(&mut *self.tx)
    .await?;
    Ok(())
  }

  async fn update_module(&mut self, m: &Module) -> CatalogResult<()> {
    sqlx::query(
      "UPDATE modules SET uuid = $2, title = $3, price_without_tax = $4, locator_id = $5, subchapters = $6, \
       course_id = $7, sort_order = $8, modified_at = $9 WHERE id = $1",
    )
    .bind(m.id)
    .bind(&m.uuid)
    .bind(&m.title)
    .bind(m.price_without_tax)
    .bind(&m.locator_id)
    .bind(&m.subchapters)
    .bind(m.course_id)
    .bind(m.order)
    .bind(m.modified_at)
    .execute(&mut *self.tx)
    .await?;
    Ok(())
  }

  async fn delete_module_by_uuid(&mut self, uuid: &str) -> CatalogResult<u64> {
    let result = sqlx::query("DELETE FROM modules WHERE uuid = $1")
      .bind(uuid)
      .execute(&mut *self.tx)
      .await?;
    Ok(result.rows_affected())
  }

  async fn delete_module(&mut self, id: Uuid) -> CatalogResult<u64> {
    let result = sqlx::query("DELETE FROM modules WHERE id = $1")
      .bind(id)
      .execute(&mut *self.tx)
      .await?;
    Ok(result.rows_affected())
  }

  async fn insert_order(&mut self, o: &Order) -> CatalogResult<()> {
    sqlx::query(
      "INSERT INTO orders (id, purchaser_id, subtotal, total_paid, created_at, modified_at) \
       VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(o.id)
    .bind(o.purchaser_id)
    .bind(o.subtotal)
    .bind(o.total_paid)
    .bind(o.created_at)
    .bind(o.modified_at)
    .execute(&mut *self.tx)
    .await?;
    Ok(())
  }

  async fn insert_order_line(&mut self, l: &OrderLine) -> CatalogResult<()> {
    sqlx::query(
      "INSERT INTO order_lines (id, order_id, module_id, seats, price_without_tax, line_total, created_at, \
       modified_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(l.id)
    .bind(l.order_id)
    .bind(l.module_id)
    .bind(l.seats)
    .bind(l.price_without_tax)
    .bind(l.line_total)
    .bind(l.created_at)
    .bind(l.modified_at)
    .execute(&mut *self.tx)
    .await?;
    Ok(())
  }

  async fn list_orders_for_purchaser(&mut self, purchaser_id: Uuid) -> CatalogResult<Vec<Order>> {
    Ok(
      sqlx::query_as::<_, Order>(
        "SELECT id, purchaser_id, subtotal, total_paid, created_at, modified_at \
         FROM orders WHERE purchaser_id = $1 ORDER BY created_at, id",
      )
      .bind(purchaser_id)
      .fetch_all(&mut *self.tx)
      .await?,
    )
  }

  async fn count_orders(&mut self) -> CatalogResult<i64> {
    Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders").fetch_one(&mut *self.tx).await?)
  }

  async fn count_order_lines(&mut self) -> CatalogResult<i64> {
    Ok(
      sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM order_lines")
        .fetch_one(&mut *self.tx)
        .await?,
    )
  }

  async fn list_order_lines(&mut self, order_id: Uuid) -> CatalogResult<Vec<OrderLine>> {
    Ok(
      sqlx::query_as::<_, OrderLine>(
        "SELECT id, order_id, module_id, seats, price_without_tax, line_total, created_at, modified_at \
         FROM order_lines WHERE order_id = $1 ORDER BY created_at",
      )
      .bind(order_id)
      .fetch_all(&mut *self.tx)
      .await?,
    )
  }

  async fn commit(self: Box<Self>) -> CatalogResult<()> {
    let PgTx { tx } = *self;
    tx.commit().await?;
    Ok(())
  }
}
