// storefront/src/catalog/memory.rs

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{CatalogError, CatalogResult, CatalogStore, CatalogTx};
use crate::models::{BackingInstance, Course, Module, Order, OrderLine};

#[derive(Debug, Clone, Default)]
struct CatalogData {
  instances: Vec<BackingInstance>,
  courses: Vec<Course>,
  modules: Vec<Module>,
  orders: Vec<Order>,
  order_lines: Vec<OrderLine>,
}

/// In-process catalog. Units of work are serialized: `begin` waits until the
/// previous one has committed or been dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalogStore {
  data: Arc<Mutex<CatalogData>>,
}

impl MemoryCatalogStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
  async fn begin(&self) -> CatalogResult<Box<dyn CatalogTx>> {
    let guard = self.data.clone().lock_owned().await;
    let working = guard.clone();
    Ok(Box::new(MemoryTx { guard, working }))
  }

  fn backend_name(&self) -> &'static str {
    "memory"
  }

  async fn ping(&self) -> CatalogResult<()> {
    Ok(())
  }
}

struct MemoryTx {
  guard: OwnedMutexGuard<CatalogData>,
  working: CatalogData,
}

impl MemoryTx {
  fn remove_modules_where(&mut self, pred: impl Fn(&Module) -> bool) -> u64 {
    let (gone, kept): (Vec<Module>, Vec<Module>) = std::mem::take(&mut self.working.modules).into_iter().partition(pred);
    self.working.modules = kept;
    let gone_ids: Vec<Uuid> = gone.iter().map(|m| m.id).collect();
    self.working.order_lines.retain(|l| !gone_ids.contains(&l.module_id));
    gone.len() as u64
  }
}

#[async_trait]
impl CatalogTx for MemoryTx {
  async fn find_course_by_uuid(&mut self, uuid: &str) -> CatalogResult<Option<Course>> {
    Ok(self.working.courses.iter().find(|c| c.uuid == uuid).cloned())
  }

  async fn find_course_by_edx_id(&mut self, edx_course_id: &str) -> CatalogResult<Option<Course>> {
    Ok(
      self
        .working
        .courses
        .iter()
        .find(|c| c.edx_course_id.as_deref() == Some(edx_course_id))
        .cloned(),
    )
  }

  async fn find_course(&mut self, id: Uuid) -> CatalogResult<Option<Course>> {
    Ok(self.working.courses.iter().find(|c| c.id == id).cloned())
  }

  async fn list_courses(&mut self) -> CatalogResult<Vec<Course>> {
    let mut courses = self.working.courses.clone();
    courses.sort_by_key(|c| c.created_at);
    Ok(courses)
  }

  async fn insert_course(&mut self, course: &Course) -> CatalogResult<()> {
    if self.working.courses.iter().any(|c| c.uuid == course.uuid || c.id == course.id) {
      return Err(CatalogError::Integrity(format!("course {} already exists", course.uuid)));
    }
    if !self.working.instances.iter().any(|i| i.id == course.instance_id) {
      return Err(CatalogError::Integrity(format!("unknown instance {}", course.instance_id)));
    }
    self.working.courses.push(course.clone());
    Ok(())
  }

  async fn update_course(&mut self, course: &Course) -> CatalogResult<()> {
    if self.working.courses.iter().any(|c| c.uuid == course.uuid && c.id != course.id) {
      return Err(CatalogError::Integrity(format!("course {} already exists", course.uuid)));
    }
    match self.working.courses.iter_mut().find(|c| c.id == course.id) {
      Some(slot) => {
        *slot = course.clone();
        Ok(())
      }
      None => Err(CatalogError::Integrity(format!("course {} does not exist", course.id))),
    }
  }

  async fn delete_course_by_uuid(&mut self, uuid: &str) -> CatalogResult<u64> {
    let Some(pos) = self.working.courses.iter().position(|c| c.uuid == uuid) else {
      return Ok(0);
    };
    let course = self.working.courses.remove(pos);
    self.remove_modules_where(|m| m.course_id == course.id);
    Ok(1)
  }

  async fn get_or_create_instance(&mut self, instance_url: &str) -> CatalogResult<BackingInstance> {
    if let Some(found) = self.working.instances.iter().find(|i| i.instance_url == instance_url) {
      return Ok(found.clone());
    }
    let instance = BackingInstance {
      id: Uuid::new_v4(),
      instance_url: instance_url.to_string(),
      username: None,
      created_at: Utc::now(),
    };
    self.working.instances.push(instance.clone());
    Ok(instance)
  }

  async fn find_instance(&mut self, id: Uuid) -> CatalogResult<Option<BackingInstance>> {
    Ok(self.working.instances.iter().find(|i| i.id == id).cloned())
  }

  async fn find_module_by_uuid(&mut self, uuid: &str) -> CatalogResult<Option<Module>> {
    Ok(self.working.modules.iter().find(|m| m.uuid == uuid).cloned())
  }

  async fn find_module_by_locator(&mut self, course_id: Uuid, locator_id: &str) -> CatalogResult<Option<Module>> {
    Ok(
      self
        .working
        .modules
        .iter()
        .find(|m| m.course_id == course_id && m.locator_id.as_deref() == Some(locator_id))
        .cloned(),
    )
  }

  async fn list_modules_for_course(&mut self, course_id: Uuid) -> CatalogResult<Vec<Module>> {
    let mut modules: Vec<Module> = self
      .working
      .modules
      .iter()
      .filter(|m| m.course_id == course_id)
      .cloned()
      .collect();
    modules.sort_by_key(|m| (m.order, m.created_at));
    Ok(modules)
  }

  async fn insert_module(&mut self, module: &Module) -> CatalogResult<()> {
    if self.working.modules.iter().any(|m| m.uuid == module.uuid || m.id == module.id) {
      return Err(CatalogError::Integrity(format!("module {} already exists", module.uuid)));
    }
    if !self.working.courses.iter().any(|c| c.id == module.course_id) {
      return Err(CatalogError::Integrity(format!("unknown course {}", module.course_id)));
    }
    self.working.modules.push(module.clone());
    Ok(())
  }

  async fn update_module(&mut self, module: &Module) -> CatalogResult<()> {
    if self.working.modules.iter().any(|m| m.uuid == module.uuid && m.id != module.id) {
      return Err(CatalogError::Integrity(format!("module {} already exists", module.uuid)));
    }
    match self.working.modules.iter_mut().find(|m| m.id == module.id) {
      Some(slot) => {
        *slot = module.clone();
        Ok(())
      }
      None => Err(CatalogError::Integrity(format!("module {} does not exist", module.id))),
    }
  }

  async fn delete_module_by_uuid(&mut self, uuid: &str) -> CatalogResult<u64> {
    Ok(self.remove_modules_where(|m| m.uuid == uuid))
  }

  async fn delete_module(&mut self, id: Uuid) -> CatalogResult<u64> {
    Ok(self.remove_modules_where(|m| m.id == id))
  }

  async fn insert_order(&mut self, order: &Order) -> CatalogResult<()> {
    if self.working.orders.iter().any(|o| o.id == order.id) {
      return Err(CatalogError::Integrity(format!("order {} already exists", order.id)));
    }
    self.working.orders.push(order.clone());
    Ok(())
  }

  async fn insert_order_line(&mut self, line: &OrderLine) -> CatalogResult<()> {
    if !self.working.orders.iter().any(|o| o.id == line.order_id) {
      return Err(CatalogError::Integrity(format!("unknown order {}", line.order_id)));
    }
    if !self.working.modules.iter().any(|m| m.id == line.module_id) {
      return Err(CatalogError::Integrity(format!("unknown module {}", line.module_id)));
    }
    self.working.order_lines.push(line.clone());
    Ok(())
  }

  async fn list_orders_for_purchaser(&mut self, purchaser_id: Uuid) -> CatalogResult<Vec<Order>> {
    let mut orders: Vec<Order> = self
      .working
      .orders
      .iter()
      .filter(|o| o.purchaser_id == purchaser_id)
      .cloned()
      .collect();
    orders.sort_by_key(|o| o.created_at);
    Ok(orders)
  }

  async fn count_orders(&mut self) -> CatalogResult<i64> {
    Ok(self.working.orders.len() as i64)
  }

  async fn count_order_lines(&mut self) -> CatalogResult<i64> {
    Ok(self.working.order_lines.len() as i64)
  }

  async fn list_order_lines(&mut self, order_id: Uuid) -> CatalogResult<Vec<OrderLine>> {
    Ok(
      self
        .working
        .order_lines
        .iter()
        .filter(|l| l.order_id == order_id)
        .cloned()
        .collect(),
    )
  }

  async fn commit(self: Box<Self>) -> CatalogResult<()> {
    let MemoryTx { mut guard, working } = *self;
    *guard = working;
    Ok(())
  }
}
