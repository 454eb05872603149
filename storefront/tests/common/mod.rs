// tests/common/mod.rs
#![allow(dead_code, unused_macros)]

use actix_web::test::TestRequest;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use sha1::Sha1;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::Level;
use uuid::Uuid;

use storefront::catalog::{CatalogStore, MemoryCatalogStore};
use storefront::config::AppConfig;
use storefront::models::course::CourseFields;
use storefront::models::{BackingInstance, Course, Module, Order, OrderLine};
use storefront::population::{PopulateModulesRequested, PopulationQueue};
use storefront::services::{BlockTree, CourseService, CourseServiceError, CreateCcxRequest, MockGateway};
use storefront::state::AppState;

pub const WEBHOOK_SECRET: &str = "integration-secret";
pub const INSTANCE: &str = "https://edx.example.org";
pub const STATUS_TOKEN: &str = "status-secret";

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

/// Builds an actix test service over the app's routes for `$state`.
macro_rules! test_service {
  ($state:expr) => {
    actix_web::test::init_service(
      actix_web::App::new()
        .app_data(actix_web::web::Data::new($state.clone()))
        .configure(storefront::web::configure_app_routes),
    )
    .await
  };
}

/// Records CCX creations and replays scripted block-tree answers.
#[derive(Default)]
pub struct FakeCourseService {
  created: Mutex<Vec<CreateCcxRequest>>,
  failing_modules: Mutex<HashSet<String>>,
  block_answers: Mutex<VecDeque<Result<BlockTree, CourseServiceError>>>,
  block_calls: Mutex<Vec<String>>,
}

impl FakeCourseService {
  pub fn created(&self) -> Vec<CreateCcxRequest> {
    self.created.lock().clone()
  }

  /// CCX creation for this module uuid answers 500.
  pub fn fail_module(&self, module_uuid: &str) {
    self.failing_modules.lock().insert(module_uuid.to_string());
  }

  pub fn answer_blocks(&self, answer: Result<BlockTree, CourseServiceError>) {
    self.block_answers.lock().push_back(answer);
  }

  pub fn block_calls(&self) -> Vec<String> {
    self.block_calls.lock().clone()
  }
}

#[async_trait]
impl CourseService for FakeCourseService {
  async fn create_ccx(&self, request: &CreateCcxRequest) -> Result<(), CourseServiceError> {
    let failing = {
      let failing = self.failing_modules.lock();
      request.course_modules.iter().any(|m| failing.contains(m))
    };
    if failing {
      return Err(CourseServiceError::Status {
        status: 500,
        body: "boom".to_string(),
      });
    }
    self.created.lock().push(request.clone());
    Ok(())
  }

  async fn fetch_course_blocks(
    &self,
    _instance: &BackingInstance,
    course_id: &str,
  ) -> Result<BlockTree, CourseServiceError> {
    self.block_calls.lock().push(course_id.to_string());
    self
      .block_answers
      .lock()
      .pop_front()
      .unwrap_or_else(|| Err(CourseServiceError::Malformed("no scripted answer".to_string())))
  }
}

pub fn test_config() -> AppConfig {
  let vars: HashMap<&str, &str> = HashMap::from([
    ("STORE_BACKEND", "memory"),
    ("PAYMENT_PROVIDER", "mock"),
    ("CCXCON_WEBHOOKS_SECRET", WEBHOOK_SECRET),
    ("CCXCON_API", "http://ccxcon.invalid/"),
    ("POPULATION_BACKOFF_UNIT_MS", "1"),
    ("STATUS_TOKEN", STATUS_TOKEN),
  ]);
  AppConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap()
}

pub struct TestApp {
  pub state: AppState,
  pub catalog: Arc<MemoryCatalogStore>,
  pub payments: MockGateway,
  pub course_service: Arc<FakeCourseService>,
  pub population_rx: UnboundedReceiver<PopulateModulesRequested>,
}

impl TestApp {
  pub fn new() -> Self {
    let catalog = Arc::new(MemoryCatalogStore::new());
    let payments = MockGateway::new();
    let course_service = Arc::new(FakeCourseService::default());
    let (queue, population_rx) = PopulationQueue::channel();
    let state = AppState::new(
      test_config(),
      catalog.clone(),
      Arc::new(payments.clone()),
      course_service.clone(),
      queue,
    );
    Self {
      state,
      catalog,
      payments,
      course_service,
      population_rx,
    }
  }

  /// (orders, order lines) currently committed.
  pub async fn order_counts(&self) -> (i64, i64) {
    let mut tx = self.catalog.begin().await.unwrap();
    (tx.count_orders().await.unwrap(), tx.count_order_lines().await.unwrap())
  }

  pub async fn courses(&self) -> Vec<Course> {
    let mut tx = self.catalog.begin().await.unwrap();
    tx.list_courses().await.unwrap()
  }

  pub async fn modules_of(&self, course_uuid: &str) -> Vec<Module> {
    let mut tx = self.catalog.begin().await.unwrap();
    let Some(course) = tx.find_course_by_uuid(course_uuid).await.unwrap() else {
      return Vec::new();
    };
    tx.list_modules_for_course(course.id).await.unwrap()
  }

  pub async fn orders_of(&self, purchaser_id: Uuid) -> Vec<(Order, Vec<OrderLine>)> {
    let mut tx = self.catalog.begin().await.unwrap();
    let mut orders = Vec::new();
    for order in tx.list_orders_for_purchaser(purchaser_id).await.unwrap() {
      let lines = tx.list_order_lines(order.id).await.unwrap();
      orders.push((order, lines));
    }
    orders
  }

  pub async fn set_owners(&self, course_uuid: &str, owners: &[Uuid]) {
    let mut tx = self.catalog.begin().await.unwrap();
    let mut course = tx.find_course_by_uuid(course_uuid).await.unwrap().unwrap();
    course.owners = owners.to_vec();
    tx.update_course(&course).await.unwrap();
    tx.commit().await.unwrap();
  }

  pub async fn module(&self, module_uuid: &str) -> Module {
    let mut tx = self.catalog.begin().await.unwrap();
    tx.find_module_by_uuid(module_uuid).await.unwrap().unwrap()
  }

  /// A live course with one module per `(uuid, price)`, in that order.
  pub async fn seed_course(&self, uuid: &str, modules: &[(&str, Option<&str>)]) -> (Course, Vec<Module>) {
    self.seed_course_with(uuid, true, None, modules).await
  }

  pub async fn seed_course_with(
    &self,
    uuid: &str,
    live: bool,
    edx_course_id: Option<&str>,
    modules: &[(&str, Option<&str>)],
  ) -> (Course, Vec<Module>) {
    let mut tx = self.catalog.begin().await.unwrap();
    let instance = tx.get_or_create_instance(INSTANCE).await.unwrap();
    let mut course = Course::new(
      uuid.to_string(),
      instance.id,
      CourseFields {
        title: format!("Course {}", uuid),
        edx_course_id: edx_course_id.map(str::to_string),
        instructors: vec!["Ada Lovelace".to_string()],
        ..Default::default()
      },
    );
    course.live = live;
    tx.insert_course(&course).await.unwrap();

    let mut created = Vec::new();
    for (position, (module_uuid, price)) in modules.iter().enumerate() {
      let mut module = Module::new(
        module_uuid.to_string(),
        course.id,
        format!("Module {}", module_uuid),
        position as i32,
      );
      module.price_without_tax = price.map(|p| p.parse::<Decimal>().unwrap());
      tx.insert_module(&module).await.unwrap();
      created.push(module);
    }
    tx.commit().await.unwrap();
    (course, created)
  }
}

pub fn sign(body: &[u8]) -> String {
  let mut mac = Hmac::<Sha1>::new_from_slice(WEBHOOK_SECRET.as_bytes()).unwrap();
  mac.update(body);
  hex::encode(mac.finalize().into_bytes())
}

pub fn webhook_request(message: &Value) -> TestRequest {
  let body = serde_json::to_vec(message).unwrap();
  TestRequest::post()
    .uri("/api/v1/webhooks/ccxcon/")
    .insert_header(("X-CCXCon-Signature", sign(&body)))
    .insert_header(("Content-Type", "application/json"))
    .set_payload(body)
}

pub fn course_payload(external_pk: &str, instance: &str, edx_course_id: Option<&str>) -> Value {
  json!({
    "title": "Circuits and Electronics",
    "external_pk": external_pk,
    "instance": instance,
    "course_id": "6.002x",
    "author_name": "MITx",
    "overview": "<p>Overview</p>",
    "description": "Learn circuits.",
    "image_url": "https://edx.example.org/img.png",
    "instructors": ["Anant Agarwal"],
    "edx_course_id": edx_course_id,
  })
}

pub fn course_update(payload: Value) -> Value {
  json!({"type": "course", "action": "update", "payload": payload})
}

pub fn module_update(external_pk: &str, course_external_pk: &str, title: &str) -> Value {
  json!({
    "type": "module",
    "action": "update",
    "payload": {
      "title": title,
      "external_pk": external_pk,
      "course_external_pk": course_external_pk,
    },
  })
}

pub const PURCHASER_EMAIL: &str = "teacher@example.org";

pub fn checkout_request(body: &Value) -> TestRequest {
  checkout_request_as(Uuid::new_v4(), body)
}

pub fn checkout_request_as(purchaser_id: Uuid, body: &Value) -> TestRequest {
  TestRequest::post()
    .uri("/api/v1/checkout/")
    .insert_header(("X-User-Id", purchaser_id.to_string()))
    .insert_header(("X-User-Email", PURCHASER_EMAIL))
    .set_json(body)
}

pub fn course_edit_request(course_uuid: &str, editor_id: Uuid, body: &Value) -> TestRequest {
  TestRequest::patch()
    .uri(&format!("/api/v1/courses/{}/", course_uuid))
    .insert_header(("X-User-Id", editor_id.to_string()))
    .insert_header(("X-User-Email", "owner@example.org"))
    .set_json(body)
}

/// A course tree of `(id, title, staff_only)` chapters, each with one subsection.
pub fn block_tree(chapters: &[(&str, &str, bool)]) -> BlockTree {
  let mut blocks = serde_json::Map::new();
  let mut children = Vec::new();
  for (id, title, staff_only) in chapters {
    let sub_id = format!("{}-sub", id);
    children.push(json!(id));
    blocks.insert(
      id.to_string(),
      json!({
        "id": id,
        "type": "chapter",
        "display_name": title,
        "children": [sub_id],
        "visible_to_staff_only": staff_only,
      }),
    );
    blocks.insert(
      sub_id.clone(),
      json!({"id": sub_id, "type": "sequential", "display_name": format!("{} intro", title)}),
    );
  }
  blocks.insert(
    "root".to_string(),
    json!({"id": "root", "type": "course", "display_name": "Course", "children": children}),
  );
  BlockTree::from_json(&json!({"root": "root", "blocks": blocks})).unwrap()
}
