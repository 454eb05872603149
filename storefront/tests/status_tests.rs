// tests/status_tests.rs
#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use common::*;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

use storefront::catalog::{CatalogStore, MemoryCatalogStore, PgCatalogStore};
use storefront::config::AppConfig;
use storefront::population::PopulationQueue;
use storefront::services::MockGateway;
use storefront::state::AppState;

fn state_with(config: AppConfig, catalog: Arc<dyn CatalogStore>) -> AppState {
  let (queue, _receiver) = PopulationQueue::channel();
  AppState::new(
    config,
    catalog,
    Arc::new(MockGateway::new()),
    Arc::new(FakeCourseService::default()),
    queue,
  )
}

fn status_uri(token: &str) -> String {
  format!("/api/v1/status/?token={}", token)
}

#[actix_web::test]
async fn test_status_reports_a_reachable_catalog() {
  setup_tracing();
  let app = TestApp::new();
  let srv = test_service!(app.state);

  let req = test::TestRequest::get().uri(&status_uri(STATUS_TOKEN)).to_request();
  let resp = test::call_service(&srv, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["memory"]["status"], "up");
  assert!(body["memory"]["response_microseconds"].is_u64());
}

#[actix_web::test]
async fn test_status_needs_the_configured_token() {
  setup_tracing();
  let app = TestApp::new();
  let srv = test_service!(app.state);

  for uri in ["/api/v1/status/".to_string(), status_uri("gibberish"), status_uri("")] {
    let req = test::TestRequest::get().uri(&uri).to_request();
    let resp = test::call_service(&srv, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", uri);
  }
}

#[actix_web::test]
async fn test_status_is_hidden_without_a_configured_token() {
  setup_tracing();
  let mut config = test_config();
  config.status_token = String::new();
  let state = state_with(config, Arc::new(MemoryCatalogStore::new()));
  let srv = test_service!(state);

  for uri in [status_uri(""), status_uri(STATUS_TOKEN)] {
    let req = test::TestRequest::get().uri(&uri).to_request();
    let resp = test::call_service(&srv, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", uri);
  }
}

#[actix_web::test]
async fn test_status_reports_an_unreachable_database() {
  setup_tracing();
  let pool = PgPoolOptions::new()
    .acquire_timeout(Duration::from_secs(2))
    .connect_lazy("postgres://storefront@127.0.0.1:1/storefront")
    .unwrap();
  let state = state_with(test_config(), Arc::new(PgCatalogStore::new(pool)));
  let srv = test_service!(state);

  let req = test::TestRequest::get().uri(&status_uri(STATUS_TOKEN)).to_request();
  let resp = test::call_service(&srv, req).await;
  assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["postgresql"]["status"], "down");
  assert!(body["postgresql"].get("response_microseconds").is_none());
}
