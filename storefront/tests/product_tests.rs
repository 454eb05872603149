// tests/product_tests.rs
#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use common::*;
use serde_json::{json, Value};

#[actix_web::test]
async fn test_listing_shows_only_available_courses_and_modules() {
  setup_tracing();
  let app = TestApp::new();
  app
    .seed_course("c1", &[("m1", Some("10.00")), ("m2", None)])
    .await;
  app.seed_course("c2", &[("n1", None)]).await;
  app
    .seed_course_with("c3", false, None, &[("o1", Some("7.00"))])
    .await;
  let srv = test_service!(app.state);

  let req = test::TestRequest::get().uri("/api/v1/products/").to_request();
  let body: Value = test::call_and_read_body_json(&srv, req).await;

  let products = body.as_array().unwrap();
  assert_eq!(products.len(), 1);
  assert_eq!(products[0]["upc"], "Course_c1");
  assert_eq!(products[0]["product_type"], "Course");
  assert_eq!(products[0]["external_pk"], "c1");
  assert_eq!(products[0]["info"]["instructors"], json!(["Ada Lovelace"]));
  let children = products[0]["children"].as_array().unwrap();
  assert_eq!(children.len(), 1);
  assert_eq!(children[0]["upc"], "Module_m1");
  assert_eq!(children[0]["price_without_tax"], json!(10.0));
}

#[actix_web::test]
async fn test_module_detail_names_its_course() {
  setup_tracing();
  let app = TestApp::new();
  app.seed_course("c1", &[("m1", Some("25.50"))]).await;
  let srv = test_service!(app.state);

  let req = test::TestRequest::get().uri("/api/v1/products/Module_m1/").to_request();
  let resp = test::call_service(&srv, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;

  assert_eq!(body["upc"], "Module_m1");
  assert_eq!(body["parent_upc"], "Course_c1");
  assert_eq!(body["price_without_tax"], json!(25.5));
  assert_eq!(body["info"]["order"], 0);
  assert_eq!(body["children"], json!([]));
}

#[actix_web::test]
async fn test_unavailable_or_unknown_products_are_not_found() {
  setup_tracing();
  let app = TestApp::new();
  app.seed_course("c1", &[("m1", None)]).await;
  let srv = test_service!(app.state);

  for uri in [
    "/api/v1/products/Module_m1/",
    "/api/v1/products/Course_c1/",
    "/api/v1/products/Module_missing/",
    "/api/v1/products/Bundle_x/",
  ] {
    let req = test::TestRequest::get().uri(uri).to_request();
    let resp = test::call_service(&srv, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", uri);
  }
}

#[actix_web::test]
async fn test_health_check() {
  let app = TestApp::new();
  let srv = test_service!(app.state);
  let req = test::TestRequest::get().uri("/api/v1/health").to_request();
  let body: Value = test::call_and_read_body_json(&srv, req).await;
  assert_eq!(body, json!({"status": "ok"}));
}
