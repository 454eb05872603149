// storefront/src/web/routes.rs

use actix_web::web;

use crate::web::handlers::{checkout_handlers, course_handlers, product_handlers, status_handlers, webhook_handlers};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .route("/status/", web::get().to(status_handlers::status_handler))
      // Catalog changes pushed by CCXCon
      .route(
        "/webhooks/ccxcon/",
        web::post().to(webhook_handlers::ccxcon_webhook_handler),
      )
      .route("/checkout/", web::post().to(checkout_handlers::checkout_handler))
      .route("/courses/{course_uuid}/", web::patch().to(course_handlers::edit_course_handler))
      .service(
        web::scope("/products")
          .route("/", web::get().to(product_handlers::list_products_handler))
          .route("/{product_id}/", web::get().to(product_handlers::get_product_handler)),
      ),
  );
}
