// storefront/src/web/handlers/status_handlers.rs

use actix_web::{http::StatusCode, web, HttpResponse};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Instant;
use tracing::{debug, error, instrument};

use crate::errors::AppError;
use crate::state::AppState;

const UP: &str = "up";
const DOWN: &str = "down";

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
  token: Option<String>,
}

/// Backend connectivity, gated on `?token=`. Without a configured
/// `STATUS_TOKEN` the endpoint does not exist.
#[instrument(name = "handler::status", skip_all)]
pub async fn status_handler(
  app_state: web::Data<AppState>,
  query: web::Query<StatusQuery>,
) -> Result<HttpResponse, AppError> {
  let expected = app_state.config.status_token.as_str();
  if expected.is_empty() || query.token.as_deref() != Some(expected) {
    return Err(AppError::NotFound("Not found.".to_string()));
  }

  let catalog = &app_state.catalog;
  let started = Instant::now();
  let (code, report) = match catalog.ping().await {
    Ok(()) => {
      let micros = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
      debug!(backend = catalog.backend_name(), micros, "Catalog answered.");
      (StatusCode::OK, json!({ "status": UP, "response_microseconds": micros }))
    }
    Err(e) => {
      error!(backend = catalog.backend_name(), error = %e, "Catalog is unreachable.");
      (StatusCode::SERVICE_UNAVAILABLE, json!({ "status": DOWN }))
    }
  };

  let mut info = Map::new();
  info.insert(catalog.backend_name().to_string(), report);
  Ok(HttpResponse::build(code).json(Value::Object(info)))
}
