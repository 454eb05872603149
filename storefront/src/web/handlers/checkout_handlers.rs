// storefront/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use flow::{ContextData, PipelineResult};
use serde_json::json;
use tracing::{error, info, instrument, warn};

use crate::errors::AppError;
use crate::pipelines::contexts::CheckoutCtxData;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

/// Body: `{"token": "...", "cart": [{"uuid": "Module_x", "seats": 3}], "total": 30.0}`.
#[instrument(name = "handler::checkout", skip(app_state, purchaser, body), fields(user_id = %purchaser.id))]
pub async fn checkout_handler(
  app_state: web::Data<AppState>,
  purchaser: AuthenticatedUser,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let ctx_data = ContextData::new(CheckoutCtxData::new(app_state.get_ref().clone(), purchaser, body));

  match app_state.registry.run(ctx_data.clone()).await {
    Ok(PipelineResult::Completed) => {
      let guard = ctx_data.read();
      let order_id = guard.order.as_ref().map(|o| o.id);
      if !guard.notification_errors.is_empty() {
        // The order and charge stand; only the CCX creation is incomplete.
        error!(
          ?order_id,
          failures = guard.notification_errors.len(),
          "Checkout completed with failed course-service notifications."
        );
        return Err(AppError::Fulfillment(guard.notification_errors.clone()));
      }
      info!(?order_id, "Checkout completed.");
      Ok(HttpResponse::Ok().json(json!({})))
    }
    Ok(PipelineResult::Stopped) => {
      warn!("Checkout pipeline stopped early.");
      Err(AppError::Internal("Checkout was halted.".to_string()))
    }
    Err(e) => {
      warn!(error = %e, "Checkout failed.");
      Err(e)
    }
  }
}
