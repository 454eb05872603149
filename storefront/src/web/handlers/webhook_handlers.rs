// storefront/src/web/handlers/webhook_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use flow::{ContextData, PipelineResult};
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::pipelines::contexts::WebhookCtxData;
use crate::pipelines::webhook_pipeline::SIGNATURE_HEADER;
use crate::state::AppState;

#[instrument(name = "handler::ccxcon_webhook", skip_all, fields(body_len = body.len()))]
pub async fn ccxcon_webhook_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let signature = req
    .headers()
    .get(SIGNATURE_HEADER)
    .and_then(|v| v.to_str().ok())
    .map(String::from);

  let ctx_data = ContextData::new(WebhookCtxData::new(app_state.get_ref().clone(), body, signature));

  match app_state.registry.run(ctx_data).await {
    Ok(PipelineResult::Completed) => {
      info!("Webhook applied.");
      Ok(HttpResponse::Ok().finish())
    }
    Ok(PipelineResult::Stopped) => {
      warn!("Webhook pipeline stopped before applying the change.");
      Err(AppError::Internal("Webhook processing was halted.".to_string()))
    }
    Err(e) => {
      warn!(error = %e, "Webhook rejected.");
      Err(e)
    }
  }
}
