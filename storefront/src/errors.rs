// storefront/src/errors.rs

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use flow::FlowError;
use serde_json::json;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::services::payment::PaymentError;

/// Caller-correctable failures. Every variant renders as a 400 with a
/// one-element JSON array carrying the message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("Missing key {0}")]
  MissingKey(String),

  #[error("Invalid key {0}")]
  InvalidKey(String),

  #[error("Invalid payload")]
  InvalidPayload,

  #[error("Invalid external_pk")]
  InvalidExternalId,

  #[error("Invalid instance")]
  InvalidInstance,

  #[error("{0}")]
  ImmutableField(String),

  #[error("{0}")]
  InvalidParentReference(String),

  #[error("Unknown action {0}")]
  UnknownAction(String),

  #[error("No handler for type {0}")]
  NoHandler(String),

  #[error("{0}")]
  InvalidFormat(String),

  #[error("One or more products are unavailable")]
  UnavailableProduct,

  #[error("Seats must be a positive integer")]
  InvalidSeatsType,

  #[error("Cannot purchase a Course")]
  CannotPurchaseCourse,

  #[error("Number of seats is zero")]
  ZeroSeats,

  #[error("Duplicate item in cart")]
  DuplicateItem,

  #[error("You must purchase all modules for a course.")]
  IncompleteCourse,

  #[error("Cart total does not match the declared total")]
  PriceMismatch,

  #[error("Cart total is out of range")]
  TotalOutOfRange,

  #[error("Cannot checkout an empty cart")]
  EmptyCart,

  #[error("Cart must be a list of items")]
  CartNotAList,

  #[error("{field} must be {expected}")]
  FieldType { field: String, expected: String },

  #[error("{0} is not a valid number")]
  InvalidNumber(String),

  #[error("Each module must be an object")]
  ModuleNotAnObject,

  #[error("Duplicate module")]
  DuplicateModule,

  #[error("Unable to find module {0}")]
  UnknownModule(String),

  #[error("User doesn't have permission to edit {0}")]
  EditNotPermitted(String),
}

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(#[from] ValidationError),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Payment Capture Error: {0}")]
  Payment(#[from] PaymentError),

  /// Payment went through and the order is stored, but some course-service
  /// notifications failed.
  #[error("Fulfillment incomplete: {} notification(s) failed", .0.len())]
  Fulfillment(Vec<String>),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Catalog Error: {0}")]
  Catalog(#[from] CatalogError),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<AppError>() {
      Ok(app_err) => app_err,
      Err(err) => match err.downcast::<ValidationError>() {
        Ok(v) => AppError::Validation(v),
        Err(err) => AppError::Internal(err.to_string()),
      },
    }
  }
}

impl AppError {
  /// The validation message when this error is caller-correctable.
  pub fn validation_message(&self) -> Option<String> {
    match self {
      AppError::Validation(v) => Some(v.to_string()),
      _ => None,
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Payment(_) => StatusCode::PAYMENT_REQUIRED,
      AppError::Fulfillment(_) => StatusCode::INTERNAL_SERVER_ERROR,
      AppError::Config(_) | AppError::Catalog(_) | AppError::Workflow { .. } | AppError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, "Rejecting request");
    }

    let mut builder = HttpResponse::build(status);
    match self {
      AppError::Validation(v) => builder.json(json!([v.to_string()])),
      AppError::Auth(m) | AppError::Forbidden(m) | AppError::NotFound(m) => builder.json(json!({ "detail": m })),
      AppError::Payment(e) => builder.json(json!({ "detail": e.to_string() })),
      AppError::Fulfillment(errors) => builder.json(json!({
        "error": "Unable to post to CCXCon",
        "error_list": errors,
      })),
      AppError::Workflow { source } => {
        tracing::error!(flow_error = ?source, "Workflow error details");
        builder.json(json!({ "error": "Workflow processing error" }))
      }
      AppError::Config(_) | AppError::Catalog(_) | AppError::Internal(_) => {
        builder.json(json!({ "error": "An internal error occurred" }))
      }
    }
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::body::to_bytes;

  async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
    let resp = err.error_response();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body()).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  #[actix_web::test]
  async fn validation_errors_render_as_single_message_arrays() {
    let (status, body) = body_json(ValidationError::MissingKey("title".into()).into()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!(["Missing key title"]));
  }

  #[actix_web::test]
  async fn fulfillment_errors_carry_error_list() {
    let (status, body) = body_json(AppError::Fulfillment(vec!["boom".into()])).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Unable to post to CCXCon");
    assert_eq!(body["error_list"], json!(["boom"]));
  }

  #[test]
  fn anyhow_wrapped_validation_errors_keep_their_kind() {
    let err: AppError = anyhow::Error::new(ValidationError::DuplicateItem).into();
    assert_eq!(err.validation_message().as_deref(), Some("Duplicate item in cart"));

    let err: AppError = anyhow::anyhow!("socket closed").into();
    assert!(matches!(err, AppError::Internal(ref m) if m == "socket closed"));
  }
}
