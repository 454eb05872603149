// storefront/src/pipelines/contexts.rs

//! Data carried through each pipeline run. Handlers receive these wrapped in
//! `flow::ContextData`.

use actix_web::web::Bytes;
use serde_json::Value;

use crate::cart::{PlacedLine, ValidatedCart};
use crate::models::Order;
use crate::population::PopulateModulesRequested;
use crate::reconciler::{Action, EntityKind};
use crate::services::ChargeReceipt;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Debug, Clone)]
pub struct WebhookEnvelope {
  pub kind: EntityKind,
  pub action: Action,
  pub payload: Value,
}

#[derive(Clone)]
pub struct WebhookCtxData {
  pub app_state: AppState,
  pub raw_body: Bytes,
  pub signature: Option<String>,
  pub envelope: Option<WebhookEnvelope>,
  /// Filled once the change is committed.
  pub followups: Vec<PopulateModulesRequested>,
}

impl WebhookCtxData {
  pub fn new(app_state: AppState, raw_body: Bytes, signature: Option<String>) -> Self {
    Self {
      app_state,
      raw_body,
      signature,
      envelope: None,
      followups: Vec::new(),
    }
  }
}

#[derive(Clone)]
pub struct CheckoutCtxData {
  pub app_state: AppState,
  pub purchaser: AuthenticatedUser,
  pub raw_body: Bytes,

  pub token: Option<String>,
  pub cart_items: Vec<Value>,
  pub declared_total_cents: Option<i64>,

  pub validated_cart: Option<ValidatedCart>,
  pub computed_total_cents: Option<i64>,

  pub order: Option<Order>,
  pub placed_lines: Vec<PlacedLine>,
  pub charge: Option<ChargeReceipt>,

  /// One message per course-service notification that failed.
  pub notification_errors: Vec<String>,
}

impl CheckoutCtxData {
  pub fn new(app_state: AppState, purchaser: AuthenticatedUser, raw_body: Bytes) -> Self {
    Self {
      app_state,
      purchaser,
      raw_body,
      token: None,
      cart_items: Vec::new(),
      declared_total_cents: None,
      validated_cart: None,
      computed_total_cents: None,
      order: None,
      placed_lines: Vec::new(),
      charge: None,
      notification_errors: Vec::new(),
    }
  }
}
