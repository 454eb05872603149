// storefront/src/pipelines/checkout_pipeline.rs
use flow::{ContextData, Pipeline, PipelineControl, Registry};
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::cart::{create_order, validate_cart};
use crate::errors::{AppError, ValidationError};
use crate::pipelines::contexts::CheckoutCtxData;
use crate::products::availability::{to_cents, to_cents_f64};
use crate::products::identity::{make_qualified_id, ProductType};
use crate::services::payment::CHARGE_DESCRIPTION;
use crate::services::CreateCcxRequest;

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
  pub token: String,
  pub cart: Vec<Value>,
  pub declared_total_cents: i64,
}

fn declared_cents(total: &Value) -> Option<i64> {
  match total {
    Value::Number(n) => match n.as_i64() {
      Some(whole) => to_cents(Decimal::from(whole)),
      None => n.as_f64().and_then(to_cents_f64),
    },
    Value::String(s) => s.trim().parse::<Decimal>().ok().and_then(to_cents),
    _ => None,
  }
}

/// Reads `{"token", "cart", "total"}` from a checkout body.
pub fn parse_checkout_request(body: &[u8]) -> Result<CheckoutRequest, ValidationError> {
  let message: Value = serde_json::from_slice(body).map_err(|_| ValidationError::InvalidPayload)?;
  let fields = message.as_object().ok_or(ValidationError::InvalidPayload)?;
  for key in ["token", "cart", "total"] {
    if !fields.contains_key(key) {
      return Err(ValidationError::MissingKey(key.to_string()));
    }
  }

  let token = match &fields["token"] {
    Value::String(s) if !s.is_empty() => s.clone(),
    _ => return Err(ValidationError::InvalidKey("token".to_string())),
  };
  let cart = fields["cart"].as_array().ok_or(ValidationError::CartNotAList)?.clone();
  if cart.is_empty() {
    return Err(ValidationError::EmptyCart);
  }
  let declared_total_cents =
    declared_cents(&fields["total"]).ok_or_else(|| ValidationError::InvalidKey("total".to_string()))?;

  Ok(CheckoutRequest {
    token,
    cart,
    declared_total_cents,
  })
}

pub fn register_checkout_pipeline(registry: &Registry<AppError>) {
  let mut p = Pipeline::<CheckoutCtxData, AppError>::new(&[
    ("parse_request", false, None),
    ("validate_cart", false, None),
    ("verify_total", false, None),
    ("place_order", false, None),
    ("notify_course_service", false, None),
  ]);

  p.on_root("parse_request", |ctx_data: ContextData<CheckoutCtxData>| async move {
    let body = ctx_data.read().raw_body.clone();
    let request = parse_checkout_request(&body)?;
    let mut guard = ctx_data.write();
    guard.token = Some(request.token);
    guard.cart_items = request.cart;
    guard.declared_total_cents = Some(request.declared_total_cents);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_root("validate_cart", |ctx_data: ContextData<CheckoutCtxData>| async move {
    let (catalog, items) = {
      let guard = ctx_data.read();
      (guard.app_state.catalog.clone(), guard.cart_items.clone())
    };
    let validated = {
      let mut tx = catalog.begin().await?;
      validate_cart(tx.as_mut(), &items).await?
    };
    let computed = to_cents(validated.subtotal).ok_or(ValidationError::TotalOutOfRange)?;
    let mut guard = ctx_data.write();
    guard.computed_total_cents = Some(computed);
    guard.validated_cart = Some(validated);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_root("verify_total", |ctx_data: ContextData<CheckoutCtxData>| async move {
    let guard = ctx_data.read();
    if guard.computed_total_cents != guard.declared_total_cents {
      warn!(
        computed = ?guard.computed_total_cents,
        declared = ?guard.declared_total_cents,
        "Cart total mismatch."
      );
      return Err(ValidationError::PriceMismatch.into());
    }
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  // Order rows and the charge share one unit of work: a failed capture leaves
  // no order behind.
  p.on_root("place_order", |ctx_data: ContextData<CheckoutCtxData>| async move {
    let (catalog, payments, items, token, declared, purchaser_id) = {
      let guard = ctx_data.read();
      (
        guard.app_state.catalog.clone(),
        guard.app_state.payments.clone(),
        guard.cart_items.clone(),
        guard.token.clone().unwrap_or_default(),
        guard.declared_total_cents,
        guard.purchaser.id,
      )
    };

    let mut tx = catalog.begin().await?;
    let cart = validate_cart(tx.as_mut(), &items).await?;
    let amount_cents = to_cents(cart.subtotal).ok_or(ValidationError::TotalOutOfRange)?;
    if Some(amount_cents) != declared {
      return Err(ValidationError::PriceMismatch.into());
    }
    let (order, placed) = create_order(tx.as_mut(), purchaser_id, &cart).await?;

    let charge = if amount_cents != 0 {
      match payments.capture(&token, amount_cents, CHARGE_DESCRIPTION, order.id).await {
        Ok(receipt) => Some(receipt),
        Err(e) => {
          error!(order_id = %order.id, error = %e, "Payment capture failed; order discarded.");
          return Err(AppError::Payment(e));
        }
      }
    } else {
      None
    };
    tx.commit().await?;
    info!(order_id = %order.id, amount_cents, lines = placed.len(), "Order placed.");

    let mut guard = ctx_data.write();
    guard.order = Some(order);
    guard.placed_lines = placed;
    guard.charge = charge;
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  // Runs after commit. Failures are collected, never raised: the purchase stands.
  p.on_root("notify_course_service", |ctx_data: ContextData<CheckoutCtxData>| async move {
    let (service, placed, email) = {
      let guard = ctx_data.read();
      (
        guard.app_state.course_service.clone(),
        guard.placed_lines.clone(),
        guard.purchaser.email.clone(),
      )
    };

    let mut failures = Vec::new();
    for entry in &placed {
      let request = CreateCcxRequest {
        master_course_id: entry.course.uuid.clone(),
        user_email: email.clone(),
        total_seats: entry.line.seats,
        display_name: entry.course.title.clone(),
        course_modules: vec![entry.module.uuid.clone()],
      };
      if let Err(e) = service.create_ccx(&request).await {
        let upc = make_qualified_id(ProductType::Module, &entry.module.uuid);
        warn!(%upc, error = %e, "CCX creation failed.");
        failures.push(format!("Unable to create CCX for {}: {}", upc, e));
      }
    }

    ctx_data.write().notification_errors = failures;
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  registry.register_pipeline(p);
}
