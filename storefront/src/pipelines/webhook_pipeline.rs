// storefront/src/pipelines/webhook_pipeline.rs

use flow::{ContextData, Pipeline, PipelineControl, Registry};
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha1::Sha1;
use tracing::{info, warn};

use crate::errors::{AppError, ValidationError};
use crate::pipelines::contexts::{WebhookCtxData, WebhookEnvelope};
use crate::reconciler::{self, Action, EntityKind};

type HmacSha1 = Hmac<Sha1>;

pub const SIGNATURE_HEADER: &str = "X-CCXCon-Signature";

/// Checks a hex HMAC-SHA1 of `body` keyed by `secret`, in constant time.
pub fn verify_signature(secret: &str, body: &[u8], signature: Option<&str>) -> Result<(), AppError> {
  let signature = signature
    .filter(|s| !s.is_empty())
    .ok_or_else(|| AppError::Forbidden("Missing webhook signature".to_string()))?;
  let expected = hex::decode(signature.trim())
    .map_err(|_| AppError::Forbidden("Invalid webhook signature".to_string()))?;

  let mut mac = HmacSha1::new_from_slice(secret.as_bytes()).map_err(|e| AppError::Internal(e.to_string()))?;
  mac.update(body);
  mac
    .verify_slice(&expected)
    .map_err(|_| AppError::Forbidden("Invalid webhook signature".to_string()))
}

/// Reads `{"type", "action", "payload"}`, reporting the first missing key.
pub fn parse_envelope(body: &[u8]) -> Result<WebhookEnvelope, ValidationError> {
  let message: Value = serde_json::from_slice(body).map_err(|_| ValidationError::InvalidPayload)?;
  let fields = message.as_object().ok_or(ValidationError::InvalidPayload)?;
  for key in ["type", "action", "payload"] {
    if !fields.contains_key(key) {
      return Err(ValidationError::MissingKey(key.to_string()));
    }
  }
  let kind = EntityKind::parse(&fields["type"])?;
  let action = Action::parse(&fields["action"])?;
  Ok(WebhookEnvelope {
    kind,
    action,
    payload: fields["payload"].clone(),
  })
}

pub fn register_webhook_pipeline(registry: &Registry<AppError>) {
  let mut p = Pipeline::<WebhookCtxData, AppError>::new(&[
    ("verify_signature", false, None),
    ("parse_envelope", false, None),
    ("apply_change", false, None),
    ("dispatch_followups", true, None),
  ]);

  p.on_root("verify_signature", |ctx_data: ContextData<WebhookCtxData>| async move {
    let verified = {
      let guard = ctx_data.read();
      verify_signature(
        &guard.app_state.config.webhook_secret,
        &guard.raw_body,
        guard.signature.as_deref(),
      )
    };
    if let Err(e) = verified {
      warn!("Webhook signature rejected.");
      return Err(e);
    }
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_root("parse_envelope", |ctx_data: ContextData<WebhookCtxData>| async move {
    let body = ctx_data.read().raw_body.clone();
    let envelope = parse_envelope(&body)?;
    info!(kind = ?envelope.kind, action = ?envelope.action, "Webhook received.");
    ctx_data.write().envelope = Some(envelope);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  // One unit of work per delivery; any error drops it uncommitted.
  p.on_root("apply_change", |ctx_data: ContextData<WebhookCtxData>| async move {
    let (catalog, envelope) = {
      let guard = ctx_data.read();
      (guard.app_state.catalog.clone(), guard.envelope.clone())
    };
    let envelope = envelope.ok_or_else(|| AppError::Internal("Webhook envelope was not parsed".to_string()))?;

    let mut tx = catalog.begin().await?;
    let followups = reconciler::apply(tx.as_mut(), envelope.kind, envelope.action, &envelope.payload).await?;
    tx.commit().await?;

    ctx_data.write().followups = followups;
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on_root("dispatch_followups", |ctx_data: ContextData<WebhookCtxData>| async move {
    let (queue, followups) = {
      let guard = ctx_data.read();
      (guard.app_state.population_queue.clone(), guard.followups.clone())
    };
    for request in followups {
      info!(course_id = %request.course_id, "Queueing module population.");
      queue.enqueue(request);
    }
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  registry.register_pipeline(p);
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
  }

  #[test]
  fn accepts_matching_signature_only() {
    let body = br#"{"type":"course"}"#;
    let good = sign("s3cret", body);
    assert!(verify_signature("s3cret", body, Some(&good)).is_ok());
    assert!(matches!(
      verify_signature("other", body, Some(&good)),
      Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
      verify_signature("s3cret", body, Some("zz-not-hex")),
      Err(AppError::Forbidden(_))
    ));
    assert!(matches!(verify_signature("s3cret", body, None), Err(AppError::Forbidden(_))));
  }

  #[test]
  fn envelope_reports_missing_keys_then_unknown_type() {
    assert_eq!(
      parse_envelope(br#"{"type": "course", "payload": {}}"#).unwrap_err(),
      ValidationError::MissingKey("action".into())
    );
    assert_eq!(
      parse_envelope(br#"{"type": "Bundle", "action": "update", "payload": {}}"#).unwrap_err(),
      ValidationError::NoHandler("Bundle".into())
    );
    assert_eq!(parse_envelope(b"not json").unwrap_err(), ValidationError::InvalidPayload);
    let env = parse_envelope(br#"{"type": "Module", "action": "delete", "payload": {"external_pk": "m"}}"#).unwrap();
    assert_eq!(env.kind, EntityKind::Module);
    assert_eq!(env.action, Action::Delete);
  }
}
