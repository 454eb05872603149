// storefront/src/services/payment.rs

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub const CHARGE_DESCRIPTION: &str = "Course purchase for MIT Teacher's Portal";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
  #[error("Payment declined: {0}")]
  Declined(String),

  #[error("Payment provider error: {0}")]
  Provider(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeReceipt {
  pub charge_id: String,
  pub amount_cents: i64,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  /// Charges `amount_cents` US cents against the card behind `token`.
  async fn capture(
    &self,
    token: &str,
    amount_cents: i64,
    description: &str,
    order_id: Uuid,
  ) -> Result<ChargeReceipt, PaymentError>;
}

/// Charges through the Stripe REST API.
#[derive(Debug, Clone)]
pub struct StripeGateway {
  http: reqwest::Client,
  api_base: String,
  secret_key: String,
}

#[derive(Debug, Deserialize)]
struct StripeCharge {
  id: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
  error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
  #[serde(default)]
  message: Option<String>,
}

impl StripeGateway {
  pub fn new(http: reqwest::Client, api_base: impl Into<String>, secret_key: impl Into<String>) -> Self {
    Self {
      http,
      api_base: api_base.into(),
      secret_key: secret_key.into(),
    }
  }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
  #[instrument(name = "stripe_capture", skip(self, token, description))]
  async fn capture(
    &self,
    token: &str,
    amount_cents: i64,
    description: &str,
    order_id: Uuid,
  ) -> Result<ChargeReceipt, PaymentError> {
    let url = format!("{}/v1/charges", self.api_base.trim_end_matches('/'));
    let form = [
      ("amount", amount_cents.to_string()),
      ("currency", "usd".to_string()),
      ("source", token.to_string()),
      ("description", description.to_string()),
      ("metadata[order_id]", order_id.to_string()),
    ];

    let resp = self
      .http
      .post(&url)
      .basic_auth(&self.secret_key, None::<&str>)
      .form(&form)
      .send()
      .await
      .map_err(|e| PaymentError::Provider(e.to_string()))?;

    let status = resp.status();
    if status.is_success() {
      let charge: StripeCharge = resp.json().await.map_err(|e| PaymentError::Provider(e.to_string()))?;
      info!(charge_id = %charge.id, "Charge captured.");
      return Ok(ChargeReceipt {
        charge_id: charge.id,
        amount_cents,
      });
    }

    let message = resp
      .json::<StripeErrorBody>()
      .await
      .ok()
      .and_then(|b| b.error.message)
      .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
    warn!(status = status.as_u16(), %message, "Charge rejected.");
    if status.is_client_error() {
      Err(PaymentError::Declined(message))
    } else {
      Err(PaymentError::Provider(message))
    }
  }
}
