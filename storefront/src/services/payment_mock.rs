// storefront/src/services/payment_mock.rs
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::payment::{ChargeReceipt, PaymentError, PaymentGateway};

/// Token that the mock gateway always declines.
pub const DECLINED_TOKEN: &str = "tok_declined";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCharge {
  pub token: String,
  pub amount_cents: i64,
  pub description: String,
  pub order_id: Uuid,
}

/// Accepts every token except [`DECLINED_TOKEN`] and remembers what it charged.
#[derive(Debug, Clone, Default)]
pub struct MockGateway {
  charges: Arc<Mutex<Vec<RecordedCharge>>>,
}

impl MockGateway {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn charges(&self) -> Vec<RecordedCharge> {
    self.charges.lock().clone()
  }
}

#[async_trait]
impl PaymentGateway for MockGateway {
  #[instrument(name = "mock_capture", skip(self, description))]
  async fn capture(
    &self,
    token: &str,
    amount_cents: i64,
    description: &str,
    order_id: Uuid,
  ) -> Result<ChargeReceipt, PaymentError> {
    if token == DECLINED_TOKEN {
      info!("Mock payment declined.");
      return Err(PaymentError::Declined("Your card was declined.".to_string()));
    }
    if amount_cents <= 0 {
      return Err(PaymentError::Provider("Amount must be greater than zero".to_string()));
    }

    self.charges.lock().push(RecordedCharge {
      token: token.to_string(),
      amount_cents,
      description: description.to_string(),
      order_id,
    });
    let charge_id = format!("mock_ch_{}", Uuid::new_v4().simple());
    info!(%charge_id, amount_cents, "Mock payment captured.");
    Ok(ChargeReceipt { charge_id, amount_cents })
  }
}
