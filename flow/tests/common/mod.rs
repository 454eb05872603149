// tests/common/mod.rs
#![allow(dead_code)]

use flow::{ContextData, FlowError, PipelineControl};
use once_cell::sync::Lazy;
use tracing::Level;

#[derive(Clone, Debug, Default)]
pub struct OrderFlowContext {
  pub seats: i32,
  pub log: Vec<String>,
  pub stop_at: Option<String>,
  pub notified: bool,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("flow error: {0}")]
  Flow(String),

  #[error("step failed: {0}")]
  Step(String),
}

impl From<FlowError> for TestError {
  fn from(fe: FlowError) -> Self {
    TestError::Flow(format!("{:?}", fe))
  }
}

/// Appends `step_name` to the log and bumps `seats`; stops if `stop_at` names this step.
pub fn recording_handler(step_name: &'static str) -> flow::Handler<OrderFlowContext, TestError> {
  Box::new(move |ctx: ContextData<OrderFlowContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.seats += 1;
      guard.log.push(step_name.to_string());
      if guard.stop_at.as_deref() == Some(step_name) {
        return Ok(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  })
}

pub fn failing_handler(step_name: &'static str, message: &'static str) -> flow::Handler<OrderFlowContext, TestError> {
  Box::new(move |ctx: ContextData<OrderFlowContext>| {
    Box::pin(async move {
      ctx.write().log.push(step_name.to_string());
      Err(TestError::Step(message.to_string()))
    })
  })
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
