// tests/pipeline_execution_tests.rs
mod common;

use common::*;
use flow::{ContextData, Pipeline, PipelineControl, PipelineResult};
use serial_test::serial;
use std::sync::Arc;

fn three_step_pipeline() -> Pipeline<OrderFlowContext, TestError> {
  let mut p = Pipeline::<OrderFlowContext, TestError>::new(&[
    ("validate", false, None),
    ("persist", false, None),
    ("notify", false, None),
  ]);
  p.on_root("validate", recording_handler("validate"));
  p.on_root("persist", recording_handler("persist"));
  p.on_root("notify", recording_handler("notify"));
  p
}

#[tokio::test]
#[serial]
async fn test_steps_run_in_declared_order() {
  setup_tracing();
  let pipeline = three_step_pipeline();
  assert_eq!(pipeline.step_names(), vec!["validate", "persist", "notify"]);

  let ctx = ContextData::new(OrderFlowContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Completed);
  let guard = ctx.read();
  assert_eq!(guard.seats, 3);
  assert_eq!(guard.log, vec!["validate", "persist", "notify"]);
}

#[tokio::test]
#[serial]
async fn test_stop_halts_remaining_steps() {
  setup_tracing();
  let pipeline = three_step_pipeline();
  let ctx = ContextData::new(OrderFlowContext {
    stop_at: Some("persist".to_string()),
    ..Default::default()
  });

  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Stopped);
  assert_eq!(ctx.read().log, vec!["validate", "persist"]);
}

#[tokio::test]
#[serial]
async fn test_handler_error_aborts_run() {
  setup_tracing();
  let mut pipeline =
    Pipeline::<OrderFlowContext, TestError>::new(&[("validate", false, None), ("persist", false, None)]);
  pipeline.on_root("validate", failing_handler("validate", "cart is empty"));
  pipeline.on_root("persist", recording_handler("persist"));

  let ctx = ContextData::new(OrderFlowContext::default());
  let err = pipeline.run(ctx.clone()).await.unwrap_err();

  assert_eq!(err, TestError::Step("cart is empty".to_string()));
  assert_eq!(ctx.read().log, vec!["validate"]);
}

#[tokio::test]
#[serial]
async fn test_skip_condition_bypasses_step() {
  setup_tracing();
  let mut pipeline = Pipeline::<OrderFlowContext, TestError>::new(&[
    ("persist", false, None),
    (
      "notify",
      false,
      Some(Arc::new(|ctx: ContextData<OrderFlowContext>| ctx.read().seats > 0)),
    ),
  ]);
  pipeline.on_root("persist", recording_handler("persist"));
  pipeline.on_root("notify", recording_handler("notify"));

  let ctx = ContextData::new(OrderFlowContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx.read().log, vec!["persist"]);
}

#[tokio::test]
#[serial]
async fn test_before_on_after_phases_run_in_sequence() {
  setup_tracing();
  let mut pipeline = Pipeline::<OrderFlowContext, TestError>::new(&[("persist", false, None)]);
  pipeline.after_root("persist", recording_handler("after"));
  pipeline.on_root("persist", recording_handler("on"));
  pipeline.before_root("persist", recording_handler("before"));

  let ctx = ContextData::new(OrderFlowContext::default());
  pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(ctx.read().log, vec!["before", "on", "after"]);
}

#[tokio::test]
#[serial]
async fn test_after_hook_can_stop_pipeline() {
  setup_tracing();
  let mut pipeline =
    Pipeline::<OrderFlowContext, TestError>::new(&[("persist", false, None), ("notify", false, None)]);
  pipeline.on_root("persist", recording_handler("persist"));
  pipeline.after_root("persist", |_ctx: ContextData<OrderFlowContext>| async move {
    Ok::<_, TestError>(PipelineControl::Stop)
  });
  pipeline.on_root("notify", |ctx: ContextData<OrderFlowContext>| async move {
    ctx.write().notified = true;
    Ok::<_, TestError>(PipelineControl::Continue)
  });

  let ctx = ContextData::new(OrderFlowContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Stopped);
  assert!(!ctx.read().notified);
}

#[tokio::test]
#[serial]
async fn test_optional_step_without_handlers_is_skipped() {
  setup_tracing();
  let mut pipeline =
    Pipeline::<OrderFlowContext, TestError>::new(&[("audit", true, None), ("persist", false, None)]);
  pipeline.on_root("persist", recording_handler("persist"));

  let ctx = ContextData::new(OrderFlowContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx.read().log, vec!["persist"]);
}

#[tokio::test]
#[serial]
async fn test_insert_and_remove_steps() {
  setup_tracing();
  let mut pipeline = three_step_pipeline();
  pipeline.insert_after_step("persist", "audit", false, None).unwrap();
  pipeline.on_root("audit", recording_handler("audit"));
  pipeline.remove_step("notify");

  assert_eq!(pipeline.step_names(), vec!["validate", "persist", "audit"]);
  assert!(pipeline.insert_after_step("persist", "audit", false, None).is_err());
  assert!(pipeline.insert_after_step("missing", "other", false, None).is_err());

  let ctx = ContextData::new(OrderFlowContext::default());
  pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().log, vec!["validate", "persist", "audit"]);
}

#[test]
#[should_panic(expected = "Step not found")]
fn test_registering_handler_on_unknown_step_panics() {
  let mut pipeline = Pipeline::<OrderFlowContext, TestError>::new(&[("persist", false, None)]);
  pipeline.on_root("persits", recording_handler("persits"));
}
