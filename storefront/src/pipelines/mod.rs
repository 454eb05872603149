// storefront/src/pipelines/mod.rs

//! Request workflows built on `flow` pipelines.

pub mod checkout_pipeline;
pub mod contexts;
pub mod webhook_pipeline;

use crate::errors::AppError;
use flow::Registry;

pub fn register_all(registry: &Registry<AppError>) {
  webhook_pipeline::register_webhook_pipeline(registry);
  checkout_pipeline::register_checkout_pipeline(registry);
}
