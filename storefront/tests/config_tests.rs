// tests/config_tests.rs
use serial_test::serial;
use std::env;
use std::time::Duration;

use storefront::config::{AppConfig, LogFormat, PaymentProvider, StoreBackend};
use storefront::errors::AppError;

const VARS: [&str; 5] = [
  "STORE_BACKEND",
  "PAYMENT_PROVIDER",
  "POPULATION_MAX_RETRIES",
  "POPULATION_BACKOFF_UNIT_MS",
  "LOG_FORMAT",
];

fn clear() {
  for name in VARS {
    env::remove_var(name);
  }
}

#[test]
#[serial]
fn test_from_env_reads_process_environment() {
  clear();
  env::set_var("STORE_BACKEND", "memory");
  env::set_var("PAYMENT_PROVIDER", "mock");
  env::set_var("POPULATION_MAX_RETRIES", "3");
  env::set_var("POPULATION_BACKOFF_UNIT_MS", "250");
  env::set_var("LOG_FORMAT", "json");

  let cfg = AppConfig::from_env().unwrap();
  clear();

  assert_eq!(cfg.store_backend, StoreBackend::Memory);
  assert_eq!(cfg.payment_provider, PaymentProvider::Mock);
  assert_eq!(cfg.population_max_retries, 3);
  assert_eq!(cfg.population_backoff_unit, Duration::from_millis(250));
  assert_eq!(cfg.log_format, LogFormat::Json);
}

#[test]
#[serial]
fn test_from_env_rejects_unknown_payment_provider() {
  clear();
  env::set_var("STORE_BACKEND", "memory");
  env::set_var("PAYMENT_PROVIDER", "paypal");

  let err = AppConfig::from_env().unwrap_err();
  clear();

  assert!(matches!(err, AppError::Config(ref m) if m.contains("paypal")));
}
