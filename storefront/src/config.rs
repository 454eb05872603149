// storefront/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
  Postgres,
  /// In-process catalog; state is lost on restart.
  Memory,
}

impl FromStr for StoreBackend {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.to_ascii_lowercase().as_str() {
      "postgres" => Ok(StoreBackend::Postgres),
      "memory" => Ok(StoreBackend::Memory),
      other => Err(AppError::Config(format!("Invalid STORE_BACKEND '{}'", other))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentProvider {
  Stripe,
  Mock,
}

impl FromStr for PaymentProvider {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.to_ascii_lowercase().as_str() {
      "stripe" => Ok(PaymentProvider::Stripe),
      "mock" => Ok(PaymentProvider::Mock),
      other => Err(AppError::Config(format!("Invalid PAYMENT_PROVIDER '{}'", other))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub store_backend: StoreBackend,
  pub database_url: Option<String>,

  /// Shared secret for the `X-CCXCon-Signature` HMAC.
  pub webhook_secret: String,

  pub ccxcon_api: String,
  pub oauth_client_id: String,
  pub oauth_client_secret: String,

  pub payment_provider: PaymentProvider,
  pub stripe_secret_key: String,
  pub stripe_api_base: String,

  pub population_max_retries: u32,
  /// Length of one backoff "second"; shortened in tests.
  pub population_backoff_unit: Duration,

  pub log_format: LogFormat,

  /// Required `?token=` for the status endpoint; empty disables it.
  pub status_token: String,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the configuration from any key lookup, so parsing can be exercised
  /// without touching the process environment.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get_or = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

    let server_host = get_or("SERVER_HOST", "127.0.0.1");
    let server_port = get_or("SERVER_PORT", "8080")
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;

    let store_backend: StoreBackend = get_or("STORE_BACKEND", "postgres").parse()?;
    let database_url = lookup("DATABASE_URL");
    if store_backend == StoreBackend::Postgres && database_url.is_none() {
      return Err(AppError::Config(
        "Missing environment variable 'DATABASE_URL' (required by STORE_BACKEND=postgres)".to_string(),
      ));
    }

    let webhook_secret = get_or("CCXCON_WEBHOOKS_SECRET", "");
    if webhook_secret.is_empty() {
      tracing::warn!("CCXCON_WEBHOOKS_SECRET is empty; webhook signatures are keyed with an empty secret.");
    }

    let payment_provider: PaymentProvider = get_or("PAYMENT_PROVIDER", "stripe").parse()?;
    let stripe_secret_key = get_or("STRIPE_SECRET_KEY", "");
    if payment_provider == PaymentProvider::Stripe && stripe_secret_key.is_empty() {
      return Err(AppError::Config(
        "Missing environment variable 'STRIPE_SECRET_KEY' (required by PAYMENT_PROVIDER=stripe)".to_string(),
      ));
    }

    let population_max_retries = get_or("POPULATION_MAX_RETRIES", "5")
      .parse::<u32>()
      .map_err(|e| AppError::Config(format!("Invalid POPULATION_MAX_RETRIES: {}", e)))?;
    let backoff_unit_ms = get_or("POPULATION_BACKOFF_UNIT_MS", "1000")
      .parse::<u64>()
      .map_err(|e| AppError::Config(format!("Invalid POPULATION_BACKOFF_UNIT_MS: {}", e)))?;

    let log_format = match get_or("LOG_FORMAT", "pretty").to_ascii_lowercase().as_str() {
      "json" => LogFormat::Json,
      "pretty" => LogFormat::Pretty,
      other => return Err(AppError::Config(format!("Invalid LOG_FORMAT '{}'", other))),
    };

    Ok(Self {
      server_host,
      server_port,
      store_backend,
      database_url,
      webhook_secret,
      ccxcon_api: get_or("CCXCON_API", "http://localhost:8077/"),
      oauth_client_id: get_or("CCXCON_OAUTH_CLIENT_ID", ""),
      oauth_client_secret: get_or("CCXCON_OAUTH_CLIENT_SECRET", ""),
      payment_provider,
      stripe_secret_key,
      stripe_api_base: get_or("STRIPE_API_BASE", "https://api.stripe.com"),
      population_max_retries,
      population_backoff_unit: Duration::from_millis(backoff_unit_ms),
      log_format,
      status_token: get_or("STATUS_TOKEN", ""),
    })
  }
}
