// storefront/src/main.rs

use actix_web::{web as actix_data, App, HttpServer};
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use storefront::catalog::{CatalogStore, MemoryCatalogStore, PgCatalogStore};
use storefront::config::{AppConfig, LogFormat, PaymentProvider, StoreBackend};
use storefront::errors::{AppError, Result as AppResult};
use storefront::population::{PopulationQueue, PopulationWorker};
use storefront::services::{CcxconClient, CourseService, MockGateway, PaymentGateway, StripeGateway};
use storefront::state::AppState;
use storefront::web::configure_app_routes;

fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);
  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Pretty => builder.init(),
  }
}

async fn build_catalog(config: &AppConfig) -> AppResult<Arc<dyn CatalogStore>> {
  match config.store_backend {
    StoreBackend::Postgres => {
      let url = config
        .database_url
        .as_deref()
        .ok_or_else(|| AppError::Config("DATABASE_URL is not set".to_string()))?;
      Ok(Arc::new(PgCatalogStore::connect(url).await?))
    }
    StoreBackend::Memory => {
      tracing::warn!("Using the in-memory catalog; data is lost on restart.");
      Ok(Arc::new(MemoryCatalogStore::new()))
    }
  }
}

fn build_payments(config: &AppConfig, http: &reqwest::Client) -> Arc<dyn PaymentGateway> {
  match config.payment_provider {
    PaymentProvider::Stripe => Arc::new(StripeGateway::new(
      http.clone(),
      config.stripe_api_base.clone(),
      config.stripe_secret_key.clone(),
    )),
    PaymentProvider::Mock => {
      tracing::warn!("Using the mock payment gateway; no money is captured.");
      Arc::new(MockGateway::new())
    }
  }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  let app_config = match AppConfig::from_env() {
    Ok(cfg) => cfg,
    Err(e) => {
      eprintln!("Configuration error: {}", e);
      return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }
  };
  init_tracing(app_config.log_format);
  tracing::info!("Starting CCX storefront...");

  let catalog = build_catalog(&app_config).await.map_err(|e| {
    tracing::error!(error = %e, "Failed to open the catalog store.");
    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
  })?;

  let http = reqwest::Client::new();
  let payments = build_payments(&app_config, &http);
  let course_service: Arc<dyn CourseService> = Arc::new(CcxconClient::new(
    http.clone(),
    app_config.ccxcon_api.clone(),
    app_config.oauth_client_id.clone(),
    app_config.oauth_client_secret.clone(),
  ));

  let (population_queue, receiver) = PopulationQueue::channel();
  let worker = PopulationWorker::new(
    catalog.clone(),
    course_service.clone(),
    population_queue.clone(),
    receiver,
    app_config.population_max_retries,
    app_config.population_backoff_unit,
  );
  actix_web::rt::spawn(worker.run());

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  let app_state = AppState::new(app_config, catalog, payments, course_service, population_queue);
  tracing::info!("Binding server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
