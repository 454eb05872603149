// storefront/src/state.rs
use crate::catalog::CatalogStore;
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::pipelines;
use crate::population::PopulationQueue;
use crate::services::{CourseService, PaymentGateway};
use flow::Registry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub catalog: Arc<dyn CatalogStore>,
  pub registry: Arc<Registry<AppError>>,
  pub config: Arc<AppConfig>,
  pub payments: Arc<dyn PaymentGateway>,
  pub course_service: Arc<dyn CourseService>,
  pub population_queue: PopulationQueue,
}

impl AppState {
  /// Wires the collaborators together and registers the request pipelines.
  pub fn new(
    config: AppConfig,
    catalog: Arc<dyn CatalogStore>,
    payments: Arc<dyn PaymentGateway>,
    course_service: Arc<dyn CourseService>,
    population_queue: PopulationQueue,
  ) -> Self {
    let registry = Arc::new(Registry::<AppError>::new());
    pipelines::register_all(&registry);
    Self {
      catalog,
      registry,
      config: Arc::new(config),
      payments,
      course_service,
      population_queue,
    }
  }
}
