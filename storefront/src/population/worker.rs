// storefront/src/population/worker.rs

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, instrument, warn};

use super::task::{backoff_seconds, populate_modules, PopulationError, PopulationOutcome};
use super::PopulateModulesRequested;
use crate::catalog::CatalogStore;
use crate::services::course_service::CourseService;

/// Sending half of the population queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PopulationQueue {
  sender: mpsc::UnboundedSender<PopulateModulesRequested>,
}

impl PopulationQueue {
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<PopulateModulesRequested>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Self { sender }, receiver)
  }

  /// Fire and forget. A closed queue only loses the request.
  pub fn enqueue(&self, request: PopulateModulesRequested) {
    let course_id = request.course_id.clone();
    if self.sender.send(request).is_err() {
      warn!(%course_id, "Population queue is closed; request dropped.");
    }
  }
}

/// Consumes population requests one at a time.
pub struct PopulationWorker {
  store: Arc<dyn CatalogStore>,
  service: Arc<dyn CourseService>,
  queue: PopulationQueue,
  receiver: mpsc::UnboundedReceiver<PopulateModulesRequested>,
  max_retries: u32,
  backoff_unit: Duration,
}

impl PopulationWorker {
  pub fn new(
    store: Arc<dyn CatalogStore>,
    service: Arc<dyn CourseService>,
    queue: PopulationQueue,
    receiver: mpsc::UnboundedReceiver<PopulateModulesRequested>,
    max_retries: u32,
    backoff_unit: Duration,
  ) -> Self {
    Self {
      store,
      service,
      queue,
      receiver,
      max_retries,
      backoff_unit,
    }
  }

  /// Runs for the life of the process; the worker keeps a sender for retries.
  pub async fn run(mut self) {
    info!("Population worker started.");
    while let Some(request) = self.receiver.recv().await {
      // Failures are logged inside `handle`.
      let _ = self.handle(request).await;
    }
    info!("Population worker stopped.");
  }

  /// Runs one request. Retryable failures are re-enqueued after their backoff
  /// delay until `max_retries` is reached.
  #[instrument(name = "population_request", skip(self), fields(course_id = %request.course_id, attempt = request.attempt))]
  pub async fn handle(&self, request: PopulateModulesRequested) -> Result<PopulationOutcome, PopulationError> {
    match populate_modules(self.store.as_ref(), self.service.as_ref(), &request.course_id).await {
      Ok(outcome) => Ok(outcome),
      Err(PopulationError::CourseService(last_error)) if last_error.is_retryable() => {
        if request.attempt >= self.max_retries {
          error!(error = %last_error, "Module population retries exhausted.");
          return Err(PopulationError::RetriesExhausted {
            course_id: request.course_id,
            retries: request.attempt,
            last_error,
          });
        }

        let delay_seconds = backoff_seconds(request.attempt);
        let delay = self
          .backoff_unit
          .saturating_mul(u32::try_from(delay_seconds).unwrap_or(u32::MAX));
        warn!(error = %last_error, delay_seconds, "Module population failed; retry scheduled.");

        let queue = self.queue.clone();
        let next = request.next_attempt();
        let attempt = next.attempt;
        tokio::spawn(async move {
          tokio::time::sleep(delay).await;
          queue.enqueue(next);
        });
        Ok(PopulationOutcome::RetryScheduled { attempt, delay_seconds })
      }
      Err(e) => {
        error!(error = %e, "Module population failed.");
        Err(e)
      }
    }
  }
}
