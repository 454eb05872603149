// storefront/src/population/mod.rs

//! Pulls a course's chapter list from its edX instance and mirrors it as
//! modules. Requests arrive on a queue; failures worth retrying are put back
//! on the queue after a growing delay.

pub mod task;
pub mod worker;

pub use task::{backoff_seconds, populate_modules, PopulationError, PopulationOutcome};
pub use worker::{PopulationQueue, PopulationWorker};

/// Ask for a course's modules to be (re)built from its block tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulateModulesRequested {
  /// The course's `edx_course_id`.
  pub course_id: String,
  /// Zero for the first try.
  pub attempt: u32,
}

impl PopulateModulesRequested {
  pub fn new(course_id: String) -> Self {
    Self { course_id, attempt: 0 }
  }

  pub fn next_attempt(&self) -> Self {
    Self {
      course_id: self.course_id.clone(),
      attempt: self.attempt + 1,
    }
  }
}
