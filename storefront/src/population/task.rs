// storefront/src/population/task.rs

use std::collections::HashSet;
use thiserror::Error;
use tracing::{info, instrument};

use crate::catalog::{CatalogError, CatalogStore};
use crate::models::Module;
use crate::services::course_service::{CourseService, CourseServiceError};

#[derive(Debug, Error)]
pub enum PopulationError {
  #[error(transparent)]
  Catalog(#[from] CatalogError),

  #[error("Course service call failed: {0}")]
  CourseService(#[from] CourseServiceError),

  #[error("Gave up populating {course_id} after {retries} retries: {last_error}")]
  RetriesExhausted {
    course_id: String,
    retries: u32,
    last_error: CourseServiceError,
  },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopulationOutcome {
  /// No course carries the id any more; it was deleted in the meantime.
  CourseMissing,
  Populated { upserted: usize, removed: u64 },
  RetryScheduled { attempt: u32, delay_seconds: u64 },
}

/// Delay before retry number `retries` (zero-based): 120, 300, 600, 1020, 1560...
pub fn backoff_seconds(retries: u32) -> u64 {
  let n = u64::from(retries) + 1;
  n * n * 60 + 60
}

/// Rebuilds the modules of the course whose `edx_course_id` is `course_id`.
///
/// Chapters flagged `visible_to_staff_only` are dropped, and so is every
/// stored module whose locator is not among the visible chapters. Remaining
/// chapters are upserted by locator, keeping their position in the tree as
/// the sort order.
#[instrument(name = "populate_modules", skip(store, service))]
pub async fn populate_modules(
  store: &dyn CatalogStore,
  service: &dyn CourseService,
  course_id: &str,
) -> Result<PopulationOutcome, PopulationError> {
  let instance = {
    let mut tx = store.begin().await?;
    let Some(course) = tx.find_course_by_edx_id(course_id).await? else {
      info!("Course no longer exists; nothing to populate.");
      return Ok(PopulationOutcome::CourseMissing);
    };
    tx.find_instance(course.instance_id)
      .await?
      .ok_or_else(|| CatalogError::Integrity(format!("course {} has no instance", course.uuid)))?
  };

  let tree = service.fetch_course_blocks(&instance, course_id).await?;
  let chapters = tree.chapters()?;
  let visible: HashSet<&str> = chapters
    .iter()
    .filter(|c| !c.visible_to_staff_only.unwrap_or(false))
    .map(|c| c.id.as_str())
    .collect();

  let mut tx = store.begin().await?;
  let Some(course) = tx.find_course_by_edx_id(course_id).await? else {
    info!("Course deleted while fetching blocks.");
    return Ok(PopulationOutcome::CourseMissing);
  };

  // Deletes go first so positions are never held twice.
  let mut removed = 0;
  for module in tx.list_modules_for_course(course.id).await? {
    let keep = module.locator_id.as_deref().is_some_and(|l| visible.contains(l));
    if !keep {
      removed += tx.delete_module(module.id).await?;
    }
  }

  let mut upserted = 0;
  for (position, chapter) in chapters.iter().enumerate() {
    if !visible.contains(chapter.id.as_str()) {
      continue;
    }
    let subchapters = tree.child_titles(chapter)?;
    let order = i32::try_from(position).unwrap_or(i32::MAX);
    match tx.find_module_by_locator(course.id, &chapter.id).await? {
      Some(mut module) => {
        module.title = chapter.display_name.clone();
        module.order = order;
        module.subchapters = subchapters;
        module.touch();
        tx.update_module(&module).await?;
      }
      None => {
        let mut module = Module::new(chapter.id.clone(), course.id, chapter.display_name.clone(), order);
        module.locator_id = Some(chapter.id.clone());
        module.subchapters = subchapters;
        tx.insert_module(&module).await?;
      }
    }
    upserted += 1;
  }

  tx.commit().await?;
  info!(upserted, removed, "Modules populated.");
  Ok(PopulationOutcome::Populated { upserted, removed })
}
