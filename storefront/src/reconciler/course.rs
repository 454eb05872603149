// storefront/src/reconciler/course.rs

use serde_json::Value;
use tracing::{info, instrument};

use super::payload;
use crate::catalog::CatalogTx;
use crate::errors::{Result, ValidationError};
use crate::models::course::CourseFields;
use crate::models::Course;
use crate::population::PopulateModulesRequested;

const REQUIRED_KEYS: [&str; 9] = [
  "title",
  "external_pk",
  "instance",
  "course_id",
  "author_name",
  "overview",
  "description",
  "image_url",
  "instructors",
];

/// Creates or overwrites a course. A course found under another instance is
/// rejected. Returns the module population requests to send once committed.
#[instrument(name = "reconcile_course_update", skip_all)]
pub async fn update(tx: &mut dyn CatalogTx, payload: &Value) -> Result<Vec<PopulateModulesRequested>> {
  let fields = payload::as_object(payload)?;
  payload::require_keys(fields, &REQUIRED_KEYS)?;

  let external_pk = payload::identifier(fields, "external_pk")?;
  if external_pk.is_empty() {
    return Err(ValidationError::InvalidExternalId.into());
  }
  let instance_url = match fields.get("instance") {
    Some(Value::String(url)) if !url.is_empty() => url.clone(),
    _ => return Err(ValidationError::InvalidInstance.into()),
  };

  let values = CourseFields {
    title: payload::string(fields, "title")?,
    description: payload::nullable_string(fields, "description")?.unwrap_or_default(),
    author_name: payload::nullable_string(fields, "author_name")?,
    overview: payload::nullable_string(fields, "overview")?,
    image_url: payload::nullable_string(fields, "image_url")?,
    course_id: payload::nullable_string(fields, "course_id")?,
    edx_course_id: payload::optional_string(fields, "edx_course_id")?,
    instructors: payload::string_list(fields, "instructors")?,
  };
  let edx_course_id = values.edx_course_id.clone().filter(|id| !id.is_empty());

  match tx.find_course_by_uuid(&external_pk).await? {
    Some(mut course) => {
      let current_url = tx.find_instance(course.instance_id).await?.map(|i| i.instance_url);
      if current_url.as_deref() != Some(instance_url.as_str()) {
        return Err(ValidationError::ImmutableField("Instance cannot be changed".to_string()).into());
      }
      course.apply(values);
      tx.update_course(&course).await?;
      info!(course_uuid = %course.uuid, "Course updated.");
    }
    None => {
      let instance = tx.get_or_create_instance(&instance_url).await?;
      let course = Course::new(external_pk, instance.id, values);
      tx.insert_course(&course).await?;
      info!(course_uuid = %course.uuid, "Course created.");
    }
  }

  Ok(edx_course_id.map(PopulateModulesRequested::new).into_iter().collect())
}

/// Removes the course and its modules. Unknown courses are ignored.
#[instrument(name = "reconcile_course_delete", skip_all)]
pub async fn delete(tx: &mut dyn CatalogTx, payload: &Value) -> Result<()> {
  let fields = payload::as_object(payload)?;
  let external_pk = payload::identifier(fields, "external_pk")?;
  let removed = tx.delete_course_by_uuid(&external_pk).await?;
  info!(course_uuid = %external_pk, removed, "Course delete applied.");
  Ok(())
}
