// storefront/src/reconciler/module.rs

use serde_json::Value;
use tracing::{info, instrument};

use super::payload;
use crate::catalog::CatalogTx;
use crate::errors::{Result, ValidationError};
use crate::models::Module;

fn invalid_parent() -> ValidationError {
  ValidationError::InvalidParentReference("Invalid course_external_pk".to_string())
}

/// Creates or renames a module. Modules never move between courses, and new
/// ones start without a price.
#[instrument(name = "reconcile_module_update", skip_all)]
pub async fn update(tx: &mut dyn CatalogTx, payload: &Value) -> Result<()> {
  let fields = payload::as_object(payload)?;
  payload::require_keys(fields, &["title", "external_pk", "course_external_pk"])?;

  let external_pk = payload::identifier(fields, "external_pk")?;
  if external_pk.is_empty() {
    return Err(ValidationError::InvalidExternalId.into());
  }
  let title = payload::string(fields, "title")?;
  let course_external_pk = payload::identifier(fields, "course_external_pk")?;
  let locator_id = payload::optional_string(fields, "locator_id")?;

  let course = tx
    .find_course_by_uuid(&course_external_pk)
    .await?
    .ok_or_else(invalid_parent)?;

  match tx.find_module_by_uuid(&external_pk).await? {
    Some(mut module) => {
      if module.course_id != course.id {
        return Err(invalid_parent().into());
      }
      module.title = title;
      if fields.contains_key("locator_id") {
        module.locator_id = locator_id;
      }
      module.touch();
      tx.update_module(&module).await?;
      info!(module_uuid = %module.uuid, "Module updated.");
    }
    None => {
      let position = tx
        .list_modules_for_course(course.id)
        .await?
        .iter()
        .map(|m| m.order.saturating_add(1))
        .max()
        .unwrap_or(0);
      let mut module = Module::new(external_pk, course.id, title, position);
      module.locator_id = locator_id;
      tx.insert_module(&module).await?;
      info!(module_uuid = %module.uuid, course_uuid = %course.uuid, "Module created.");
    }
  }
  Ok(())
}

/// Removes the module if it exists.
#[instrument(name = "reconcile_module_delete", skip_all)]
pub async fn delete(tx: &mut dyn CatalogTx, payload: &Value) -> Result<()> {
  let fields = payload::as_object(payload)?;
  let external_pk = payload::identifier(fields, "external_pk")?;
  let removed = tx.delete_module_by_uuid(&external_pk).await?;
  info!(module_uuid = %external_pk, removed, "Module delete applied.");
  Ok(())
}
