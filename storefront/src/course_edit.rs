// storefront/src/course_edit.rs

//! Owner edits to a course and its modules.
//!
//! An edit body may carry `live`, `title`, `description` and a `modules`
//! list of `{"uuid", "title"?, "price_without_tax"?}` entries. Every value is
//! checked before anything is written, so a rejected edit changes nothing.

use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::catalog::CatalogTx;
use crate::errors::{AppError, Result, ValidationError};
use crate::models::Module;
use crate::products::availability::is_storable_amount;

const CONTENT: &str = "course descriptions or titles";
const LIVENESS: &str = "course liveness";
const PRICE: &str = "module price";

/// What an accepted edit touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CourseEdit {
  pub course_changed: bool,
  pub modules_changed: usize,
}

fn must_be(field: &str, expected: &str) -> ValidationError {
  ValidationError::FieldType {
    field: field.to_string(),
    expected: expected.to_string(),
  }
}

fn require_owner(is_owner: bool, what: &str) -> Result<(), ValidationError> {
  if is_owner {
    Ok(())
  } else {
    Err(ValidationError::EditNotPermitted(what.to_string()))
  }
}

fn non_empty_title(value: &Value) -> Result<String, ValidationError> {
  match value {
    Value::String(s) if !s.is_empty() => Ok(s.clone()),
    _ => Err(must_be("title", "a non-empty string")),
  }
}

/// Reads a price sent as decimal text. `null` takes the module off sale.
/// Prices are kept to the cent, rounding half to even.
pub fn parse_price(value: &Value) -> Result<Option<Decimal>, ValidationError> {
  let text = match value {
    Value::Null => return Ok(None),
    Value::String(s) => s.trim(),
    _ => return Err(must_be("price_without_tax", "a string")),
  };
  let invalid = || ValidationError::InvalidNumber("price_without_tax".to_string());

  let price = text
    .parse::<Decimal>()
    .or_else(|_| Decimal::from_scientific(text))
    .map_err(|_| invalid())?
    .round_dp(2);
  if price < Decimal::ZERO || !is_storable_amount(&price) {
    return Err(invalid());
  }
  Ok(Some(price))
}

/// Applies an edit to the course `course_uuid` on behalf of `editor`.
///
/// Courses that are not live are only visible to their owners; anyone else
/// gets a not-found. Each value is type-checked before the editor's
/// ownership is, matching the order the fields appear in.
#[instrument(name = "edit_course", skip(tx, body))]
pub async fn edit_course(tx: &mut dyn CatalogTx, course_uuid: &str, editor: Uuid, body: &Value) -> Result<CourseEdit> {
  let not_found = || AppError::NotFound("Not found.".to_string());
  let mut course = tx.find_course_by_uuid(course_uuid).await?.ok_or_else(not_found)?;
  let is_owner = course.owners.contains(&editor);
  if !course.live && !is_owner {
    return Err(not_found());
  }
  let fields = body.as_object().ok_or(ValidationError::InvalidPayload)?;

  let mut course_changed = false;
  if let Some(live) = fields.get("live") {
    let live = live.as_bool().ok_or_else(|| must_be("live", "a bool"))?;
    require_owner(is_owner, LIVENESS)?;
    course.live = live;
    course_changed = true;
  }
  if let Some(title) = fields.get("title") {
    let title = non_empty_title(title)?;
    require_owner(is_owner, CONTENT)?;
    course.title = title;
    course_changed = true;
  }
  if let Some(description) = fields.get("description") {
    let description = description.as_str().ok_or_else(|| must_be("description", "a string"))?;
    require_owner(is_owner, CONTENT)?;
    course.description = description.to_string();
    course_changed = true;
  }

  let mut changed_modules: Vec<Module> = Vec::new();
  if let Some(entries) = fields.get("modules") {
    let entries = entries.as_array().ok_or_else(|| must_be("modules", "a list of modules"))?;
    let mut seen: HashSet<String> = HashSet::new();
    for entry in entries {
      let entry = entry.as_object().ok_or(ValidationError::ModuleNotAnObject)?;
      let module_uuid = match entry.get("uuid") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => return Err(ValidationError::MissingKey("uuid".to_string()).into()),
      };
      if !seen.insert(module_uuid.clone()) {
        return Err(ValidationError::DuplicateModule.into());
      }
      let mut module = tx
        .find_module_by_uuid(&module_uuid)
        .await?
        .filter(|m| m.course_id == course.id)
        .ok_or_else(|| ValidationError::UnknownModule(module_uuid.clone()))?;

      let mut changed = false;
      if let Some(title) = entry.get("title") {
        let title = non_empty_title(title)?;
        require_owner(is_owner, CONTENT)?;
        module.title = title;
        changed = true;
      }
      if let Some(price) = entry.get("price_without_tax") {
        let price = parse_price(price)?;
        require_owner(is_owner, PRICE)?;
        module.price_without_tax = price;
        changed = true;
      }
      if changed {
        module.touch();
        changed_modules.push(module);
      }
    }
  }

  if course_changed {
    course.touch();
    tx.update_course(&course).await?;
  }
  for module in &changed_modules {
    tx.update_module(module).await?;
  }
  info!(
    course_uuid = %course.uuid,
    course_changed,
    modules_changed = changed_modules.len(),
    "Course edited."
  );
  Ok(CourseEdit {
    course_changed,
    modules_changed: changed_modules.len(),
  })
}
