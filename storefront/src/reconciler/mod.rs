// storefront/src/reconciler/mod.rs

//! Applies catalog change notifications from the course service.
//!
//! Each notification names an entity kind, an action and a payload. The
//! handlers here only stage changes on the unit of work they are given; the
//! caller decides whether to commit.

pub mod course;
pub mod module;
pub mod payload;

use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::catalog::CatalogTx;
use crate::errors::{Result, ValidationError};
use crate::population::PopulateModulesRequested;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
  Course,
  Module,
}

impl EntityKind {
  /// Case-insensitive. Unknown names fail with "No handler for type <name>".
  pub fn parse(raw: &Value) -> Result<Self, ValidationError> {
    let name = match raw {
      Value::String(s) => s.clone(),
      other => other.to_string(),
    };
    match name.to_lowercase().as_str() {
      "course" => Ok(EntityKind::Course),
      "module" => Ok(EntityKind::Module),
      _ => Err(ValidationError::NoHandler(name)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  Update,
  Delete,
}

impl Action {
  pub fn parse(raw: &Value) -> Result<Self, ValidationError> {
    match raw {
      Value::String(s) if s == "update" => Ok(Action::Update),
      Value::String(s) if s == "delete" => Ok(Action::Delete),
      Value::String(s) => Err(ValidationError::UnknownAction(s.clone())),
      other => Err(ValidationError::UnknownAction(other.to_string())),
    }
  }
}

type EntityHandler =
  for<'a> fn(&'a mut dyn CatalogTx, Action, &'a Value) -> BoxFuture<'a, Result<Vec<PopulateModulesRequested>>>;

fn course_handler<'a>(
  tx: &'a mut dyn CatalogTx,
  action: Action,
  payload: &'a Value,
) -> BoxFuture<'a, Result<Vec<PopulateModulesRequested>>> {
  Box::pin(async move {
    match action {
      Action::Update => course::update(tx, payload).await,
      Action::Delete => course::delete(tx, payload).await.map(|()| Vec::new()),
    }
  })
}

fn module_handler<'a>(
  tx: &'a mut dyn CatalogTx,
  action: Action,
  payload: &'a Value,
) -> BoxFuture<'a, Result<Vec<PopulateModulesRequested>>> {
  Box::pin(async move {
    match action {
      Action::Update => module::update(tx, payload).await.map(|()| Vec::new()),
      Action::Delete => module::delete(tx, payload).await.map(|()| Vec::new()),
    }
  })
}

const HANDLERS: [(EntityKind, EntityHandler); 2] = [
  (EntityKind::Course, course_handler),
  (EntityKind::Module, module_handler),
];

/// Stages one change on `tx` and returns the follow-up work it requested.
pub async fn apply(
  tx: &mut dyn CatalogTx,
  kind: EntityKind,
  action: Action,
  payload: &Value,
) -> Result<Vec<PopulateModulesRequested>> {
  let handler = HANDLERS
    .iter()
    .find(|(k, _)| *k == kind)
    .map(|(_, h)| *h)
    .ok_or_else(|| crate::errors::AppError::Internal(format!("No handler registered for {:?}", kind)))?;
  handler(tx, action, payload).await
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn entity_kind_is_case_insensitive() {
    assert_eq!(EntityKind::parse(&json!("COURSE")).unwrap(), EntityKind::Course);
    assert_eq!(EntityKind::parse(&json!("module")).unwrap(), EntityKind::Module);
    assert_eq!(
      EntityKind::parse(&json!("Bundle")).unwrap_err().to_string(),
      "No handler for type Bundle"
    );
  }

  #[test]
  fn actions_are_exact() {
    assert_eq!(Action::parse(&json!("update")).unwrap(), Action::Update);
    assert_eq!(
      Action::parse(&json!("upsert")).unwrap_err().to_string(),
      "Unknown action upsert"
    );
  }
}
