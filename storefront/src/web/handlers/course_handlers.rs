// storefront/src/web/handlers/course_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::course_edit::edit_course;
use crate::errors::{AppError, ValidationError};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

/// Body: any of `live`, `title`, `description`, and
/// `modules: [{"uuid", "title", "price_without_tax"}]`.
#[instrument(
  name = "handler::edit_course",
  skip(app_state, editor, path, body),
  fields(course_uuid = %path.as_ref(), user_id = %editor.id)
)]
pub async fn edit_course_handler(
  app_state: web::Data<AppState>,
  editor: AuthenticatedUser,
  path: web::Path<String>,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let body: Value = serde_json::from_slice(&body).map_err(|_| ValidationError::InvalidPayload)?;
  let course_uuid = path.into_inner();

  let mut tx = app_state.catalog.begin().await?;
  let edit = edit_course(tx.as_mut(), &course_uuid, editor.id, &body).await?;
  tx.commit().await?;
  debug!(?edit, "Course edit committed.");
  Ok(HttpResponse::Ok().finish())
}
