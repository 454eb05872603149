// storefront/src/models/instance.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A deployment of the course-content service that courses are hosted on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct BackingInstance {
  pub id: Uuid,
  pub instance_url: String,
  pub username: Option<String>,
  pub created_at: DateTime<Utc>,
}
