// storefront/src/models/course.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Course {
  pub id: Uuid,
  /// External identity assigned by the course service; unique.
  pub uuid: String,
  pub title: String,
  pub description: String,
  /// New courses start hidden until an owner publishes them.
  pub live: bool,
  pub author_name: Option<String>,
  pub overview: Option<String>,
  pub image_url: Option<String>,
  pub course_id: Option<String>,
  pub edx_course_id: Option<String>,
  pub instructors: Vec<String>,
  /// Users allowed to edit the course, its liveness and its module prices.
  pub owners: Vec<Uuid>,
  pub instance_id: Uuid,
  pub created_at: DateTime<Utc>,
  pub modified_at: DateTime<Utc>,
}

/// The fields a course webhook may overwrite.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CourseFields {
  pub title: String,
  pub description: String,
  pub author_name: Option<String>,
  pub overview: Option<String>,
  pub image_url: Option<String>,
  pub course_id: Option<String>,
  pub edx_course_id: Option<String>,
  pub instructors: Vec<String>,
}

impl Course {
  pub fn new(uuid: String, instance_id: Uuid, fields: CourseFields) -> Self {
    let now = Utc::now();
    let mut course = Self {
      id: Uuid::new_v4(),
      uuid,
      title: String::new(),
      description: String::new(),
      live: false,
      author_name: None,
      overview: None,
      image_url: None,
      course_id: None,
      edx_course_id: None,
      instructors: Vec::new(),
      owners: Vec::new(),
      instance_id,
      created_at: now,
      modified_at: now,
    };
    course.apply(fields);
    course.modified_at = now;
    course
  }

  pub fn apply(&mut self, fields: CourseFields) {
    self.title = fields.title;
    self.description = fields.description;
    self.author_name = fields.author_name;
    self.overview = fields.overview;
    self.image_url = fields.image_url;
    self.course_id = fields.course_id;
    self.edx_course_id = fields.edx_course_id;
    self.instructors = fields.instructors;
    self.modified_at = Utc::now();
  }

  pub fn touch(&mut self) {
    self.modified_at = Utc::now();
  }
}
