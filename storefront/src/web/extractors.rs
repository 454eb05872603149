// storefront/src/web/extractors.rs

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_EMAIL_HEADER: &str = "X-User-Email";

/// The purchaser, as asserted by the authentication layer in front of us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
  pub id: Uuid,
  pub email: String,
}

fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
  req
    .headers()
    .get(name)
    .and_then(|v| v.to_str().ok())
    .map(str::trim)
    .filter(|v| !v.is_empty())
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = futures_util::future::Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let id = header(req, USER_ID_HEADER).and_then(|v| Uuid::parse_str(v).ok());
    let email = header(req, USER_EMAIL_HEADER);
    match (id, email) {
      (Some(id), Some(email)) => futures_util::future::ready(Ok(AuthenticatedUser {
        id,
        email: email.to_string(),
      })),
      _ => {
        warn!("Missing or invalid user identity headers.");
        futures_util::future::ready(Err(AppError::Auth(
          "Authentication credentials were not provided.".to_string(),
        )))
      }
    }
  }
}
