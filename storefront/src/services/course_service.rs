// storefront/src/services/course_service.rs

//! Calls into the course service: CCX creation through CCXCon and block-tree
//! reads from the backing edX instance.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::models::BackingInstance;

const CCXCON_TOKEN_PATH: &str = "/o/token/";
const CCXCON_CREATE_CCX_PATH: &str = "/api/v1/ccx/";
const INSTANCE_TOKEN_PATH: &str = "/oauth2/access_token";
const BLOCKS_PATH: &str = "/api/courses/v1/blocks/";
const REQUESTED_BLOCK_FIELDS: &str = "children,display_name,id,type,visible_to_staff_only";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CourseServiceError {
  /// The request never produced a response.
  #[error("Transport error: {0}")]
  Transport(String),

  #[error("Unable to obtain access token: {0}")]
  Token(String),

  #[error("Unexpected status {status}: {body}")]
  Status { status: u16, body: String },

  #[error("Malformed response: {0}")]
  Malformed(String),
}

impl CourseServiceError {
  /// Non-2xx answers and unreadable bodies are worth another try later.
  pub fn is_retryable(&self) -> bool {
    matches!(self, CourseServiceError::Status { .. } | CourseServiceError::Malformed(_))
  }
}

/// Body of the CCX creation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateCcxRequest {
  pub master_course_id: String,
  pub user_email: String,
  pub total_seats: i32,
  pub display_name: String,
  pub course_modules: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Block {
  pub id: String,
  #[serde(default)]
  pub display_name: String,
  #[serde(rename = "type", default)]
  pub block_type: String,
  #[serde(default)]
  pub children: Vec<String>,
  #[serde(default)]
  pub visible_to_staff_only: Option<bool>,
}

/// A course's blocks keyed by id, plus the id of the course root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTree {
  pub root: String,
  pub blocks: HashMap<String, Block>,
}

impl BlockTree {
  /// Accepts the blocks API body: `{"root": "...", "blocks": {...}}`.
  pub fn from_json(body: &Value) -> Result<Self, CourseServiceError> {
    let root = body
      .get("root")
      .and_then(Value::as_str)
      .ok_or_else(|| CourseServiceError::Malformed("missing root".to_string()))?
      .to_string();
    let blocks_value = body
      .get("blocks")
      .cloned()
      .ok_or_else(|| CourseServiceError::Malformed("missing blocks".to_string()))?;
    let blocks: HashMap<String, Block> =
      serde_json::from_value(blocks_value).map_err(|e| CourseServiceError::Malformed(e.to_string()))?;
    if !blocks.contains_key(&root) {
      return Err(CourseServiceError::Malformed(format!("root block {} not found", root)));
    }
    Ok(Self { root, blocks })
  }

  /// The root's direct children, in order.
  pub fn chapters(&self) -> Result<Vec<&Block>, CourseServiceError> {
    let root = self.block(&self.root)?;
    root.children.iter().map(|id| self.block(id)).collect()
  }

  /// Display names of a block's direct children.
  pub fn child_titles(&self, block: &Block) -> Result<Vec<String>, CourseServiceError> {
    block
      .children
      .iter()
      .map(|id| self.block(id).map(|b| b.display_name.clone()))
      .collect()
  }

  fn block(&self, id: &str) -> Result<&Block, CourseServiceError> {
    self
      .blocks
      .get(id)
      .ok_or_else(|| CourseServiceError::Malformed(format!("block {} not found", id)))
  }
}

#[async_trait]
pub trait CourseService: Send + Sync {
  /// Success is a 201 from CCXCon; anything else is an error.
  async fn create_ccx(&self, request: &CreateCcxRequest) -> Result<(), CourseServiceError>;

  async fn fetch_course_blocks(
    &self,
    instance: &BackingInstance,
    course_id: &str,
  ) -> Result<BlockTree, CourseServiceError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
  access_token: String,
}

#[derive(Debug, Clone)]
pub struct CcxconClient {
  http: reqwest::Client,
  ccxcon_api: String,
  client_id: String,
  client_secret: String,
}

fn join(base: &str, path: &str) -> Result<Url, CourseServiceError> {
  Url::parse(base)
    .and_then(|u| u.join(path))
    .map_err(|e| CourseServiceError::Transport(format!("invalid url {}: {}", base, e)))
}

fn transport(err: reqwest::Error) -> CourseServiceError {
  CourseServiceError::Transport(err.to_string())
}

impl CcxconClient {
  pub fn new(
    http: reqwest::Client,
    ccxcon_api: impl Into<String>,
    client_id: impl Into<String>,
    client_secret: impl Into<String>,
  ) -> Self {
    Self {
      http,
      ccxcon_api: ccxcon_api.into(),
      client_id: client_id.into(),
      client_secret: client_secret.into(),
    }
  }

  /// OAuth2 client-credentials grant.
  async fn fetch_token(&self, token_url: Url) -> Result<String, CourseServiceError> {
    let form = [
      ("grant_type", "client_credentials"),
      ("client_id", self.client_id.as_str()),
      ("client_secret", self.client_secret.as_str()),
    ];
    let resp = self.http.post(token_url).form(&form).send().await.map_err(transport)?;
    let status = resp.status();
    if !status.is_success() {
      return Err(CourseServiceError::Token(format!("HTTP {}", status.as_u16())));
    }
    let token: TokenResponse = resp
      .json()
      .await
      .map_err(|e| CourseServiceError::Token(e.to_string()))?;
    Ok(token.access_token)
  }
}

#[async_trait]
impl CourseService for CcxconClient {
  #[instrument(name = "ccxcon_create_ccx", skip(self, request), fields(master_course_id = %request.master_course_id))]
  async fn create_ccx(&self, request: &CreateCcxRequest) -> Result<(), CourseServiceError> {
    let token = self.fetch_token(join(&self.ccxcon_api, CCXCON_TOKEN_PATH)?).await?;
    let resp = self
      .http
      .post(join(&self.ccxcon_api, CCXCON_CREATE_CCX_PATH)?)
      .bearer_auth(token)
      .json(request)
      .send()
      .await
      .map_err(transport)?;

    let status = resp.status();
    if status == StatusCode::CREATED {
      debug!("CCX created.");
      return Ok(());
    }
    let body = resp.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), "CCX creation rejected.");
    Err(CourseServiceError::Status {
      status: status.as_u16(),
      body,
    })
  }

  #[instrument(name = "edx_fetch_blocks", skip(self, instance), fields(instance_url = %instance.instance_url))]
  async fn fetch_course_blocks(
    &self,
    instance: &BackingInstance,
    course_id: &str,
  ) -> Result<BlockTree, CourseServiceError> {
    let token = self
      .fetch_token(join(&instance.instance_url, INSTANCE_TOKEN_PATH)?)
      .await?;
    let username = instance.username.clone().unwrap_or_default();
    let resp = self
      .http
      .get(join(&instance.instance_url, BLOCKS_PATH)?)
      .query(&[
        ("depth", "all"),
        ("username", username.as_str()),
        ("course_id", course_id),
        ("requested_fields", REQUESTED_BLOCK_FIELDS),
      ])
      .bearer_auth(token)
      .send()
      .await
      .map_err(transport)?;

    let status = resp.status();
    if status.as_u16() >= 300 {
      let body = resp.text().await.unwrap_or_default();
      return Err(CourseServiceError::Status {
        status: status.as_u16(),
        body,
      });
    }
    let body: Value = resp
      .json()
      .await
      .map_err(|e| CourseServiceError::Malformed(e.to_string()))?;
    BlockTree::from_json(&body)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn sample() -> Value {
    json!({
      "root": "course",
      "blocks": {
        "course": {"id": "course", "type": "course", "display_name": "C", "children": ["ch1", "ch2"]},
        "ch1": {"id": "ch1", "type": "chapter", "display_name": "One", "children": ["s1"]},
        "ch2": {"id": "ch2", "type": "chapter", "display_name": "Two", "visible_to_staff_only": true},
        "s1": {"id": "s1", "type": "sequential", "display_name": "Sub"}
      }
    })
  }

  #[test]
  fn reads_chapters_and_child_titles() {
    let tree = BlockTree::from_json(&sample()).unwrap();
    let chapters = tree.chapters().unwrap();
    assert_eq!(chapters.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(), ["ch1", "ch2"]);
    assert_eq!(chapters[1].visible_to_staff_only, Some(true));
    assert_eq!(tree.child_titles(chapters[0]).unwrap(), vec!["Sub".to_string()]);
  }

  #[test]
  fn missing_keys_are_malformed_and_retryable() {
    let err = BlockTree::from_json(&json!({"blocks": {}})).unwrap_err();
    assert!(matches!(err, CourseServiceError::Malformed(_)));
    assert!(err.is_retryable());
    assert!(!CourseServiceError::Transport("reset".into()).is_retryable());
  }

  #[test]
  fn paths_replace_the_base_path() {
    let url = join("https://ccxcon.example.org/some/prefix/", CCXCON_CREATE_CCX_PATH).unwrap();
    assert_eq!(url.as_str(), "https://ccxcon.example.org/api/v1/ccx/");
  }
}
