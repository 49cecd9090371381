//! Remote content API
//!
//! The release flow reads and writes repository content on the hosting
//! service without a local checkout: raw file reads, multi-file commits,
//! tag creation. Everything goes through the [`ContentApi`] trait so the
//! flow can run against an in-process fake in tests.

mod client;

pub use client::HttpClient;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::ApiError;

/// One file operation inside a commit payload.
#[derive(Debug, Clone, Serialize)]
pub struct FileAction {
  pub action: FileActionKind,
  pub file_path: String,
  pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileActionKind {
  Create,
  Update,
}

impl FileAction {
  pub fn update(file_path: impl Into<String>, content: impl Into<String>) -> Self {
    FileAction {
      action: FileActionKind::Update,
      file_path: file_path.into(),
      content: content.into(),
    }
  }
}

/// A commit as returned by the service.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiCommit {
  pub id: String,
  pub created_at: DateTime<Utc>,
}

/// A tag as returned by the service.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiTag {
  pub name: String,
  #[serde(default)]
  pub message: Option<String>,
}

/// A branch or tag ref containing a given commit.
#[derive(Debug, Clone, Deserialize)]
pub struct RefInfo {
  #[serde(rename = "type")]
  pub ref_type: String,
  pub name: String,
}

impl RefInfo {
  pub fn is_tag(&self) -> bool {
    self.ref_type == "tag"
  }
}

/// Repository content operations against a hosting service.
///
/// `Sync` so a single client can serve parallel component reads.
pub trait ContentApi: Sync {
  /// Raw contents of `file` in `project` at `ref`.
  fn file_contents(&self, project: &str, file: &str, reference: &str) -> Result<String, ApiError>;

  /// Create one commit on `branch` applying all `actions` atomically.
  fn create_commit(
    &self,
    project: &str,
    branch: &str,
    message: &str,
    actions: &[FileAction],
  ) -> Result<ApiCommit, ApiError>;

  /// Create a tag pointing at `ref`.
  fn create_tag(
    &self,
    project: &str,
    tag: &str,
    reference: &str,
    message: &str,
  ) -> Result<ApiTag, ApiError>;

  /// Look up a single commit by SHA or ref name.
  fn commit(&self, project: &str, reference: &str) -> Result<ApiCommit, ApiError>;

  /// Branches and tags containing `sha`.
  fn commit_refs(&self, project: &str, sha: &str) -> Result<Vec<RefInfo>, ApiError>;
}
