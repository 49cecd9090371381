use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::core::error::TrainResult;

/// One released artifact: what was tagged, from which ref, at which SHA.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReleaseEntry {
  pub name: String,
  pub version: String,
  pub sha: String,
  #[serde(rename = "ref")]
  pub reference: String,
  pub tag: bool,
}

/// Shared recorder for everything a run releases.
///
/// Cloning yields a handle onto the same underlying list, so taggers
/// running on worker threads all append to one record.
#[derive(Debug, Clone, Default)]
pub struct ReleaseMetadata {
  entries: Arc<Mutex<Vec<ReleaseEntry>>>,
}

impl ReleaseMetadata {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_release(
    &self,
    name: impl Into<String>,
    version: impl Into<String>,
    sha: impl Into<String>,
    reference: impl Into<String>,
    tag: bool,
  ) {
    let entry = ReleaseEntry {
      name: name.into(),
      version: version.into(),
      sha: sha.into(),
      reference: reference.into(),
      tag,
    };

    self.entries.lock().unwrap().push(entry);
  }

  /// Snapshot of the recorded releases.
  pub fn releases(&self) -> Vec<ReleaseEntry> {
    self.entries.lock().unwrap().clone()
  }

  pub fn to_json(&self) -> TrainResult<String> {
    Ok(serde_json::to_string_pretty(&self.releases())?)
  }
}
