//! Component version resolution tests against the in-process API fake

use anyhow::Result;

use crate::helpers::*;
use release_train::components::{ComponentVersions, VersionMap};
use release_train::core::context::RunContext;
use release_train::project;

const APP: &str = "gitlab-org/gitlab-ee";
const OMNIBUS: &str = "gitlab-org/omnibus-gitlab";
const SHA: &str = "a1b2c3d4e5f6a7b8c9d0";

fn seeded() -> FakeApi {
  let api = FakeApi::new();
  api.set_file(APP, SHA, "GITALY_SERVER_VERSION", "12.9.0\n");
  api.set_file(APP, SHA, "GITLAB_ELASTICSEARCH_INDEXER_VERSION", "1.5.0\n");
  api.set_file(APP, SHA, "GITLAB_PAGES_VERSION", "1.16.0\n");
  api.set_file(APP, SHA, "GITLAB_SHELL_VERSION", "11.0.0\n");
  api.set_file(APP, SHA, "GITLAB_WORKHORSE_VERSION", "8.21.0\n");
  api
}

#[test]
fn omnibus_versions_pairs_the_commit_with_component_pins() -> Result<()> {
  let api = seeded();
  let ctx = RunContext::new(false, false);
  let components = ComponentVersions::new(&api, ctx);

  let versions = components.omnibus_versions(&project::GITLAB_EE, SHA)?;

  assert_eq!(versions["VERSION"], SHA);
  assert_eq!(versions["GITALY_SERVER_VERSION"], "12.9.0");
  assert_eq!(versions["GITLAB_WORKHORSE_VERSION"], "8.21.0");
  assert_eq!(versions.len(), 6);

  Ok(())
}

#[test]
fn missing_component_file_is_an_error() {
  let api = FakeApi::new();
  let ctx = RunContext::new(false, false);
  let components = ComponentVersions::new(&api, ctx);

  assert!(components.omnibus_versions(&project::GITLAB_EE, SHA).is_err());
}

#[test]
fn cng_versions_add_the_mailroom_pin() -> Result<()> {
  let api = seeded();
  api.set_file(APP, SHA, "Gemfile.lock", "GEM\n  specs:\n    gitlab-mail_room (0.0.9)\n");

  let ctx = RunContext::new(false, false);
  let components = ComponentVersions::new(&api, ctx);

  let versions = components.cng_versions(&project::GITLAB_EE, SHA)?;
  assert_eq!(versions["MAILROOM_VERSION"], "0.0.9");

  Ok(())
}

#[test]
fn change_detection_ignores_trailing_newlines() -> Result<()> {
  let api = FakeApi::new();
  let ctx = RunContext::new(false, false);
  let components = ComponentVersions::new(&api, ctx);

  let mut versions = VersionMap::new();
  versions.insert("GITALY_SERVER_VERSION".to_string(), "12.9.0".to_string());

  api.set_file(OMNIBUS, "master", "GITALY_SERVER_VERSION", "12.9.0\n");
  assert!(!components.omnibus_version_changes("master", &versions)?);

  api.set_file(OMNIBUS, "master", "GITALY_SERVER_VERSION", "12.9.0");
  assert!(!components.omnibus_version_changes("master", &versions)?);

  api.set_file(OMNIBUS, "master", "GITALY_SERVER_VERSION", "12.8.0\n");
  assert!(components.omnibus_version_changes("master", &versions)?);

  Ok(())
}

#[test]
fn unreadable_pin_counts_as_changed() -> Result<()> {
  let api = FakeApi::new();
  let ctx = RunContext::new(false, false);
  let components = ComponentVersions::new(&api, ctx);

  let mut versions = VersionMap::new();
  versions.insert("GITALY_SERVER_VERSION".to_string(), "12.9.0".to_string());

  // file absent from the packaging repo entirely
  assert!(components.omnibus_version_changes("master", &versions)?);

  Ok(())
}
