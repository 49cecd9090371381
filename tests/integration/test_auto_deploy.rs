//! Auto-deploy tagging tests against the in-process API fake

use anyhow::Result;

use crate::helpers::*;
use release_train::api::{ContentApi, RefInfo};
use release_train::auto_deploy::{self, AutoDeployBranch, AutoDeployTagger};
use release_train::components::VersionMap;
use release_train::core::context::RunContext;
use release_train::release::ReleaseMetadata;

const BRANCH: &str = "12-9-auto-deploy-20200226";
const APP: &str = "gitlab-org/gitlab-ee";
const OMNIBUS: &str = "gitlab-org/omnibus-gitlab";
const CNG: &str = "gitlab-org/build/CNG";
const DEPLOYER: &str = "gitlab-com/gl-infra/deployer";
const HELM: &str = "gitlab-org/charts/gitlab";

const APP_SHA: &str = "a1b2c3d4e5f6a7b8c9d0";
const OMNIBUS_SHA: &str = "0123456789abcdef0123";

const COMPONENT_FILES: &[(&str, &str)] = &[
  ("GITALY_SERVER_VERSION", "12.9.0"),
  ("GITLAB_ELASTICSEARCH_INDEXER_VERSION", "1.5.0"),
  ("GITLAB_PAGES_VERSION", "1.16.0"),
  ("GITLAB_SHELL_VERSION", "11.0.0"),
  ("GITLAB_WORKHORSE_VERSION", "8.21.0"),
];

fn branch() -> AutoDeployBranch {
  AutoDeployBranch::parse(BRANCH).unwrap()
}

/// Fake with the application's pins at `APP_SHA` and its branch tip set.
fn seeded_app() -> FakeApi {
  let api = FakeApi::new();
  api.set_commit(APP, BRANCH, APP_SHA, fixed_time(9, 0));

  for (file, version) in COMPONENT_FILES {
    api.set_file(APP, APP_SHA, file, &format!("{}\n", version));
  }

  api
}

/// Write the current component map into the packaging repo so nothing has
/// drifted.
fn sync_omnibus_pins(api: &FakeApi) {
  api.set_file(OMNIBUS, BRANCH, "VERSION", &format!("{}\n", APP_SHA));
  for (file, version) in COMPONENT_FILES {
    api.set_file(OMNIBUS, BRANCH, file, &format!("{}\n", version));
  }
}

fn component_map() -> VersionMap {
  let mut versions = VersionMap::new();
  versions.insert("VERSION".to_string(), APP_SHA.to_string());
  for (file, version) in COMPONENT_FILES {
    versions.insert((*file).to_string(), (*version).to_string());
  }
  versions
}

#[test]
fn tag_name_is_deterministic_and_minute_sensitive() {
  let api = FakeApi::new();
  let ops = FakeApi::new();
  let ctx = RunContext::new(false, false);
  let tagger = AutoDeployTagger::omnibus(&api, &ops, ctx, branch(), ReleaseMetadata::new());

  let versions = component_map();

  api.set_commit(OMNIBUS, BRANCH, OMNIBUS_SHA, fixed_time(10, 42));
  let head = api.commit(OMNIBUS, BRANCH).unwrap();
  let name = tagger.tag_name(&head, &versions);
  assert_eq!(name, "12.9.202602261042+a1b2c3d4e5f.0123456789a");
  assert_eq!(name, tagger.tag_name(&head, &versions));

  api.set_commit(OMNIBUS, BRANCH, OMNIBUS_SHA, fixed_time(10, 43));
  let later = api.commit(OMNIBUS, BRANCH).unwrap();
  assert_ne!(tagger.tag_name(&later, &versions), name);
}

#[test]
fn drifted_pins_are_synced_and_tagged() -> Result<()> {
  let api = seeded_app();
  let ops = FakeApi::new();
  let ctx = RunContext::new(false, false);
  let metadata = ReleaseMetadata::new();

  // stale gitaly pin in the packaging repo
  sync_omnibus_pins(&api);
  api.set_file(OMNIBUS, BRANCH, "GITALY_SERVER_VERSION", "12.8.0\n");
  api.set_commit(OMNIBUS, BRANCH, OMNIBUS_SHA, fixed_time(10, 42));

  let tag = auto_deploy::tag_omnibus(&api, &ops, ctx, branch(), metadata.clone())?.unwrap();
  assert_eq!(tag.name, "12.9.202602261042+a1b2c3d4e5f.0123456789a");

  // the pin was updated in one commit alongside the others
  assert_eq!(api.file(OMNIBUS, BRANCH, "GITALY_SERVER_VERSION").as_deref(), Some("12.9.0\n"));
  assert_eq!(api.created_commits(), vec![(OMNIBUS.to_string(), "Update component versions".to_string())]);

  // primary tag on the branch tip, mirror tag on the trigger repo's master
  let tags = api.created_tags();
  assert_eq!(tags, vec![(OMNIBUS.to_string(), tag.name.clone(), OMNIBUS_SHA.to_string())]);
  let ops_tags = ops.created_tags();
  assert_eq!(ops_tags, vec![(DEPLOYER.to_string(), tag.name.clone(), "master".to_string())]);

  let releases = metadata.releases();
  assert_eq!(releases.len(), 1);
  assert_eq!(releases[0].name, "omnibus-gitlab");
  assert_eq!(releases[0].version, tag.name);
  assert_eq!(releases[0].sha, OMNIBUS_SHA);

  Ok(())
}

#[test]
fn unchanged_pins_with_tagged_tip_do_nothing() -> Result<()> {
  let api = seeded_app();
  let ops = FakeApi::new();
  let ctx = RunContext::new(false, false);

  sync_omnibus_pins(&api);
  api.set_commit(OMNIBUS, BRANCH, OMNIBUS_SHA, fixed_time(10, 42));
  api.set_refs(
    OMNIBUS,
    OMNIBUS_SHA,
    vec![
      RefInfo { ref_type: "branch".to_string(), name: BRANCH.to_string() },
      RefInfo { ref_type: "tag".to_string(), name: "12.9.202602260800+aaa.bbb".to_string() },
    ],
  );

  let tag = auto_deploy::tag_omnibus(&api, &ops, ctx, branch(), ReleaseMetadata::new())?;

  assert!(tag.is_none());
  assert!(api.created_tags().is_empty());
  assert!(api.created_commits().is_empty());

  Ok(())
}

#[test]
fn untagged_tip_is_tagged_even_without_pin_changes() -> Result<()> {
  let api = seeded_app();
  let ops = FakeApi::new();
  let ctx = RunContext::new(false, false);

  sync_omnibus_pins(&api);
  api.set_commit(OMNIBUS, BRANCH, OMNIBUS_SHA, fixed_time(10, 42));
  api.set_refs(
    OMNIBUS,
    OMNIBUS_SHA,
    vec![RefInfo { ref_type: "branch".to_string(), name: BRANCH.to_string() }],
  );

  let tag = auto_deploy::tag_omnibus(&api, &ops, ctx, branch(), ReleaseMetadata::new())?;

  assert!(tag.is_some());
  assert!(api.created_commits().is_empty());
  assert_eq!(api.created_tags().len(), 1);

  Ok(())
}

#[test]
fn dependent_tag_failure_does_not_fail_the_run() -> Result<()> {
  let api = seeded_app();
  let ops = FakeApi::new();
  let ctx = RunContext::new(false, false);

  sync_omnibus_pins(&api);
  api.set_file(OMNIBUS, BRANCH, "GITALY_SERVER_VERSION", "12.8.0\n");
  api.set_commit(OMNIBUS, BRANCH, OMNIBUS_SHA, fixed_time(10, 42));
  ops.fail_tags_for(DEPLOYER);

  let tag = auto_deploy::tag_omnibus(&api, &ops, ctx, branch(), ReleaseMetadata::new())?;

  assert!(tag.is_some());
  assert_eq!(api.created_tags().len(), 1);
  assert!(ops.created_tags().is_empty());

  Ok(())
}

#[test]
fn primary_tag_failure_propagates() {
  let api = seeded_app();
  let ops = FakeApi::new();
  let ctx = RunContext::new(false, false);

  sync_omnibus_pins(&api);
  api.set_file(OMNIBUS, BRANCH, "GITALY_SERVER_VERSION", "12.8.0\n");
  api.set_commit(OMNIBUS, BRANCH, OMNIBUS_SHA, fixed_time(10, 42));
  api.fail_tags_for(OMNIBUS);

  let result = auto_deploy::tag_omnibus(&api, &ops, ctx, branch(), ReleaseMetadata::new());

  assert!(result.is_err());
  assert!(ops.created_tags().is_empty());
}

#[test]
fn failed_pin_sync_leaves_no_partial_state() {
  let api = seeded_app();
  let ops = FakeApi::new();
  let ctx = RunContext::new(false, false);

  sync_omnibus_pins(&api);
  api.set_file(OMNIBUS, BRANCH, "GITALY_SERVER_VERSION", "12.8.0\n");
  api.set_commit(OMNIBUS, BRANCH, OMNIBUS_SHA, fixed_time(10, 42));
  api.fail_create_commit();

  let result = auto_deploy::tag_omnibus(&api, &ops, ctx, branch(), ReleaseMetadata::new());

  assert!(result.is_err());
  assert_eq!(api.file(OMNIBUS, BRANCH, "GITALY_SERVER_VERSION").as_deref(), Some("12.8.0\n"));
  assert!(api.created_tags().is_empty());
}

#[test]
fn dry_run_records_intent_without_writing() -> Result<()> {
  let api = seeded_app();
  let ops = FakeApi::new();
  let ctx = RunContext::new(false, true);
  let metadata = ReleaseMetadata::new();

  sync_omnibus_pins(&api);
  api.set_file(OMNIBUS, BRANCH, "GITALY_SERVER_VERSION", "12.8.0\n");
  api.set_commit(OMNIBUS, BRANCH, OMNIBUS_SHA, fixed_time(10, 42));

  let tag = auto_deploy::tag_omnibus(&api, &ops, ctx, branch(), metadata.clone())?;

  assert!(tag.is_none());
  assert!(api.created_tags().is_empty());
  assert!(api.created_commits().is_empty());
  assert_eq!(api.file(OMNIBUS, BRANCH, "GITALY_SERVER_VERSION").as_deref(), Some("12.8.0\n"));

  // the run still records what it would have tagged
  assert_eq!(metadata.releases().len(), 1);

  Ok(())
}

#[test]
fn cng_tagging_translates_variables_and_mirrors_to_charts() -> Result<()> {
  let api = seeded_app();
  let ctx = RunContext::new(false, false);

  api.set_file(
    APP,
    APP_SHA,
    "Gemfile.lock",
    "GEM\n  specs:\n    gitlab-mail_room (0.0.9)\n",
  );
  api.set_commit(CNG, BRANCH, OMNIBUS_SHA, fixed_time(10, 42));

  let tag = auto_deploy::tag_cng(&api, ctx, branch(), ReleaseMetadata::new())?.unwrap();

  // image tags carry only the application ref, not their own tip
  assert_eq!(tag.name, "12.9.202602261042+a1b2c3d4e5f");

  let app_pin = format!("{}\n", APP_SHA);
  assert_eq!(api.file(CNG, BRANCH, "variables/GITLAB_VERSION").as_deref(), Some(app_pin.as_str()));
  assert_eq!(api.file(CNG, BRANCH, "variables/GITALY_VERSION").as_deref(), Some("v12.9.0\n"));
  assert_eq!(api.file(CNG, BRANCH, "variables/MAILROOM_VERSION").as_deref(), Some("v0.0.9\n"));

  let tags = api.created_tags();
  assert!(tags.contains(&(CNG.to_string(), tag.name.clone(), OMNIBUS_SHA.to_string())));
  assert!(tags.contains(&(HELM.to_string(), tag.name.clone(), "master".to_string())));

  Ok(())
}
