use log::{error, info};

use super::branch::AutoDeployBranch;
use crate::api::{ApiCommit, ApiTag, ContentApi};
use crate::components::VersionMap;
use crate::core::context::RunContext;
use crate::core::error::TrainResult;
use crate::project::{self, Project};
use crate::release::ReleaseMetadata;

/// Tags a packaging repository's auto-deploy branch, then mirrors the tag
/// onto dependent repositories that trigger from it.
///
/// The primary tag is the deployment anchor: a failure there aborts the
/// run. Dependent tags are best-effort; a failure is logged and the
/// remaining dependents still get their tag.
pub struct AutoDeployTagger<'a> {
  api: &'a dyn ContentApi,
  ctx: RunContext,
  branch: AutoDeployBranch,
  metadata: ReleaseMetadata,
  target: &'static Project,
  dependents: Vec<(&'static Project, &'a dyn ContentApi)>,
  release_name: &'static str,
  include_target_ref: bool,
}

impl<'a> AutoDeployTagger<'a> {
  /// Tagger for the package repository. The deployment trigger repository
  /// lives on the ops instance and needs its own client.
  pub fn omnibus(
    api: &'a dyn ContentApi,
    ops_api: &'a dyn ContentApi,
    ctx: RunContext,
    branch: AutoDeployBranch,
    metadata: ReleaseMetadata,
  ) -> Self {
    AutoDeployTagger {
      api,
      ctx,
      branch,
      metadata,
      target: &project::OMNIBUS_GITLAB,
      dependents: vec![(&project::DEPLOYER, ops_api)],
      release_name: "omnibus-gitlab",
      include_target_ref: true,
    }
  }

  /// Tagger for the container image repository.
  pub fn cng(
    api: &'a dyn ContentApi,
    ctx: RunContext,
    branch: AutoDeployBranch,
    metadata: ReleaseMetadata,
  ) -> Self {
    AutoDeployTagger {
      api,
      ctx,
      branch,
      metadata,
      target: &project::CNG_IMAGE,
      dependents: vec![(&project::HELM_GITLAB, api)],
      release_name: "cng-image",
      include_target_ref: false,
    }
  }

  fn target_path(&self) -> String {
    self.target.path_for(&self.ctx)
  }

  /// Tip commit of the auto-deploy branch on the target repository.
  pub fn target_commit(&self) -> TrainResult<ApiCommit> {
    Ok(self.api.commit(&self.target_path(), self.branch.name())?)
  }

  /// Whether the branch tip has no tag pointing at it yet. A tagged tip
  /// with an unchanged component map means there is nothing to deploy.
  pub fn tip_untagged(&self) -> TrainResult<bool> {
    let head = self.target_commit()?;
    let refs = self.api.commit_refs(&self.target_path(), &head.id)?;

    Ok(!refs.iter().any(|r| r.is_tag()))
  }

  /// Deterministic tag name for `head` and the component map: branch
  /// version, tip commit minute, then the refs that produced the build.
  pub fn tag_name(&self, head: &ApiCommit, versions: &VersionMap) -> String {
    let timestamp = head.created_at.format("%Y%m%d%H%M");
    let gitlab_ref = versions.get("VERSION").map(String::as_str).unwrap_or("unknown");

    let mut name = format!(
      "{}.{}.{}+{}",
      self.branch.major(),
      self.branch.minor(),
      timestamp,
      short_ref(gitlab_ref)
    );

    if self.include_target_ref {
      name.push('.');
      name.push_str(short_ref(&head.id));
    }

    name
  }

  fn tag_message(&self, tag_name: &str, versions: &VersionMap) -> String {
    let mut message = format!("Auto-deploy {}\n\n", tag_name);
    for (file, version) in versions {
      message.push_str(&format!("{}: {}\n", file, version));
    }

    message
  }

  /// Tag the branch tip, record it in the release metadata, and mirror the
  /// tag onto the dependents at their master.
  pub fn tag(&self, versions: &VersionMap) -> TrainResult<Option<ApiTag>> {
    let head = self.target_commit()?;
    let tag_name = self.tag_name(&head, versions);
    let message = self.tag_message(&tag_name, versions);

    self
      .metadata
      .add_release(self.release_name, tag_name.clone(), head.id.clone(), self.branch.name(), true);

    if self.ctx.dry_run {
      info!("[dry-run] would tag {} at {} as '{}'", self.target_path(), head.id, tag_name);
      return Ok(None);
    }

    info!("Tagging {} at {} as '{}'", self.target_path(), head.id, tag_name);
    let tag = self.api.create_tag(&self.target_path(), &tag_name, &head.id, &message)?;

    for (dependent, api) in &self.dependents {
      if let Err(err) = api.create_tag(&dependent.path(), &tag_name, "master", &message) {
        error!("Failed to tag dependent {} as '{}': {}", dependent.path(), tag_name, err);
      }
    }

    Ok(Some(tag))
  }
}

/// First 11 characters of a ref, the display width of an abbreviated SHA.
fn short_ref(reference: &str) -> &str {
  &reference[..reference.len().min(11)]
}
