//! Auto-deploy tagging
//!
//! Every few hours a coordinator asks: did anything land on the
//! auto-deploy branch since the last package was cut? The builders here
//! answer that by comparing the application's component pins against the
//! packaging repository and checking whether the branch tip already
//! carries a tag. When something changed, the pins are synced in a single
//! commit and the branch tip is tagged for the deployment pipeline.

mod branch;
mod tagger;

pub use branch::AutoDeployBranch;
pub use tagger::AutoDeployTagger;

use log::info;

use crate::api::{ApiTag, ContentApi};
use crate::components::ComponentVersions;
use crate::core::context::RunContext;
use crate::core::error::TrainResult;
use crate::project;
use crate::release::ReleaseMetadata;

/// Sync component pins into the package repository and tag its auto-deploy
/// branch. Returns the created tag, or `None` when there was nothing to
/// deploy (or this is a dry run).
pub fn tag_omnibus(
  api: &dyn ContentApi,
  ops_api: &dyn ContentApi,
  ctx: RunContext,
  branch: AutoDeployBranch,
  metadata: ReleaseMetadata,
) -> TrainResult<Option<ApiTag>> {
  let components = ComponentVersions::new(api, ctx);

  let app_head = api.commit(&project::GITLAB_EE.path_for(&ctx), branch.name())?;
  let versions = components.omnibus_versions(&project::GITLAB_EE, &app_head.id)?;

  let tagger = AutoDeployTagger::omnibus(api, ops_api, ctx, branch.clone(), metadata);

  let changed = components.omnibus_version_changes(branch.name(), &versions)?;
  if changed {
    components.update_omnibus(branch.name(), &versions)?;
  }

  if changed || tagger.tip_untagged()? {
    tagger.tag(&versions)
  } else {
    info!("No changes on '{}'; nothing to tag", branch.name());
    Ok(None)
  }
}

/// Sync image build variables into the container image repository and tag
/// its auto-deploy branch.
pub fn tag_cng(
  api: &dyn ContentApi,
  ctx: RunContext,
  branch: AutoDeployBranch,
  metadata: ReleaseMetadata,
) -> TrainResult<Option<ApiTag>> {
  let components = ComponentVersions::new(api, ctx);

  let app_head = api.commit(&project::GITLAB_EE.path_for(&ctx), branch.name())?;
  let versions = components.cng_versions(&project::GITLAB_EE, &app_head.id)?;

  let tagger = AutoDeployTagger::cng(api, ctx, branch.clone(), metadata);

  let changed = components.cng_version_changes(branch.name(), &versions)?;
  if changed {
    components.update_cng(branch.name(), &versions)?;
  }

  if changed || tagger.tip_untagged()? {
    tagger.tag(&versions)
  } else {
    info!("No changes on '{}'; nothing to tag", branch.name());
    Ok(None)
  }
}
