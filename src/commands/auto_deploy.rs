use std::env;

use crate::api::HttpClient;
use crate::auto_deploy::{self, AutoDeployBranch};
use crate::core::config::TrainConfig;
use crate::core::context::RunContext;
use crate::core::error::{TrainResult, ResultExt};
use crate::release::ReleaseMetadata;

/// Run the auto-deploy command: sync component pins and tag the branch on
/// the package and image repositories.
pub fn run_auto_deploy(branch: String, ctx: RunContext) -> TrainResult<()> {
  let branch = AutoDeployBranch::parse(&branch)?;

  let root = env::current_dir().context("Failed to get current directory")?;
  let config = TrainConfig::load(&root)?;

  let api = HttpClient::for_context(&config, &ctx)?;
  let ops_api = HttpClient::for_ops(&config)?;

  let metadata = ReleaseMetadata::new();

  match auto_deploy::tag_omnibus(&api, &ops_api, ctx, branch.clone(), metadata.clone())? {
    Some(tag) => println!("✅ Tagged omnibus-gitlab as '{}'", tag.name),
    None => println!("⚠️ No package tag created for '{}'", branch.name()),
  }

  match auto_deploy::tag_cng(&api, ctx, branch.clone(), metadata.clone())? {
    Some(tag) => println!("✅ Tagged CNG images as '{}'", tag.name),
    None => println!("⚠️ No image tag created for '{}'", branch.name()),
  }

  let releases = metadata.releases();
  if !releases.is_empty() {
    println!("{}", metadata.to_json()?);
  }

  Ok(())
}
