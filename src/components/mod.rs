//! Component version resolution
//!
//! The main application pins the versions of its satellite components in
//! single-line files (`GITALY_SERVER_VERSION` and friends) and an exact gem
//! pin in `Gemfile.lock`. The packaging repos carry their own copies of
//! those pins; this module reads the application's pins at a commit and
//! propagates them.

use std::collections::BTreeMap;

use log::{info, trace, warn};
use rayon::prelude::*;
use semver::Version as SemverVersion;

use crate::api::{ApiCommit, ContentApi, FileAction};
use crate::core::context::RunContext;
use crate::core::error::{ApiError, TrainResult, VersionError};
use crate::project::{self, Project};
use crate::ui::progress::ComponentProgress;

/// Single-line version files read from the application repository, one per
/// pinned component project.
pub fn version_files() -> Vec<&'static str> {
  project::COMPONENTS.iter().filter_map(|p| p.version_file).collect()
}

/// Gem pinned via `Gemfile.lock` rather than a version file.
pub const MAILROOM_GEM: &str = "gitlab-mail_room";
pub const MAILROOM_VERSION_FILE: &str = "MAILROOM_VERSION";

/// File name to pinned version, ordered for stable commit payloads.
pub type VersionMap = BTreeMap<String, String>;

/// Resolves component pins from the application repository and applies
/// them to the packaging repositories.
pub struct ComponentVersions<'a> {
  api: &'a dyn ContentApi,
  ctx: RunContext,
}

impl<'a> ComponentVersions<'a> {
  pub fn new(api: &'a dyn ContentApi, ctx: RunContext) -> Self {
    ComponentVersions { api, ctx }
  }

  /// Component map for the Omnibus package at `commit_id`: the application
  /// version itself plus every version file.
  pub fn omnibus_versions(&self, project: &Project, commit_id: &str) -> TrainResult<VersionMap> {
    let mut versions = VersionMap::new();
    versions.insert("VERSION".to_string(), commit_id.to_string());

    let path = project.path_for(&self.ctx);
    let pointer_files = version_files();
    let progress = ComponentProgress::new(pointer_files.len(), format!("Resolving components of {}", path));

    let files: Vec<(String, String)> = pointer_files
      .par_iter()
      .map(|file| {
        let content = self.api.file_contents(&path, file, commit_id)?;
        progress.inc();
        Ok(((*file).to_string(), chomp(&content)))
      })
      .collect::<Result<_, ApiError>>()?;

    versions.extend(files);

    trace!("Omnibus versions for {} at {}: {:?}", path, commit_id, versions);

    Ok(versions)
  }

  /// Component map for the container images at `commit_id`: the Omnibus map
  /// plus the mailroom gem pin from `Gemfile.lock`.
  pub fn cng_versions(&self, project: &Project, commit_id: &str) -> TrainResult<VersionMap> {
    let mut versions = self.omnibus_versions(project, commit_id)?;

    let path = project.path_for(&self.ctx);
    let lockfile = self.api.file_contents(&path, "Gemfile.lock", commit_id)?;
    versions.insert(
      MAILROOM_VERSION_FILE.to_string(),
      version_from_lockfile(&lockfile, MAILROOM_GEM)?,
    );

    Ok(versions)
  }

  /// Write the component map into the Omnibus repository as one commit so
  /// a partial update can never be observed on the branch.
  pub fn update_omnibus(&self, branch: &str, versions: &VersionMap) -> TrainResult<Option<ApiCommit>> {
    if self.ctx.dry_run {
      info!("[dry-run] would update omnibus components on '{}': {:?}", branch, versions);
      return Ok(None);
    }

    let actions: Vec<FileAction> = versions
      .iter()
      .map(|(file, version)| FileAction::update(format!("/{}", file), format!("{}\n", version)))
      .collect();

    let commit = self.api.create_commit(
      &project::OMNIBUS_GITLAB.path_for(&self.ctx),
      branch,
      "Update component versions",
      &actions,
    )?;

    info!("Updated omnibus components on '{}' in {}", branch, commit.id);

    Ok(Some(commit))
  }

  /// Whether any pin in `versions` differs from what the Omnibus repository
  /// currently carries on `ref`. A file that cannot be read counts as
  /// changed; resolution happens when the update commit is applied.
  pub fn omnibus_version_changes(&self, reference: &str, versions: &VersionMap) -> TrainResult<bool> {
    let path = project::OMNIBUS_GITLAB.path_for(&self.ctx);

    for (file, version) in versions {
      match self.api.file_contents(&path, file, reference) {
        Ok(current) => {
          if chomp(&current) != *version {
            return Ok(true);
          }
        }
        Err(err) => {
          warn!("Could not read {} at {} ({}); treating as changed", file, reference, err);
          return Ok(true);
        }
      }
    }

    Ok(false)
  }

  /// Write the image build variables into the CNG repository as one commit.
  pub fn update_cng(&self, branch: &str, versions: &VersionMap) -> TrainResult<Option<ApiCommit>> {
    let variables = to_cng_variables(versions);

    if self.ctx.dry_run {
      info!("[dry-run] would update image variables on '{}': {:?}", branch, variables);
      return Ok(None);
    }

    let actions: Vec<FileAction> = variables
      .iter()
      .map(|(name, value)| FileAction::update(format!("/variables/{}", name), format!("{}\n", value)))
      .collect();

    let commit = self.api.create_commit(
      &project::CNG_IMAGE.path_for(&self.ctx),
      branch,
      "Update image versions",
      &actions,
    )?;

    info!("Updated image variables on '{}' in {}", branch, commit.id);

    Ok(Some(commit))
  }

  /// Change detection for the CNG repository, over the translated variable
  /// set rather than the raw version files.
  pub fn cng_version_changes(&self, reference: &str, versions: &VersionMap) -> TrainResult<bool> {
    let path = project::CNG_IMAGE.path_for(&self.ctx);

    for (name, value) in to_cng_variables(versions) {
      let file = format!("variables/{}", name);
      match self.api.file_contents(&path, &file, reference) {
        Ok(current) => {
          if chomp(&current) != value {
            return Ok(true);
          }
        }
        Err(err) => {
          warn!("Could not read {} at {} ({}); treating as changed", file, reference, err);
          return Ok(true);
        }
      }
    }

    Ok(false)
  }
}

/// Translate a component map into the variable names the image build
/// expects. Plain semantic versions become `v`-prefixed tag names; SHAs and
/// branch names pass through as-is.
pub fn to_cng_variables(versions: &VersionMap) -> VersionMap {
  let mut variables = VersionMap::new();

  for (file, version) in versions {
    let value = if SemverVersion::parse(version).is_ok() {
      format!("v{}", version)
    } else {
      version.clone()
    };

    match file.as_str() {
      "VERSION" => {
        variables.insert("GITLAB_VERSION".to_string(), value.clone());
        variables.insert("GITLAB_REF_SLUG".to_string(), value.clone());
        variables.insert("GITLAB_ASSETS_TAG".to_string(), value);
      }
      "GITALY_SERVER_VERSION" => {
        variables.insert("GITALY_VERSION".to_string(), value);
      }
      _ => {
        let name = file.trim_end_matches("_VERSION");
        variables.insert(format!("{}_VERSION", name), value);
      }
    }
  }

  variables
}

/// Exact pinned version of `gem` from a `Gemfile.lock` body.
///
/// Pins appear as 4-space-indented `name (x.y.z)` lines in the specs
/// section; the first match wins.
pub fn version_from_lockfile(lockfile: &str, gem: &str) -> Result<String, VersionError> {
  let prefix = format!("    {} (", gem);

  lockfile
    .lines()
    .find_map(|line| {
      line
        .strip_prefix(&prefix)
        .and_then(|rest| rest.strip_suffix(')'))
        .map(str::to_string)
    })
    .ok_or_else(|| VersionError::NotFound { name: gem.to_string() })
}

/// Strip a single trailing newline, CRLF included.
pub fn chomp(content: &str) -> String {
  content
    .strip_suffix("\r\n")
    .or_else(|| content.strip_suffix('\n'))
    .unwrap_or(content)
    .to_string()
}
