//! Tagged release flow
//!
//! A release walks a fixed sequence of steps against a fresh working copy:
//! prepare the stable branch, check the tag does not already exist, verify
//! the remotes agree, bump the version files, then tag and push. The tag
//! check makes the whole flow idempotent: re-running a finished release is
//! a no-op, not an error.

mod kind;
mod metadata;

pub use kind::ReleaseKind;
pub use metadata::{ReleaseEntry, ReleaseMetadata};

use log::{info, warn};

use crate::components::chomp;
use crate::core::context::RunContext;
use crate::core::error::TrainResult;
use crate::core::version::Version;
use crate::git::RemoteRepository;

/// Depth of the initial clone; release branches never need more history.
const CLONE_DEPTH: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseState {
  Preparing,
  BeforeHook,
  TagCheck,
  BumpingVersions,
  Tagging,
  AfterHook,
  Cleanup,
}

/// How a release run ended, short of a fatal error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
  Completed { tag: String },
  SkippedTagExists { tag: String },
}

pub struct Release {
  kind: ReleaseKind,
  version: Version,
  metadata: ReleaseMetadata,
  repository: RemoteRepository,
  state: ReleaseState,
}

impl Release {
  pub fn new(
    kind: ReleaseKind,
    version: Version,
    ctx: RunContext,
    metadata: ReleaseMetadata,
  ) -> TrainResult<Self> {
    let project = kind.project();
    let remotes = project.remotes_for(&ctx);

    // One working copy per repository name, exclusive to this run
    let path = std::env::temp_dir().join(project.key);
    let repository = RemoteRepository::new(&path, &remotes, Some(CLONE_DEPTH), &ctx)?;

    Ok(Release::with_repository(kind, version, metadata, repository))
  }

  /// Construct against an existing working copy. Dry-run and security
  /// handling already live in the repository itself.
  pub fn with_repository(
    kind: ReleaseKind,
    version: Version,
    metadata: ReleaseMetadata,
    repository: RemoteRepository,
  ) -> Self {
    Release {
      kind,
      version,
      metadata,
      repository,
      state: ReleaseState::Preparing,
    }
  }

  pub fn state(&self) -> ReleaseState {
    self.state
  }

  /// Run the release to completion. The working copy is removed afterwards
  /// whether the run succeeded or not.
  pub fn execute(&mut self) -> TrainResult<ReleaseOutcome> {
    let result = self.run_steps();

    self.state = ReleaseState::Cleanup;
    if let Err(err) = self.repository.cleanup() {
      warn!("Failed to clean up working copy: {}", err);
    }

    result
  }

  fn run_steps(&mut self) -> TrainResult<ReleaseOutcome> {
    let tag = self.version.tag();

    self.enter(ReleaseState::Preparing);
    self.prepare()?;

    self.enter(ReleaseState::BeforeHook);
    self.before_hook()?;

    self.enter(ReleaseState::TagCheck);
    if self.tag_exists(&tag)? {
      warn!("Tag '{}' already exists; skipping {}", tag, self.kind.release_name());
      return Ok(ReleaseOutcome::SkippedTagExists { tag });
    }

    self.enter(ReleaseState::BumpingVersions);
    self.bump_versions()?;

    self.enter(ReleaseState::Tagging);
    self.tag(&tag)?;

    self.enter(ReleaseState::AfterHook);
    self.after_hook()?;

    Ok(ReleaseOutcome::Completed { tag })
  }

  fn enter(&mut self, state: ReleaseState) {
    self.state = state;
    info!("{}: {:?}", self.kind.release_name(), state);
  }

  /// Bring master and the stable branch for this version up to date,
  /// creating the stable branch from master when this is its first release.
  fn prepare(&mut self) -> TrainResult<()> {
    let stable = self.version.stable_branch();

    self.repository.pull_from_all_remotes("master")?;
    self.repository.ensure_branch_exists(&stable, "master")?;
    self.repository.pull_from_all_remotes(&stable)?;

    Ok(())
  }

  /// Refuse to release from remotes that disagree on the branches the
  /// release will push.
  fn before_hook(&mut self) -> TrainResult<()> {
    self.repository.verify_sync("master")?;
    self.repository.verify_sync(&self.version.stable_branch())
  }

  fn tag_exists(&self, tag: &str) -> TrainResult<bool> {
    Ok(self.repository.tags(None)?.iter().any(|t| t == tag))
  }

  /// Rewrite the version files on the stable branch, skipping files that
  /// already carry the target version, and fold any generated files into
  /// the same commit.
  fn bump_versions(&mut self) -> TrainResult<()> {
    let mut changed: Vec<String> = Vec::new();

    for (file, content) in self.kind.version_files(&self.version) {
      let current = self.repository.read_file(&file).unwrap_or_default();
      if chomp(&current) == chomp(&content) {
        info!("{} already at {}", file, self.version);
        continue;
      }

      self.repository.write_file(&file, &content)?;
      changed.push(file);
    }

    if changed.is_empty() {
      return Ok(());
    }

    let files: Vec<&str> = changed.iter().map(String::as_str).collect();
    self
      .repository
      .commit(&files, &format!("Update VERSION to {}", self.version))?;

    let amended = self.kind.amended_files(&self.version);
    if !amended.is_empty() {
      let mut names: Vec<String> = Vec::with_capacity(amended.len());
      for (file, content) in &amended {
        self.repository.write_file(file, content)?;
        names.push(file.clone());
      }

      let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
      self.repository.commit_amend(&name_refs)?;
    }

    Ok(())
  }

  /// Push the bumped branch everywhere, tag it, push the tag, and record
  /// the release.
  fn tag(&mut self, tag: &str) -> TrainResult<()> {
    let stable = self.version.stable_branch();

    self.repository.push_ref("branch", &stable)?;

    if self.kind.update_master() {
      self.repository.push_ref("branch", "master")?;
    }

    info!("Creating tag '{}' on '{}'", tag, stable);
    self.repository.create_tag(tag, Some(&format!("Version {}", tag)))?;
    self.repository.push_ref("tag", tag)?;

    self.metadata.add_release(
      self.kind.release_name(),
      self.version.to_patch(),
      self.repository.sha_of_tag(tag)?,
      tag,
      true,
    );

    Ok(())
  }

  fn after_hook(&mut self) -> TrainResult<()> {
    Ok(())
  }
}
