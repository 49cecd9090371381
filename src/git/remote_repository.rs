//! Local working copy of one upstream project and its named remotes
//!
//! The working copy is ephemeral: it is wiped at construction, cloned on
//! first use, and discardable at any point afterwards. No state is implied
//! by its survival to the next run. The first configured remote is the
//! canonical one; it backs the initial clone and is the reference point for
//! the consistency check in [`RemoteRepository::verify_sync`].

use crate::core::context::RunContext;
use crate::core::error::{GitError, TrainError, TrainResult, ResultExt};
use log::{trace, warn};
use std::path::{Path, PathBuf};
use std::process::Command;

/// A named remote
#[derive(Debug, Clone)]
pub struct Remote {
  pub name: String,
  pub url: String,
}

/// Captured result of one git subprocess invocation
#[derive(Debug)]
pub struct GitOutput {
  pub stdout: String,
  pub stderr: String,
  pub success: bool,
}

impl GitOutput {
  /// Combined stdout and stderr for diagnostics
  pub fn combined(&self) -> String {
    if self.stderr.is_empty() {
      self.stdout.clone()
    } else if self.stdout.is_empty() {
      self.stderr.clone()
    } else {
      format!("{}\n{}", self.stdout, self.stderr)
    }
  }
}

/// Retryable, side-effect-explicit interface over a local git working copy.
pub struct RemoteRepository {
  pub(crate) path: PathBuf,
  pub(crate) remotes: Vec<Remote>,
  pub(crate) global_depth: Option<u32>,
  pub(crate) dry_run: bool,
}

impl RemoteRepository {
  /// Open a working copy at an explicit path.
  ///
  /// Any existing directory at `path` is removed first: the working copy is
  /// exclusive to this run and nothing from an earlier run may leak into it.
  pub fn new(
    path: &Path,
    remotes: &[(String, String)],
    global_depth: Option<u32>,
    ctx: &RunContext,
  ) -> TrainResult<Self> {
    if remotes.is_empty() {
      return Err(TrainError::message("At least one remote is required"));
    }

    if ctx.dry_run {
      warn!("Pushes will be ignored because this is a dry run");
    }

    let repository = Self {
      path: path.to_path_buf(),
      remotes: remotes
        .iter()
        .map(|(name, url)| Remote {
          name: name.clone(),
          url: url.clone(),
        })
        .collect(),
      global_depth,
      dry_run: ctx.dry_run,
    };

    repository.cleanup()?;
    repository.init_remotes()?;

    Ok(repository)
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn remotes(&self) -> &[Remote] {
    &self.remotes
  }

  /// The reference copy for consistency checks (first configured remote)
  pub fn canonical_remote(&self) -> &Remote {
    &self.remotes[0]
  }

  /// Remove the working copy. Safe to call repeatedly; runs on both the
  /// success and failure paths of a release.
  pub fn cleanup(&self) -> TrainResult<()> {
    if self.path.exists() {
      trace!("Removing working copy at {}", self.path.display());
      std::fs::remove_dir_all(&self.path).with_context(|| format!("Failed to remove {}", self.path.display()))?;
    }

    Ok(())
  }

  /// Clone the canonical remote, then register the other remotes.
  fn init_remotes(&self) -> TrainResult<()> {
    self.ensure_repo_exists()?;

    for remote in self.remotes.iter().skip(1) {
      let output = self.run_git(&["remote", "add", &remote.name, &remote.url])?;
      if !output.success && !output.stderr.contains("already exists") {
        return Err(
          GitError::CommandFailed {
            command: format!("git remote add {}", remote.name),
            output: output.combined(),
          }
          .into(),
        );
      }
    }

    Ok(())
  }

  /// Clone on demand: a shallow, single-origin clone of the canonical remote.
  fn ensure_repo_exists(&self) -> TrainResult<()> {
    if self.path.join(".git").is_dir() {
      return Ok(());
    }

    let canonical = self.canonical_remote();
    let mut args: Vec<String> = vec!["clone".into(), "--quiet".into()];
    if let Some(depth) = self.global_depth {
      args.push(format!("--depth={}", depth));
    }
    args.push("--origin".into());
    args.push(canonical.name.clone());
    args.push(canonical.url.clone());
    args.push(self.path.display().to_string());

    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    let output = run_git_at(None, &arg_refs)?;

    if !output.success {
      return Err(
        GitError::CannotClone {
          url: canonical.url.clone(),
          output: output.combined(),
        }
        .into(),
      );
    }

    Ok(())
  }

  /// Run git inside the working copy, cloning it first if necessary.
  pub(crate) fn run_git(&self, args: &[&str]) -> TrainResult<GitOutput> {
    self.ensure_repo_exists()?;
    run_git_at(Some(&self.path), args)
  }
}

/// Execute one git command with an isolated environment.
///
/// - Passes arguments as a vector, never as a shell string
/// - Clears environment variables, whitelisting PATH, HOME, and GIT_*
/// - Supplies a fallback committer identity for bare CI runners
/// - Forces safe configuration regardless of user config
fn run_git_at(dir: Option<&Path>, args: &[&str]) -> TrainResult<GitOutput> {
  let mut cmd = Command::new("git");

  if let Some(dir) = dir {
    cmd.arg("-C").arg(dir);
  }

  cmd.env_clear();
  for (key, value) in std::env::vars() {
    if key == "PATH" || key == "HOME" || key.starts_with("GIT_") {
      cmd.env(key, value);
    }
  }
  if std::env::var("GIT_COMMITTER_NAME").is_err() {
    cmd.env("GIT_COMMITTER_NAME", "release-train");
    cmd.env("GIT_COMMITTER_EMAIL", "release-train@invalid");
    cmd.env("GIT_AUTHOR_NAME", "release-train");
    cmd.env("GIT_AUTHOR_EMAIL", "release-train@invalid");
  }

  cmd.arg("-c").arg("protocol.version=2");
  cmd.arg("-c").arg("advice.detachedHead=false");
  cmd.arg("-c").arg("core.quotePath=false");
  // Divergent pulls must merge (and surface conflicts), never rebase
  cmd.arg("-c").arg("pull.rebase=false");

  cmd.args(args);

  trace!("git {}", args.join(" "));

  let output = cmd.output().context(format!("Failed to execute git {}", args.first().unwrap_or(&"")))?;

  Ok(GitOutput {
    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    success: output.status.success(),
  })
}
