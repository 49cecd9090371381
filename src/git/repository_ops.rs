//! Release-facing operations on a [`RemoteRepository`]
//!
//! Failure semantics, by class:
//! - expected-absent refs return `false`, never an error
//! - conflicts and divergence (`CannotPull`, `OutOfSync`) are fatal and
//!   never auto-resolved
//! - a push failure on one remote is logged and reported as `false` so the
//!   remaining remotes still receive the ref

use super::remote_repository::RemoteRepository;
use crate::core::error::{GitError, TrainResult, ResultExt};
use log::{info, trace, warn};

/// Options for [`RemoteRepository::commit_with`]
#[derive(Debug, Default)]
pub struct CommitOptions<'a> {
  pub message: Option<&'a str>,
  pub amend: bool,
  pub no_edit: bool,
  pub author: Option<&'a str>,
}

impl RemoteRepository {
  /// Shallow-fetch `ref` from the canonical remote into a same-named local
  /// ref. Returns `false` when the ref does not exist on the remote.
  pub fn fetch(&self, reference: &str) -> TrainResult<bool> {
    self.fetch_from(reference, &self.canonical_remote().name, self.global_depth)
  }

  /// Fetch `ref` from a specific remote.
  ///
  /// The first attempt assumes the ref can be mapped onto a same-named local
  /// branch; if that fails (e.g. the ref is not yet a local branch) it is
  /// retried without the refspec.
  pub fn fetch_from(&self, reference: &str, remote: &str, depth: Option<u32>) -> TrainResult<bool> {
    let mut base: Vec<String> = vec!["fetch".into(), "--quiet".into()];
    if let Some(depth) = depth {
      base.push(format!("--depth={}", depth));
    }
    base.push(remote.to_string());

    let refspec = format!("{}:{}", reference, reference);
    let mut args: Vec<&str> = base.iter().map(String::as_str).collect();
    args.push(&refspec);

    let output = self.run_git(&args)?;
    if output.success {
      return Ok(true);
    }

    let mut args: Vec<&str> = base.iter().map(String::as_str).collect();
    args.push(reference);

    Ok(self.run_git(&args)?.success)
  }

  /// Fetch `branch`; check it out if it already exists locally, otherwise
  /// create it from `base` and check it out.
  pub fn ensure_branch_exists(&self, branch: &str, base: &str) -> TrainResult<()> {
    self.fetch(branch)?;

    if self.checkout_branch(branch)? {
      return Ok(());
    }

    self.checkout_new_branch(branch, base)
  }

  /// Check out an existing branch. Returns `false` if it does not exist.
  pub fn checkout_branch(&self, branch: &str) -> TrainResult<bool> {
    Ok(self.run_git(&["checkout", "--quiet", branch])?.success)
  }

  /// Create `branch` from `base` and check it out.
  ///
  /// Fatal on failure: the base was just fetched, so a failure here is a
  /// real conflict, not transience, and is not retried.
  pub fn checkout_new_branch(&self, branch: &str, base: &str) -> TrainResult<()> {
    self.fetch(base)?;

    let output = self.run_git(&["checkout", "--quiet", "-b", branch, base])?;
    if !output.success {
      return Err(
        GitError::CannotCheckoutBranch {
          branch: branch.to_string(),
          output: output.combined(),
        }
        .into(),
      );
    }

    Ok(())
  }

  /// Pull `ref` from one remote, then inspect the index for unresolved
  /// merge conflicts. Conflicts abort the release; they are never
  /// auto-resolved.
  pub fn pull(&self, reference: &str, remote: &str, depth: Option<u32>) -> TrainResult<bool> {
    let mut args: Vec<String> = vec!["pull".into(), "--quiet".into()];
    if let Some(depth) = depth {
      args.push(format!("--depth={}", depth));
    }
    args.push(remote.to_string());
    args.push(reference.to_string());

    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    let output = self.run_git(&arg_refs)?;

    if self.conflicts()? {
      return Err(
        GitError::CannotPull {
          reference: reference.to_string(),
          remote: remote.to_string(),
          output: output.combined(),
        }
        .into(),
      );
    }

    Ok(output.success)
  }

  /// Pull `ref` sequentially from every configured remote.
  pub fn pull_from_all_remotes(&self, reference: &str) -> TrainResult<()> {
    for remote in self.remotes().to_vec() {
      self.pull(reference, &remote.name, self.global_depth)?;
    }

    Ok(())
  }

  /// Verify `ref` resolves to the same SHA on every configured remote,
  /// using a lightweight server-side listing (no content fetch). With fewer
  /// than two remotes there is nothing to compare and the check is skipped.
  pub fn verify_sync(&self, reference: &str) -> TrainResult<()> {
    if self.remotes().len() < 2 {
      return Ok(());
    }

    let refs = self.ls_remotes(reference)?;

    let mut shas: Vec<&str> = refs.iter().map(|(_, sha)| sha.as_str()).collect();
    shas.sort_unstable();
    shas.dedup();

    if shas.len() == 1 {
      return Ok(());
    }

    Err(
      GitError::OutOfSync {
        reference: reference.to_string(),
        remotes: refs,
      }
      .into(),
    )
  }

  /// Per-remote SHA report for `ref`. An unreachable remote reports
  /// `unknown`; a remote without the ref reports an empty string.
  fn ls_remotes(&self, reference: &str) -> TrainResult<Vec<(String, String)>> {
    let mut report = Vec::with_capacity(self.remotes().len());

    for remote in self.remotes().to_vec() {
      let output = self.run_git(&["ls-remote", &remote.name, reference])?;

      let sha = if !output.success {
        "unknown".to_string()
      } else {
        output
          .stdout
          .split('\t')
          .next()
          .map(|s| s.trim().to_string())
          .unwrap_or_default()
      };

      report.push((remote.name.clone(), sha));
    }

    Ok(report)
  }

  /// Write a file inside the working copy.
  pub fn write_file(&self, file: &str, content: &str) -> TrainResult<()> {
    let path = self.path().join(file);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))
  }

  /// Read a file from the working copy.
  pub fn read_file(&self, file: &str) -> TrainResult<String> {
    let path = self.path().join(file);
    std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))
  }

  /// Stage `files` and commit them with `message`.
  pub fn commit(&self, files: &[&str], message: &str) -> TrainResult<()> {
    self.commit_with(
      files,
      CommitOptions {
        message: Some(message),
        ..Default::default()
      },
    )
  }

  /// Stage `files` and amend them into the previous commit, keeping its
  /// message.
  pub fn commit_amend(&self, files: &[&str]) -> TrainResult<()> {
    self.commit_with(
      files,
      CommitOptions {
        amend: true,
        no_edit: true,
        ..Default::default()
      },
    )
  }

  /// Full commit entry point with amend/author control.
  pub fn commit_with(&self, files: &[&str], opts: CommitOptions<'_>) -> TrainResult<()> {
    if !files.is_empty() {
      let mut add_args = vec!["add"];
      add_args.extend_from_slice(files);
      let output = self.run_git(&add_args)?;
      if !output.success {
        return Err(
          GitError::CommandFailed {
            command: "git add".to_string(),
            output: output.combined(),
          }
          .into(),
        );
      }
    }

    let mut args: Vec<String> = vec!["commit".into()];
    if opts.no_edit {
      args.push("--no-edit".into());
    }
    if opts.amend {
      args.push("--amend".into());
    }
    if let Some(author) = opts.author {
      args.push(format!("--author={}", author));
    }
    if let Some(message) = opts.message {
      args.push("--message".into());
      args.push(message.to_string());
    }

    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    let output = self.run_git(&arg_refs)?;

    if !output.success {
      return Err(GitError::CannotCommit { output: output.combined() }.into());
    }

    Ok(())
  }

  /// Create an annotated tag at HEAD.
  pub fn create_tag(&self, tag: &str, message: Option<&str>) -> TrainResult<()> {
    let message = message.map(String::from).unwrap_or_else(|| format!("Version {}", tag));

    let output = self.run_git(&["tag", "-a", tag, "-m", &message])?;
    if !output.success {
      return Err(
        GitError::CannotCreateTag {
          tag: tag.to_string(),
          output: output.combined(),
        }
        .into(),
      );
    }

    Ok(())
  }

  /// Push a branch or tag ref to one remote.
  ///
  /// In dry-run mode this only logs intent. A failed push is logged and
  /// reported as `false`, never raised: one broken mirror must not stop
  /// propagation to the others.
  pub fn push(&self, remote: &str, reference: &str) -> TrainResult<bool> {
    if self.dry_run {
      trace!("[dry-run] push {} {}:{}", remote, reference, reference);
      return Ok(true);
    }

    let refspec = format!("{}:{}", reference, reference);
    let output = self.run_git(&["push", remote, &refspec])?;

    if output.success {
      Ok(true)
    } else {
      warn!("Failed to push '{}' to '{}': {}", reference, remote, output.combined());
      Ok(false)
    }
  }

  /// Push a ref to every configured remote; `true` only when all succeeded.
  pub fn push_to_all_remotes(&self, reference: &str) -> TrainResult<bool> {
    let mut all_pushed = true;

    for remote in self.remotes().to_vec() {
      all_pushed &= self.push(&remote.name, reference)?;
    }

    Ok(all_pushed)
  }

  /// List tags known to the canonical remote.
  pub fn tags(&self, sort: Option<&str>) -> TrainResult<Vec<String>> {
    self.fetch("refs/tags/*")?;

    let sort_arg;
    let mut args = vec!["tag", "--list"];
    if let Some(key) = sort {
      sort_arg = format!("--sort={}", key);
      args.push(&sort_arg);
    }

    let output = self.run_git(&args)?;
    if !output.success {
      return Err(
        GitError::CommandFailed {
          command: "git tag --list".to_string(),
          output: output.combined(),
        }
        .into(),
      );
    }

    Ok(output.stdout.lines().map(|line| line.trim().to_string()).collect())
  }

  /// SHA of the commit a tag points at.
  pub fn sha_of_tag(&self, tag: &str) -> TrainResult<String> {
    let output = self.run_git(&["rev-list", "--max-count=1", tag])?;
    if !output.success {
      return Err(
        GitError::CommandFailed {
          command: format!("git rev-list --max-count=1 {}", tag),
          output: output.combined(),
        }
        .into(),
      );
    }

    Ok(output.stdout.trim().to_string())
  }

  /// SHA of HEAD.
  pub fn head(&self) -> TrainResult<String> {
    let output = self.run_git(&["rev-parse", "--verify", "HEAD"])?;
    if !output.success {
      return Err(
        GitError::CommandFailed {
          command: "git rev-parse --verify HEAD".to_string(),
          output: output.combined(),
        }
        .into(),
      );
    }

    Ok(output.stdout.trim().to_string())
  }

  /// Whether the working tree has uncommitted changes, optionally limited
  /// to `paths`.
  pub fn changes(&self, paths: &[&str]) -> TrainResult<bool> {
    let mut args = vec!["status", "--porcelain"];
    if !paths.is_empty() {
      args.push("--");
      args.extend_from_slice(paths);
    }

    let output = self.run_git(&args)?;
    Ok(!output.stdout.trim().is_empty())
  }

  /// Unresolved merge entries in the index, i.e. a conflicted merge.
  fn conflicts(&self) -> TrainResult<bool> {
    let output = self.run_git(&["ls-files", "-u"])?;
    Ok(!output.stdout.trim().is_empty())
  }
}

// Convenience logging wrapper used by the release flow.
impl RemoteRepository {
  /// Push a ref to all remotes with step-level logging.
  pub fn push_ref(&self, ref_type: &str, reference: &str) -> TrainResult<bool> {
    let names: Vec<&str> = self.remotes().iter().map(|r| r.name.as_str()).collect();
    info!("Pushing {} '{}' to remotes {:?}", ref_type, reference, names);

    self.push_to_all_remotes(reference)
  }
}
