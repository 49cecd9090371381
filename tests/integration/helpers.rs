//! Test helpers for integration tests

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

use release_train::api::{ApiCommit, ApiTag, ContentApi, FileAction, RefInfo};
use release_train::core::error::ApiError;

/// Run git in a directory, failing the test on a non-zero exit.
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .env("GIT_AUTHOR_NAME", "Test User")
    .env("GIT_AUTHOR_EMAIL", "test@example.com")
    .env("GIT_COMMITTER_NAME", "Test User")
    .env("GIT_COMMITTER_EMAIL", "test@example.com")
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

pub fn git_stdout(cwd: &Path, args: &[&str]) -> Result<String> {
  let output = git(cwd, args)?;
  Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// A bare repository seeded with one commit on `master`.
pub struct SeededRemote {
  _root: TempDir,
  pub path: PathBuf,
  pub head: String,
}

impl SeededRemote {
  /// Create a bare remote whose `master` carries `files`.
  pub fn new(files: &[(&str, &str)]) -> Result<Self> {
    let root = TempDir::new()?;
    let bare = root.path().join("remote.git");
    let work = root.path().join("seed");

    git(root.path(), &["init", "--bare", "--initial-branch=master", bare.to_str().unwrap()])?;

    git(root.path(), &["init", "--initial-branch=master", work.to_str().unwrap()])?;
    for (file, content) in files {
      let path = work.join(file);
      if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
      }
      std::fs::write(path, content)?;
    }
    git(&work, &["add", "."])?;
    git(&work, &["commit", "--allow-empty", "-m", "Seed repository"])?;
    git(&work, &["push", bare.to_str().unwrap(), "master"])?;

    let head = git_stdout(&work, &["rev-parse", "HEAD"])?;

    Ok(SeededRemote {
      _root: root,
      path: bare,
      head,
    })
  }

  pub fn url(&self) -> String {
    self.path.display().to_string()
  }

  /// Commit `files` onto a branch of the remote through a throwaway clone.
  pub fn push_commit(&self, branch: &str, files: &[(&str, &str)], message: &str) -> Result<String> {
    let work = TempDir::new()?;
    let clone = work.path().join("clone");

    git(work.path(), &["clone", &self.url(), clone.to_str().unwrap()])?;
    let checkout = git(&clone, &["checkout", branch]);
    if checkout.is_err() {
      git(&clone, &["checkout", "-b", branch])?;
    }

    for (file, content) in files {
      let path = clone.join(file);
      if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
      }
      std::fs::write(path, content)?;
    }
    git(&clone, &["add", "."])?;
    git(&clone, &["commit", "-m", message])?;
    git(&clone, &["push", "origin", branch])?;

    git_stdout(&clone, &["rev-parse", "HEAD"])
  }

  /// Contents of `file` at `reference` on the remote, if present.
  pub fn show(&self, reference: &str, file: &str) -> Option<String> {
    let output = Command::new("git")
      .current_dir(&self.path)
      .args(["show", &format!("{}:{}", reference, file)])
      .output()
      .ok()?;

    if output.status.success() {
      Some(String::from_utf8_lossy(&output.stdout).to_string())
    } else {
      None
    }
  }

  pub fn tags(&self) -> Result<Vec<String>> {
    Ok(
      git_stdout(&self.path, &["tag", "--list"])?
        .lines()
        .map(String::from)
        .collect(),
    )
  }

  pub fn has_branch(&self, branch: &str) -> bool {
    Command::new("git")
      .current_dir(&self.path)
      .args(["rev-parse", "--verify", &format!("refs/heads/{}", branch)])
      .output()
      .map(|o| o.status.success())
      .unwrap_or(false)
  }
}

/// Fixed timestamp for deterministic tag names.
pub fn fixed_time(hour: u32, minute: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2026, 2, 26, hour, minute, 0).unwrap()
}

type FileKey = (String, String, String);

#[derive(Default)]
struct FakeState {
  // (project, reference, file) -> content
  files: HashMap<FileKey, String>,
  // (project, reference) -> commit
  commits: HashMap<(String, String), ApiCommit>,
  // (project, sha) -> refs containing it
  refs: HashMap<(String, String), Vec<RefInfo>>,
  // (project, tag name, target ref)
  tags: Vec<(String, String, String)>,
  commit_count: usize,
  commit_messages: Vec<(String, String)>,
  fail_create_commit: bool,
  fail_tags_for: Option<String>,
}

/// In-process [`ContentApi`] over plain maps.
#[derive(Default)]
pub struct FakeApi {
  state: Mutex<FakeState>,
}

impl FakeApi {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set_file(&self, project: &str, reference: &str, file: &str, content: &str) {
    let mut state = self.state.lock().unwrap();
    state.files.insert(
      (project.to_string(), reference.to_string(), file.to_string()),
      content.to_string(),
    );
  }

  pub fn set_commit(&self, project: &str, reference: &str, id: &str, created_at: DateTime<Utc>) {
    let mut state = self.state.lock().unwrap();
    let commit = ApiCommit {
      id: id.to_string(),
      created_at,
    };
    state
      .commits
      .insert((project.to_string(), reference.to_string()), commit.clone());
    // The SHA itself also resolves.
    state.commits.insert((project.to_string(), id.to_string()), commit);
  }

  pub fn set_refs(&self, project: &str, sha: &str, refs: Vec<RefInfo>) {
    let mut state = self.state.lock().unwrap();
    state.refs.insert((project.to_string(), sha.to_string()), refs);
  }

  /// Tags created so far, as `(project, tag name, target ref)`.
  pub fn created_tags(&self) -> Vec<(String, String, String)> {
    self.state.lock().unwrap().tags.clone()
  }

  /// Commit messages created so far, as `(project, message)`.
  pub fn created_commits(&self) -> Vec<(String, String)> {
    self.state.lock().unwrap().commit_messages.clone()
  }

  pub fn file(&self, project: &str, reference: &str, file: &str) -> Option<String> {
    let state = self.state.lock().unwrap();
    state
      .files
      .get(&(project.to_string(), reference.to_string(), file.to_string()))
      .cloned()
  }

  pub fn fail_create_commit(&self) {
    self.state.lock().unwrap().fail_create_commit = true;
  }

  /// Make `create_tag` fail for one project.
  pub fn fail_tags_for(&self, project: &str) {
    self.state.lock().unwrap().fail_tags_for = Some(project.to_string());
  }
}

impl ContentApi for FakeApi {
  fn file_contents(&self, project: &str, file: &str, reference: &str) -> Result<String, ApiError> {
    let state = self.state.lock().unwrap();
    state
      .files
      .get(&(project.to_string(), reference.to_string(), file.to_string()))
      .cloned()
      .ok_or_else(|| ApiError::Http {
        status: 404,
        url: format!("fake:///{}/{}/{}", project, reference, file),
      })
  }

  fn create_commit(
    &self,
    project: &str,
    branch: &str,
    message: &str,
    actions: &[FileAction],
  ) -> Result<ApiCommit, ApiError> {
    let mut state = self.state.lock().unwrap();

    if state.fail_create_commit {
      return Err(ApiError::Request {
        message: "connection reset by peer".to_string(),
      });
    }

    for action in actions {
      let file = action.file_path.trim_start_matches('/').to_string();
      state
        .files
        .insert((project.to_string(), branch.to_string(), file), action.content.clone());
    }

    state.commit_count += 1;
    state.commit_messages.push((project.to_string(), message.to_string()));

    Ok(ApiCommit {
      id: format!("fakecommit{:06}", state.commit_count),
      created_at: Utc::now(),
    })
  }

  fn create_tag(
    &self,
    project: &str,
    tag: &str,
    reference: &str,
    message: &str,
  ) -> Result<ApiTag, ApiError> {
    let mut state = self.state.lock().unwrap();

    if state.fail_tags_for.as_deref() == Some(project) {
      return Err(ApiError::Http {
        status: 503,
        url: format!("fake:///{}/tags", project),
      });
    }

    state
      .tags
      .push((project.to_string(), tag.to_string(), reference.to_string()));

    Ok(ApiTag {
      name: tag.to_string(),
      message: Some(message.to_string()),
    })
  }

  fn commit(&self, project: &str, reference: &str) -> Result<ApiCommit, ApiError> {
    let state = self.state.lock().unwrap();
    state
      .commits
      .get(&(project.to_string(), reference.to_string()))
      .cloned()
      .ok_or_else(|| ApiError::Http {
        status: 404,
        url: format!("fake:///{}/commits/{}", project, reference),
      })
  }

  fn commit_refs(&self, project: &str, sha: &str) -> Result<Vec<RefInfo>, ApiError> {
    let state = self.state.lock().unwrap();
    Ok(
      state
        .refs
        .get(&(project.to_string(), sha.to_string()))
        .cloned()
        .unwrap_or_default(),
    )
  }
}
