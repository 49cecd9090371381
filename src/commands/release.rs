use crate::core::context::RunContext;
use crate::core::error::{TrainError, TrainResult};
use crate::core::version::{Edition, Version};
use crate::release::{Release, ReleaseKind, ReleaseMetadata, ReleaseOutcome};

/// Run the release command
pub fn run_release(project: String, version: String, ctx: RunContext) -> TrainResult<()> {
  let version = Version::parse(&version)?;
  let kind = parse_kind(&project, &version)?;

  let metadata = ReleaseMetadata::new();
  let outcome = Release::new(kind, version, ctx, metadata.clone())?.execute()?;

  match &outcome {
    ReleaseOutcome::Completed { tag } => {
      println!("✅ Released {} as '{}'", kind.release_name(), tag);
    }
    ReleaseOutcome::SkippedTagExists { tag } => {
      println!("⚠️ Tag '{}' already exists; {} was not re-released", tag, kind.release_name());
    }
  }

  let releases = metadata.releases();
  if !releases.is_empty() {
    println!("{}", metadata.to_json()?);
  }

  Ok(())
}

fn parse_kind(project: &str, version: &Version) -> TrainResult<ReleaseKind> {
  match project {
    "gitlab" => {
      let edition = if version.is_ee() { Edition::Ee } else { Edition::Ce };
      Ok(ReleaseKind::Gitlab { edition })
    }
    "gitlab-ee" => Ok(ReleaseKind::Gitlab { edition: Edition::Ee }),
    "gitlab-ce" => Ok(ReleaseKind::Gitlab { edition: Edition::Ce }),
    "gitaly" => Ok(ReleaseKind::Gitaly),
    "omnibus" | "omnibus-gitlab" => Ok(ReleaseKind::Omnibus),
    other => Err(TrainError::with_help(
      format!("Unknown project '{}'", other),
      "Supported projects: gitlab, gitlab-ee, gitlab-ce, gitaly, omnibus",
    )),
  }
}
