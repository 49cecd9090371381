use log::{debug, trace};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Serialize;

use super::{ApiCommit, ApiTag, ContentApi, FileAction, RefInfo};
use crate::core::config::TrainConfig;
use crate::core::context::RunContext;
use crate::core::error::ApiError;
use crate::core::retry::RetryPolicy;

/// Blocking client for the hosting service's REST API.
///
/// Reads are retried per the configured policy; writes run exactly once so
/// a timed-out commit is never re-applied.
pub struct HttpClient {
  base_url: String,
  token: Option<String>,
  http: Client,
  retry: RetryPolicy,
}

impl HttpClient {
  pub fn new(base_url: impl Into<String>, token: Option<String>, retry: RetryPolicy) -> Result<Self, ApiError> {
    let http = Client::builder()
      .user_agent(concat!("release-train/", env!("CARGO_PKG_VERSION")))
      .build()?;

    Ok(HttpClient {
      base_url: base_url.into(),
      token,
      http,
      retry,
    })
  }

  /// Client for the instance the current run writes to: the dev instance
  /// during a security release, the canonical instance otherwise.
  pub fn for_context(config: &TrainConfig, ctx: &RunContext) -> Result<Self, ApiError> {
    let retry = RetryPolicy::from_settings(&config.retry);

    if ctx.security_release {
      Self::new(config.api.dev_endpoint.clone(), config.api.dev_token(), retry)
    } else {
      Self::new(config.api.endpoint.clone(), config.api.token(), retry)
    }
  }

  /// Client for the ops instance, used for deployment trigger tags.
  pub fn for_ops(config: &TrainConfig) -> Result<Self, ApiError> {
    let retry = RetryPolicy::from_settings(&config.retry);
    Self::new(config.api.ops_endpoint.clone(), config.api.ops_token(), retry)
  }

  fn project_url(&self, project: &str, tail: &str) -> String {
    format!("{}/projects/{}/{}", self.base_url, encode(project), tail)
  }

  fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
    match &self.token {
      Some(token) => builder.header("PRIVATE-TOKEN", token.as_str()),
      None => builder,
    }
  }

  fn check(url: &str, response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
      Ok(response)
    } else {
      Err(ApiError::Http {
        status: status.as_u16(),
        url: url.to_string(),
      })
    }
  }

  fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<Response, ApiError> {
    trace!("GET {}", url);
    let response = self.authed(self.http.get(url).query(query)).send()?;
    Self::check(url, response)
  }

  fn post_json<B: Serialize>(&self, url: &str, body: &B) -> Result<Response, ApiError> {
    debug!("POST {}", url);
    let response = self.authed(self.http.post(url)).json(body).send()?;
    Self::check(url, response)
  }
}

impl ContentApi for HttpClient {
  fn file_contents(&self, project: &str, file: &str, reference: &str) -> Result<String, ApiError> {
    let url = self.project_url(project, &format!("repository/files/{}/raw", encode(file)));

    self
      .retry
      .run("file_contents", || {
        self.get(&url, &[("ref", reference)])?.text().map_err(ApiError::from)
      })
  }

  fn create_commit(
    &self,
    project: &str,
    branch: &str,
    message: &str,
    actions: &[FileAction],
  ) -> Result<ApiCommit, ApiError> {
    #[derive(Serialize)]
    struct CommitPayload<'a> {
      branch: &'a str,
      commit_message: &'a str,
      actions: &'a [FileAction],
    }

    let url = self.project_url(project, "repository/commits");
    let payload = CommitPayload {
      branch,
      commit_message: message,
      actions,
    };

    self.post_json(&url, &payload)?.json().map_err(ApiError::from)
  }

  fn create_tag(
    &self,
    project: &str,
    tag: &str,
    reference: &str,
    message: &str,
  ) -> Result<ApiTag, ApiError> {
    #[derive(Serialize)]
    struct TagPayload<'a> {
      tag_name: &'a str,
      #[serde(rename = "ref")]
      reference: &'a str,
      message: &'a str,
    }

    let url = self.project_url(project, "repository/tags");
    let payload = TagPayload {
      tag_name: tag,
      reference,
      message,
    };

    self.post_json(&url, &payload)?.json().map_err(ApiError::from)
  }

  fn commit(&self, project: &str, reference: &str) -> Result<ApiCommit, ApiError> {
    let url = self.project_url(project, &format!("repository/commits/{}", encode(reference)));

    self
      .retry
      .run("commit", || self.get(&url, &[])?.json().map_err(ApiError::from))
  }

  fn commit_refs(&self, project: &str, sha: &str) -> Result<Vec<RefInfo>, ApiError> {
    let url = self.project_url(project, &format!("repository/commits/{}/refs", sha));

    self
      .retry
      .run("commit_refs", || {
        self.get(&url, &[("type", "all")])?.json().map_err(ApiError::from)
      })
  }
}

/// Percent-encode a project or file path for use as a single URL segment.
fn encode(path: &str) -> String {
  path.replace('/', "%2F").replace('.', "%2E")
}
