//! Blocking GitHub client over `ureq`.
//!
//! | Operation        | Endpoint                                             |
//! |------------------|------------------------------------------------------|
//! | `fetch_file`     | `GET  /repos/{owner}/{repo}/contents/{path}?ref=`    |
//! | `update_file`    | `PUT  /repos/{owner}/{repo}/contents/{path}`         |
//! | `fetch_commit`   | `GET  /repos/{owner}/{repo}/commits/{ref}`           |
//! | `list_commits`   | `GET  /repos/{owner}/{repo}/commits?sha=&per_page=&page=` |
//! | `commit_history` | `POST /graphql` (`ref.target.history(first:)`)       |
//!
//! Every call is bounded by the agent-wide timeout.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use marksync_core::settings::Settings;
use marksync_core::types::{BranchName, RepoRef};
use marksync_core::ConfigError;

use crate::error::HostError;
use crate::host::{CommitInfo, FileUpdate, RemoteFile, RepositoryHost};

const USER_AGENT: &str = concat!("marksync/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";
const ERROR_BODY_LIMIT: usize = 300;

const HISTORY_QUERY: &str = r#"
query($owner: String!, $repo: String!, $branch: String!, $first: Int!) {
  repository(owner: $owner, name: $repo) {
    ref(qualifiedName: $branch) {
      target {
        ... on Commit {
          history(first: $first) {
            nodes {
              oid
              committedDate
              message
            }
          }
        }
      }
    }
  }
}
"#;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ContentResponse {
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    sha: String,
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    message: String,
    author: Option<CommitSignature>,
    committer: Option<CommitSignature>,
}

#[derive(Debug, Deserialize)]
struct CommitSignature {
    date: String,
}

impl From<CommitResponse> for CommitInfo {
    fn from(value: CommitResponse) -> Self {
        let date = value
            .commit
            .author
            .or(value.commit.committer)
            .map(|s| s.date)
            .unwrap_or_default();
        CommitInfo {
            sha: value.sha,
            message: value.commit.message,
            date,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<GraphqlData>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GraphqlData {
    repository: Option<GraphqlRepository>,
}

#[derive(Debug, Deserialize)]
struct GraphqlRepository {
    #[serde(rename = "ref")]
    git_ref: Option<GraphqlRef>,
}

#[derive(Debug, Deserialize)]
struct GraphqlRef {
    target: GraphqlTarget,
}

#[derive(Debug, Deserialize)]
struct GraphqlTarget {
    history: Option<GraphqlHistory>,
}

#[derive(Debug, Deserialize)]
struct GraphqlHistory {
    nodes: Vec<GraphqlCommit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphqlCommit {
    #[serde(default)]
    oid: String,
    committed_date: String,
    message: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// GitHub REST + GraphQL client. Cheap to clone; share one per process.
#[derive(Clone)]
pub struct GithubClient {
    agent: ureq::Agent,
    api_base: String,
    graphql_url: String,
    token: String,
}

impl GithubClient {
    pub fn new(api_base: &str, graphql_url: &str, token: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build();
        Self {
            agent,
            api_base: api_base.trim_end_matches('/').to_string(),
            graphql_url: graphql_url.to_string(),
            token: token.trim().to_string(),
        }
    }

    /// Build from settings. A missing token is a configuration error.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let token = settings.require_token()?;
        Ok(Self::new(
            &settings.api_base,
            &settings.graphql_endpoint(),
            token,
            settings.request_timeout(),
        ))
    }

    fn repo_url(&self, repo: &RepoRef, tail: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, repo.owner, repo.name, tail
        )
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        self.agent
            .request(method, url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Accept", "application/vnd.github+json")
            .set("X-GitHub-Api-Version", API_VERSION)
    }

    fn read_json<T: DeserializeOwned>(
        operation: &'static str,
        response: ureq::Response,
    ) -> Result<T, HostError> {
        response.into_json().map_err(|e| HostError::Decode {
            operation,
            message: e.to_string(),
        })
    }
}

fn map_ureq_error(operation: &'static str, err: ureq::Error) -> HostError {
    match err {
        ureq::Error::Status(status, response) => HostError::Status {
            operation,
            status,
            message: truncate(response.into_string().unwrap_or_default()),
        },
        ureq::Error::Transport(transport) => HostError::Transport {
            operation,
            message: transport.to_string(),
        },
    }
}

fn truncate(mut text: String) -> String {
    if text.len() > ERROR_BODY_LIMIT {
        let mut cut = ERROR_BODY_LIMIT;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
        text.push('…');
    }
    text
}

fn decode_content(operation: &'static str, response: ContentResponse) -> Result<String, HostError> {
    if let Some(encoding) = response.encoding.as_deref() {
        if encoding != "base64" {
            return Err(HostError::Decode {
                operation,
                message: format!("unsupported content encoding '{encoding}'"),
            });
        }
    }
    let compact: String = response
        .content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD.decode(compact).map_err(|e| HostError::Decode {
        operation,
        message: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| HostError::Decode {
        operation,
        message: format!("content is not UTF-8: {e}"),
    })
}

/// 409, or 422 complaining about the sha, means the revision token is stale.
fn is_revision_conflict(status: u16, body: &str) -> bool {
    status == 409 || (status == 422 && body.contains("sha"))
}

/// Percent-encode each `/`-separated segment, keeping the separators.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

impl RepositoryHost for GithubClient {
    fn fetch_file(
        &self,
        repo: &RepoRef,
        path: &str,
        branch: &BranchName,
    ) -> Result<Option<RemoteFile>, HostError> {
        const OP: &str = "fetch file";
        let url = self.repo_url(repo, &format!("contents/{}", encode_path(path)));
        tracing::debug!("GET {url} (ref {branch})");
        let response = match self.request("GET", &url).query("ref", &branch.0).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(404, _)) => return Ok(None),
            Err(err) => return Err(map_ureq_error(OP, err)),
        };
        let body: ContentResponse = Self::read_json(OP, response)?;
        let sha = body.sha.clone();
        let content = decode_content(OP, body)?;
        Ok(Some(RemoteFile {
            path: path.to_string(),
            content,
            sha,
        }))
    }

    fn update_file(&self, repo: &RepoRef, update: &FileUpdate<'_>) -> Result<(), HostError> {
        const OP: &str = "update file";
        let url = self.repo_url(repo, &format!("contents/{}", encode_path(update.path)));
        let mut payload = json!({
            "message": update.message,
            "content": STANDARD.encode(update.content.as_bytes()),
            "branch": update.branch.0,
        });
        if let Some(sha) = update.previous_sha {
            payload["sha"] = json!(sha);
        }
        tracing::debug!("PUT {url} (branch {})", update.branch);
        match self.request("PUT", &url).send_json(payload) {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(status, response)) => {
                let body = truncate(response.into_string().unwrap_or_default());
                if is_revision_conflict(status, &body) {
                    Err(HostError::Conflict {
                        path: update.path.to_string(),
                        message: format!("HTTP {status}: {body}"),
                    })
                } else {
                    Err(HostError::Status {
                        operation: OP,
                        status,
                        message: body,
                    })
                }
            }
            Err(err) => Err(map_ureq_error(OP, err)),
        }
    }

    fn fetch_commit(&self, repo: &RepoRef, reference: &str) -> Result<CommitInfo, HostError> {
        const OP: &str = "fetch commit";
        let url = self.repo_url(repo, &format!("commits/{}", encode_path(reference)));
        tracing::debug!("GET {url}");
        let response = self
            .request("GET", &url)
            .call()
            .map_err(|e| map_ureq_error(OP, e))?;
        let body: CommitResponse = Self::read_json(OP, response)?;
        Ok(body.into())
    }

    fn list_commits(
        &self,
        repo: &RepoRef,
        branch: &BranchName,
        per_page: u32,
        page: u32,
    ) -> Result<Vec<CommitInfo>, HostError> {
        const OP: &str = "list commits";
        let url = self.repo_url(repo, "commits");
        tracing::debug!("GET {url} (sha {branch}, per_page {per_page}, page {page})");
        let response = self
            .request("GET", &url)
            .query("sha", &branch.0)
            .query("per_page", &per_page.to_string())
            .query("page", &page.to_string())
            .call()
            .map_err(|e| map_ureq_error(OP, e))?;
        let body: Vec<CommitResponse> = Self::read_json(OP, response)?;
        Ok(body.into_iter().map(CommitInfo::from).collect())
    }

    fn commit_history(
        &self,
        repo: &RepoRef,
        branch: &BranchName,
        first: u32,
    ) -> Result<Vec<CommitInfo>, HostError> {
        const OP: &str = "graphql commit history";
        let payload = json!({
            "query": HISTORY_QUERY,
            "variables": {
                "owner": repo.owner,
                "repo": repo.name,
                "branch": branch.qualified(),
                "first": first,
            }
        });
        tracing::debug!("POST {} (history of {repo}@{branch})", self.graphql_url);
        let response = self
            .request("POST", &self.graphql_url)
            .send_json(payload)
            .map_err(|e| map_ureq_error(OP, e))?;
        let body: GraphqlResponse = Self::read_json(OP, response)?;

        if let Some(first_error) = body.errors.first() {
            return Err(HostError::Decode {
                operation: OP,
                message: first_error.message.clone(),
            });
        }
        let history = body
            .data
            .and_then(|d| d.repository)
            .and_then(|r| r.git_ref)
            .and_then(|r| r.target.history)
            .ok_or_else(|| HostError::Decode {
                operation: OP,
                message: format!("branch '{branch}' not found in {repo}"),
            })?;
        Ok(history
            .nodes
            .into_iter()
            .map(|node| CommitInfo {
                sha: node.oid,
                message: node.message,
                date: node.committed_date,
            })
            .collect())
    }
}
