//! Source hosting access: the [`SourceHost`] seam and its Bitbucket Server
//! client.

use crate::config::ServerConfig;
use crate::error::Result;
use crate::json_path::{query_str, PathSegment};
use crate::path;
use crate::tracker::check;
use reqwest::blocking::Client;
use serde_json::{json, Value};

/// A pull request from a task branch into the target branch of the same
/// repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub project: String,
    pub repo: String,
    pub from_branch: String,
    pub to_branch: String,
    pub title: String,
    pub description: String,
}

impl PullRequest {
    fn body(&self) -> Value {
        let repository = json!({
            "slug": self.repo,
            "project": { "key": self.project },
        });
        json!({
            "title": self.title,
            "description": self.description,
            "state": "OPEN",
            "open": true,
            "closed": false,
            "fromRef": { "id": format!("refs/heads/{}", self.from_branch), "repository": repository },
            "toRef": { "id": format!("refs/heads/{}", self.to_branch), "repository": repository },
        })
    }
}

pub trait SourceHost {
    fn clone_url(&self, project: &str, repo: &str) -> Result<String>;
    /// Open the pull request and return its web link.
    fn open_pull_request(&self, pr: &PullRequest) -> Result<String>;
}

// ---------------------------------------------------------------------------
// BitbucketClient
// ---------------------------------------------------------------------------

pub struct BitbucketClient {
    http: Client,
    base: String,
    username: String,
    password: String,
}

impl BitbucketClient {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        Ok(Self {
            http: Client::builder().build()?,
            base: config.bitbucket_url(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn repo_url(&self, project: &str, repo: &str) -> String {
        format!("{}/rest/api/1.0/projects/{project}/repos/{repo}", self.base)
    }
}

/// `links.clone[-1].href`: the last advertised clone link.
fn clone_path() -> Vec<PathSegment> {
    path!["links", "clone", -1, "href"]
}

impl SourceHost for BitbucketClient {
    fn clone_url(&self, project: &str, repo: &str) -> Result<String> {
        let resp = self
            .http
            .get(self.repo_url(project, repo))
            .basic_auth(&self.username, Some(&self.password))
            .send()?;
        let body: Value = check(resp)?.json()?;
        query_str(&body, &clone_path())
    }

    fn open_pull_request(&self, pr: &PullRequest) -> Result<String> {
        tracing::info!(project = %pr.project, repo = %pr.repo, from = %pr.from_branch, to = %pr.to_branch, "opening pull request");
        let resp = self
            .http
            .post(format!("{}/pull-requests", self.repo_url(&pr.project, &pr.repo)))
            .basic_auth(&self.username, Some(&self.password))
            .json(&pr.body())
            .send()?;
        let body: Value = check(resp)?.json()?;
        query_str(&body, &path!["links", "self", 0, "href"])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
