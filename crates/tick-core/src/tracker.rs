//! Issue tracker access: the [`IssueTracker`] seam and its Jira client.

use crate::config::ServerConfig;
use crate::error::{Result, TickError};
use crate::json_path::{query, task_from_issue};
use crate::path;
use crate::task::{TaskList, TaskRecord};
use crate::types::TaskStatus;
use chrono::{DateTime, Utc};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde_json::{json, Value};

pub const JQL_CURRENT_TASKS: &str =
    "assignee = currentUser() and resolution = Unresolved order by updated";

const ISSUE_FIELDS: &str = "summary,status,issuetype,aggregatetimespent";

/// Timestamp layout the tracker expects for worklog start times.
pub const WORKLOG_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.000+0000";

pub fn format_worklog_start(started: DateTime<Utc>) -> String {
    started.format(WORKLOG_TIME_FORMAT).to_string()
}

pub trait IssueTracker {
    /// Unresolved tasks assigned to the user, most recently updated first.
    fn unresolved_tasks(&self) -> Result<TaskList>;
    fn task(&self, key: &str) -> Result<TaskRecord>;
    fn transition(&self, key: &str, status: TaskStatus) -> Result<()>;
    fn log_work(&self, key: &str, started: DateTime<Utc>, seconds: u64) -> Result<()>;
}

// ---------------------------------------------------------------------------
// JiraClient
// ---------------------------------------------------------------------------

pub struct JiraClient {
    http: Client,
    base: String,
    username: String,
    password: String,
}

impl JiraClient {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        Ok(Self {
            http: Client::builder().build()?,
            base: config.jira_url().to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/rest/api/2/{path}", self.base)
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        req.basic_auth(&self.username, Some(&self.password))
            .header(reqwest::header::ACCEPT, "application/json")
    }

    fn get_json(&self, path: &str, params: &[(&str, &str)]) -> Result<Value> {
        let req = self.authed(self.http.get(self.url(path)).query(params));
        let resp = check(req.send()?)?;
        Ok(resp.json()?)
    }

    fn post_json(&self, path: &str, body: &Value) -> Result<()> {
        let req = self.authed(self.http.post(self.url(path)).json(body));
        check(req.send()?)?;
        Ok(())
    }
}

/// Turn a non-success response into [`TickError::Remote`], preferring the
/// tracker's own error message.
pub(crate) fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    Err(TickError::Remote {
        status: status.as_u16(),
        message: remote_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        }),
    })
}

fn remote_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["errorMessages", "errors"].iter().find_map(|field| {
        let first = query(&value, &path![*field, 0]).ok()?;
        match first {
            Value::String(s) => Some(s),
            // Bitbucket: {"errors": [{"message": "..."}]}
            other => other.get("message")?.as_str().map(str::to_string),
        }
    })
}

impl IssueTracker for JiraClient {
    fn unresolved_tasks(&self) -> Result<TaskList> {
        let body = self.get_json(
            "search",
            &[("jql", JQL_CURRENT_TASKS), ("fields", ISSUE_FIELDS)],
        )?;
        let issues = match query(&body, &path!["issues"]) {
            Ok(Value::Array(issues)) => issues,
            _ => Vec::new(),
        };
        let records = issues
            .iter()
            .map(task_from_issue)
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(count = records.len(), "fetched unresolved tasks");
        Ok(TaskList::new(records))
    }

    fn task(&self, key: &str) -> Result<TaskRecord> {
        let body = self.get_json(&format!("issue/{key}"), &[("fields", ISSUE_FIELDS)])?;
        task_from_issue(&body)
    }

    fn transition(&self, key: &str, status: TaskStatus) -> Result<()> {
        let body = self.get_json(&format!("issue/{key}/transitions"), &[])?;
        let transitions = match query(&body, &path!["transitions"]) {
            Ok(Value::Array(t)) => t,
            _ => Vec::new(),
        };
        let id = transitions
            .iter()
            .find(|t| transition_target(t).is_some_and(|name| status.matches(&name)))
            .and_then(|t| t.get("id").and_then(Value::as_str).map(str::to_string))
            .ok_or_else(|| TickError::TransitionNotFound {
                key: key.to_string(),
                status: status.to_string(),
            })?;

        tracing::info!(key, %status, transition = %id, "transitioning task");
        self.post_json(
            &format!("issue/{key}/transitions"),
            &json!({ "transition": { "id": id } }),
        )
    }

    fn log_work(&self, key: &str, started: DateTime<Utc>, seconds: u64) -> Result<()> {
        tracing::info!(key, seconds, "logging work");
        self.post_json(
            &format!("issue/{key}/worklog"),
            &json!({
                "started": format_worklog_start(started),
                "timeSpentSeconds": seconds,
            }),
        )
    }
}

/// Target status of a transition, falling back to the transition's own name.
fn transition_target(transition: &Value) -> Option<String> {
    query(transition, &path!["to", "name"])
        .or_else(|_| query(transition, &path!["name"]))
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
