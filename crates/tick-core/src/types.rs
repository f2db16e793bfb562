use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// TaskStatus
// ---------------------------------------------------------------------------

/// Workflow statuses a task can be moved to on the tracker.
///
/// Remote status strings are always compared through this set, so
/// `"In Progress"`, `"in progress"` and `"in-progress"` are the same status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Awaiting PR Approval")]
    AwaitingPrApproval,
    #[serde(rename = "PR In Review")]
    PrInReview,
    #[serde(rename = "Pending QA")]
    PendingQa,
    #[serde(rename = "QA In Review")]
    QaInReview,
    #[serde(rename = "Resolved")]
    Resolved,
    #[serde(rename = "Done")]
    Done,
}

impl TaskStatus {
    pub fn all() -> &'static [TaskStatus] {
        &[
            TaskStatus::ToDo,
            TaskStatus::InProgress,
            TaskStatus::AwaitingPrApproval,
            TaskStatus::PrInReview,
            TaskStatus::PendingQa,
            TaskStatus::QaInReview,
            TaskStatus::Resolved,
            TaskStatus::Done,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::ToDo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::AwaitingPrApproval => "Awaiting PR Approval",
            TaskStatus::PrInReview => "PR In Review",
            TaskStatus::PendingQa => "Pending QA",
            TaskStatus::QaInReview => "QA In Review",
            TaskStatus::Resolved => "Resolved",
            TaskStatus::Done => "Done",
        }
    }

    /// Case-insensitive match against a status name as the tracker reports it.
    pub fn matches(self, name: &str) -> bool {
        normalize(name) == normalize(self.as_str())
    }
}

fn normalize(s: &str) -> String {
    s.split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = crate::error::TickError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::all()
            .iter()
            .copied()
            .find(|status| status.matches(s))
            .ok_or_else(|| crate::error::TickError::InvalidStatus(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Attribute
// ---------------------------------------------------------------------------

/// Task attributes that are derived from the task key through rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Repo,
    Project,
    Branch,
}

impl Attribute {
    pub fn as_str(self) -> &'static str {
        match self {
            Attribute::Repo => "repo",
            Attribute::Project => "project",
            Attribute::Branch => "branch",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
