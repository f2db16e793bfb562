use crate::error::{Result, TickError};
use crate::rules::RuleSet;
use crate::types::{Attribute, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;

// ---------------------------------------------------------------------------
// TaskRecord
// ---------------------------------------------------------------------------

/// A tracked task as the tracker reports it, plus the local timer.
///
/// `start_time` is an absolute timestamp, so a running timer survives process
/// exit: elapsed time is recomputed from it on every invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskRecord {
    pub key: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "type")]
    pub task_type: Option<String>,
    /// Seconds already logged on the tracker before the current session.
    #[serde(default, deserialize_with = "de_seconds")]
    pub time_spent: u64,
    #[serde(default, with = "epoch_seconds")]
    pub start_time: Option<DateTime<Utc>>,

    #[serde(skip)]
    repo: OnceCell<String>,
    #[serde(skip)]
    project: OnceCell<String>,
    #[serde(skip)]
    branch: OnceCell<String>,
}

/// A finished timing session, as it should be logged on the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLog {
    pub started: DateTime<Utc>,
    pub seconds: u64,
}

impl TaskRecord {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_time_spent(mut self, seconds: u64) -> Self {
        self.time_spent = seconds;
        self
    }

    pub fn is_running(&self) -> bool {
        self.start_time.is_some()
    }

    /// The remote status mapped onto the known status set.
    pub fn status_kind(&self) -> Option<TaskStatus> {
        self.status.as_deref().and_then(|s| s.parse().ok())
    }

    pub fn has_status(&self, status: TaskStatus) -> bool {
        self.status.as_deref().is_some_and(|s| status.matches(s))
    }

    // -----------------------------------------------------------------------
    // Time accounting
    // -----------------------------------------------------------------------

    fn running_seconds(&self, now: DateTime<Utc>) -> u64 {
        match self.start_time {
            // A clock that went backwards contributes nothing rather than
            // shrinking the total.
            Some(start) => u64::try_from((now - start).num_seconds()).unwrap_or(0),
            None => 0,
        }
    }

    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> u64 {
        self.time_spent + self.running_seconds(now)
    }

    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> u64 {
        whole_minutes(self.elapsed_seconds(now))
    }

    pub fn begin_session(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.start_time.is_some() {
            return Err(TickError::AlreadyRunning(self.key.clone()));
        }
        self.start_time = Some(now);
        Ok(())
    }

    /// Stop the timer and fold the running time into `time_spent`.
    pub fn end_session(&mut self, now: DateTime<Utc>) -> Result<SessionLog> {
        let Some(started) = self.start_time else {
            return Err(TickError::NotRunning(self.key.clone()));
        };
        let seconds = self.running_seconds(now);
        self.time_spent += seconds;
        self.start_time = None;
        Ok(SessionLog { started, seconds })
    }

    // -----------------------------------------------------------------------
    // Derived attributes
    // -----------------------------------------------------------------------
    //
    // Each is resolved once per record and then kept, even if the rules are
    // edited later in the same process.

    pub fn repo(&self, rules: &RuleSet) -> Result<&str> {
        memoize(&self.repo, || rules.resolve(Attribute::Repo, &self.key))
    }

    pub fn project(&self, rules: &RuleSet) -> Result<&str> {
        memoize(&self.project, || rules.resolve(Attribute::Project, &self.key))
    }

    pub fn branch(&self, rules: &RuleSet) -> Result<&str> {
        memoize(&self.branch, || {
            let prefix = rules.resolve(Attribute::Branch, &self.key)?;
            Ok(format!("{prefix}{}", self.key))
        })
    }

    /// Columns shown by `tick status`: key, summary, status, type, minutes.
    pub fn display_row(&self, now: DateTime<Utc>) -> Vec<String> {
        vec![
            self.key.clone(),
            self.summary.clone().unwrap_or_default(),
            self.status.clone().unwrap_or_default(),
            self.task_type.clone().unwrap_or_default(),
            self.elapsed_minutes(now).to_string(),
        ]
    }
}

/// Seconds to the nearest minute; an exact half minute rounds to the even
/// neighbour (30s → 0, 90s → 2, 150s → 2).
pub fn whole_minutes(seconds: u64) -> u64 {
    let (minutes, rest) = (seconds / 60, seconds % 60);
    if rest > 30 || (rest == 30 && minutes % 2 == 1) {
        minutes + 1
    } else {
        minutes
    }
}

fn memoize<'a>(cell: &'a OnceCell<String>, f: impl FnOnce() -> Result<String>) -> Result<&'a str> {
    if let Some(v) = cell.get() {
        return Ok(v.as_str());
    }
    let value = f()?;
    Ok(cell.get_or_init(|| value).as_str())
}

impl PartialEq for TaskRecord {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.summary == other.summary
            && self.status == other.status
            && self.task_type == other.task_type
            && self.time_spent == other.time_spent
            && self.start_time == other.start_time
    }
}

// ---------------------------------------------------------------------------
// TaskList
// ---------------------------------------------------------------------------

/// Ordered tasks with unique keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TaskList {
    tasks: Vec<TaskRecord>,
}

impl TaskList {
    pub fn new(records: impl IntoIterator<Item = TaskRecord>) -> Self {
        let mut list = Self::default();
        for record in records {
            list.upsert(record);
        }
        list
    }

    /// Replace the entry with the same key in place, else append.
    pub fn upsert(&mut self, record: TaskRecord) {
        match self.tasks.iter_mut().find(|t| t.key == record.key) {
            Some(existing) => *existing = record,
            None => self.tasks.push(record),
        }
    }

    pub fn get(&self, key: &str) -> Option<&TaskRecord> {
        self.tasks.iter().find(|t| t.key == key)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TaskRecord> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl<'a> IntoIterator for &'a TaskList {
    type Item = &'a TaskRecord;
    type IntoIter = std::slice::Iter<'a, TaskRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}

// ---------------------------------------------------------------------------
// Serde helpers
// ---------------------------------------------------------------------------

/// Remote time values arrive as integers, floats or null.
fn de_seconds<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.filter(|v| *v > 0.0).map(|v| v as u64).unwrap_or(0))
}

/// `start_time` is stored as Unix seconds; `0` and `null` both mean "not
/// running".
mod epoch_seconds {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_i64(dt.timestamp()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<i64>::deserialize(deserializer)?;
        Ok(secs
            .filter(|s| *s != 0)
            .and_then(|s| DateTime::<Utc>::from_timestamp(s, 0)))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
