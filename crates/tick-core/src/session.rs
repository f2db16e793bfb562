//! User-facing task operations.
//!
//! [`Session`] wires the rules, the current-task store and the task list
//! cache to the tracker, source host and git. Every operation that reads the
//! clock takes `now` from the caller.

use crate::cache::TaskListCache;
use crate::error::{Result, TickError};
use crate::git::Git;
use crate::hosting::{PullRequest, SourceHost};
use crate::rules::RuleSet;
use crate::store::CurrentTaskStore;
use crate::task::{SessionLog, TaskList, TaskRecord};
use crate::tracker::IssueTracker;
use crate::types::TaskStatus;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// What happened to the timer when a task stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct Stopped {
    pub task: TaskRecord,
    pub session: SessionLog,
    /// Whether a worklog entry was sent (zero-length sessions are not).
    pub logged: bool,
}

/// Result of `init`: where the repository lives and what git reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkout {
    pub dir: PathBuf,
    pub cloned_from: Option<String>,
    pub branch: String,
    pub output: Vec<String>,
}

pub struct Session<'a> {
    rules: &'a RuleSet,
    target_branch: &'a str,
    store: &'a mut dyn CurrentTaskStore,
    tracker: &'a dyn IssueTracker,
    host: &'a dyn SourceHost,
    git: &'a dyn Git,
    cache: TaskListCache,
}

impl<'a> Session<'a> {
    pub fn new(
        rules: &'a RuleSet,
        target_branch: &'a str,
        store: &'a mut dyn CurrentTaskStore,
        tracker: &'a dyn IssueTracker,
        host: &'a dyn SourceHost,
        git: &'a dyn Git,
    ) -> Self {
        Self {
            rules,
            target_branch,
            store,
            tracker,
            host,
            git,
            cache: TaskListCache::default(),
        }
    }

    pub fn current_task(&self) -> Result<Option<TaskRecord>> {
        self.store.load()
    }

    pub fn task(&self, key: &str) -> Result<TaskRecord> {
        self.tracker.task(key)
    }

    /// `key`, or the current task's key when none is given.
    pub fn resolve_key(&self, key: Option<&str>) -> Result<String> {
        match key {
            Some(k) => Ok(k.to_string()),
            None => self
                .current_task()?
                .map(|t| t.key)
                .ok_or(TickError::NoCurrentTask),
        }
    }

    // -----------------------------------------------------------------------
    // status
    // -----------------------------------------------------------------------

    /// Unresolved tasks with the current task merged in.
    pub fn status(&mut self, now: DateTime<Utc>) -> Result<TaskList> {
        let current = self.store.load()?;
        let tracker = self.tracker;
        self.cache
            .get_or_fetch(now, current.as_ref(), || tracker.unresolved_tasks())
    }

    // -----------------------------------------------------------------------
    // Timer operations
    // -----------------------------------------------------------------------

    /// Stop the current task, moving it back to To Do if it was in progress.
    ///
    /// The new status is saved before the worklog is sent, so a retry after a
    /// failed worklog does not repeat the transition.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Result<Option<Stopped>> {
        let Some(mut task) = self.running_task()? else {
            return Ok(None);
        };
        if task.has_status(TaskStatus::InProgress) {
            self.tracker.transition(&task.key, TaskStatus::ToDo)?;
            task.status = Some(TaskStatus::ToDo.to_string());
            self.store.save(&task)?;
        }
        let stopped = self.finish(task, now)?;
        Ok(Some(stopped))
    }

    /// The stored task if its timer is running. A snapshot without a start
    /// time has nothing to stop and is dropped.
    fn running_task(&mut self) -> Result<Option<TaskRecord>> {
        match self.store.load()? {
            Some(task) if task.is_running() => Ok(Some(task)),
            Some(task) => {
                tracing::warn!(key = %task.key, "current task has no start time, clearing it");
                self.store.clear()?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// End the session, log it and clear the store.
    fn finish(&mut self, mut task: TaskRecord, now: DateTime<Utc>) -> Result<Stopped> {
        let session = task.end_session(now)?;
        let logged = session.seconds > 0;
        if logged {
            self.tracker
                .log_work(&task.key, session.started, session.seconds)?;
        } else {
            tracing::warn!(key = %task.key, "session shorter than a second, nothing logged");
        }
        self.store.clear()?;
        self.cache.invalidate();
        tracing::info!(key = %task.key, seconds = session.seconds, "stopped task");
        Ok(Stopped {
            task,
            session,
            logged,
        })
    }

    /// Make `key` the current task, stopping any other running task first.
    ///
    /// Re-running `workon` for the task already being timed refreshes its
    /// remote fields and keeps the original start time.
    pub fn workon(&mut self, key: &str, now: DateTime<Utc>) -> Result<(TaskRecord, Option<Stopped>)> {
        let previous = self.store.load()?;
        let mut stopped = None;
        let mut start = None;
        if let Some(prev) = previous {
            if prev.key == key {
                start = prev.start_time;
            } else {
                stopped = self.stop(now)?;
            }
        }

        let mut task = self.tracker.task(key)?;
        match start {
            Some(s) => task.start_time = Some(s),
            None => task.begin_session(now)?,
        }
        self.store.save(&task)?;

        if task.has_status(TaskStatus::ToDo) {
            self.tracker.transition(key, TaskStatus::InProgress)?;
            task.status = Some(TaskStatus::InProgress.to_string());
            self.store.save(&task)?;
        }
        self.cache.invalidate();
        tracing::info!(key, "working on task");
        Ok((task, stopped))
    }

    /// Move `key` to `status`. Moving the current task out of In Progress
    /// stops its timer.
    pub fn move_task(
        &mut self,
        key: &str,
        status: TaskStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Stopped>> {
        self.tracker.transition(key, status)?;
        self.cache.invalidate();

        let Some(mut current) = self.running_task()?.filter(|t| t.key == key) else {
            return Ok(None);
        };
        current.status = Some(status.to_string());
        self.store.save(&current)?;
        if status == TaskStatus::InProgress {
            return Ok(None);
        }
        self.finish(current, now).map(Some)
    }

    pub fn log_time(&mut self, key: &str, minutes: u64, now: DateTime<Utc>) -> Result<()> {
        let seconds = minutes
            .checked_mul(60)
            .filter(|_| minutes >= 1)
            .ok_or(TickError::InvalidDuration(minutes))?;
        self.tracker.log_work(key, now, seconds)
    }

    // -----------------------------------------------------------------------
    // Repository operations
    // -----------------------------------------------------------------------

    fn resolution_failed(&self, task: &TaskRecord, reason: impl ToString) -> TickError {
        let attr = |r: Result<&str>| r.map(str::to_string).unwrap_or_else(|e| e.to_string());
        TickError::ResolutionFailed {
            repo: attr(task.repo(self.rules)),
            branch: attr(task.branch(self.rules)),
            project: attr(task.project(self.rules)),
            reason: reason.to_string(),
        }
    }

    /// Clone (or reuse) the task's repository under `dir`, check out the task
    /// branch and pull.
    pub fn init(&mut self, key: &str, dir: &Path) -> Result<Checkout> {
        let task = self.tracker.task(key)?;
        let repo = task.repo(self.rules)?.to_string();
        let project = task.project(self.rules)?.to_string();
        let branch = task.branch(self.rules)?.to_string();
        let target = dir.join(&repo);

        let mut output = Vec::new();
        let mut cloned_from = None;
        if target.exists() {
            tracing::info!(dir = %target.display(), "repository already exists locally");
        } else {
            let url = self
                .host
                .clone_url(&project, &repo)
                .map_err(|e| self.resolution_failed(&task, e))?;
            tracing::info!(%url, dir = %target.display(), "cloning repository");
            output.push(
                self.git
                    .clone_repo(&url, &target)
                    .map_err(|e| self.resolution_failed(&task, e))?,
            );
            cloned_from = Some(url);
        }

        let git_step = |r: Result<String>| r.map_err(|e| self.resolution_failed(&task, e));
        output.push(git_step(self.git.checkout(&target, &branch))?);
        output.push(git_step(self.git.pull(&target))?);
        output.retain(|o| !o.is_empty());

        Ok(Checkout {
            dir: target,
            cloned_from,
            branch,
            output,
        })
    }

    /// Stage everything in `dir`, commit with the task summary and push.
    pub fn push(&mut self, key: &str, dir: &Path) -> Result<String> {
        let task = self.tracker.task(key)?;
        let branch = task.branch(self.rules)?;
        let actual = self.git.current_branch(dir)?.unwrap_or_default();
        if actual != branch {
            return Err(TickError::WrongBranch {
                expected: branch.to_string(),
                actual,
            });
        }
        let message = task.summary.clone().unwrap_or_else(|| task.key.clone());
        self.git.add_all(dir)?;
        self.git.commit(dir, &message)?;
        self.git.push(dir)?;
        tracing::info!(key, branch, "pushed changes");
        Ok(message)
    }

    /// Open a pull request for the task branch and return its link.
    pub fn open_pr(&mut self, key: &str) -> Result<String> {
        let task = self.tracker.task(key)?;
        let pr = PullRequest {
            project: task.project(self.rules)?.to_string(),
            repo: task.repo(self.rules)?.to_string(),
            from_branch: task.branch(self.rules)?.to_string(),
            to_branch: self.target_branch.to_string(),
            title: format!("{key} {}", task.summary.as_deref().unwrap_or_default())
                .trim_end()
                .to_string(),
            description: String::new(),
        };
        self.host.open_pull_request(&pr)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
