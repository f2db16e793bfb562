use crate::task::{TaskList, TaskRecord};
use chrono::{DateTime, Duration, Utc};

/// Seconds a fetched task list stays fresh.
pub const DEFAULT_WINDOW_SECS: i64 = 300;

/// Time-windowed cache of the remote task list.
///
/// The clock is passed in on every call. The current task is merged into the
/// returned list on every call, hits included, so local timer state is never
/// shadowed by the cached remote copy.
#[derive(Debug, Clone)]
pub struct TaskListCache {
    cached: Option<TaskList>,
    expiry: Option<DateTime<Utc>>,
    window: Duration,
}

impl Default for TaskListCache {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_WINDOW_SECS))
    }
}

impl TaskListCache {
    pub fn new(window: Duration) -> Self {
        Self {
            cached: None,
            expiry: None,
            window,
        }
    }

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.cached.is_some() && self.expiry.is_some_and(|e| now < e)
    }

    /// Force the next call to fetch. The stale list is kept as a fallback.
    pub fn invalidate(&mut self) {
        self.expiry = None;
    }

    /// Return the cached list, refetching it when the window has passed.
    ///
    /// A failed fetch leaves the previous entry and expiry untouched; the
    /// previous list is returned if there is one, otherwise the error is.
    pub fn get_or_fetch<E, F>(
        &mut self,
        now: DateTime<Utc>,
        current: Option<&TaskRecord>,
        fetch: F,
    ) -> Result<TaskList, E>
    where
        E: std::fmt::Display,
        F: FnOnce() -> Result<TaskList, E>,
    {
        if !self.is_fresh(now) {
            match fetch() {
                Ok(list) => {
                    tracing::debug!(tasks = list.len(), "task list refreshed");
                    self.cached = Some(list);
                    self.expiry = Some(now + self.window);
                }
                Err(e) if self.cached.is_some() => {
                    tracing::warn!(error = %e, "task list refresh failed, using stale copy");
                }
                Err(e) => return Err(e),
            }
        }

        let mut list = self.cached.clone().unwrap_or_default();
        if let Some(task) = current {
            list.upsert(task.clone());
        }
        Ok(list)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
