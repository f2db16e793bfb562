use crate::config::ConfigFile;
use crate::error::Result;
use crate::task::TaskRecord;
use std::path::{Path, PathBuf};

/// Persistence for the single task being timed.
///
/// `save` overwrites any previous snapshot; `load` restores it, `start_time`
/// included, in a later process.
pub trait CurrentTaskStore {
    fn load(&self) -> Result<Option<TaskRecord>>;
    fn save(&mut self, record: &TaskRecord) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

// ---------------------------------------------------------------------------
// ConfigFileStore
// ---------------------------------------------------------------------------

/// Keeps the snapshot in the `current_task` section of `config.yaml`.
#[derive(Debug, Clone)]
pub struct ConfigFileStore {
    path: PathBuf,
}

impl ConfigFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CurrentTaskStore for ConfigFileStore {
    fn load(&self) -> Result<Option<TaskRecord>> {
        Ok(ConfigFile::load(&self.path)?.current_task)
    }

    fn save(&mut self, record: &TaskRecord) -> Result<()> {
        tracing::debug!(key = %record.key, path = %self.path.display(), "saving current task");
        ConfigFile::update(&self.path, |cfg| cfg.current_task = Some(record.clone()))?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        tracing::debug!(path = %self.path.display(), "clearing current task");
        ConfigFile::update(&self.path, |cfg| cfg.current_task = None)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    current: Option<TaskRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_task(record: TaskRecord) -> Self {
        Self {
            current: Some(record),
        }
    }
}

impl CurrentTaskStore for MemoryStore {
    fn load(&self) -> Result<Option<TaskRecord>> {
        Ok(self.current.clone())
    }

    fn save(&mut self, record: &TaskRecord) -> Result<()> {
        self.current = Some(record.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.current = None;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn running_task() -> TaskRecord {
        let mut task = TaskRecord::new("PROJ-3")
            .with_summary("Wire up store")
            .with_status("In Progress")
            .with_time_spent(240);
        task.begin_session(Utc.with_ymd_and_hms(2024, 5, 2, 14, 30, 0).unwrap())
            .unwrap();
        task
    }

    #[test]
    fn file_store_empty_loads_none() {
        let dir = TempDir::new().unwrap();
        let store = ConfigFileStore::new(dir.path().join("config.yaml"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        let task = running_task();

        ConfigFileStore::new(&path).save(&task).unwrap();

        let reopened = ConfigFileStore::new(&path);
        let loaded = reopened.load().unwrap().unwrap();
        assert_eq!(loaded, task);
        assert_eq!(loaded.start_time, task.start_time);
    }

    #[test]
    fn file_store_save_overwrites() {
        let dir = TempDir::new().unwrap();
        let mut store = ConfigFileStore::new(dir.path().join("config.yaml"));
        store.save(&TaskRecord::new("A-1")).unwrap();
        store.save(&TaskRecord::new("B-2")).unwrap();
        assert_eq!(store.load().unwrap().unwrap().key, "B-2");
    }

    #[test]
    fn file_store_clear_keeps_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        ConfigFile {
            config: Some(ServerConfig::new("https://jira.x", "u", "p")),
            ..ConfigFile::default()
        }
        .save(&path)
        .unwrap();

        let mut store = ConfigFileStore::new(&path);
        store.save(&running_task()).unwrap();
        store.clear().unwrap();

        assert!(store.load().unwrap().is_none());
        assert!(ConfigFile::load(&path).unwrap().config.is_some());
    }

    #[test]
    fn memory_store_lifecycle() {
        let mut store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());
        store.save(&running_task()).unwrap();
        assert!(store.load().unwrap().unwrap().is_running());
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
