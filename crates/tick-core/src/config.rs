use crate::error::{Result, TickError};
use crate::rules::RuleSet;
use crate::task::TaskRecord;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_TARGET_BRANCH: &str = "develop";

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

/// Credentials and endpoints for the tracker and source host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    /// Bitbucket base URL. Defaults to `url` with `jira` replaced by
    /// `bitbucket`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitbucket_url: Option<String>,
    /// Branch that pull requests are opened against.
    #[serde(default = "default_target_branch")]
    pub target_branch: String,
}

fn default_target_branch() -> String {
    DEFAULT_TARGET_BRANCH.to_string()
}

impl ServerConfig {
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password: password.into(),
            bitbucket_url: None,
            target_branch: default_target_branch(),
        }
    }

    pub fn jira_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    pub fn bitbucket_url(&self) -> String {
        match &self.bitbucket_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => self.jira_url().replace("jira", "bitbucket"),
        }
    }
}

// ---------------------------------------------------------------------------
// ConfigFile (top-level)
// ---------------------------------------------------------------------------

/// The whole `config.yaml` document.
///
/// It doubles as the current-task store: `current_task` holds the snapshot
/// of the task being timed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub config: Option<ServerConfig>,
    #[serde(default)]
    pub rules: RuleSet,
    #[serde(default)]
    pub current_task: Option<TaskRecord>,
}

impl ConfigFile {
    /// Load the document; a missing or empty file is an empty document.
    pub fn load(path: &Path) -> Result<Self> {
        let Some(data) = crate::io::read_if_exists(path)? else {
            return Ok(Self::default());
        };
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: ConfigFile = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    /// Load, apply `f`, and write back.
    pub fn update(path: &Path, f: impl FnOnce(&mut ConfigFile)) -> Result<ConfigFile> {
        let mut cfg = Self::load(path)?;
        f(&mut cfg);
        cfg.save(path)?;
        Ok(cfg)
    }

    pub fn server(&self) -> Result<&ServerConfig> {
        self.config.as_ref().ok_or(TickError::NotConfigured)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
