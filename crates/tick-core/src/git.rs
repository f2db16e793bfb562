//! Local git operations behind the [`Git`] seam, backed by the `git` binary.

use crate::error::{Result, TickError};
use std::path::{Path, PathBuf};
use std::process::Command;

pub trait Git {
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<String>;
    fn checkout(&self, dir: &Path, branch: &str) -> Result<String>;
    fn pull(&self, dir: &Path) -> Result<String>;
    fn add_all(&self, dir: &Path) -> Result<String>;
    fn commit(&self, dir: &Path, message: &str) -> Result<String>;
    fn push(&self, dir: &Path) -> Result<String>;
    /// The checked-out branch, or `None` when `dir` is not a git work tree.
    fn current_branch(&self, dir: &Path) -> Result<Option<String>>;
}

// ---------------------------------------------------------------------------
// GitCli
// ---------------------------------------------------------------------------

/// Runs the `git` found on `PATH`. A missing binary only surfaces as
/// [`TickError::GitNotFound`] once a command is actually run.
#[derive(Debug, Clone, Default)]
pub struct GitCli {
    bin: Option<PathBuf>,
}

impl GitCli {
    pub fn new() -> Self {
        Self {
            bin: which::which("git").ok(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.bin.is_some()
    }

    fn run(&self, dir: &Path, args: &[&str]) -> Result<String> {
        let bin = self.bin.as_ref().ok_or(TickError::GitNotFound)?;
        tracing::debug!(dir = %dir.display(), ?args, "git");
        let output = Command::new(bin)
            .args(args)
            .current_dir(dir)
            .output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TickError::Git(stderr.trim().to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Git for GitCli {
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<String> {
        let parent = dest.parent().unwrap_or(Path::new("."));
        std::fs::create_dir_all(parent)?;
        let dest_str = dest.to_str().ok_or_else(|| {
            TickError::Git(format!("non-UTF8 destination: {}", dest.display()))
        })?;
        self.run(parent, &["clone", url, dest_str])
    }

    fn checkout(&self, dir: &Path, branch: &str) -> Result<String> {
        self.run(dir, &["checkout", branch])
    }

    fn pull(&self, dir: &Path) -> Result<String> {
        self.run(dir, &["pull"])
    }

    fn add_all(&self, dir: &Path) -> Result<String> {
        self.run(dir, &["add", "./"])
    }

    fn commit(&self, dir: &Path, message: &str) -> Result<String> {
        self.run(dir, &["commit", "-m", message])
    }

    fn push(&self, dir: &Path) -> Result<String> {
        self.run(dir, &["push"])
    }

    fn current_branch(&self, dir: &Path) -> Result<Option<String>> {
        if !dir.is_dir() {
            return Ok(None);
        }
        match self.run(dir, &["rev-parse", "--abbrev-ref", "HEAD"]) {
            Ok(branch) => Ok(Some(branch)),
            Err(TickError::Git(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
