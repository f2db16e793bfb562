use crate::error::{Result, TickError};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const TICK_DIR: &str = ".tick";
pub const CONFIG_FILE: &str = "config.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn tick_dir(home: &Path) -> PathBuf {
    home.join(TICK_DIR)
}

pub fn config_path_in(home: &Path) -> PathBuf {
    tick_dir(home).join(CONFIG_FILE)
}

/// Default location of the config file: `~/.tick/config.yaml`.
pub fn default_config_path() -> Result<PathBuf> {
    let home = home::home_dir().ok_or(TickError::HomeNotFound)?;
    Ok(config_path_in(&home))
}

/// Resolve the config file path.
///
/// Priority:
/// 1. `--config` flag / `TICK_CONFIG` env var (passed in as `explicit`)
/// 2. `~/.tick/config.yaml`
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(p) => Ok(p.to_path_buf()),
        None => default_config_path(),
    }
}
