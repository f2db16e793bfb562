//! Rule-based resolution of task attributes.
//!
//! A task key such as `PROJ-123` is normalized to `proj`, then looked up in
//! the per-attribute override map:
//!
//! ```yaml
//! rules:
//!   repo:
//!     proj: backend-service
//!   branch:
//!     default: feature/
//! ```
//!
//! Resolution always yields a string: the override for the normalized key,
//! else the attribute's `default`, else the normalized key itself.

use crate::error::{Result, TickError};
use crate::types::Attribute;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

pub const DEFAULT_RULE: &str = "default";

static KEY_RE: OnceLock<Regex> = OnceLock::new();

fn key_re() -> &'static Regex {
    KEY_RE.get_or_init(|| Regex::new(r"(\w+)-\d+$").unwrap())
}

/// Lowercase `key` and strip its trailing `-<number>`: `PROJ-123` → `proj`.
pub fn filter_key(key: &str) -> Result<String> {
    let lowered = key.to_lowercase();
    key_re()
        .captures(&lowered)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| TickError::InvalidKeyFormat(key.to_string()))
}

// ---------------------------------------------------------------------------
// RuleSet
// ---------------------------------------------------------------------------

/// Attribute name → (normalized key or `default`) → override value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: BTreeMap<String, BTreeMap<String, String>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an override for `name` (a normalized key or `default`).
    pub fn with_rule(
        mut self,
        attribute: Attribute,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.rules
            .entry(attribute.as_str().to_string())
            .or_default()
            .insert(name.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn resolve(&self, attribute: Attribute, key: &str) -> Result<String> {
        let filtered = filter_key(key)?;
        let Some(rules) = self.rules.get(attribute.as_str()) else {
            return Ok(filtered);
        };
        let resolved = rules
            .get(&filtered)
            .or_else(|| rules.get(DEFAULT_RULE))
            .cloned()
            .unwrap_or(filtered);
        Ok(resolved)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
