//! Nested value extraction from tracker and host JSON payloads.
//!
//! A path is a list of segments: object keys, array indices (negative counts
//! from the end) and a wildcard that fans out over the current collection.
//! Absent values are reported as [`TickError::NotFound`] instead of `null`.

use crate::error::{Result, TickError};
use crate::task::TaskRecord;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(i64),
    Wildcard,
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<i64> for PathSegment {
    fn from(index: i64) -> Self {
        PathSegment::Index(index)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => write!(f, ".{k}"),
            PathSegment::Index(i) => write!(f, "[{i}]"),
            PathSegment::Wildcard => f.write_str("[*]"),
        }
    }
}

/// Build a path from mixed key/index segments: `path!["links", "clone", -1, "href"]`.
#[macro_export]
macro_rules! path {
    ($($seg:expr),* $(,)?) => {
        vec![$($crate::json_path::PathSegment::from($seg)),*]
    };
}

fn render(path: &[PathSegment]) -> String {
    path.iter().map(|s| s.to_string()).collect()
}

/// Look up `path` inside `value`.
pub fn query(value: &Value, path: &[PathSegment]) -> Result<Value> {
    lookup(value, path).ok_or_else(|| TickError::NotFound(render(path)))
}

/// Like [`query`], but requires the result to be a string.
pub fn query_str(value: &Value, path: &[PathSegment]) -> Result<String> {
    match query(value, path)? {
        Value::String(s) => Ok(s),
        _ => Err(TickError::NotFound(render(path))),
    }
}

fn lookup(value: &Value, path: &[PathSegment]) -> Option<Value> {
    if value.is_null() {
        return None;
    }
    let Some((segment, rest)) = path.split_first() else {
        return Some(value.clone());
    };
    match segment {
        PathSegment::Key(key) => lookup(value.as_object()?.get(key)?, rest),
        PathSegment::Index(index) => {
            let items = value.as_array()?;
            let i = if *index < 0 {
                items.len().checked_sub(index.unsigned_abs() as usize)?
            } else {
                *index as usize
            };
            lookup(items.get(i)?, rest)
        }
        PathSegment::Wildcard => {
            let children: Vec<&Value> = match value {
                Value::Array(items) => items.iter().collect(),
                Value::Object(map) => map.values().collect(),
                _ => return None,
            };
            let mut out = Vec::new();
            for child in children {
                match lookup(child, rest) {
                    Some(Value::Array(nested)) if !rest.is_empty() => out.extend(nested),
                    Some(v) => out.push(v),
                    None => {}
                }
            }
            Some(Value::Array(out))
        }
    }
}

// ---------------------------------------------------------------------------
// Tracker payload mapping
// ---------------------------------------------------------------------------

/// Convert a tracker issue payload into a [`TaskRecord`].
///
/// `key` is required; the descriptive fields and time spent are optional.
pub fn task_from_issue(issue: &Value) -> Result<TaskRecord> {
    let key = query_str(issue, &path!["key"])?;
    let text = |p: Vec<PathSegment>| query_str(issue, &p).ok();
    let time_spent = query(issue, &path!["fields", "aggregatetimespent"])
        .ok()
        .and_then(|v| v.as_f64())
        .filter(|s| *s > 0.0)
        .map(|s| s as u64)
        .unwrap_or(0);

    let mut record = TaskRecord::new(key).with_time_spent(time_spent);
    record.summary = text(path!["fields", "summary"]);
    record.status = text(path!["fields", "status", "name"]);
    record.task_type = text(path!["fields", "issuetype", "name"]);
    Ok(record)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn repo_payload() -> Value {
        json!({
            "slug": "proj-api",
            "links": {
                "clone": [
                    {"name": "ssh", "href": "ssh://git@bitbucket/proj/proj-api.git"},
                    {"name": "http", "href": "https://bitbucket/scm/proj/proj-api.git"}
                ]
            }
        })
    }

    #[test]
    fn key_and_index_descent() {
        let v = repo_payload();
        assert_eq!(
            query_str(&v, &path!["links", "clone", 0, "name"]).unwrap(),
            "ssh"
        );
        assert_eq!(
            query_str(&v, &path!["links", "clone", -1, "href"]).unwrap(),
            "https://bitbucket/scm/proj/proj-api.git"
        );
    }

    #[test]
    fn empty_path_returns_value() {
        let v = json!({"a": 1});
        assert_eq!(query(&v, &[]).unwrap(), v);
    }

    #[test]
    fn absent_paths_are_not_found() {
        let v = repo_payload();
        for p in [
            path!["missing"],
            path!["links", "clone", 5],
            path!["links", "clone", -3],
            path!["slug", "nested"],
            path!["links", 0],
        ] {
            assert!(matches!(query(&v, &p), Err(TickError::NotFound(_))), "{p:?}");
        }
    }

    #[test]
    fn not_found_names_the_path() {
        let err = query(&repo_payload(), &path!["links", "clone", -1, "nope"]).unwrap_err();
        assert_eq!(err.to_string(), "path not found in response: .links.clone[-1].nope");
    }

    #[test]
    fn null_counts_as_absent() {
        let v = json!({"fields": {"aggregatetimespent": null}});
        assert!(query(&v, &path!["fields", "aggregatetimespent"]).is_err());
    }

    #[test]
    fn wildcard_over_array_skips_missing() {
        let v = json!({"issues": [{"key": "A-1"}, {"id": 2}, {"key": "B-2"}]});
        let mut p = path!["issues"];
        p.push(PathSegment::Wildcard);
        p.push("key".into());
        assert_eq!(query(&v, &p).unwrap(), json!(["A-1", "B-2"]));
    }

    #[test]
    fn wildcard_over_object_values() {
        let v = json!({"a": {"n": 1}, "b": {"n": 2}});
        let p = vec![PathSegment::Wildcard, "n".into()];
        assert_eq!(query(&v, &p).unwrap(), json!([1, 2]));
    }

    #[test]
    fn nested_wildcards_flatten() {
        let v = json!([{"xs": [1, 2]}, {"xs": [3]}]);
        let p = vec![PathSegment::Wildcard, "xs".into(), PathSegment::Wildcard];
        assert_eq!(query(&v, &p).unwrap(), json!([1, 2, 3]));
    }

    #[test]
    fn issue_mapping() {
        let issue = json!({
            "key": "PROJ-42",
            "fields": {
                "summary": "Add login page",
                "status": {"name": "In Progress"},
                "issuetype": {"name": "Story"},
                "aggregatetimespent": 3600
            }
        });
        let task = task_from_issue(&issue).unwrap();
        assert_eq!(task.key, "PROJ-42");
        assert_eq!(task.summary.as_deref(), Some("Add login page"));
        assert_eq!(task.status.as_deref(), Some("In Progress"));
        assert_eq!(task.task_type.as_deref(), Some("Story"));
        assert_eq!(task.time_spent, 3600);
        assert!(!task.is_running());
    }

    #[test]
    fn issue_mapping_tolerates_missing_fields() {
        let issue = json!({"key": "PROJ-1", "fields": {"aggregatetimespent": null}});
        let task = task_from_issue(&issue).unwrap();
        assert_eq!(task.time_spent, 0);
        assert!(task.summary.is_none());
    }

    #[test]
    fn issue_mapping_requires_key() {
        assert!(task_from_issue(&json!({"fields": {}})).is_err());
    }
}
