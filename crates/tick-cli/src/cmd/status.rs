use super::Services;
use crate::output::{print_json, print_table, CURRENT_MARKER};
use anyhow::Context;
use chrono::Utc;
use serde_json::json;
use std::path::Path;

pub fn run(config_path: &Path, json: bool) -> anyhow::Result<()> {
    let mut services = Services::load(config_path)?;
    let mut session = services.session()?;
    let now = Utc::now();
    let tasks = session.status(now).context("failed to fetch tasks")?;

    if json {
        let items: Vec<_> = tasks
            .iter()
            .map(|t| {
                json!({
                    "key": t.key,
                    "summary": t.summary,
                    "status": t.status,
                    "type": t.task_type,
                    "minutes": t.elapsed_minutes(now),
                    "current": t.is_running(),
                })
            })
            .collect();
        return print_json(&items);
    }

    if tasks.is_empty() {
        println!("No unresolved tasks.");
        return Ok(());
    }

    let rows = tasks
        .iter()
        .map(|t| {
            let marker = if t.is_running() { CURRENT_MARKER } else { "" };
            let mut row = vec![marker.to_string()];
            row.extend(t.display_row(now));
            row
        })
        .collect();
    print_table(&["", "KEY", "SUMMARY", "STATUS", "TYPE", "MINUTES"], rows);
    Ok(())
}
