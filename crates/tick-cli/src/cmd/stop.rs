use super::Services;
use crate::output::print_json;
use chrono::Utc;
use serde_json::json;
use std::path::Path;
use tick_core::task::whole_minutes;

pub fn run(config_path: &Path, json: bool) -> anyhow::Result<()> {
    let mut services = Services::load(config_path)?;
    let mut session = services.session()?;
    let stopped = session.stop(Utc::now())?;

    if json {
        let value = match &stopped {
            Some(s) => json!({
                "stopped": s.task.key,
                "status": s.task.status,
                "seconds": s.session.seconds,
                "logged": s.logged,
            }),
            None => json!({ "stopped": null }),
        };
        return print_json(&value);
    }

    match stopped {
        Some(s) => {
            println!("Stopped {}", s.task.key);
            if s.logged {
                println!("Logged {} minutes", whole_minutes(s.session.seconds));
            }
        }
        None => println!("No task currently being worked on."),
    }
    Ok(())
}
