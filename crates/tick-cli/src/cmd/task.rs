use super::Services;
use crate::output::print_json;
use anyhow::Context;
use chrono::Utc;
use clap::Args;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use tick_core::session::Stopped;
use tick_core::task::whole_minutes;
use tick_core::types::TaskStatus;

#[derive(Args)]
pub struct TaskArgs {
    /// Task key; defaults to the current task
    pub key: Option<String>,

    /// Directory used by --init and --push
    #[arg(default_value = "./")]
    pub dir: PathBuf,

    /// Start the timer on the task, stopping any other running task
    #[arg(short, long)]
    pub workon: bool,

    /// Open a pull request for the task branch and print its link
    #[arg(short, long)]
    pub request: bool,

    /// Move the task to STATUS
    #[arg(short, long = "move", value_name = "STATUS", value_parser = parse_status)]
    pub move_to: Option<TaskStatus>,

    /// Log MINUTES against the task, minimum 1
    #[arg(
        short,
        long,
        visible_alias = "log_time",
        value_name = "MINUTES",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub log_time: Option<u64>,

    /// Clone the task's repository into DIR and check out the task branch
    #[arg(short, long)]
    pub init: bool,

    /// Commit everything in DIR with the task summary and push
    #[arg(short, long)]
    pub push: bool,
}

impl TaskArgs {
    fn has_action(&self) -> bool {
        self.workon
            || self.request
            || self.move_to.is_some()
            || self.log_time.is_some()
            || self.init
            || self.push
    }
}

fn parse_status(s: &str) -> Result<TaskStatus, String> {
    s.parse().map_err(|_| {
        let valid: Vec<&str> = TaskStatus::all().iter().map(|st| st.as_str()).collect();
        format!("expected one of: {}", valid.join(", "))
    })
}

fn stopped_json(stopped: &Option<Stopped>) -> Value {
    match stopped {
        Some(s) => json!({
            "key": s.task.key,
            "seconds": s.session.seconds,
            "logged": s.logged,
        }),
        None => Value::Null,
    }
}

fn report_stopped(stopped: &Option<Stopped>) {
    if let Some(s) = stopped {
        println!("Stopped {}", s.task.key);
        if s.logged {
            println!("Logged {} minutes", whole_minutes(s.session.seconds));
        }
    }
}

pub fn run(config_path: &Path, args: TaskArgs, json: bool) -> anyhow::Result<()> {
    let mut services = Services::load(config_path)?;
    let mut session = services.session()?;
    let key = session.resolve_key(args.key.as_deref())?;
    let now = Utc::now();
    let mut report = Map::new();
    report.insert("key".to_string(), json!(key));

    if !args.has_action() {
        let task = session.task(&key).with_context(|| format!("failed to fetch {key}"))?;
        if json {
            return print_json(&task);
        }
        println!("{}", task.key);
        println!("  summary: {}", task.summary.as_deref().unwrap_or("-"));
        println!("  status:  {}", task.status.as_deref().unwrap_or("-"));
        println!("  type:    {}", task.task_type.as_deref().unwrap_or("-"));
        println!("  minutes: {}", task.elapsed_minutes(now));
        return Ok(());
    }

    if args.push {
        let message = session
            .push(&key, &args.dir)
            .with_context(|| format!("failed to push {key}"))?;
        if !json {
            println!("Pushed {key}: {message}");
        }
        report.insert("pushed".to_string(), json!(message));
    }

    if args.init {
        let checkout = session.init(&key, &args.dir)?;
        if !json {
            match &checkout.cloned_from {
                Some(url) => println!("Creating new repo at {} from {url}", checkout.dir.display()),
                None => println!("{} already exists locally.", checkout.dir.display()),
            }
            for line in &checkout.output {
                println!("{line}");
            }
        }
        report.insert(
            "init".to_string(),
            json!({
                "dir": checkout.dir,
                "cloned_from": checkout.cloned_from,
                "branch": checkout.branch,
            }),
        );
    }

    if args.workon {
        let (task, stopped) = session
            .workon(&key, now)
            .with_context(|| format!("failed to start {key}"))?;
        if !json {
            report_stopped(&stopped);
            println!("Working on {key} ({})", task.status.as_deref().unwrap_or("-"));
        }
        report.insert("workon".to_string(), json!({ "stopped": stopped_json(&stopped) }));
    }

    if let Some(status) = args.move_to {
        if !json {
            println!("Moving {key} to {status}");
        }
        let stopped = session
            .move_task(&key, status, now)
            .with_context(|| format!("failed to move {key}"))?;
        if !json {
            report_stopped(&stopped);
        }
        report.insert(
            "moved".to_string(),
            json!({ "status": status, "stopped": stopped_json(&stopped) }),
        );
    }

    if args.request {
        if !json {
            println!("Opening PR for {key}");
        }
        let link = session
            .open_pr(&key)
            .with_context(|| format!("failed to open a pull request for {key}"))?;
        if !json {
            println!("Pull request created: {link}");
        }
        report.insert("pull_request".to_string(), json!(link));
    }

    if let Some(mins) = args.log_time {
        if !json {
            println!("Logging {mins} minutes on {key}");
        }
        session
            .log_time(&key, mins, now)
            .with_context(|| format!("failed to log time on {key}"))?;
        report.insert("logged_minutes".to_string(), json!(mins));
    }

    if json {
        print_json(&report)?;
    }
    Ok(())
}
