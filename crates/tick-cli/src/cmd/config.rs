use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use serde_json::json;
use std::io::{BufRead, Write};
use std::path::Path;
use std::process::Command;
use tick_core::config::{ConfigFile, ServerConfig};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Store server credentials, prompting for any not given
    Init {
        /// Jira base URL
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },

    /// Open the config file in $VISUAL or $EDITOR
    Edit,

    /// Show the config path and non-secret settings
    Show,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(path: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Init {
            url,
            username,
            password,
        } => init(path, url, username, password, json),
        ConfigSubcommand::Edit => edit(path),
        ConfigSubcommand::Show => show(path, json),
    }
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

fn init(
    path: &Path,
    url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let existing = ConfigFile::load(path)
        .with_context(|| format!("failed to read {}", path.display()))?
        .config;
    let previous = |f: fn(&ServerConfig) -> &str| existing.as_ref().map(|c| f(c).to_string());

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let url = match url {
        Some(u) => u,
        None => prompt(&mut input, "url", previous(|c| c.url.as_str()))?,
    };
    let username = match username {
        Some(u) => u,
        None => prompt(&mut input, "username", previous(|c| c.username.as_str()))?,
    };
    let password = match password {
        Some(p) => p,
        None => prompt(&mut input, "password", previous(|c| c.password.as_str()))?,
    };

    let mut server = ServerConfig::new(url, username, password);
    if let Some(prev) = &existing {
        server.bitbucket_url = prev.bitbucket_url.clone();
        server.target_branch = prev.target_branch.clone();
    }
    ConfigFile::update(path, |cfg| cfg.config = Some(server))
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::debug!(path = %path.display(), "saved credentials");

    if json {
        print_json(&json!({ "path": path }))?;
    } else {
        println!(
            "Credentials will be saved locally! If you wish to configure other values use 'tick config edit'"
        );
        println!("Saved {}", path.display());
    }
    Ok(())
}

/// Ask for `label` on stdin. An empty answer keeps `default`.
fn prompt(input: &mut impl BufRead, label: &str, default: Option<String>) -> anyhow::Result<String> {
    match &default {
        Some(d) if label != "password" => eprint!("{label} [{d}]: "),
        Some(_) => eprint!("{label} [unchanged]: "),
        None => eprint!("{label}: "),
    }
    std::io::stderr().flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let answer = line.trim();
    if !answer.is_empty() {
        return Ok(answer.to_string());
    }
    default.with_context(|| format!("a value for {label} is required"))
}

// ---------------------------------------------------------------------------
// edit
// ---------------------------------------------------------------------------

fn edit(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        ConfigFile::default()
            .save(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
    }

    let editor = ["VISUAL", "EDITOR"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|v| !v.trim().is_empty());

    match editor {
        Some(editor) => {
            let mut parts = editor.split_whitespace();
            let program = parts.next().unwrap_or_default();
            let status = Command::new(program)
                .args(parts)
                .arg(path)
                .status()
                .with_context(|| format!("failed to launch editor '{editor}'"))?;
            if !status.success() {
                anyhow::bail!("editor '{editor}' exited with {status}");
            }
        }
        None => open::that(path).with_context(|| format!("failed to open {}", path.display()))?,
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(path: &Path, json: bool) -> anyhow::Result<()> {
    let cfg = ConfigFile::load(path).with_context(|| format!("failed to read {}", path.display()))?;
    let server = cfg.config.as_ref();

    if json {
        let value = json!({
            "path": path,
            "configured": server.is_some(),
            "url": server.map(|s| s.jira_url()),
            "username": server.map(|s| &s.username),
            "bitbucket_url": server.map(|s| s.bitbucket_url()),
            "target_branch": server.map(|s| &s.target_branch),
            "rules": cfg.rules,
            "current_task": cfg.current_task.as_ref().map(|t| &t.key),
        });
        return print_json(&value);
    }

    println!("path:          {}", path.display());
    match server {
        Some(s) => {
            println!("url:           {}", s.jira_url());
            println!("username:      {}", s.username);
            println!("bitbucket_url: {}", s.bitbucket_url());
            println!("target_branch: {}", s.target_branch);
        }
        None => println!("not configured: run 'tick config init'"),
    }
    if let Some(task) = &cfg.current_task {
        println!("current task:  {}", task.key);
    }
    if !cfg.rules.is_empty() {
        println!("rules:");
        print!("{}", format_rules(&cfg)?);
    }
    Ok(())
}

fn format_rules(cfg: &ConfigFile) -> anyhow::Result<String> {
    let value = serde_json::to_value(&cfg.rules)?;
    let mut out = String::new();
    if let Some(attrs) = value.as_object() {
        for (attr, overrides) in attrs {
            out.push_str(&format!("  {attr}:\n"));
            for (name, v) in overrides.as_object().into_iter().flatten() {
                out.push_str(&format!("    {name}: {}\n", v.as_str().unwrap_or_default()));
            }
        }
    }
    Ok(out)
}
