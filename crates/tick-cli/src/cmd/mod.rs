pub mod config;
pub mod status;
pub mod stop;
pub mod task;

use anyhow::Context;
use tick_core::config::ConfigFile;
use tick_core::git::GitCli;
use tick_core::hosting::BitbucketClient;
use tick_core::session::Session;
use tick_core::store::ConfigFileStore;
use tick_core::tracker::JiraClient;
use std::path::Path;

/// Everything a [`Session`] borrows, built from the config file.
pub struct Services {
    config: ConfigFile,
    store: ConfigFileStore,
    tracker: JiraClient,
    host: BitbucketClient,
    git: GitCli,
}

impl Services {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config = ConfigFile::load(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let server = config.server()?;
        let tracker = JiraClient::new(server).context("failed to build tracker client")?;
        let host = BitbucketClient::new(server).context("failed to build source host client")?;
        Ok(Self {
            store: ConfigFileStore::new(path),
            tracker,
            host,
            git: GitCli::new(),
            config,
        })
    }

    pub fn session(&mut self) -> anyhow::Result<Session<'_>> {
        let server = self.config.server()?;
        Ok(Session::new(
            &self.config.rules,
            &server.target_branch,
            &mut self.store,
            &self.tracker,
            &self.host,
            &self.git,
        ))
    }
}
