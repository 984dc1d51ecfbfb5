pub mod analyze;
pub mod config;
pub mod context;
pub mod group;
pub mod init;
pub mod log;
pub mod module;

use anyhow::Context as _;
use dev_core::{config::Config, group::FsGroupStore, module::FsModuleStore};
use std::path::{Path, PathBuf};

/// Stores and configuration for one project root, loaded fresh per command.
pub struct Project {
    pub root: PathBuf,
    pub config: Config,
}

impl Project {
    pub fn load(root: &Path) -> anyhow::Result<Self> {
        let config = Config::load(root).context("failed to load .dev/config.yaml")?;
        Ok(Self {
            root: root.to_path_buf(),
            config,
        })
    }

    pub fn modules(&self) -> FsModuleStore {
        FsModuleStore::from_config(&self.root, &self.config)
    }

    pub fn groups(&self) -> FsGroupStore {
        FsGroupStore::for_root(&self.root)
    }
}
