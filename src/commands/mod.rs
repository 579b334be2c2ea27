//! CLI command implementations.

mod clean;
mod config;
mod info;
mod install;
mod list;
mod remove;
mod search;
mod update;

pub use clean::CleanCmd;
pub use config::ConfigCmd;
pub use info::InfoCmd;
pub use install::InstallCmd;
pub use list::ListCmd;
pub use remove::RemoveCmd;
pub use search::SearchCmd;
pub use update::UpdateCmd;

use anyhow::Result;

use crate::local::{self, LocalConfig, LocalDb};
use crate::repo::{CacheStore, RepoApi};

/// Shared handles the commands operate on.
pub(crate) struct App {
    pub config: LocalConfig,
    pub db: LocalDb,
    pub api: RepoApi,
}

pub(crate) async fn open_app() -> Result<App> {
    let config = LocalConfig::load()?;
    let db = LocalDb::open(&local::db_path()?).await?;
    let api = RepoApi::new(
        CacheStore::Sqlite(db.clone()),
        config.cache_ttl(),
        config.curseforge_api_key_secret(),
    );
    Ok(App { config, db, api })
}
