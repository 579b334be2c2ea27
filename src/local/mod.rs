//! Local state: configuration and the installed/cache database.
//!
//! State lives in the user data directory, e.g.
//! `~/.local/share/modget/modget.db` on Linux:
//! - `installed_projects` - what is on disk, written by install/remove/update
//! - `api_cache` - cached upstream responses, written only by the repo
//!   request context

mod config;
mod db;
pub mod models;

pub use config::LocalConfig;
pub use db::LocalDb;

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Directory name under the platform data dir.
pub const DATA_DIR_NAME: &str = "modget";

/// Database file name inside the data directory.
pub const DB_FILE_NAME: &str = "modget.db";

/// The modget data directory.
pub fn data_dir() -> Result<PathBuf> {
    let dir = dirs::data_dir().context("could not determine user data directory")?;
    Ok(dir.join(DATA_DIR_NAME))
}

/// Path of the local database.
pub fn db_path() -> Result<PathBuf> {
    Ok(data_dir()?.join(DB_FILE_NAME))
}
