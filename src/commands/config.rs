//! Config command - manage local configuration.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Args, Subcommand};

use crate::local::LocalConfig;
use crate::types::MinecraftVersion;

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub command: ConfigSubCmd,
}

#[derive(Subcommand)]
pub enum ConfigSubCmd {
    /// Set the mods directory mods are installed into
    SetModsDir(SetModsDirCmd),

    /// Set the default game version, e.g. 1.20.1
    SetGameVersion(SetGameVersionCmd),

    /// Set the default mod loader (fabric, forge, quilt, ...)
    SetLoader(SetLoaderCmd),

    /// Set the CurseForge API key
    SetCfKey(SetCfKeyCmd),

    /// Set how long cached API responses stay fresh, in seconds
    SetCacheTtl(SetCacheTtlCmd),

    /// Show current configuration
    Show,
}

#[derive(Args)]
pub struct SetModsDirCmd {
    /// Directory path
    pub dir: PathBuf,
}

#[derive(Args)]
pub struct SetGameVersionCmd {
    /// Game version, e.g. 1.20.1
    pub version: String,
}

#[derive(Args)]
pub struct SetLoaderCmd {
    /// Loader name, e.g. fabric
    pub loader: String,
}

#[derive(Args)]
pub struct SetCfKeyCmd {
    /// API key from the CurseForge developer console
    pub key: String,
}

#[derive(Args)]
pub struct SetCacheTtlCmd {
    /// Freshness window in seconds
    pub seconds: u64,
}

impl ConfigCmd {
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            ConfigSubCmd::SetModsDir(cmd) => {
                let mut config = LocalConfig::load()?;
                config.mods_dir = Some(cmd.dir.clone());
                config.save()?;
                println!("Mods directory set to: {}", cmd.dir.display());
            }
            ConfigSubCmd::SetGameVersion(cmd) => {
                if MinecraftVersion::parse(&cmd.version).is_none() {
                    bail!("not a game version: {}", cmd.version);
                }
                let mut config = LocalConfig::load()?;
                config.game_version = Some(cmd.version.clone());
                config.save()?;
                println!("Game version set to: {}", cmd.version);
            }
            ConfigSubCmd::SetLoader(cmd) => {
                let mut config = LocalConfig::load()?;
                config.loader = cmd.loader.to_lowercase();
                config.save()?;
                println!("Loader set to: {}", config.loader);
            }
            ConfigSubCmd::SetCfKey(cmd) => {
                let mut config = LocalConfig::load()?;
                config.set_curseforge_key(cmd.key.clone());
                config.save()?;
                println!("CurseForge API key saved.");
            }
            ConfigSubCmd::SetCacheTtl(cmd) => {
                let mut config = LocalConfig::load()?;
                config.cache_ttl_secs = cmd.seconds;
                config.save()?;
                println!("Cache TTL set to: {}s", cmd.seconds);
            }
            ConfigSubCmd::Show => {
                let config = LocalConfig::load()?;
                println!("Config: {}", LocalConfig::config_path()?.display());
                println!();
                println!("mods_dir:      {}", config.mods_dir()?.display());
                println!(
                    "game_version:  {}",
                    config.game_version.as_deref().unwrap_or("(not set)")
                );
                println!("loader:        {}", config.loader);
                println!("cache_ttl:     {}s", config.cache_ttl_secs);
                println!(
                    "cf_api_key:    {}",
                    if config.has_curseforge_key() {
                        "(set)"
                    } else {
                        "(not set)"
                    }
                );
            }
        }
        Ok(())
    }
}
