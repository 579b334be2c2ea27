//! Local configuration management.
//!
//! Config is stored at `~/.config/modget/config.toml` and contains:
//! - the mods directory files are installed into
//! - default game version / loader used for version selection
//! - cache freshness window
//! - CurseForge API key

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

const CONFIG_DIR: &str = "modget";
const CONFIG_FILE: &str = "config.toml";

/// Local configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Directory mod files are installed into (default: ~/.minecraft/mods).
    #[serde(default)]
    pub mods_dir: Option<PathBuf>,

    /// Game version used to pick compatible mod versions, e.g. "1.20.1".
    #[serde(default)]
    pub game_version: Option<String>,

    /// Mod loader used to pick compatible mod versions (default: fabric).
    #[serde(default = "default_loader")]
    pub loader: String,

    /// How long a cached API response counts as fresh, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// CurseForge API key. Marketplace requests fail without one.
    #[serde(default)]
    pub curseforge_api_key: Option<String>,
}

fn default_loader() -> String {
    "fabric".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    60 * 60 * 24
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            mods_dir: None,
            game_version: None,
            loader: default_loader(),
            cache_ttl_secs: default_cache_ttl_secs(),
            curseforge_api_key: None,
        }
    }
}

impl LocalConfig {
    /// Load config from the default location.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).context("failed to read config file")?;

        toml::from_str(&content).context("failed to parse config file")
    }

    /// Save config to the default location.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("failed to serialize config")?;

        std::fs::write(&path, content).context("failed to write config file")
    }

    /// Cache freshness window.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// The mods directory, defaulting to `~/.minecraft/mods`.
    pub fn mods_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.mods_dir {
            return Ok(dir.clone());
        }
        let home = dirs::home_dir().context("could not determine home directory")?;
        Ok(home.join(".minecraft").join("mods"))
    }

    /// Get the CurseForge API key as a SecretString.
    pub fn curseforge_api_key_secret(&self) -> Option<SecretString> {
        self.curseforge_api_key.clone().map(SecretString::from)
    }

    /// Check if the config has a CurseForge API key.
    pub fn has_curseforge_key(&self) -> bool {
        self.curseforge_api_key
            .as_ref()
            .map(|k| !k.is_empty())
            .unwrap_or(false)
    }

    /// Set the CurseForge API key.
    pub fn set_curseforge_key(&mut self, key: String) {
        self.curseforge_api_key = Some(key);
    }

    /// Get the config file path.
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("could not determine config directory")?;

        Ok(config_dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LocalConfig::default();
        assert!(config.mods_dir.is_none());
        assert_eq!(config.loader, "fabric");
        assert_eq!(config.cache_ttl_secs, 86400);
        assert!(!config.has_curseforge_key());
    }

    #[test]
    fn test_has_curseforge_key() {
        let mut config = LocalConfig::default();
        assert!(!config.has_curseforge_key());

        config.set_curseforge_key("$2a$10$test".to_string());
        assert!(config.has_curseforge_key());
    }

    #[test]
    fn test_serialize_deserialize() {
        let mut config = LocalConfig::default();
        config.set_curseforge_key("$2a$10$test".to_string());
        config.game_version = Some("1.20.1".to_string());

        let toml_str = toml::to_string(&config).unwrap();
        let parsed: LocalConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.curseforge_api_key, config.curseforge_api_key);
        assert_eq!(parsed.game_version, config.game_version);
        assert_eq!(parsed.loader, config.loader);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let parsed: LocalConfig = toml::from_str("").unwrap();
        assert_eq!(parsed.loader, "fabric");
        assert_eq!(parsed.cache_ttl_secs, 86400);
    }
}
