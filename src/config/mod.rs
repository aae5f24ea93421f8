//! # Configuration
//!
//! TOML configuration for the ranvale binary.
//!
//! ```toml
//! [storage]
//! data_dir = "./data"
//!
//! [logging]
//! level = "info"
//! file = "ranvale.log"
//!
//! [player]
//! starting_location = 1
//! locale = "en"
//!
//! [security.argon2]
//! memory_kib = 19456
//! time_cost = 2
//! parallelism = 1
//! ```
//!
//! Every section except `[storage]` may be omitted.

use anyhow::{anyhow, Result};
use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub security: Option<SecurityConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
    /// Sled directory for player records; defaults to `<data_dir>/players`.
    #[serde(default)]
    pub players_db_path: Option<String>,
}

impl StorageConfig {
    pub fn players_path(&self) -> PathBuf {
        match &self.players_db_path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(&self.data_dir).join("players"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Defaults applied to newly created characters.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlayerConfig {
    /// Room vnum new characters start in.
    #[serde(default)]
    pub starting_location: Option<u32>,
    #[serde(default)]
    pub locale: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Argon2Config {
    #[serde(default)]
    pub memory_kib: Option<u32>,
    #[serde(default)]
    pub time_cost: Option<u32>,
    #[serde(default)]
    pub parallelism: Option<u32>,
}

impl Argon2Config {
    /// Argon2id hasher with any unset cost falling back to the crate default.
    pub fn hasher(&self) -> Result<Argon2<'static>> {
        let base = Params::DEFAULT;
        let params = Params::new(
            self.memory_kib.unwrap_or(base.m_cost()),
            self.time_cost.unwrap_or(base.t_cost()),
            self.parallelism.unwrap_or(base.p_cost()),
            None,
        )
        .map_err(|e| anyhow!("Invalid argon2 parameters: {}", e))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SecurityConfig {
    #[serde(default)]
    pub argon2: Option<Argon2Config>,
}

impl Config {
    /// Load configuration from a TOML file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Write a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Password hasher honouring `[security.argon2]`.
    pub fn password_hasher(&self) -> Result<Argon2<'static>> {
        match self.security.as_ref().and_then(|s| s.argon2.as_ref()) {
            Some(a) => a.hasher(),
            None => Ok(Argon2::default()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                data_dir: "./data".to_string(),
                players_db_path: None,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("ranvale.log".to_string()),
            },
            player: PlayerConfig {
                starting_location: Some(1),
                locale: Some("en".to_string()),
            },
            security: Some(SecurityConfig::default()),
        }
    }
}
