//! Bot configuration (`underhive.toml`).
//!
//! ```toml
//! log_filter = "underhive=debug"
//!
//! [discord]
//! token = "..."            # or DISCORD_BOT_TOKEN
//! owners = [123456789012345678]
//!
//! [storage]
//! database_path = "necromunda.db"   # or UNDERHIVE_DATABASE
//!
//! [market]
//! catalog_path = "Trading Post.csv"
//! trading_post_size = 20
//! stash_size = 5
//! ```
//!
//! Every section and key is optional; a missing file means all defaults.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use underhive_economy::MarketConfig;

/// Default tracing directive when neither `RUST_LOG` nor `log_filter` is set.
pub const DEFAULT_LOG_FILTER: &str = "underhive=info";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Discord connection.
    pub discord: DiscordConfig,
    /// SQLite location.
    pub storage: StorageConfig,
    /// Catalog and market generation.
    pub market: MarketSettings,
    /// Extra tracing directive, e.g. `underhive=debug`.
    pub log_filter: Option<String>,
}

/// `[discord]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Bot token.
    pub token: Option<String>,
    /// User ids allowed to run `/admin` commands.
    pub owners: Vec<u64>,
}

/// `[storage]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file.
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("necromunda.db"),
        }
    }
}

/// `[market]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MarketSettings {
    /// Trading post CSV.
    pub catalog_path: PathBuf,
    /// Generator tuning.
    #[serde(flatten)]
    pub generator: MarketConfig,
}

impl Default for MarketSettings {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("Trading Post.csv"),
            generator: MarketConfig::default(),
        }
    }
}

impl Config {
    /// Parses configuration text.
    ///
    /// # Errors
    ///
    /// Fails on invalid TOML or wrongly typed keys.
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("invalid configuration")
    }

    /// Loads `path`, or the defaults if the file does not exist.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::info!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("in {}", path.display()))
    }

    /// The bot token.
    ///
    /// # Errors
    ///
    /// Fails when no token was configured.
    pub fn token(&self) -> anyhow::Result<&str> {
        self.discord
            .token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .context("no Discord token: set DISCORD_BOT_TOKEN or [discord].token")
    }

    /// Directive for the tracing `EnvFilter`.
    #[must_use]
    pub fn log_directive(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.market.generator, MarketConfig::default());
        assert_eq!(config.log_directive(), DEFAULT_LOG_FILTER);
        assert!(config.token().is_err());
    }

    #[test]
    fn test_partial_config() {
        let config = Config::from_toml(
            r#"
            log_filter = "underhive=debug"

            [discord]
            token = "abc"
            owners = [42]

            [market]
            catalog_path = "data/items.csv"
            stash_size = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.token().unwrap(), "abc");
        assert_eq!(config.discord.owners, vec![42]);
        assert_eq!(config.market.catalog_path, PathBuf::from("data/items.csv"));
        assert_eq!(config.market.generator.stash_size, 3);
        assert_eq!(config.market.generator.trading_post_size, 20);
        assert_eq!(config.storage.database_path, PathBuf::from("necromunda.db"));
        assert_eq!(config.log_directive(), "underhive=debug");
    }

    #[test]
    fn test_bad_types_rejected() {
        assert!(Config::from_toml("[discord]\nowners = \"me\"").is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, Config::default());
    }
}
