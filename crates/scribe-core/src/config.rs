//! Configuration system for Scribe.
//!
//! Two mappings drive the pipeline: channel id -> archive repository and
//! user id -> preferred display name. Both are loaded at startup and
//! hot-reloadable through [`ConfigHandle::reload`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::event::{ChannelId, UserId};

/// Main configuration struct for Scribe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bot behavior settings
    pub bot: BotConfig,
    /// Archive backend settings
    pub github: GithubConfig,
    /// Channel id (decimal string) -> "owner/repo" archive target
    pub channel_repos: HashMap<String, String>,
    /// User id (decimal string) -> preferred display name
    pub display_names: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig::default(),
            github: GithubConfig::default(),
            channel_repos: HashMap::new(),
            display_names: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Substring that triggers a single-message save on a quoted reply
    pub save_keyword: String,
    /// Substring that triggers a history listing
    pub browse_keyword: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            save_keyword: "save".to_string(),
            browse_keyword: "browse".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GithubConfig {
    /// API token (can be set directly or via environment)
    pub token: Option<String>,
    /// Environment variable name holding the token
    pub token_env: Option<String>,
    /// Base URL override (for GitHub Enterprise or tests)
    pub api_base: Option<String>,
}

impl GithubConfig {
    /// Resolve the token from the direct value, the configured variable,
    /// or the `SCRIBE_GITHUB_TOKEN` environment variable.
    pub fn resolve_token(&self) -> Option<String> {
        if let Some(ref token) = self.token {
            return Some(token.clone());
        }
        if let Some(ref env_var) = self.token_env {
            if let Ok(token) = std::env::var(env_var) {
                return Some(token);
            }
        }
        std::env::var("SCRIBE_GITHUB_TOKEN").ok()
    }
}

impl Config {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment(None).extract()
    }

    /// Load configuration, merging `path` over the standard sources.
    pub fn load_from(path: &Path) -> Result<Self, figment::Error> {
        Self::figment(Some(path)).extract()
    }

    fn figment(extra: Option<&Path>) -> Figment {
        let mut figment = Figment::new()
            // Default values
            .merge(Serialized::defaults(Config::default()))
            // User config
            .merge(Toml::file(Self::config_dir().join("config.toml")))
            // Project config
            .merge(Toml::file(".scribe/config.toml"));
        if let Some(path) = extra {
            figment = figment.merge(Toml::file(path));
        }
        // Environment variables; double underscore separates nesting so
        // map keys keep their own underscores
        figment.merge(Env::prefixed("SCRIBE_").split("__"))
    }

    /// Load and validate configuration.
    pub fn load_validated(extra: Option<&Path>) -> Result<Self, Error> {
        let config = Self::figment(extra)
            .extract::<Config>()
            .map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), Error> {
        if self.bot.save_keyword.is_empty() {
            return Err(Error::Config("bot.save_keyword cannot be empty".into()));
        }
        if self.bot.browse_keyword.is_empty() {
            return Err(Error::Config("bot.browse_keyword cannot be empty".into()));
        }
        if let Some(ref base) = self.github.api_base {
            if !base.starts_with("http://") && !base.starts_with("https://") {
                return Err(Error::Config(
                    "github.api_base must start with http:// or https://".into(),
                ));
            }
        }
        for (channel, repo) in &self.channel_repos {
            if !repo.contains('/') {
                return Err(Error::Config(format!(
                    "channel_repos.{channel}: '{repo}' is not an owner/repo pair"
                )));
            }
        }
        Ok(())
    }

    /// Archive repository configured for a channel, if any.
    pub fn repo_for(&self, channel: ChannelId) -> Option<&str> {
        self.channel_repos
            .get(&channel.to_string())
            .map(String::as_str)
    }

    /// Preferred display name configured for a user, if any.
    pub fn display_name_for(&self, user: UserId) -> Option<&str> {
        self.display_names
            .get(&user.to_string())
            .map(String::as_str)
    }

    /// Get the configuration directory.
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join("scribe"))
            .unwrap_or_else(|| PathBuf::from("~/.config/scribe"))
    }
}

/// Shared, hot-reloadable configuration handle.
#[derive(Clone)]
pub struct ConfigHandle {
    inner: Arc<RwLock<Config>>,
    extra_path: Option<PathBuf>,
}

impl ConfigHandle {
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
            extra_path: None,
        }
    }

    /// Remember an extra config path so reloads merge the same sources as
    /// the initial load.
    pub fn with_extra_path(mut self, path: Option<PathBuf>) -> Self {
        self.extra_path = path;
        self
    }

    /// Snapshot of the current configuration.
    pub fn get(&self) -> Config {
        self.inner.read().clone()
    }

    /// Re-read configuration from disk and swap it in.
    pub fn reload(&self) -> Result<(), Error> {
        let fresh = Config::load_validated(self.extra_path.as_deref())?;
        *self.inner.write() = fresh;
        Ok(())
    }

    pub fn repo_for(&self, channel: ChannelId) -> Option<String> {
        self.inner.read().repo_for(channel).map(str::to_string)
    }

    pub fn display_name_for(&self, user: UserId) -> Option<String> {
        self.inner.read().display_name_for(user).map(str::to_string)
    }

    pub fn save_keyword(&self) -> String {
        self.inner.read().bot.save_keyword.clone()
    }

    pub fn browse_keyword(&self) -> String {
        self.inner.read().bot.browse_keyword.clone()
    }

    pub fn github_token(&self) -> Option<String> {
        self.inner.read().github.resolve_token()
    }

    pub fn api_base(&self) -> Option<String> {
        self.inner.read().github.api_base.clone()
    }
}
