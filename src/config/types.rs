//! Core configuration types and loading.

use super::defaults::{default_api_base, default_true};
use super::listen::HttpConfig;
use super::tickets::{EmojiConfig, TicketsConfig};
use super::validation::{ValidationError, validate};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use ticketd_proto::{ApplicationId, ChannelId, RoleId};

/// Environment variable that overrides `bot.token`.
pub const TOKEN_ENV: &str = "TICKETD_TOKEN";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Invalid(Vec<ValidationError>),
}

/// Daemon configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Bot identity and credentials.
    pub bot: BotConfig,
    /// Interactions endpoint.
    #[serde(default)]
    pub http: HttpConfig,
    /// Ticket behaviour.
    #[serde(default)]
    pub tickets: TicketsConfig,
    /// Control-button emojis.
    #[serde(default)]
    pub emojis: EmojiConfig,
}

impl Config {
    /// Load configuration from a TOML file, apply environment overrides and
    /// validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&content)?;
        config.apply_token_override(std::env::var(TOKEN_ENV).ok());
        validate(&config).map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Parse without validation.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Replace the configured token with a non-blank override.
    pub fn apply_token_override(&mut self, token: Option<String>) {
        if let Some(token) = token.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
            self.bot.token = token;
        }
    }
}

/// Bot identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Application id; also the bot's user id.
    pub application_id: ApplicationId,
    /// Hex-encoded Ed25519 key used to verify interaction requests.
    pub public_key: String,
    /// Bot token. Prefer the `TICKETD_TOKEN` environment variable.
    #[serde(default)]
    pub token: String,
    /// Role treated as administrator in addition to the built-in permission.
    #[serde(default)]
    pub admin_role_id: Option<RoleId>,
    /// Channel that receives audit lines.
    #[serde(default)]
    pub log_channel_id: Option<ChannelId>,
    /// REST base URL (default: https://discord.com/api/v10).
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Register guild slash commands at startup (default: true).
    #[serde(default = "default_true")]
    pub register_commands: bool,
}
