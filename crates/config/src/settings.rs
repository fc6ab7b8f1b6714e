use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub channels: ChannelSettings,
    pub ws: WsSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseBackend {
    Memory,
    Mongo,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub backend: DatabaseBackend,
    pub url: String,
    pub name: String,
    pub max_pool_size: Option<u32>,
    pub min_pool_size: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_ttl_secs: u64,
    pub issuer: String,
}

/// How idle channels get removed.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryMode {
    /// Periodic scan comparing `last_active_at` against the threshold.
    Sweep,
    /// One debounced deletion task per channel, rescheduled on every post.
    Timer,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChannelSettings {
    pub inactivity_threshold_secs: u64,
    pub expiry_mode: ExpiryMode,
    pub sweep_interval_secs: u64,
    pub kick_vote_quorum: u64,
}

impl ChannelSettings {
    pub fn inactivity_threshold(&self) -> Duration {
        Duration::from_secs(self.inactivity_threshold_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            inactivity_threshold_secs: 30 * 24 * 60 * 60,
            expiry_mode: ExpiryMode::Sweep,
            sweep_interval_secs: 3600,
            kick_vote_quorum: 3,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WsSettings {
    /// Per-connection outbound queue; events beyond it are dropped for that connection.
    pub outbound_buffer: usize,
}

impl Default for WsSettings {
    fn default() -> Self {
        Self { outbound_buffer: 256 }
    }
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .prefix("HUDDLE"),
            )
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 3000)?
            .set_default("app.cors_origins", Vec::<String>::new())?
            .set_default("database.backend", "memory")?
            .set_default("database.url", "mongodb://localhost:27017")?
            .set_default("database.name", "huddle")?
            .set_default("jwt.secret", "change-me-in-production")?
            .set_default("jwt.access_token_ttl_secs", 3600)?
            .set_default("jwt.issuer", "huddle")?
            .set_default("channels.inactivity_threshold_secs", 30 * 24 * 60 * 60)?
            .set_default("channels.expiry_mode", "sweep")?
            .set_default("channels.sweep_interval_secs", 3600)?
            .set_default("channels.kick_vote_quorum", 3)?
            .set_default("ws.outbound_buffer", 256)?
            .build()?;

        config.try_deserialize()
    }
}
