use crate::model::UserId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

fn default_schema_version() -> u32 {
    1
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("api_base_url is not a valid url: {0}")]
    BaseUrl(#[from] url::ParseError),
    #[error("api_base_url must use http or https, got {0}")]
    Scheme(String),
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub request_timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub progress_tick_ms: u64,
    pub auto_advance: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            progress_tick_ms: 1_000,
            auto_advance: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub api_base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub log_level: String,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub player: PlayerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            api_base_url: "http://localhost:8080".to_string(),
            user_id: None,
            log_level: "warn".to_string(),
            http: HttpConfig::default(),
            player: PlayerConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.api_base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Scheme(url.scheme().to_string()));
        }
        if self.http.request_timeout_ms == 0 {
            return Err(ConfigError::ZeroInterval("http.request_timeout_ms"));
        }
        if self.player.progress_tick_ms == 0 {
            return Err(ConfigError::ZeroInterval("player.progress_tick_ms"));
        }
        Ok(())
    }
}
