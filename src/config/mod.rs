use std::env;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_BOX_API_URL: &str = "https://api.box.com/2.0";
const DEFAULT_BOX_AUTH_URL: &str = "https://api.box.com/oauth2/token";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// 远程存储服务的应用凭据
#[derive(Debug, Clone, serde::Deserialize)]
pub struct BoxConfig {
    pub client_id: String,
    pub client_secret: String,
    pub enterprise_id: String,
    pub public_key_id: String,
    pub private_key: String,
    pub api_url: String,
    pub auth_url: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub session_ttl_secs: u64,
    pub cookie_secure: bool,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: u32,
    pub remote: BoxConfig,
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn optional(name: &'static str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

/// `24h` 和 `24` 都按小时解析
fn parse_hours(value: &str) -> Option<u64> {
    value.trim().trim_end_matches('h').parse::<u64>().ok()
}

impl BoxConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(BoxConfig {
            client_id: required("BOX_CLIENT_ID")?,
            client_secret: required("BOX_CLIENT_SECRET")?,
            enterprise_id: required("BOX_ENTERPRISE_ID")?,
            public_key_id: required("BOX_PUBLIC_KEY_ID")?,
            // 环境变量里的换行通常被写成字面量 \n
            private_key: required("BOX_PRIVATE_KEY")?.replace("\\n", "\n"),
            api_url: optional("BOX_API_URL").unwrap_or_else(|| DEFAULT_BOX_API_URL.into()),
            auth_url: optional("BOX_AUTH_URL").unwrap_or_else(|| DEFAULT_BOX_AUTH_URL.into()),
        })
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let session_ttl_hours = match optional("SESSION_TTL") {
            Some(value) => parse_hours(&value).ok_or(ConfigError::Invalid {
                name: "SESSION_TTL",
                value,
            })?,
            None => 24,
        };

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            redis_url: required("REDIS_URL")?,
            server_host: optional("SERVER_HOST").unwrap_or_else(|| "::".into()),
            server_port: parse_or("SERVER_PORT", 3000)?,
            api_base_uri: optional("API_BASE_URI").unwrap_or_else(|| "/api".into()),
            session_ttl_secs: session_ttl_hours * 3600,
            cookie_secure: parse_or("COOKIE_SECURE", false)?,
            rate_limit_window_secs: parse_or("RATE_LIMIT_WINDOW", 60)?,
            rate_limit_requests: parse_or("RATE_LIMIT_REQUESTS", 100)?,
            remote: BoxConfig::from_env()?,
        })
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}
