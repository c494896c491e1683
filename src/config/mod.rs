//! Configuration module for the welcome bot.
//!
//! Process settings come from environment variables. The welcome
//! behaviour itself lives in a JSON file, see [`WelcomeConfig`].

mod welcome;

pub use welcome::WelcomeConfig;

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // OneBot
    pub api_url: Url,
    pub access_token: Option<String>,
    pub api_timeout: Duration,

    /// Address the event webhook listens on.
    pub listen_addr: SocketAddr,

    /// Path of the welcome settings JSON file.
    pub welcome_config_path: PathBuf,

    /// Locale for the built-in default greeting.
    pub locale: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every variable has a default; only unparsable values are errors.
    /// Expects `.env` to have been loaded already (see `main`).
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = env::var("ONEBOT_API_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:3000".to_string());
        let api_url = Url::parse(&api_url)?;

        let access_token = env::var("ONEBOT_ACCESS_TOKEN")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let host = match env::var("WEBHOOK_HOST") {
            Ok(raw) => raw
                .trim()
                .parse::<IpAddr>()
                .map_err(|_| ConfigError::InvalidEnv { name: "WEBHOOK_HOST", value: raw })?,
            Err(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
        };
        let port = parse_env_or("WEBHOOK_PORT", 8080u16)?;
        let api_timeout = Duration::from_secs(parse_env_or("API_TIMEOUT_SECS", 10u64)?);

        let welcome_config_path = env::var("WELCOME_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("welcome.json"));

        let locale = crate::i18n::resolve_locale(env::var("WELCOME_LOCALE").ok().as_deref());

        Ok(Self {
            api_url,
            access_token,
            api_timeout,
            listen_addr: SocketAddr::new(host, port),
            welcome_config_path,
            locale,
        })
    }
}

/// Parse a numeric environment variable, falling back when unset.
fn parse_env_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidEnv { name, value: raw }),
        Err(_) => Ok(default),
    }
}
