//! Error types.

use thiserror::Error;

/// Errors raised while loading process configuration.
///
/// Only fatal problems end up here. Bad values inside the welcome
/// settings degrade to defaults with a warning instead.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable is set but cannot be parsed.
    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    /// The OneBot API base URL is not a valid URL.
    #[error("invalid ONEBOT_API_URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The welcome config file exists but cannot be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The welcome config file is not valid JSON.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from OneBot HTTP API calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (connect, timeout, body).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status from the OneBot implementation.
    #[error("{action} returned HTTP {status}")]
    Status {
        action: &'static str,
        status: reqwest::StatusCode,
    },

    /// The call reached OneBot but it reported a failure.
    #[error("{action} failed with retcode {retcode}: {message}")]
    Retcode {
        action: &'static str,
        retcode: i64,
        message: String,
    },

    /// The response `data` field did not have the expected shape.
    #[error("unexpected response for {action}: {source}")]
    Decode {
        action: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
