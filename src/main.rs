//! Welcomer - QQ group welcome bot over OneBot v11
//!
//! Listens for member-joined notices and greets new members with a
//! templated, optionally segmented message.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration and welcome settings
//! - `i18n` - Locale default greetings
//! - `onebot` - OneBot event/message types and HTTP API client
//! - `welcome` - Resolver, nickname lookup and delivery
//! - `bot` - Webhook intake, dispatch and runtime
//! - `utils` - Template text helpers

mod bot;
mod config;
mod error;
mod i18n;
mod onebot;
mod utils;
mod welcome;

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bot::AppState;
use config::{Config, WelcomeConfig};
use onebot::OneBotClient;
use welcome::WelcomeResolver;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("welcomer=info,reqwest=warn,hyper=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    info!("Starting welcomer...");

    i18n::init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded successfully");
    info!("OneBot API: {}", config.api_url);

    let welcome = WelcomeConfig::load(&config.welcome_config_path, &config.locale)?;
    info!(
        "Welcome settings loaded: target_groups={:?}, {} group override(s)",
        welcome.target_groups,
        welcome.group_templates.len()
    );
    if welcome.target_groups.is_empty() {
        warn!("No target groups configured, no one will be welcomed");
    }

    let api = OneBotClient::new(
        config.api_url.clone(),
        config.access_token.clone(),
        config.api_timeout,
    )?;

    // Connectivity check only; the webhook works without it
    match api.get_login_info().await {
        Ok(me) => info!("Logged in as {} ({})", me.nickname, me.user_id),
        Err(e) => warn!("Could not reach OneBot API yet: {}", e),
    }

    let resolver = WelcomeResolver::new(Arc::new(welcome));
    let state = AppState::new(resolver, api, config.access_token.clone());
    info!("Welcome plugin loaded");

    bot::run(&config, state).await
}
