//! OneBot v11 protocol types and HTTP API client.

pub mod api;
pub mod event;
pub mod message;

pub use api::OneBotClient;
