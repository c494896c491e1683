//! Welcome core.
//!
//! [`WelcomeResolver`] decides whether a notice deserves a welcome and
//! turns the configured template into outbound fragments. It owns no
//! I/O: member lookup and message delivery come in through the
//! [`MemberLookup`] and [`MessageSender`] traits.

pub mod delivery;
pub mod nickname;
pub mod resolver;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ApiError;
use crate::onebot::message::Part;

pub use delivery::{DeliveryReport, deliver};
pub use resolver::{Outcome, WelcomeResolver};

/// Member details returned by the platform.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberInfo {
    /// Group-card name (per-group display name).
    #[serde(default)]
    pub card: Option<String>,
    /// Platform-wide nickname.
    #[serde(default)]
    pub nickname: Option<String>,
}

/// Looks up a group member's display names.
#[async_trait]
pub trait MemberLookup: Send + Sync {
    /// `Ok(None)` when the platform knows nothing about the member.
    async fn get_group_member_info(
        &self,
        group_id: i64,
        user_id: i64,
    ) -> Result<Option<MemberInfo>, ApiError>;
}

/// Delivers one outbound message to a group.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_group_message(&self, group_id: i64, fragment: &[Part]) -> Result<(), ApiError>;
}
