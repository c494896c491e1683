//! Outbound message model.
//!
//! A [`Fragment`] is one outbound message made of ordered [`Part`]s.
//! OneBot v11 expects the message as an array of typed segments.

use serde::Serialize;
use serde_json::{Value, json};

/// One piece of an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    /// Literal text, newlines included.
    Text(String),
    /// At-mention of a user.
    Mention(i64),
}

impl Part {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// OneBot message segment for this part.
    pub fn to_segment(&self) -> Value {
        match self {
            Self::Text(text) => json!({ "type": "text", "data": { "text": text } }),
            // OneBot ids in segment data are strings
            Self::Mention(user_id) => json!({ "type": "at", "data": { "qq": user_id.to_string() } }),
        }
    }
}

/// One outbound message.
pub type Fragment = Vec<Part>;

/// Body of a `send_group_msg` call.
#[derive(Debug, Serialize)]
pub struct GroupMessage {
    pub group_id: i64,
    pub message: Vec<Value>,
}

impl GroupMessage {
    pub fn new(group_id: i64, fragment: &[Part]) -> Self {
        Self {
            group_id,
            message: fragment.iter().map(Part::to_segment).collect(),
        }
    }
}
