//! Inbound OneBot events.
//!
//! Events arrive as loosely-typed JSON. [`RawEvent`] keeps every field
//! optional; the resolver validates it into a typed record before use.

use serde::Deserialize;
use serde_json::Value;

use crate::utils::id_from_value;

/// Loosely-typed OneBot v11 event. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEvent {
    #[serde(default)]
    pub post_type: Option<String>,
    #[serde(default)]
    pub notice_type: Option<String>,
    #[serde(default)]
    pub sub_type: Option<String>,
    #[serde(default)]
    pub meta_event_type: Option<String>,

    /// Identifiers may be numbers or numeric strings depending on the
    /// OneBot implementation.
    #[serde(default)]
    pub group_id: Option<Value>,
    #[serde(default)]
    pub user_id: Option<Value>,
    #[serde(default)]
    pub self_id: Option<Value>,
}

impl RawEvent {
    pub fn is_meta(&self) -> bool {
        self.post_type.as_deref() == Some("meta_event")
    }

    pub fn group_id(&self) -> IdField {
        IdField::from_option(self.group_id.as_ref())
    }

    pub fn user_id(&self) -> IdField {
        IdField::from_option(self.user_id.as_ref())
    }

    pub fn self_id(&self) -> IdField {
        IdField::from_option(self.self_id.as_ref())
    }
}

/// State of an identifier field after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdField {
    Missing,
    Invalid,
    Valid(i64),
}

impl IdField {
    fn from_option(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::Missing,
            Some(v) => id_from_value(v).map_or(Self::Invalid, Self::Valid),
        }
    }
}

/// A validated member-joined notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupIncrease {
    pub group_id: i64,
    pub user_id: i64,
    /// The bot's own account, when reported.
    pub self_id: Option<i64>,
}
