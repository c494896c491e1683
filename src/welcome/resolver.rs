//! Welcome resolution.
//!
//! Turns a raw notice into the fragments to send:
//! validate -> nickname -> template -> segments -> fragments.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use super::MemberLookup;
use super::nickname::fetch_nickname;
use crate::config::WelcomeConfig;
use crate::onebot::event::{GroupIncrease, IdField, RawEvent};
use crate::onebot::message::{Fragment, Part};
use crate::utils::sanitize_nickname;

const NICKNAME_PLACEHOLDER: &str = "{nickname}";
const AT_PLACEHOLDER: &str = "{at}";

/// Why an event was not handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skip {
    NotNotice,
    NotGroupIncrease,
    MissingGroupId,
    InvalidGroupId,
    MissingUserId,
    InvalidUserId,
    MissingSelfId,
    InvalidSelfId,
    NotTargetGroup(i64),
    SelfJoin,
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotNotice => write!(f, "not a notice"),
            Self::NotGroupIncrease => write!(f, "not a group_increase notice"),
            Self::MissingGroupId => write!(f, "group_id missing"),
            Self::InvalidGroupId => write!(f, "group_id is not an integer"),
            Self::MissingUserId => write!(f, "user_id missing"),
            Self::InvalidUserId => write!(f, "user_id is not an integer"),
            Self::MissingSelfId => write!(f, "self_id missing"),
            Self::InvalidSelfId => write!(f, "self_id is not an integer"),
            Self::NotTargetGroup(id) => write!(f, "group {} is not a target group", id),
            Self::SelfJoin => write!(f, "the bot itself joined"),
        }
    }
}

/// Result of handling one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The event does not call for a welcome.
    Ignored(Skip),
    /// The welcome rendered to nothing but blank segments.
    Empty { group_id: i64 },
    /// Fragments to deliver in order.
    Fragments { group_id: i64, fragments: Vec<Fragment> },
}

/// Pure welcome logic over an immutable config.
#[derive(Debug, Clone)]
pub struct WelcomeResolver {
    config: Arc<WelcomeConfig>,
}

impl WelcomeResolver {
    pub fn new(config: Arc<WelcomeConfig>) -> Self {
        Self { config }
    }

    /// Whether this event should produce a welcome. The skip reason is
    /// logged when it should not.
    pub fn should_handle(&self, event: &RawEvent) -> bool {
        match self.validate(event) {
            Ok(_) => true,
            Err(skip) => {
                log_skip(&skip);
                false
            }
        }
    }

    /// Validate a raw event into a member-joined notice for a target group.
    pub fn validate(&self, event: &RawEvent) -> Result<GroupIncrease, Skip> {
        if event.post_type.as_deref() != Some("notice") {
            return Err(Skip::NotNotice);
        }
        if event.notice_type.as_deref() != Some("group_increase") {
            return Err(Skip::NotGroupIncrease);
        }

        let group_id = match event.group_id() {
            IdField::Valid(id) => id,
            IdField::Missing => return Err(Skip::MissingGroupId),
            IdField::Invalid => return Err(Skip::InvalidGroupId),
        };
        let user_id = match event.user_id() {
            IdField::Valid(id) => id,
            IdField::Missing => return Err(Skip::MissingUserId),
            IdField::Invalid => return Err(Skip::InvalidUserId),
        };
        let self_id = match (event.self_id(), self.config.ignore_self_join) {
            (IdField::Valid(id), _) => Some(id),
            (IdField::Missing, true) => return Err(Skip::MissingSelfId),
            (IdField::Invalid, true) => return Err(Skip::InvalidSelfId),
            (_, false) => None,
        };

        if !self.config.target_groups.contains(&group_id) {
            return Err(Skip::NotTargetGroup(group_id));
        }

        if self.config.ignore_self_join && self_id == Some(user_id) {
            return Err(Skip::SelfJoin);
        }

        Ok(GroupIncrease {
            group_id,
            user_id,
            self_id,
        })
    }

    /// Template for a group: its override, else the default.
    pub fn resolve_template(&self, group_id: i64) -> &str {
        self.config
            .group_templates
            .get(&group_id)
            .map(String::as_str)
            .unwrap_or(self.config.default_template.as_str())
    }

    /// Substitute `{nickname}`; `{at}` is left for [`Self::build_fragment`].
    pub fn format_message(&self, template: &str, nickname: &str) -> String {
        template.replace(NICKNAME_PLACEHOLDER, &sanitize_nickname(nickname))
    }

    /// Split a message into non-blank segments.
    ///
    /// Segments keep their original whitespace; only blank-only ones are
    /// dropped.
    pub fn segment<'a>(&self, message: &'a str) -> Vec<&'a str> {
        let separator = self.config.segment_separator.as_str();

        let parts: Vec<&str> = if separator.is_empty() {
            vec![message]
        } else {
            message.split(separator).collect()
        };

        parts.into_iter().filter(|s| !s.trim().is_empty()).collect()
    }

    /// Turn one segment into a fragment, replacing `{at}` with mentions.
    pub fn build_fragment(&self, segment: &str, user_id: i64) -> Fragment {
        if !segment.contains(AT_PLACEHOLDER) {
            return vec![Part::text(segment)];
        }

        let pieces: Vec<&str> = segment.split(AT_PLACEHOLDER).collect();
        let last = pieces.len() - 1;
        let mut fragment = Vec::with_capacity(pieces.len() * 2);

        for (i, piece) in pieces.into_iter().enumerate() {
            if !piece.is_empty() {
                fragment.push(Part::text(piece));
            }
            if i < last {
                fragment.push(Part::Mention(user_id));
            }
        }

        fragment
    }

    /// Full pipeline for one event.
    pub async fn handle(&self, event: &RawEvent, lookup: &dyn MemberLookup) -> Outcome {
        let notice = match self.validate(event) {
            Ok(notice) => notice,
            Err(skip) => {
                log_skip(&skip);
                return Outcome::Ignored(skip);
            }
        };

        debug!(
            "New member {} joined group {} (sub_type={:?}, bot={:?})",
            notice.user_id, notice.group_id, event.sub_type, notice.self_id
        );

        let nickname = fetch_nickname(
            lookup,
            notice.group_id,
            notice.user_id,
            self.config.lookup_timeout,
        )
        .await;

        let template = self.resolve_template(notice.group_id);
        let message = self.format_message(template, &nickname);
        let segments = self.segment(&message);

        if segments.is_empty() {
            info!(
                "Welcome message for group {} is blank after segmentation, nothing to send",
                notice.group_id
            );
            return Outcome::Empty {
                group_id: notice.group_id,
            };
        }

        let fragments = segments
            .into_iter()
            .map(|segment| self.build_fragment(segment, notice.user_id))
            .collect();

        Outcome::Fragments {
            group_id: notice.group_id,
            fragments,
        }
    }
}

fn log_skip(skip: &Skip) {
    match skip {
        Skip::NotNotice | Skip::NotGroupIncrease => trace!("Event ignored: {}", skip),
        Skip::NotTargetGroup(_) | Skip::SelfJoin => debug!("Join ignored: {}", skip),
        _ => warn!("Malformed group_increase notice: {}", skip),
    }
}
