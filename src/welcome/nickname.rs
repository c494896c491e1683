//! Nickname acquisition with fallback.

use std::time::Duration;

use tracing::debug;

use super::MemberLookup;

/// Placeholder used when the member's name cannot be determined.
pub fn fallback_nickname(user_id: i64) -> String {
    format!("新成员({})", user_id)
}

/// Fetch the display name of a new member.
///
/// Prefers the group card, then the platform nickname. Errors, empty
/// answers and lookups slower than `timeout` all yield
/// [`fallback_nickname`]; this never fails.
pub async fn fetch_nickname(
    lookup: &dyn MemberLookup,
    group_id: i64,
    user_id: i64,
    timeout: Duration,
) -> String {
    let result = tokio::time::timeout(timeout, lookup.get_group_member_info(group_id, user_id)).await;

    let info = match result {
        Ok(Ok(Some(info))) => info,
        Ok(Ok(None)) => {
            debug!("No member info for {} in group {}", user_id, group_id);
            return fallback_nickname(user_id);
        }
        Ok(Err(e)) => {
            debug!("Failed to fetch member info for {} in group {}: {}", user_id, group_id, e);
            return fallback_nickname(user_id);
        }
        Err(_) => {
            debug!(
                "Member info lookup for {} in group {} timed out after {:?}",
                user_id, group_id, timeout
            );
            return fallback_nickname(user_id);
        }
    };

    [info.card, info.nickname]
        .into_iter()
        .flatten()
        .find(|name| !name.trim().is_empty())
        .unwrap_or_else(|| fallback_nickname(user_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::welcome::MemberInfo;
    use async_trait::async_trait;

    enum FakeLookup {
        Found(MemberInfo),
        Absent,
        Failing,
        Hanging,
    }

    #[async_trait]
    impl MemberLookup for FakeLookup {
        async fn get_group_member_info(
            &self,
            _group_id: i64,
            _user_id: i64,
        ) -> Result<Option<MemberInfo>, ApiError> {
            match self {
                Self::Found(info) => Ok(Some(info.clone())),
                Self::Absent => Ok(None),
                Self::Failing => Err(ApiError::Retcode {
                    action: "get_group_member_info",
                    retcode: 100,
                    message: "member not found".to_string(),
                }),
                Self::Hanging => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(None)
                }
            }
        }
    }

    fn info(card: Option<&str>, nickname: Option<&str>) -> MemberInfo {
        MemberInfo {
            card: card.map(String::from),
            nickname: nickname.map(String::from),
        }
    }

    const WAIT: Duration = Duration::from_millis(200);

    #[tokio::test]
    async fn test_card_preferred_over_nickname() {
        let lookup = FakeLookup::Found(info(Some("Card"), Some("Nick")));
        assert_eq!(fetch_nickname(&lookup, 1, 2, WAIT).await, "Card");
    }

    #[tokio::test]
    async fn test_empty_card_uses_nickname() {
        let lookup = FakeLookup::Found(info(Some(""), Some("Nick")));
        assert_eq!(fetch_nickname(&lookup, 1, 2, WAIT).await, "Nick");
    }

    #[tokio::test]
    async fn test_no_names_falls_back() {
        let lookup = FakeLookup::Found(info(None, Some("  ")));
        assert_eq!(fetch_nickname(&lookup, 1, 2, WAIT).await, "新成员(2)");
    }

    #[tokio::test]
    async fn test_absent_and_failing_fall_back() {
        assert_eq!(fetch_nickname(&FakeLookup::Absent, 1, 7, WAIT).await, "新成员(7)");
        assert_eq!(fetch_nickname(&FakeLookup::Failing, 1, 7, WAIT).await, "新成员(7)");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_falls_back() {
        let name = fetch_nickname(&FakeLookup::Hanging, 1, 8, WAIT).await;
        assert_eq!(name, "新成员(8)");
    }
}
