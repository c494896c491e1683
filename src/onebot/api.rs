//! OneBot v11 HTTP API client.
//!
//! Actions are POSTed as JSON to `<base>/<action>`. Every response uses
//! the same envelope; a non-zero `retcode` means the action failed.
//! Docs: <https://github.com/botuniverse/onebot-11/blob/master/api/public.md>

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use super::message::{GroupMessage, Part};
use crate::error::ApiError;
use crate::welcome::{MemberInfo, MemberLookup, MessageSender};

/// OneBot response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    retcode: i64,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    wording: Option<String>,
}

impl ApiResponse {
    /// Check `retcode`, returning the `data` payload on success.
    fn into_data(self, action: &'static str) -> Result<Value, ApiError> {
        if self.retcode != 0 {
            let message = self
                .wording
                .or(self.message)
                .filter(|s| !s.is_empty())
                .unwrap_or(self.status);
            return Err(ApiError::Retcode {
                action,
                retcode: self.retcode,
                message,
            });
        }
        Ok(self.data)
    }
}

/// Client for the OneBot HTTP API.
#[derive(Debug, Clone)]
pub struct OneBotClient {
    client: reqwest::Client,
    base_url: Url,
    access_token: Option<String>,
}

impl OneBotClient {
    /// Create a client for the API at `base_url`.
    pub fn new(
        base_url: Url,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            access_token,
        })
    }

    fn action_url(&self, action: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), action)
    }

    /// Call an action and decode its `data` payload.
    async fn call<T: DeserializeOwned>(&self, action: &'static str, body: Value) -> Result<T, ApiError> {
        let mut request = self.client.post(self.action_url(action)).json(&body);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status { action, status });
        }

        let envelope: ApiResponse = resp.json().await?;
        let data = envelope.into_data(action)?;
        decode_data(action, data)
    }

    /// Get the bot's own account, used as a startup connectivity check.
    pub async fn get_login_info(&self) -> Result<LoginInfo, ApiError> {
        self.call("get_login_info", json!({})).await
    }

    /// Send one message to a group.
    pub async fn send_group_msg(&self, group_id: i64, fragment: &[Part]) -> Result<(), ApiError> {
        let body = serde_json::to_value(GroupMessage::new(group_id, fragment))
            .map_err(|source| ApiError::Decode {
                action: "send_group_msg",
                source,
            })?;

        let _: Value = self.call("send_group_msg", body).await?;
        debug!("send_group_msg to {} ok ({} parts)", group_id, fragment.len());
        Ok(())
    }
}

fn decode_data<T: DeserializeOwned>(action: &'static str, data: Value) -> Result<T, ApiError> {
    serde_json::from_value(data).map_err(|source| ApiError::Decode { action, source })
}

/// Result of `get_login_info`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginInfo {
    pub user_id: i64,
    #[serde(default)]
    pub nickname: String,
}

#[async_trait]
impl MemberLookup for OneBotClient {
    async fn get_group_member_info(
        &self,
        group_id: i64,
        user_id: i64,
    ) -> Result<Option<MemberInfo>, ApiError> {
        let data: Value = self
            .call(
                "get_group_member_info",
                json!({ "group_id": group_id, "user_id": user_id, "no_cache": true }),
            )
            .await?;

        if data.is_null() {
            return Ok(None);
        }
        decode_data("get_group_member_info", data).map(Some)
    }
}

#[async_trait]
impl MessageSender for OneBotClient {
    async fn send_group_message(&self, group_id: i64, fragment: &[Part]) -> Result<(), ApiError> {
        self.send_group_msg(group_id, fragment).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(value: Value) -> ApiResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_ok_envelope_yields_data() {
        let resp = envelope(json!({
            "status": "ok",
            "retcode": 0,
            "data": { "card": "", "nickname": "Bob", "user_id": 55 }
        }));
        let data = resp.into_data("get_group_member_info").unwrap();
        let info: MemberInfo = decode_data("get_group_member_info", data).unwrap();

        assert_eq!(info.card.as_deref(), Some(""));
        assert_eq!(info.nickname.as_deref(), Some("Bob"));
    }

    #[test]
    fn test_failed_envelope_prefers_wording() {
        let resp = envelope(json!({
            "status": "failed",
            "retcode": 100,
            "data": null,
            "message": "raw",
            "wording": "member not found"
        }));

        match resp.into_data("get_group_member_info") {
            Err(ApiError::Retcode { retcode, message, .. }) => {
                assert_eq!(retcode, 100);
                assert_eq!(message, "member not found");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_failed_envelope_without_message_uses_status() {
        let resp = envelope(json!({ "status": "failed", "retcode": 102 }));

        match resp.into_data("send_group_msg") {
            Err(ApiError::Retcode { message, .. }) => assert_eq!(message, "failed"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_action_url_joins_cleanly() {
        let client = OneBotClient::new(
            Url::parse("http://127.0.0.1:3000/").unwrap(),
            None,
            Duration::from_secs(1),
        )
        .unwrap();

        assert_eq!(client.action_url("send_group_msg"), "http://127.0.0.1:3000/send_group_msg");

        let client = OneBotClient::new(
            Url::parse("http://host/onebot").unwrap(),
            None,
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.action_url("get_login_info"), "http://host/onebot/get_login_info");
    }
}
