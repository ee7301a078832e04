//! Slack Web API client.
//!
//! Implements [`ChatPlatform`] over the handful of Web API methods the
//! incident core needs. Writes are posted as JSON, reads as form-encoded
//! bodies since several `conversations.*` read methods ignore JSON bodies.

use std::time::Duration;

use async_trait::async_trait;
use incident_core::blocks::fallback_text;
use incident_core::{
    Block, ChannelId, ChatPlatform, IncidentForm, MessageTs, PinnedMessage, PlatformError,
    PlatformResult, UserId,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::config::BotConfig;
use crate::error::{SlackApiError, network_error};
use crate::views::modal_view;

const API_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of `auth.test`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthInfo {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub bot_id: Option<String>,
}

/// Slack Web API client authenticated with a bot token.
#[derive(Clone)]
pub struct SlackClient {
    client: reqwest::Client,
    base_url: String,
    token: SecretString,
}

impl std::fmt::Debug for SlackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackClient")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl SlackClient {
    /// Create a client from the bot configuration.
    pub fn new(config: &BotConfig) -> PlatformResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(API_TIMEOUT)
            .build()
            .map_err(|e| PlatformError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            token: SecretString::new(config.bot_token().into()),
        })
    }

    /// Check the token with `auth.test`.
    pub async fn auth_test(&self) -> PlatformResult<AuthInfo> {
        let response = self.api_call("auth.test", &json!({})).await?;
        let info: AuthInfo = serde_json::from_value(response)?;
        debug!(user_id = %info.user_id, team = %info.team, "Slack authentication ok");
        Ok(info)
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    /// POST a JSON body to a Web API method.
    async fn api_call(&self, method: &str, payload: &Value) -> PlatformResult<Value> {
        let response = self
            .client
            .post(self.url(method))
            .header(
                "Authorization",
                format!("Bearer {}", self.token.expose_secret()),
            )
            .header("Content-Type", "application/json; charset=utf-8")
            .json(payload)
            .send()
            .await
            .map_err(network_error)?;

        Self::read_response(method, response).await
    }

    /// POST a form-encoded body to a Web API method.
    async fn api_form(&self, method: &str, params: &[(&str, &str)]) -> PlatformResult<Value> {
        let response = self
            .client
            .post(self.url(method))
            .header(
                "Authorization",
                format!("Bearer {}", self.token.expose_secret()),
            )
            .form(params)
            .send()
            .await
            .map_err(network_error)?;

        Self::read_response(method, response).await
    }

    async fn read_response(method: &str, response: reqwest::Response) -> PlatformResult<Value> {
        // Check for rate limiting
        if response.status() == 429 {
            let retry_after: u64 = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(30);
            warn!(method, retry_after, "Slack rate limit hit");
            return Err(PlatformError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PlatformError::Api(format!("{}: {} {}", method, status, body)));
        }

        let body: Value = response.json().await.map_err(network_error)?;

        if body.get("ok").and_then(Value::as_bool) != Some(true) {
            let code = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            return Err(SlackApiError::new(code, method).into());
        }

        Ok(body)
    }
}

fn str_at<'a>(value: &'a Value, pointer: &str, method: &str) -> PlatformResult<&'a str> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .ok_or_else(|| PlatformError::InvalidResponse(format!("{method}: missing {pointer}")))
}

/// Blocks of kinds we do not model (rich_text, images) come back as
/// [`Block::Other`] so edits write them back untouched.
fn parse_blocks(raw: Option<&Value>) -> Vec<Block> {
    raw.and_then(Value::as_array)
        .map(|blocks| {
            blocks
                .iter()
                .map(|b| {
                    serde_json::from_value::<Block>(b.clone())
                        .unwrap_or_else(|_| Block::Other(b.clone()))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn parse_pins(response: &Value) -> Vec<PinnedMessage> {
    let Some(items) = response.get("items").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| item.get("message"))
        .filter_map(|message| {
            let ts = message.get("ts").and_then(Value::as_str)?;
            Some(PinnedMessage {
                ts: MessageTs::new(ts),
                text: message
                    .get("text")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                blocks: parse_blocks(message.get("blocks")),
            })
        })
        .collect()
}

fn join_users(users: &[UserId]) -> String {
    users
        .iter()
        .map(UserId::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

#[async_trait]
impl ChatPlatform for SlackClient {
    async fn create_channel(&self, name: &str, private: bool) -> PlatformResult<ChannelId> {
        let method = "conversations.create";
        let response = self
            .api_call(method, &json!({ "name": name, "is_private": private }))
            .await?;
        let id = str_at(&response, "/channel/id", method)?;
        info!(channel = id, name, "Created channel");
        Ok(ChannelId::new(id))
    }

    async fn invite_users(&self, channel: &ChannelId, users: &[UserId]) -> PlatformResult<()> {
        let result = self
            .api_call(
                "conversations.invite",
                &json!({ "channel": channel, "users": join_users(users) }),
            )
            .await;

        match result {
            Ok(_) => Ok(()),
            // Everyone requested is already a member.
            Err(PlatformError::Api(msg)) if msg.ends_with("already_in_channel") => {
                debug!(channel = %channel, "Users already in channel");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn get_topic(&self, channel: &ChannelId) -> PlatformResult<String> {
        let response = self
            .api_form("conversations.info", &[("channel", channel.as_str())])
            .await?;
        Ok(response
            .pointer("/channel/topic/value")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    async fn set_topic(&self, channel: &ChannelId, topic: &str) -> PlatformResult<()> {
        self.api_call(
            "conversations.setTopic",
            &json!({ "channel": channel, "topic": topic }),
        )
        .await?;
        Ok(())
    }

    async fn post_message(
        &self,
        channel: &ChannelId,
        blocks: &[Block],
    ) -> PlatformResult<MessageTs> {
        let method = "chat.postMessage";
        let response = self
            .api_call(
                method,
                &json!({
                    "channel": channel,
                    "text": fallback_text(blocks),
                    "blocks": blocks,
                }),
            )
            .await?;
        Ok(MessageTs::new(str_at(&response, "/ts", method)?))
    }

    async fn update_message(
        &self,
        channel: &ChannelId,
        ts: &MessageTs,
        blocks: &[Block],
    ) -> PlatformResult<()> {
        self.api_call(
            "chat.update",
            &json!({
                "channel": channel,
                "ts": ts,
                "text": fallback_text(blocks),
                "blocks": blocks,
            }),
        )
        .await?;
        Ok(())
    }

    async fn pin_message(&self, channel: &ChannelId, ts: &MessageTs) -> PlatformResult<()> {
        self.api_call("pins.add", &json!({ "channel": channel, "timestamp": ts }))
            .await?;
        Ok(())
    }

    async fn list_pins(&self, channel: &ChannelId) -> PlatformResult<Vec<PinnedMessage>> {
        let response = self
            .api_form("pins.list", &[("channel", channel.as_str())])
            .await?;
        Ok(parse_pins(&response))
    }

    async fn post_ephemeral(
        &self,
        channel: &ChannelId,
        user: &UserId,
        blocks: &[Block],
    ) -> PlatformResult<()> {
        self.api_call(
            "chat.postEphemeral",
            &json!({
                "channel": channel,
                "user": user,
                "text": fallback_text(blocks),
                "blocks": blocks,
            }),
        )
        .await?;
        Ok(())
    }

    async fn open_modal(&self, trigger_id: &str, form: &IncidentForm) -> PlatformResult<()> {
        self.api_call(
            "views.open",
            &json!({ "trigger_id": trigger_id, "view": modal_view(form) }),
        )
        .await?;
        Ok(())
    }
}
