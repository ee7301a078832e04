//! Contract between the incident core and the chat platform.
//!
//! All incident state lives on the platform: the channel topic and two pinned
//! messages. Nothing is cached between calls; every operation asks the
//! platform for the current topic and pins.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::blocks::Block;
use crate::error::PlatformResult;
use crate::forms::IncidentForm;

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create from any string-like value.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

id_newtype!(
    /// Channel identifier (e.g. `C0123ABC`).
    ChannelId
);
id_newtype!(
    /// User identifier (e.g. `U0123ABC`).
    UserId
);
id_newtype!(
    /// Message timestamp, the platform's message identifier.
    MessageTs
);

/// A message pinned in a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinnedMessage {
    /// Message identifier.
    pub ts: MessageTs,
    /// Fallback text of the message.
    pub text: String,
    /// Current block list.
    pub blocks: Vec<Block>,
}

impl PinnedMessage {
    /// Whether the message is tagged with `marker`.
    ///
    /// The marker is looked up in the first block; messages without blocks
    /// fall back to their text.
    pub fn contains_marker(&self, marker: &str) -> bool {
        match self.blocks.first().and_then(Block::text) {
            Some(first) if first.contains(marker) => true,
            _ => self.text.contains(marker),
        }
    }

    /// Whether any block (or the fallback text) contains `needle`.
    pub fn contains_text(&self, needle: &str) -> bool {
        self.text.contains(needle)
            || self
                .blocks
                .iter()
                .filter_map(Block::text)
                .any(|text| text.contains(needle))
    }
}

/// Operations the incident core needs from the chat platform.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Create a channel. Fails with `PlatformError::NameTaken` on collision.
    async fn create_channel(&self, name: &str, private: bool) -> PlatformResult<ChannelId>;

    /// Invite users to a channel in one call.
    async fn invite_users(&self, channel: &ChannelId, users: &[UserId]) -> PlatformResult<()>;

    /// Current channel topic (empty when unset).
    async fn get_topic(&self, channel: &ChannelId) -> PlatformResult<String>;

    /// Replace the channel topic.
    async fn set_topic(&self, channel: &ChannelId, topic: &str) -> PlatformResult<()>;

    /// Post a message, returning its identifier.
    async fn post_message(&self, channel: &ChannelId, blocks: &[Block])
    -> PlatformResult<MessageTs>;

    /// Replace the blocks of an existing message.
    async fn update_message(
        &self,
        channel: &ChannelId,
        ts: &MessageTs,
        blocks: &[Block],
    ) -> PlatformResult<()>;

    /// Pin a message in its channel.
    async fn pin_message(&self, channel: &ChannelId, ts: &MessageTs) -> PlatformResult<()>;

    /// All pinned messages of a channel.
    async fn list_pins(&self, channel: &ChannelId) -> PlatformResult<Vec<PinnedMessage>>;

    /// Post a message visible only to `user`.
    async fn post_ephemeral(
        &self,
        channel: &ChannelId,
        user: &UserId,
        blocks: &[Block],
    ) -> PlatformResult<()>;

    /// Open a modal form for the user who issued `trigger_id`.
    async fn open_modal(&self, trigger_id: &str, form: &IncidentForm) -> PlatformResult<()>;
}
