//! Block Kit message model.
//!
//! Incident messages (ledgers, help menu, confirmations) are lists of blocks.
//! The bot only writes mrkdwn sections. Every other block kind a platform
//! returns is carried as raw JSON so that editing a message writes it back
//! unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A Block Kit block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Block {
    /// A section, the only kind the bot produces.
    Known(KnownBlock),
    /// Any other block, kept verbatim.
    Other(Value),
}

/// Block kinds the bot reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KnownBlock {
    /// Section block (main content).
    Section {
        text: TextObject,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fields: Option<Vec<TextObject>>,
    },
}

impl Block {
    /// Section block with mrkdwn text.
    pub fn section(text: impl Into<String>) -> Self {
        Block::Known(KnownBlock::Section {
            text: TextObject::mrkdwn(text),
            fields: None,
        })
    }

    /// Primary text of the block, if it carries any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Block::Known(KnownBlock::Section { text, .. }) => Some(&text.text),
            Block::Other(raw) => raw.pointer("/text/text").and_then(Value::as_str),
        }
    }
}

/// Block Kit text object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextObject {
    #[serde(rename = "type")]
    pub text_type: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<bool>,
}

impl TextObject {
    /// Create a mrkdwn text object.
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self {
            text_type: "mrkdwn".to_string(),
            text: text.into(),
            emoji: None,
        }
    }
}

/// Builder for block lists.
#[derive(Debug, Default)]
pub struct BlocksBuilder {
    blocks: Vec<Block>,
}

impl BlocksBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a section with mrkdwn text.
    pub fn section(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(Block::section(text));
        self
    }

    /// Finish the list.
    pub fn build(self) -> Vec<Block> {
        self.blocks
    }
}

/// Mention markup for a user ID (`<@U123>`).
pub fn mention(user_id: &str) -> String {
    format!("<@{user_id}>")
}

/// Plain-text rendering of a block list, one line per text-bearing block.
///
/// Used as the notification fallback text of posted messages.
pub fn fallback_text(blocks: &[Block]) -> String {
    blocks
        .iter()
        .filter_map(Block::text)
        .collect::<Vec<_>>()
        .join("\n")
}
