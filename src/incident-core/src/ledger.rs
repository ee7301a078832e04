//! Append-only ledgers kept as single pinned messages.
//!
//! Each incident channel carries two ledgers, the timeline and the action
//! items. A ledger is one pinned message whose first block is a marker
//! header; entries are appended by editing that message, so the channel
//! always has exactly two pins no matter how many entries are added.
//!
//! Ledgers are located by marker each time. Their message IDs are never
//! stored.

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::blocks::{Block, mention};
use crate::error::{IncidentError, IncidentResult, PlatformResult, PlatformResultExt};
use crate::platform::{ChannelId, ChatPlatform, MessageTs, PinnedMessage, UserId};

/// Timestamp format used in timeline entries.
pub const TIMELINE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The two ledgers of an incident channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerKind {
    /// Chronological log of incident events.
    Timeline,
    /// Checklist of follow-up work.
    ActionItems,
}

impl LedgerKind {
    /// Header text that tags the ledger message.
    pub fn marker(self) -> &'static str {
        match self {
            LedgerKind::Timeline => "*Incident Timeline*",
            LedgerKind::ActionItems => "*Action Items*",
        }
    }
}

impl fmt::Display for LedgerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerKind::Timeline => f.write_str("timeline"),
            LedgerKind::ActionItems => f.write_str("action items"),
        }
    }
}

/// A line to append to a ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    text: String,
    dedup_key: Option<String>,
}

impl LedgerEntry {
    /// Timeline line: `<time> - <message> by <@user>`.
    pub fn timeline(at: DateTime<Utc>, message: &str, user: &UserId) -> Self {
        Self::stamped(at, &format!("{} by {}", message, mention(user.as_str())))
    }

    /// Timeline line with no trailing author: `<time> - <text>`.
    pub fn stamped(at: DateTime<Utc>, text: &str) -> Self {
        Self {
            text: format!("{} - {}", at.format(TIMELINE_TIME_FORMAT), text),
            dedup_key: None,
        }
    }

    /// Action item line: `<@user> - <description>`.
    ///
    /// Action items are deduplicated on their description.
    pub fn action_item(user: &UserId, description: &str) -> Self {
        Self {
            text: format!("{} - {}", mention(user.as_str()), description),
            dedup_key: Some(description.to_string()),
        }
    }

    /// Rendered line.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Result of an append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The entry was added to the ledger.
    Appended,
    /// An identical action item already existed; nothing changed.
    Duplicate,
}

/// Find the pinned ledger message of `kind`.
///
/// A channel without pins, or without a matching pin, yields `None`.
pub async fn find_ledger<P>(
    platform: &P,
    channel: &ChannelId,
    kind: LedgerKind,
) -> PlatformResult<Option<PinnedMessage>>
where
    P: ChatPlatform + ?Sized,
{
    let pins = platform.list_pins(channel).await?;
    if pins.is_empty() {
        warn!(channel = %channel, "No pins found in channel");
        return Ok(None);
    }

    Ok(pins
        .into_iter()
        .find(|pin| pin.contains_marker(kind.marker())))
}

/// Post and pin a new ledger message with its header and `initial` entries.
///
/// Only the create-incident path calls this, once per ledger kind.
pub async fn create_ledger<P>(
    platform: &P,
    channel: &ChannelId,
    kind: LedgerKind,
    initial: &[LedgerEntry],
) -> IncidentResult<MessageTs>
where
    P: ChatPlatform + ?Sized,
{
    let blocks: Vec<Block> = std::iter::once(Block::section(kind.marker()))
        .chain(initial.iter().map(|entry| Block::section(entry.text())))
        .collect();

    let ts = platform
        .post_message(channel, &blocks)
        .await
        .context(&format!("failed to create {kind}"))?;

    platform
        .pin_message(channel, &ts)
        .await
        .context(&format!("failed to pin {kind} message"))?;

    debug!(channel = %channel, ledger = %kind, ts = %ts, "Created ledger");
    Ok(ts)
}

/// Append `entry` to the ledger of `kind` by editing the pinned message.
///
/// Existing blocks are written back as read, whatever their kind. Fails with
/// [`IncidentError::LedgerNotFound`] when the ledger is missing and with
/// [`IncidentError::LedgerUnreadable`] when it came back without blocks.
pub async fn append_entry<P>(
    platform: &P,
    channel: &ChannelId,
    kind: LedgerKind,
    entry: &LedgerEntry,
) -> IncidentResult<AppendOutcome>
where
    P: ChatPlatform + ?Sized,
{
    let ledger = find_ledger(platform, channel, kind)
        .await
        .context(&format!("failed to get {kind} message"))?
        .ok_or(IncidentError::LedgerNotFound(kind))?;

    if kind == LedgerKind::ActionItems
        && let Some(key) = &entry.dedup_key
        && ledger.contains_text(key)
    {
        debug!(channel = %channel, item = %key, "Action item already present");
        return Ok(AppendOutcome::Duplicate);
    }

    let PinnedMessage { ts, mut blocks, .. } = ledger;
    if blocks.is_empty() {
        // Editing would replace the entries held in the message text.
        warn!(channel = %channel, ledger = %kind, ts = %ts, "Ledger has no readable blocks");
        return Err(IncidentError::LedgerUnreadable(kind));
    }
    blocks.push(Block::section(entry.text()));

    platform
        .update_message(channel, &ts, &blocks)
        .await
        .context(&format!("failed to update {kind}"))?;

    Ok(AppendOutcome::Appended)
}
