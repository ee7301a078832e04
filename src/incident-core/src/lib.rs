//! Incident state kept entirely on a chat platform.
//!
//! An incident is a channel. Its metadata (severity, description, roles) is
//! encoded in the channel topic and its history lives in two pinned ledger
//! messages, a timeline and a list of action items. This crate holds the
//! encoding, the ledger protocol, channel provisioning and the lifecycle
//! operations; talking to a concrete platform is left to a
//! [`ChatPlatform`] implementation.
//!
//! # Example
//!
//! ```rust,ignore
//! use incident_core::{Command, CommandContext, IncidentService};
//!
//! let service = IncidentService::new(slack_client);
//! let reply = service.dispatch(&ctx, Command::parse("t Rolled back deploy")).await?;
//! ```

pub mod blocks;
pub mod clock;
pub mod command;
pub mod error;
pub mod forms;
pub mod ledger;
pub mod lifecycle;
pub mod platform;
pub mod provision;
pub mod topic;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use blocks::{Block, BlocksBuilder, KnownBlock, TextObject};
pub use clock::{Clock, FixedClock, SystemClock};
pub use command::{Command, CommandContext, CommandReply};
pub use error::{IncidentError, IncidentResult, PlatformError, PlatformResult};
pub use forms::{FormField, FormKind, IncidentForm};
pub use ledger::{AppendOutcome, LedgerEntry, LedgerKind};
pub use lifecycle::{CreateIncident, IncidentService, UpdateIncident, help_blocks};
pub use platform::{ChannelId, ChatPlatform, MessageTs, PinnedMessage, UserId};
pub use topic::{IncidentTopic, PipeTopicCodec, Severity, Status, TopicCodec, TopicTag};
