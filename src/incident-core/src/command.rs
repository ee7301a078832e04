//! `/incident` slash-command routing.

use tracing::{error, info};

use crate::blocks::Block;
use crate::clock::Clock;
use crate::error::{IncidentError, IncidentResult};
use crate::lifecycle::{IncidentService, help_blocks};
use crate::platform::{ChannelId, ChatPlatform, UserId};

pub const TIMELINE_USAGE: &str = "Usage: /incident timeline <message> (or /incident t <message>)";
pub const ACTION_ITEM_USAGE: &str =
    "Usage: /incident action-item <description> (or /incident ai <description>)";
pub const EMPTY_COMMAND_HINT: &str =
    "Please provide a command. Use `/incident help` (or `/incident h`) for details.";
pub const HELP_NOT_IN_CHANNEL: &str = "Oops! I can't display the help message here because I'm not a member of this channel. Please add me to this channel, try `/incident help` in a channel I'm in, or send me a direct message with `help`.";

/// A parsed `/incident` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create,
    Update,
    /// Timeline entry; empty text asks for usage.
    Timeline(String),
    /// Action item; empty text asks for usage.
    ActionItem(String),
    /// Resolve with an optional resolution note.
    Resolve(Option<String>),
    Help,
    /// No verb at all.
    Empty,
    /// Verb that matched nothing, lowercased.
    Unknown(String),
}

impl Command {
    /// Parse command text. The verb is case-insensitive; the rest is kept
    /// verbatim apart from surrounding whitespace.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let (verb, rest) = match text.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (text, ""),
        };

        match verb.to_lowercase().as_str() {
            "" => Command::Empty,
            "create" | "c" => Command::Create,
            "update" | "u" => Command::Update,
            "timeline" | "t" => Command::Timeline(rest.to_string()),
            "action-item" | "ai" => Command::ActionItem(rest.to_string()),
            "resolve" | "r" => Command::Resolve((!rest.is_empty()).then(|| rest.to_string())),
            "help" | "h" => Command::Help,
            other => Command::Unknown(other.to_string()),
        }
    }
}

/// Who invoked a command, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandContext {
    pub channel: ChannelId,
    pub user: UserId,
    /// Short-lived token for opening modals.
    pub trigger_id: String,
}

/// What to send back on the command's HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandReply {
    /// Empty acknowledgment.
    Ack,
    /// Text shown only to the invoking user.
    Ephemeral(String),
}

impl<P: ChatPlatform, C: Clock> IncidentService<P, C> {
    /// Run a parsed command.
    pub async fn dispatch(&self, ctx: &CommandContext, command: Command) -> IncidentResult<CommandReply> {
        info!(channel = %ctx.channel, user = %ctx.user, command = ?command, "Dispatching command");

        match command {
            Command::Create => self.open_create_form(&ctx.trigger_id).await?,
            Command::Update => self.open_update_form(&ctx.trigger_id, &ctx.channel).await?,
            Command::Timeline(text) if text.is_empty() => self.send_usage(ctx, TIMELINE_USAGE).await,
            Command::Timeline(text) => self.add_timeline_item(&ctx.channel, &ctx.user, &text).await?,
            Command::ActionItem(text) if text.is_empty() => {
                self.send_usage(ctx, ACTION_ITEM_USAGE).await
            }
            Command::ActionItem(text) => {
                self.add_action_item(&ctx.channel, &ctx.user, &text).await?;
            }
            Command::Resolve(reason) => {
                self.resolve_incident(&ctx.channel, &ctx.user, reason.as_deref())
                    .await?
            }
            Command::Help => return self.send_help(ctx).await,
            Command::Empty => self.send_hint(ctx, EMPTY_COMMAND_HINT).await?,
            Command::Unknown(verb) => {
                let hint = format!(
                    "Command `{verb}` not found. Use `/incident help` (or `/incident h`) for details."
                );
                self.send_hint(ctx, &hint).await?
            }
        }

        Ok(CommandReply::Ack)
    }

    async fn send_usage(&self, ctx: &CommandContext, usage: &str) {
        if let Err(e) = self
            .platform()
            .post_ephemeral(&ctx.channel, &ctx.user, &[Block::section(usage)])
            .await
        {
            error!(channel = %ctx.channel, error = %e, "Failed to send usage message");
        }
    }

    async fn send_hint(&self, ctx: &CommandContext, text: &str) -> IncidentResult<()> {
        self.platform()
            .post_ephemeral(&ctx.channel, &ctx.user, &[Block::section(text)])
            .await
            .map_err(|e| IncidentError::platform("could not send message", e))
    }

    async fn send_help(&self, ctx: &CommandContext) -> IncidentResult<CommandReply> {
        match self
            .platform()
            .post_ephemeral(&ctx.channel, &ctx.user, &help_blocks())
            .await
        {
            Ok(()) => Ok(CommandReply::Ack),
            Err(e) if e.is_not_in_channel() => {
                error!(channel = %ctx.channel, user = %ctx.user, error = %e, "Failed to send help message");
                Ok(CommandReply::Ephemeral(HELP_NOT_IN_CHANNEL.to_string()))
            }
            Err(e) => Err(IncidentError::platform("could not send help message", e)),
        }
    }
}
