//! Error types for incident operations.
//!
//! Two layers:
//! - [`PlatformError`] describes a failed call to the chat platform.
//! - [`IncidentError`] is what lifecycle operations surface to their caller.
//!
//! Recoverable failures (topic writes after resolve, ephemeral confirmations)
//! never reach these types; they are logged where they happen.

use thiserror::Error;

use crate::ledger::LedgerKind;

/// Errors returned by a [`ChatPlatform`](crate::platform::ChatPlatform) call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// The requested channel name is already in use.
    #[error("Channel name already taken: {0}")]
    NameTaken(String),

    /// The bot is not a member of the channel.
    #[error("Not in channel: {0}")]
    NotInChannel(String),

    /// Authentication error (invalid token, revoked, etc.).
    #[error("Authentication error: {0}")]
    Auth(String),

    /// API rate limited.
    #[error("Rate limited: retry after {retry_after_secs} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// The platform rejected the request.
    #[error("Platform API error: {0}")]
    Api(String),

    /// Network/HTTP error.
    #[error("Network error: {0}")]
    Network(String),

    /// Operation timed out.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// The platform answered with something we could not interpret.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl PlatformError {
    /// Whether this error is a channel-name collision.
    pub fn is_name_taken(&self) -> bool {
        matches!(self, Self::NameTaken(_))
    }

    /// Whether this error means the bot cannot post into the channel.
    pub fn is_not_in_channel(&self) -> bool {
        matches!(self, Self::NotInChannel(_))
    }
}

impl From<serde_json::Error> for PlatformError {
    fn from(err: serde_json::Error) -> Self {
        PlatformError::Json(err.to_string())
    }
}

/// Result type for platform calls.
pub type PlatformResult<T> = std::result::Result<T, PlatformError>;

/// Errors surfaced by incident lifecycle operations.
#[derive(Error, Debug)]
pub enum IncidentError {
    /// A required platform call failed.
    #[error("{context}: {source}")]
    Platform {
        /// What the operation was doing when the call failed.
        context: String,
        /// Underlying platform error.
        #[source]
        source: PlatformError,
    },

    /// The pinned ledger message could not be located.
    #[error("{0} message not found")]
    LedgerNotFound(LedgerKind),

    /// The ledger message was found but its blocks could not be read.
    #[error("{0} message has no readable blocks")]
    LedgerUnreadable(LedgerKind),

    /// Every candidate channel name was already taken.
    #[error("No free channel name for {base} after {attempts} attempts")]
    ChannelNamesExhausted {
        /// Channel name prefix that was tried.
        base: String,
        /// Number of names attempted.
        attempts: u32,
    },

    /// Caller supplied input that cannot be acted on.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl IncidentError {
    /// Wrap a platform error with a short description of the failed step.
    pub fn platform(context: impl Into<String>, source: PlatformError) -> Self {
        Self::Platform {
            context: context.into(),
            source,
        }
    }

    /// The underlying platform error, if any.
    pub fn platform_error(&self) -> Option<&PlatformError> {
        match self {
            Self::Platform { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type for incident operations.
pub type IncidentResult<T> = std::result::Result<T, IncidentError>;

/// Extension for attaching context to platform results.
pub trait PlatformResultExt<T> {
    /// Convert a platform failure into an [`IncidentError::Platform`].
    fn context(self, context: &str) -> IncidentResult<T>;
}

impl<T> PlatformResultExt<T> for PlatformResult<T> {
    fn context(self, context: &str) -> IncidentResult<T> {
        self.map_err(|e| IncidentError::platform(context, e))
    }
}
