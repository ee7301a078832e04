//! Incident metadata stored in the channel topic.
//!
//! Topic layout:
//!
//! ```text
//! <TAG> incident: <description>[ | Commander: <@U…>][ | Comms: <@U…>]
//! Resolved: <description>[ | Commander: <@U…>][ | Comms: <@U…>]
//! ```
//!
//! Decoding is best-effort and never fails: topics written by hand or by
//! older versions of the bot degrade to a description with no tag.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::UserId;

const INCIDENT_SEPARATOR: &str = " incident: ";
const RESOLVED_LABEL: &str = "Resolved";
const COMMANDER_SEGMENT: &str = " | Commander: <@";
const COMMS_SEGMENT: &str = " | Comms: <@";

/// Error for unrecognised severity or status labels.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LabelError {
    /// Not one of `SEV-0`..`SEV-3`.
    #[error("Unknown severity: {0}")]
    Severity(String),
    /// Not one of the status labels.
    #[error("Unknown status: {0}")]
    Status(String),
}

/// Incident severity, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Critical: high impact, affects many users.
    #[serde(rename = "SEV-0")]
    Sev0,
    /// Major: significant impact, affects some users.
    #[serde(rename = "SEV-1")]
    Sev1,
    /// Moderate: non-critical impact or user inconvenience.
    #[serde(rename = "SEV-2")]
    Sev2,
    /// Minor: low priority.
    #[serde(rename = "SEV-3")]
    Sev3,
}

impl Severity {
    /// All severities, most severe first.
    pub const ALL: [Severity; 4] = [
        Severity::Sev0,
        Severity::Sev1,
        Severity::Sev2,
        Severity::Sev3,
    ];

    /// Topic and form label.
    pub fn label(self) -> &'static str {
        match self {
            Severity::Sev0 => "SEV-0",
            Severity::Sev1 => "SEV-1",
            Severity::Sev2 => "SEV-2",
            Severity::Sev3 => "SEV-3",
        }
    }

    /// One-line explanation shown in forms.
    pub fn summary(self) -> &'static str {
        match self {
            Severity::Sev0 => "Critical: High impact, affects many users.",
            Severity::Sev1 => "Major: Significant impact, affects some users.",
            Severity::Sev2 => "Moderate: Non-critical impact or user inconvenience.",
            Severity::Sev3 => "Minor: Low priority, no immediate attention needed.",
        }
    }

    /// The two highest severities get a postmortem action item.
    pub fn requires_postmortem(self) -> bool {
        matches!(self, Severity::Sev0 | Severity::Sev1)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Severity {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Severity::ALL
            .into_iter()
            .find(|sev| sev.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| LabelError::Severity(s.to_string()))
    }
}

/// Incident working status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Investigating,
    Fixing,
    Monitoring,
    Resolved,
}

impl Status {
    /// All statuses in workflow order.
    pub const ALL: [Status; 4] = [
        Status::Investigating,
        Status::Fixing,
        Status::Monitoring,
        Status::Resolved,
    ];

    /// Form label.
    pub fn label(self) -> &'static str {
        match self {
            Status::Investigating => "Investigating",
            Status::Fixing => "Fixing",
            Status::Monitoring => "Monitoring",
            Status::Resolved => "Resolved",
        }
    }

    /// One-line explanation shown in forms.
    pub fn summary(self) -> &'static str {
        match self {
            Status::Investigating => "Incident is under investigation.",
            Status::Fixing => "A fix is being implemented.",
            Status::Monitoring => "Fix implemented, monitoring for stability.",
            Status::Resolved => "The incident has been resolved.",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Status {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Status::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| LabelError::Status(s.to_string()))
    }
}

/// Leading tag of the topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TopicTag {
    /// Open incident at the given severity.
    Active(Severity),
    /// Incident has been resolved. Severity is no longer shown.
    Resolved,
}

/// Incident metadata as carried by the channel topic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentTopic {
    /// Leading tag; `None` when the topic was not written by the bot.
    pub tag: Option<TopicTag>,
    /// Free-text description.
    pub description: String,
    /// Incident commander.
    pub commander: Option<UserId>,
    /// Communications representative.
    pub comms_rep: Option<UserId>,
}

impl IncidentTopic {
    /// Topic for a newly declared incident.
    pub fn active(severity: Severity, description: impl Into<String>) -> Self {
        Self {
            tag: Some(TopicTag::Active(severity)),
            description: description.into(),
            commander: None,
            comms_rep: None,
        }
    }

    /// Set the commander.
    pub fn with_commander(mut self, commander: Option<UserId>) -> Self {
        self.commander = commander;
        self
    }

    /// Set the comms representative.
    pub fn with_comms_rep(mut self, comms_rep: Option<UserId>) -> Self {
        self.comms_rep = comms_rep;
        self
    }

    /// Whether the topic carries the `Resolved` tag.
    pub fn is_resolved(&self) -> bool {
        self.tag == Some(TopicTag::Resolved)
    }

    /// Severity, when the incident is active.
    pub fn severity(&self) -> Option<Severity> {
        match self.tag {
            Some(TopicTag::Active(severity)) => Some(severity),
            _ => None,
        }
    }

    /// Encode into the topic string.
    pub fn encode(&self) -> String {
        PipeTopicCodec.encode(self)
    }

    /// Decode a topic string. Never fails.
    pub fn decode(raw: &str) -> Self {
        PipeTopicCodec.decode(raw)
    }
}

/// Converts incident metadata to and from its stored text form.
pub trait TopicCodec: Send + Sync {
    /// Format version, bumped whenever the layout changes.
    fn version(&self) -> u32;

    /// Encode metadata into topic text.
    fn encode(&self, topic: &IncidentTopic) -> String;

    /// Decode topic text. Implementations must not fail.
    fn decode(&self, raw: &str) -> IncidentTopic;
}

/// The `TAG incident: description | Commander: … | Comms: …` layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipeTopicCodec;

impl TopicCodec for PipeTopicCodec {
    fn version(&self) -> u32 {
        1
    }

    fn encode(&self, topic: &IncidentTopic) -> String {
        let mut out = match topic.tag {
            Some(TopicTag::Active(severity)) => {
                format!("{severity}{INCIDENT_SEPARATOR}{}", topic.description)
            }
            Some(TopicTag::Resolved) => format!("{RESOLVED_LABEL}: {}", topic.description),
            None => topic.description.clone(),
        };
        if let Some(commander) = &topic.commander {
            out.push_str(&format!("{COMMANDER_SEGMENT}{commander}>"));
        }
        if let Some(comms) = &topic.comms_rep {
            out.push_str(&format!("{COMMS_SEGMENT}{comms}>"));
        }
        out
    }

    fn decode(&self, raw: &str) -> IncidentTopic {
        let mut core = raw.to_string();
        let commander = take_role_segment(&mut core, COMMANDER_SEGMENT);
        let comms_rep = take_role_segment(&mut core, COMMS_SEGMENT);

        let (tag, description) = split_tag(&core);

        IncidentTopic {
            tag,
            description,
            commander,
            comms_rep,
        }
    }
}

/// Remove a ` | Role: <@U…>` segment from `core` and return the user.
///
/// An unterminated segment is cut off without yielding a user so its text
/// never ends up in the description.
fn take_role_segment(core: &mut String, segment: &str) -> Option<UserId> {
    let start = core.find(segment)?;
    let id_start = start + segment.len();
    match core[id_start..].find('>') {
        Some(len) => {
            let user = core[id_start..id_start + len].to_string();
            core.replace_range(start..id_start + len + 1, "");
            (!user.is_empty()).then(|| UserId::new(user))
        }
        None => {
            core.truncate(start);
            None
        }
    }
}

fn split_tag(core: &str) -> (Option<TopicTag>, String) {
    if let Some(rest) = core.strip_prefix(RESOLVED_LABEL) {
        if let Some(description) = rest.strip_prefix(INCIDENT_SEPARATOR) {
            return (Some(TopicTag::Resolved), description.to_string());
        }
        if let Some(rest) = rest.strip_prefix(':') {
            let description = rest.strip_prefix(' ').unwrap_or(rest);
            return (Some(TopicTag::Resolved), description.to_string());
        }
        if let Some(description) = rest.strip_prefix(' ') {
            return (Some(TopicTag::Resolved), description.to_string());
        }
    }

    if let Some((head, description)) = core.split_once(INCIDENT_SEPARATOR)
        && let Ok(severity) = head.parse::<Severity>()
    {
        return (Some(TopicTag::Active(severity)), description.to_string());
    }

    (None, core.to_string())
}
