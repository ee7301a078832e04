//! Inbound Slack payloads: slash commands and modal submissions.

use std::collections::HashMap;

use incident_core::forms::{CREATE_CALLBACK_ID, UPDATE_CALLBACK_ID};
use incident_core::{
    ChannelId, CommandContext, CreateIncident, FormField, Severity, Status, UpdateIncident, UserId,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Slack slash command payload (form-encoded).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlashCommandPayload {
    /// Team ID.
    #[serde(default)]
    pub team_id: String,
    /// Channel ID where the command was invoked.
    pub channel_id: String,
    /// Channel name.
    #[serde(default)]
    pub channel_name: String,
    /// User ID who invoked the command.
    pub user_id: String,
    /// Username.
    #[serde(default)]
    pub user_name: String,
    /// The command (e.g., "/incident").
    #[serde(default)]
    pub command: String,
    /// Text after the command.
    #[serde(default)]
    pub text: String,
    /// URL for delayed responses.
    #[serde(default)]
    pub response_url: String,
    /// Trigger ID for opening modals.
    #[serde(default)]
    pub trigger_id: String,
}

impl SlashCommandPayload {
    pub fn context(&self) -> CommandContext {
        CommandContext {
            channel: ChannelId::new(&self.channel_id),
            user: UserId::new(&self.user_id),
            trigger_id: self.trigger_id.clone(),
        }
    }
}

/// Slash command replies are only visible to the invoking user.
const EPHEMERAL: &str = "ephemeral";

/// Synchronous reply to a slash command.
#[derive(Debug, Clone, Serialize)]
pub struct SlashCommandResponse {
    pub response_type: &'static str,
    pub text: String,
}

impl SlashCommandResponse {
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            response_type: EPHEMERAL,
            text: text.into(),
        }
    }
}

/// Form body of an interaction request; the JSON lives in `payload`.
#[derive(Debug, Clone, Deserialize)]
pub struct InteractionForm {
    pub payload: String,
}

/// Problems with an interaction payload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("malformed interaction payload: {0}")]
    Malformed(String),

    #[error("missing form value: {0}")]
    MissingField(&'static str),

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

/// Interaction payload, reduced to what modal submissions carry.
#[derive(Debug, Clone, Deserialize)]
pub struct InteractionPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub user: InteractionUser,
    #[serde(default)]
    pub view: Option<ViewPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InteractionUser {
    pub id: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewPayload {
    #[serde(default)]
    pub callback_id: String,
    #[serde(default)]
    pub private_metadata: String,
    #[serde(default)]
    pub state: ViewState,
}

/// Submitted values keyed by block ID, then action ID.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewState {
    #[serde(default)]
    pub values: HashMap<String, HashMap<String, ElementValue>>,
}

/// Value of a single input element.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ElementValue {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub selected_option: Option<SelectedOption>,
    #[serde(default)]
    pub selected_user: Option<String>,
    #[serde(default)]
    pub selected_users: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectedOption {
    pub text: OptionText,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptionText {
    pub text: String,
}

/// What a modal submission asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Create(CreateIncident),
    Update(UpdateIncident),
    /// Anything other than one of our modal submissions.
    Ignored,
}

impl InteractionPayload {
    /// Parse the JSON carried in an interaction request's `payload` field.
    pub fn parse(raw: &str) -> Result<Self, PayloadError> {
        serde_json::from_str(raw).map_err(|e| PayloadError::Malformed(e.to_string()))
    }

    /// Turn a modal submission into an incident request.
    pub fn into_submission(self) -> Result<Submission, PayloadError> {
        if self.kind != "view_submission" {
            return Ok(Submission::Ignored);
        }
        let Some(view) = self.view else {
            return Ok(Submission::Ignored);
        };
        let user = UserId::new(self.user.id);
        let state = &view.state;

        match view.callback_id.as_str() {
            CREATE_CALLBACK_ID => {
                let description = state
                    .element(FormField::Description)
                    .and_then(|e| e.value.clone())
                    .ok_or(PayloadError::MissingField("description"))?;

                Ok(Submission::Create(CreateIncident {
                    creator: user,
                    description,
                    severity: state.severity()?,
                    status: state.status()?,
                    commander: state.user(FormField::Commander),
                    comms_rep: state.user(FormField::CommsRep),
                    members: state.users(FormField::Members),
                }))
            }
            UPDATE_CALLBACK_ID => {
                if view.private_metadata.is_empty() {
                    return Err(PayloadError::MissingField("private_metadata"));
                }
                Ok(Submission::Update(UpdateIncident {
                    channel: ChannelId::new(view.private_metadata.clone()),
                    user,
                    severity: state.severity()?,
                    status: state.status()?,
                    commander: state.user(FormField::Commander),
                    comms_rep: state.user(FormField::CommsRep),
                }))
            }
            _ => Ok(Submission::Ignored),
        }
    }
}

impl ViewState {
    /// Element submitted for `field`, regardless of its action ID.
    fn element(&self, field: FormField) -> Option<&ElementValue> {
        self.values
            .get(field.id())
            .and_then(|actions| actions.values().next())
    }

    fn selected_label(&self, field: FormField) -> Result<&str, PayloadError> {
        self.element(field)
            .and_then(|e| e.selected_option.as_ref())
            .map(|opt| opt.text.text.as_str())
            .ok_or(PayloadError::MissingField(field.id()))
    }

    fn severity(&self) -> Result<Severity, PayloadError> {
        let label = self.selected_label(FormField::Severity)?;
        label.parse().map_err(|_| PayloadError::InvalidValue {
            field: FormField::Severity.id(),
            value: label.to_string(),
        })
    }

    fn status(&self) -> Result<Status, PayloadError> {
        let label = self.selected_label(FormField::Status)?;
        label.parse().map_err(|_| PayloadError::InvalidValue {
            field: FormField::Status.id(),
            value: label.to_string(),
        })
    }

    /// Single selected user; multi-selects contribute their first pick.
    fn user(&self, field: FormField) -> Option<UserId> {
        let element = self.element(field)?;
        element
            .selected_user
            .clone()
            .or_else(|| element.selected_users.as_ref()?.first().cloned())
            .filter(|id| !id.is_empty())
            .map(UserId::new)
    }

    fn users(&self, field: FormField) -> Vec<UserId> {
        self.element(field)
            .and_then(|e| e.selected_users.as_ref())
            .map(|ids| ids.iter().map(|id| UserId::new(id.as_str())).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn select(label: &str) -> serde_json::Value {
        json!({
            "type": "static_select",
            "selected_option": { "text": { "type": "plain_text", "text": label }, "value": "2" }
        })
    }

    fn create_payload() -> String {
        json!({
            "type": "view_submission",
            "user": { "id": "U1", "username": "alice" },
            "view": {
                "callback_id": "create_incident_modal",
                "private_metadata": "",
                "state": { "values": {
                    "incident_severity": { "incident_severity": select("SEV-1") },
                    "status": { "status": select("Fixing") },
                    "description": { "description": { "type": "plain_text_input", "value": "DB down" } },
                    "incident_commander": { "incident_commander": { "type": "users_select", "selected_user": "U2" } },
                    "comms_representative": { "comms_representative": { "type": "users_select", "selected_user": null } },
                    "incident_members": { "incident_members": { "type": "multi_users_select", "selected_users": ["U3", "U4"] } }
                }}
            }
        })
        .to_string()
    }

    #[test]
    fn test_slash_command_context() {
        let payload: SlashCommandPayload = serde_json::from_value(json!({
            "channel_id": "C1", "user_id": "U1", "text": "t hello", "trigger_id": "T1"
        }))
        .unwrap();
        let ctx = payload.context();
        assert_eq!(ctx.channel, ChannelId::new("C1"));
        assert_eq!(ctx.user, UserId::new("U1"));
        assert_eq!(ctx.trigger_id, "T1");
    }

    #[test]
    fn test_ephemeral_response_json() {
        let json = serde_json::to_value(SlashCommandResponse::ephemeral("nope")).unwrap();
        assert_eq!(json, json!({ "response_type": "ephemeral", "text": "nope" }));
    }

    #[test]
    fn test_create_submission() {
        let submission = InteractionPayload::parse(&create_payload())
            .unwrap()
            .into_submission()
            .unwrap();

        assert_eq!(
            submission,
            Submission::Create(CreateIncident {
                creator: UserId::new("U1"),
                description: "DB down".into(),
                severity: Severity::Sev1,
                status: Status::Fixing,
                commander: Some(UserId::new("U2")),
                comms_rep: None,
                members: vec![UserId::new("U3"), UserId::new("U4")],
            })
        );
    }

    #[test]
    fn test_update_submission_uses_private_metadata() {
        let raw = json!({
            "type": "view_submission",
            "user": { "id": "U9" },
            "view": {
                "callback_id": "update_incident_modal",
                "private_metadata": "C42",
                "state": { "values": {
                    "incident_severity": { "incident_severity": select("SEV-2") },
                    "status": { "status": select("Monitoring") },
                    "incident_commander": { "incident_commander": { "selected_users": ["U5"] } }
                }}
            }
        })
        .to_string();

        let submission = InteractionPayload::parse(&raw)
            .unwrap()
            .into_submission()
            .unwrap();
        assert_eq!(
            submission,
            Submission::Update(UpdateIncident {
                channel: ChannelId::new("C42"),
                user: UserId::new("U9"),
                severity: Severity::Sev2,
                status: Status::Monitoring,
                commander: Some(UserId::new("U5")),
                comms_rep: None,
            })
        );
    }

    #[test]
    fn test_other_interactions_ignored() {
        let raw = json!({ "type": "block_actions", "user": { "id": "U1" } }).to_string();
        assert_eq!(
            InteractionPayload::parse(&raw).unwrap().into_submission().unwrap(),
            Submission::Ignored
        );
    }

    #[test]
    fn test_invalid_severity_label() {
        let raw = create_payload().replace("SEV-1", "SEV-9");
        let err = InteractionPayload::parse(&raw)
            .unwrap()
            .into_submission()
            .unwrap_err();
        assert_eq!(
            err,
            PayloadError::InvalidValue {
                field: "incident_severity",
                value: "SEV-9".into()
            }
        );
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            InteractionPayload::parse("{not json"),
            Err(PayloadError::Malformed(_))
        ));
    }
}
