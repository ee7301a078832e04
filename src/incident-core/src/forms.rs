//! Modal forms the bot asks the platform to open.
//!
//! A form is described by its kind and fields only; turning it into a
//! concrete view layout is the platform client's job.

use serde::{Deserialize, Serialize};

use crate::platform::{ChannelId, UserId};

/// Callback ID of the create-incident form.
pub const CREATE_CALLBACK_ID: &str = "create_incident_modal";
/// Callback ID of the update-incident form.
pub const UPDATE_CALLBACK_ID: &str = "update_incident_modal";

/// Which form is being opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FormKind {
    /// Declare a new incident.
    Create,
    /// Edit the incident owning `channel`.
    Update { channel: ChannelId },
}

/// Input fields, each with a stable block and action ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Severity,
    Status,
    Description,
    Commander,
    CommsRep,
    Members,
}

impl FormField {
    /// Block ID, also used as the action ID of the field's element.
    pub fn id(self) -> &'static str {
        match self {
            FormField::Severity => "incident_severity",
            FormField::Status => "status",
            FormField::Description => "description",
            FormField::Commander => "incident_commander",
            FormField::CommsRep => "comms_representative",
            FormField::Members => "incident_members",
        }
    }

    /// Whether the field may be left empty.
    pub fn optional(self) -> bool {
        matches!(
            self,
            FormField::Commander | FormField::CommsRep | FormField::Members
        )
    }
}

/// A modal form request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentForm {
    pub kind: FormKind,
    /// Pre-selected commander.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commander: Option<UserId>,
    /// Pre-selected comms representative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comms_rep: Option<UserId>,
}

impl IncidentForm {
    /// Empty create form.
    pub fn create() -> Self {
        Self {
            kind: FormKind::Create,
            commander: None,
            comms_rep: None,
        }
    }

    /// Update form for `channel`, without pre-fill.
    pub fn update(channel: ChannelId) -> Self {
        Self {
            kind: FormKind::Update { channel },
            commander: None,
            comms_rep: None,
        }
    }

    /// Pre-select the role holders.
    pub fn with_roles(mut self, commander: Option<UserId>, comms_rep: Option<UserId>) -> Self {
        self.commander = commander;
        self.comms_rep = comms_rep;
        self
    }

    pub fn callback_id(&self) -> &'static str {
        match self.kind {
            FormKind::Create => CREATE_CALLBACK_ID,
            FormKind::Update { .. } => UPDATE_CALLBACK_ID,
        }
    }

    /// Opaque value echoed back on submission: the channel for updates.
    pub fn private_metadata(&self) -> Option<&str> {
        match &self.kind {
            FormKind::Create => None,
            FormKind::Update { channel } => Some(channel.as_str()),
        }
    }

    /// Fields in display order.
    pub fn fields(&self) -> &'static [FormField] {
        match self.kind {
            FormKind::Create => &[
                FormField::Severity,
                FormField::Status,
                FormField::Description,
                FormField::Commander,
                FormField::CommsRep,
                FormField::Members,
            ],
            FormKind::Update { .. } => &[
                FormField::Severity,
                FormField::Status,
                FormField::Commander,
                FormField::CommsRep,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_form() {
        let form = IncidentForm::create();
        assert_eq!(form.callback_id(), "create_incident_modal");
        assert_eq!(form.private_metadata(), None);
        assert!(form.fields().contains(&FormField::Description));
        assert!(form.fields().contains(&FormField::Members));
    }

    #[test]
    fn test_update_form_carries_channel() {
        let form = IncidentForm::update(ChannelId::new("C42"))
            .with_roles(Some(UserId::new("U1")), None);
        assert_eq!(form.callback_id(), "update_incident_modal");
        assert_eq!(form.private_metadata(), Some("C42"));
        assert_eq!(form.commander, Some(UserId::new("U1")));
        assert!(!form.fields().contains(&FormField::Description));
    }

    #[test]
    fn test_field_ids() {
        assert_eq!(FormField::Severity.id(), "incident_severity");
        assert_eq!(FormField::CommsRep.id(), "comms_representative");
        assert!(FormField::Members.optional());
        assert!(!FormField::Status.optional());
    }
}
