//! Block Kit modal views for incident forms.

use incident_core::{FormField, FormKind, IncidentForm, Severity, Status};
use serde_json::{Value, json};

fn plain(text: &str) -> Value {
    json!({ "type": "plain_text", "text": text })
}

fn static_options<'a>(items: impl Iterator<Item = (&'a str, &'a str)>) -> Vec<Value> {
    items
        .enumerate()
        .map(|(i, (label, summary))| {
            json!({
                "text": plain(label),
                "description": plain(summary),
                "value": (i + 1).to_string(),
            })
        })
        .collect()
}

fn user_select(action_id: &str, placeholder: &str, initial: Option<&str>) -> Value {
    let mut element = json!({
        "type": "users_select",
        "action_id": action_id,
        "placeholder": plain(placeholder),
    });
    if let Some(user) = initial {
        element["initial_user"] = json!(user);
    }
    element
}

fn input_block(form: &IncidentForm, field: FormField) -> Value {
    let id = field.id();
    let (label, hint, element) = match field {
        FormField::Severity => (
            "severity",
            None,
            json!({
                "type": "static_select",
                "action_id": id,
                "placeholder": plain("Select Severity..."),
                "options": static_options(Severity::ALL.iter().map(|s| (s.label(), s.summary()))),
            }),
        ),
        FormField::Status => (
            "status",
            None,
            json!({
                "type": "static_select",
                "action_id": id,
                "placeholder": plain("Current Status..."),
                "options": static_options(Status::ALL.iter().map(|s| (s.label(), s.summary()))),
            }),
        ),
        FormField::Description => (
            "description",
            Some("Example: Increased latency in checkout"),
            json!({
                "type": "plain_text_input",
                "action_id": id,
                "placeholder": plain("Enter description of incident..."),
            }),
        ),
        FormField::Commander => (
            "Incident Commander (Optional - select one)",
            None,
            user_select(
                id,
                "Select Incident Commander",
                form.commander.as_ref().map(|u| u.as_str()),
            ),
        ),
        FormField::CommsRep => (
            "Comms Representative (Optional - select one)",
            None,
            user_select(
                id,
                "Select Comms Representative",
                form.comms_rep.as_ref().map(|u| u.as_str()),
            ),
        ),
        FormField::Members => (
            "incident_members",
            Some("Example: @johndoe @janedoe"),
            json!({
                "type": "multi_users_select",
                "action_id": id,
                "placeholder": plain("Enter people to add to incident channel..."),
            }),
        ),
    };

    let mut block = json!({
        "type": "input",
        "block_id": id,
        "label": plain(label),
        "element": element,
        "optional": field.optional(),
    });
    if let Some(hint) = hint {
        block["hint"] = plain(hint);
    }
    block
}

/// Render `form` as a `views.open` modal view.
pub fn modal_view(form: &IncidentForm) -> Value {
    let (title, submit, intro) = match form.kind {
        FormKind::Create => (
            "Create an Incident",
            "Create Incident",
            "Enter the below details for the incident channel.",
        ),
        FormKind::Update { .. } => (
            "Update an Incident",
            "Update Incident",
            "Enter the below details for the incident update.",
        ),
    };

    let mut blocks = vec![json!({
        "type": "section",
        "text": { "type": "mrkdwn", "text": intro },
    })];
    blocks.extend(form.fields().iter().map(|field| input_block(form, *field)));

    let mut view = json!({
        "type": "modal",
        "callback_id": form.callback_id(),
        "title": plain(title),
        "close": plain("Cancel"),
        "submit": plain(submit),
        "blocks": blocks,
    });
    if let Some(metadata) = form.private_metadata() {
        view["private_metadata"] = json!(metadata);
    }
    view
}
