//! Incident lifecycle: create, update, resolve and ledger entries.
//!
//! [`IncidentService`] composes the channel provisioner, the topic codec and
//! the ledgers. It keeps no state of its own; every call re-reads the topic
//! and pins from the platform.
//!
//! Each operation separates required steps, whose failure is returned, from
//! best-effort steps, whose failure is logged at `warn` and otherwise
//! ignored.

use tracing::{info, instrument, warn};

use crate::blocks::{Block, BlocksBuilder, mention};
use crate::clock::{Clock, SystemClock};
use crate::error::{IncidentError, IncidentResult, PlatformResultExt};
use crate::forms::IncidentForm;
use crate::ledger::{AppendOutcome, LedgerEntry, LedgerKind, append_entry, create_ledger};
use crate::platform::{ChannelId, ChatPlatform, UserId};
use crate::provision::{base_channel_name, dedup_participants, provision_channel};
use crate::topic::{IncidentTopic, Severity, Status, TopicTag};

/// Action item added automatically for the highest severities.
pub const POSTMORTEM_ITEM: &str = "Create incident postmortem";

/// Ephemeral confirmation sent after a resolve.
pub const RESOLVED_CONFIRMATION: &str = ":white_check_mark: Incident marked as resolved.";

const DESCRIPTION_UNAVAILABLE: &str = "Description unavailable";

/// Fields submitted through the create form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIncident {
    /// User who submitted the form.
    pub creator: UserId,
    pub description: String,
    pub severity: Severity,
    pub status: Status,
    pub commander: Option<UserId>,
    pub comms_rep: Option<UserId>,
    /// Extra people to invite.
    pub members: Vec<UserId>,
}

/// Fields submitted through the update form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateIncident {
    /// Incident channel, echoed back from the form.
    pub channel: ChannelId,
    /// User who submitted the form.
    pub user: UserId,
    pub severity: Severity,
    pub status: Status,
    /// New commander; `None` clears the role.
    pub commander: Option<UserId>,
    /// New comms representative; `None` clears the role.
    pub comms_rep: Option<UserId>,
}

/// Runs incident operations against a chat platform.
#[derive(Debug)]
pub struct IncidentService<P, C = SystemClock> {
    platform: P,
    clock: C,
    private_channels: bool,
}

impl<P: ChatPlatform> IncidentService<P, SystemClock> {
    /// Service using the wall clock and public channels.
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            clock: SystemClock,
            private_channels: false,
        }
    }
}

impl<P: ChatPlatform, C: Clock> IncidentService<P, C> {
    /// Replace the clock.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> IncidentService<P, C2> {
        IncidentService {
            platform: self.platform,
            clock,
            private_channels: self.private_channels,
        }
    }

    /// Create incident channels as private channels.
    pub fn with_private_channels(mut self, private: bool) -> Self {
        self.private_channels = private;
        self
    }

    /// The underlying platform.
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Open the create-incident form.
    pub async fn open_create_form(&self, trigger_id: &str) -> IncidentResult<()> {
        self.platform
            .open_modal(trigger_id, &IncidentForm::create())
            .await
            .context("could not open dialog")
    }

    /// Open the update form for `channel`, pre-filled with the current roles.
    ///
    /// The form still opens, empty, when the topic cannot be read.
    pub async fn open_update_form(&self, trigger_id: &str, channel: &ChannelId) -> IncidentResult<()> {
        let mut form = IncidentForm::update(channel.clone());
        match self.platform.get_topic(channel).await {
            Ok(raw) => {
                let topic = IncidentTopic::decode(&raw);
                form = form.with_roles(topic.commander, topic.comms_rep);
            }
            Err(e) => {
                warn!(channel = %channel, error = %e, "Could not get current topic for update form prefill");
            }
        }

        self.platform
            .open_modal(trigger_id, &form)
            .await
            .context("could not open update dialog")
    }

    /// Declare an incident: new channel, topic, both ledgers.
    #[instrument(skip(self, req), fields(creator = %req.creator, severity = %req.severity))]
    pub async fn create_incident(&self, req: CreateIncident) -> IncidentResult<ChannelId> {
        let description = req.description.trim();
        if description.is_empty() {
            return Err(IncidentError::InvalidInput(
                "description must not be empty".to_string(),
            ));
        }

        let now = self.clock.now();
        let participants = dedup_participants(
            std::iter::once(req.creator.clone())
                .chain(req.members.iter().cloned())
                .chain(req.commander.iter().cloned())
                .chain(req.comms_rep.iter().cloned()),
        );

        let channel = provision_channel(
            &self.platform,
            &base_channel_name(now),
            &participants,
            self.private_channels,
        )
        .await?;

        let topic = IncidentTopic::active(req.severity, description)
            .with_commander(req.commander.clone())
            .with_comms_rep(req.comms_rep.clone());
        if let Err(e) = self.platform.set_topic(&channel, &topic.encode()).await {
            warn!(channel = %channel, error = %e, "Failed to set channel topic (non-fatal)");
        }

        let created = LedgerEntry::stamped(
            now,
            &format!(
                "Incident created by {}. Severity: {} Status: {}",
                mention(req.creator.as_str()),
                req.severity,
                req.status
            ),
        );
        create_ledger(&self.platform, &channel, LedgerKind::Timeline, &[created]).await?;
        create_ledger(&self.platform, &channel, LedgerKind::ActionItems, &[]).await?;

        if req.severity.requires_postmortem() {
            self.add_postmortem_item(&channel, &req.creator).await;
        }

        if let Err(e) = self
            .platform
            .post_ephemeral(&channel, &req.creator, &help_blocks())
            .await
        {
            warn!(channel = %channel, user = %req.creator, error = %e, "Failed to send help message");
        }

        info!(channel = %channel, "Incident created");
        Ok(channel)
    }

    /// Apply an update-form submission.
    ///
    /// A resolved incident stays resolved; only [`resolve_incident`] sets
    /// that tag. The consolidated timeline entry is the only required write.
    ///
    /// [`resolve_incident`]: Self::resolve_incident
    #[instrument(skip(self, req), fields(channel = %req.channel, user = %req.user))]
    pub async fn update_incident(&self, req: UpdateIncident) -> IncidentResult<()> {
        let channel = &req.channel;
        let raw = self
            .platform
            .get_topic(channel)
            .await
            .context("failed to get channel topic")?;
        let current = IncidentTopic::decode(&raw);

        let tag = if current.is_resolved() {
            TopicTag::Resolved
        } else {
            TopicTag::Active(req.severity)
        };
        let description = if current.description.is_empty() {
            DESCRIPTION_UNAVAILABLE.to_string()
        } else {
            current.description.clone()
        };
        let updated = IncidentTopic {
            tag: Some(tag),
            description,
            commander: req.commander.clone(),
            comms_rep: req.comms_rep.clone(),
        };

        let encoded = updated.encode();
        if encoded != raw
            && let Err(e) = self.platform.set_topic(channel, &encoded).await
        {
            warn!(channel = %channel, topic = %encoded, error = %e, "Failed to update channel topic");
        }

        let newcomers = dedup_participants(
            role_change(&current.commander, &req.commander)
                .into_iter()
                .chain(role_change(&current.comms_rep, &req.comms_rep)),
        );
        if !newcomers.is_empty()
            && let Err(e) = self.platform.invite_users(channel, &newcomers).await
        {
            warn!(channel = %channel, error = %e, "Failed to invite new commander/comms to channel");
        }

        if req.severity.requires_postmortem() {
            self.add_postmortem_item(channel, &req.user).await;
        }

        let message = update_summary(&req, &current);
        self.add_timeline_item(channel, &req.user, &message).await
    }

    /// Record resolution on the timeline and re-tag the topic.
    ///
    /// Only the timeline entry is required; the topic write and the
    /// confirmation are best-effort.
    #[instrument(skip(self, reason))]
    pub async fn resolve_incident(
        &self,
        channel: &ChannelId,
        user: &UserId,
        reason: Option<&str>,
    ) -> IncidentResult<()> {
        let message = match reason.map(str::trim).filter(|r| !r.is_empty()) {
            Some(reason) => format!("Incident resolved. Resolution: {reason}"),
            None => "Incident resolved.".to_string(),
        };
        self.add_timeline_item(channel, user, &message).await?;

        match self.platform.get_topic(channel).await {
            Ok(raw) => self.mark_topic_resolved(channel, &raw).await,
            Err(e) => {
                warn!(channel = %channel, error = %e, "Failed to get channel topic for resolving incident");
            }
        }

        let confirmation = [Block::section(RESOLVED_CONFIRMATION)];
        if let Err(e) = self.platform.post_ephemeral(channel, user, &confirmation).await {
            warn!(channel = %channel, user = %user, error = %e, "Failed to send resolve confirmation message");
        }

        info!(channel = %channel, "Incident resolved");
        Ok(())
    }

    async fn mark_topic_resolved(&self, channel: &ChannelId, raw: &str) {
        let mut topic = IncidentTopic::decode(raw);
        if topic.description.is_empty() {
            warn!(channel = %channel, "Topic was empty or unparsable for resolve");
            topic.description = DESCRIPTION_UNAVAILABLE.to_string();
        } else if topic.tag.is_none() {
            warn!(channel = %channel, topic = %raw, "Topic has no incident tag, using it as description");
        }
        topic.tag = Some(TopicTag::Resolved);

        let encoded = topic.encode();
        if encoded == raw {
            return;
        }
        if let Err(e) = self.platform.set_topic(channel, &encoded).await {
            warn!(channel = %channel, topic = %encoded, error = %e, "Failed to set channel topic to resolved");
        }
    }

    /// Append `<now> - <message> by <@user>` to the timeline.
    pub async fn add_timeline_item(
        &self,
        channel: &ChannelId,
        user: &UserId,
        message: &str,
    ) -> IncidentResult<()> {
        let entry = LedgerEntry::timeline(self.clock.now(), message, user);
        append_entry(&self.platform, channel, LedgerKind::Timeline, &entry).await?;
        Ok(())
    }

    /// Append `<@user> - <description>` to the action items.
    ///
    /// Adding a description that is already listed is a no-op.
    pub async fn add_action_item(
        &self,
        channel: &ChannelId,
        user: &UserId,
        description: &str,
    ) -> IncidentResult<AppendOutcome> {
        let entry = LedgerEntry::action_item(user, description);
        append_entry(&self.platform, channel, LedgerKind::ActionItems, &entry).await
    }

    async fn add_postmortem_item(&self, channel: &ChannelId, user: &UserId) {
        if let Err(e) = self.add_action_item(channel, user, POSTMORTEM_ITEM).await {
            warn!(channel = %channel, error = %e, "Failed to add postmortem action item");
        }
    }
}

/// The newly assigned holder of a role, if it changed to someone.
fn role_change(old: &Option<UserId>, new: &Option<UserId>) -> Option<UserId> {
    match new {
        Some(user) if old.as_ref() != Some(user) => Some(user.clone()),
        _ => None,
    }
}

fn update_summary(req: &UpdateIncident, current: &IncidentTopic) -> String {
    let mut parts = vec![format!(
        "Incident updated. Status: {}, Severity: {}",
        req.status, req.severity
    )];

    if req.commander != current.commander {
        parts.push(match &req.commander {
            Some(user) => format!("Incident Commander changed to {}.", mention(user.as_str())),
            None => "Incident Commander removed.".to_string(),
        });
    }
    if req.comms_rep != current.comms_rep {
        parts.push(match &req.comms_rep {
            Some(user) => format!("Comms Representative changed to {}.", mention(user.as_str())),
            None => "Comms Representative removed.".to_string(),
        });
    }

    parts.join(" ")
}

/// The help menu.
pub fn help_blocks() -> Vec<Block> {
    BlocksBuilder::new()
        .section(
            "Hey there 👋 I'm Hal. I'm here to help you create and manage incidents in Slack.\n\
             Here are the commands available to you:",
        )
        .section(
            "*🆕 Use `/incident create` (or `c`)*. I will ask you for some details, and create a new incident.",
        )
        .section("*🔄 Use `/incident update` (or `u`)*. Change the status or severity of an incident.")
        .section(
            "*🧹 Use `/incident action-item <description>` (or `ai <description>`)*. Adds an action item to the incident.",
        )
        .section(
            "*⏰ Use `/incident timeline <message>` (or `t <message>`)*. Adds an event to the incident timeline.",
        )
        .section(
            "*✅ Use `/incident resolve [optional message]` (or `r [optional message]`)*. Marks the incident as resolved and updates the channel topic.",
        )
        .section("*🤖 Use `/incident help` (or `h`)*. Show this menu again.")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::PlatformError;
    use crate::forms::FormKind;
    use crate::testing::MemoryPlatform;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn service() -> IncidentService<MemoryPlatform, FixedClock> {
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());
        IncidentService::new(MemoryPlatform::new()).with_clock(clock)
    }

    fn user(id: &str) -> UserId {
        UserId::new(id)
    }

    fn create_request(severity: Severity) -> CreateIncident {
        CreateIncident {
            creator: user("U1"),
            description: "DB outage".to_string(),
            severity,
            status: Status::Investigating,
            commander: Some(user("U2")),
            comms_rep: None,
            members: vec![user("U3"), user("U1")],
        }
    }

    fn update_request(channel: &ChannelId, severity: Severity) -> UpdateIncident {
        UpdateIncident {
            channel: channel.clone(),
            user: user("U1"),
            severity,
            status: Status::Fixing,
            commander: Some(user("U2")),
            comms_rep: None,
        }
    }

    #[tokio::test]
    async fn test_create_incident_sets_up_channel() {
        let svc = service();
        let channel = svc.create_incident(create_request(Severity::Sev1)).await.unwrap();
        let p = svc.platform();
        let id = channel.as_str();

        assert_eq!(
            p.channel_name(id),
            Some(("incident-20240101-1".to_string(), false))
        );
        assert_eq!(p.members(id), vec![user("U1"), user("U3"), user("U2")]);
        assert_eq!(p.topic(id), "SEV-1 incident: DB outage | Commander: <@U2>");
        assert_eq!(p.pins(id).len(), 2);
        assert_eq!(
            p.ledger_lines(id, LedgerKind::Timeline),
            vec![
                "2024-01-01 12:00:00 - Incident created by <@U1>. Severity: SEV-1 Status: Investigating"
                    .to_string()
            ]
        );
        assert_eq!(
            p.ledger_lines(id, LedgerKind::ActionItems),
            vec!["<@U1> - Create incident postmortem".to_string()]
        );

        let ephemerals = p.ephemerals();
        assert_eq!(ephemerals.len(), 1);
        assert_eq!(ephemerals[0].1, user("U1"));
        assert_eq!(ephemerals[0].2, help_blocks());
    }

    #[tokio::test]
    async fn test_create_critical_adds_postmortem() {
        let svc = service();
        let channel = svc.create_incident(create_request(Severity::Sev0)).await.unwrap();

        let topic = IncidentTopic::decode(&svc.platform().topic(channel.as_str()));
        assert_eq!(topic.severity(), Some(Severity::Sev0));
        assert_eq!(
            svc.platform()
                .ledger_lines(channel.as_str(), LedgerKind::ActionItems),
            vec![format!("<@U1> - {POSTMORTEM_ITEM}")]
        );
    }

    #[tokio::test]
    async fn test_create_low_severity_has_no_postmortem() {
        for severity in [Severity::Sev2, Severity::Sev3] {
            let svc = service();
            let channel = svc.create_incident(create_request(severity)).await.unwrap();
            assert!(
                svc.platform()
                    .ledger_lines(channel.as_str(), LedgerKind::ActionItems)
                    .is_empty()
            );
        }
    }

    #[tokio::test]
    async fn test_create_picks_next_free_name() {
        let svc = service();
        svc.platform().take_name("incident-20240101-1");
        let channel = svc.create_incident(create_request(Severity::Sev3)).await.unwrap();
        assert_eq!(
            svc.platform().channel_name(channel.as_str()).map(|(n, _)| n),
            Some("incident-20240101-2".to_string())
        );
    }

    #[tokio::test]
    async fn test_create_private_channel() {
        let svc = service().with_private_channels(true);
        let channel = svc.create_incident(create_request(Severity::Sev3)).await.unwrap();
        assert_eq!(
            svc.platform().channel_name(channel.as_str()).map(|(_, p)| p),
            Some(true)
        );
    }

    #[tokio::test]
    async fn test_create_survives_topic_failure() {
        let svc = service();
        svc.platform()
            .fail("set_topic", PlatformError::Api("too_long".into()));
        let channel = svc.create_incident(create_request(Severity::Sev2)).await.unwrap();
        assert_eq!(svc.platform().topic(channel.as_str()), "");
        assert_eq!(svc.platform().pins(channel.as_str()).len(), 2);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_description() {
        let svc = service();
        let mut req = create_request(Severity::Sev2);
        req.description = "   ".to_string();
        let err = svc.create_incident(req).await.unwrap_err();
        assert!(matches!(err, IncidentError::InvalidInput(_)));
        assert!(svc.platform().channel_named("incident-20240101-1").is_none());
    }

    #[tokio::test]
    async fn test_update_changes_topic_and_logs() {
        let svc = service();
        let channel = svc.create_incident(create_request(Severity::Sev3)).await.unwrap();

        let mut req = update_request(&channel, Severity::Sev2);
        req.commander = Some(user("U4"));
        req.comms_rep = Some(user("U5"));
        svc.update_incident(req).await.unwrap();

        let p = svc.platform();
        let id = channel.as_str();
        assert_eq!(
            p.topic(id),
            "SEV-2 incident: DB outage | Commander: <@U4> | Comms: <@U5>"
        );
        assert!(p.members(id).ends_with(&[user("U4"), user("U5")]));
        assert_eq!(
            p.ledger_lines(id, LedgerKind::Timeline)[1],
            "2024-01-01 12:00:00 - Incident updated. Status: Fixing, Severity: SEV-2 \
             Incident Commander changed to <@U4>. Comms Representative changed to <@U5>. by <@U1>"
        );
    }

    #[tokio::test]
    async fn test_update_removing_role() {
        let svc = service();
        let channel = svc.create_incident(create_request(Severity::Sev3)).await.unwrap();

        let mut req = update_request(&channel, Severity::Sev3);
        req.commander = None;
        svc.update_incident(req).await.unwrap();

        let p = svc.platform();
        assert_eq!(p.topic(channel.as_str()), "SEV-3 incident: DB outage");
        let lines = p.ledger_lines(channel.as_str(), LedgerKind::Timeline);
        assert!(lines[1].ends_with("Severity: SEV-3 Incident Commander removed. by <@U1>"));
    }

    #[tokio::test]
    async fn test_update_keeps_resolved_tag() {
        let svc = service();
        let channel = svc.create_incident(create_request(Severity::Sev3)).await.unwrap();
        svc.resolve_incident(&channel, &user("U1"), None).await.unwrap();

        svc.update_incident(update_request(&channel, Severity::Sev0))
            .await
            .unwrap();

        assert_eq!(
            svc.platform().topic(channel.as_str()),
            "Resolved: DB outage | Commander: <@U2>"
        );
    }

    #[tokio::test]
    async fn test_update_to_high_severity_adds_postmortem_once() {
        let svc = service();
        let channel = svc.create_incident(create_request(Severity::Sev3)).await.unwrap();

        svc.update_incident(update_request(&channel, Severity::Sev0))
            .await
            .unwrap();
        svc.update_incident(update_request(&channel, Severity::Sev1))
            .await
            .unwrap();

        assert_eq!(
            svc.platform()
                .ledger_lines(channel.as_str(), LedgerKind::ActionItems),
            vec!["<@U1> - Create incident postmortem".to_string()]
        );
    }

    #[tokio::test]
    async fn test_update_fails_when_topic_unreadable() {
        let svc = service();
        let channel = svc.create_incident(create_request(Severity::Sev3)).await.unwrap();
        svc.platform()
            .fail("get_topic", PlatformError::Network("connection reset".into()));

        let err = svc
            .update_incident(update_request(&channel, Severity::Sev2))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("failed to get channel topic"));
    }

    #[tokio::test]
    async fn test_update_without_timeline_fails() {
        let svc = service();
        svc.platform().add_channel("C9");
        svc.platform().put_topic("C9", "SEV-2 incident: Legacy");

        let err = svc
            .update_incident(update_request(&ChannelId::new("C9"), Severity::Sev2))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IncidentError::LedgerNotFound(LedgerKind::Timeline)
        ));
    }

    #[tokio::test]
    async fn test_resolve_retags_topic() {
        let svc = service();
        let mut req = create_request(Severity::Sev2);
        req.comms_rep = Some(user("U5"));
        let channel = svc.create_incident(req).await.unwrap();

        svc.resolve_incident(&channel, &user("U1"), Some("rolled back"))
            .await
            .unwrap();

        let p = svc.platform();
        let id = channel.as_str();
        assert_eq!(
            p.topic(id),
            "Resolved: DB outage | Commander: <@U2> | Comms: <@U5>"
        );
        assert_eq!(
            p.ledger_lines(id, LedgerKind::Timeline).last().unwrap(),
            "2024-01-01 12:00:00 - Incident resolved. Resolution: rolled back by <@U1>"
        );
        let last = p.ephemerals().pop().unwrap();
        assert_eq!(last.2, vec![Block::section(RESOLVED_CONFIRMATION)]);
    }

    #[tokio::test]
    async fn test_resolve_is_best_effort_after_timeline() {
        let svc = service();
        let channel = svc.create_incident(create_request(Severity::Sev3)).await.unwrap();
        svc.platform()
            .fail("set_topic", PlatformError::Api("restricted_action".into()));
        svc.platform()
            .fail("post_ephemeral", PlatformError::NotInChannel("C1".into()));

        svc.resolve_incident(&channel, &user("U1"), None).await.unwrap();
        assert!(
            svc.platform()
                .ledger_lines(channel.as_str(), LedgerKind::Timeline)
                .last()
                .unwrap()
                .ends_with("Incident resolved. by <@U1>")
        );
    }

    #[tokio::test]
    async fn test_resolve_requires_timeline() {
        let svc = service();
        svc.platform().add_channel("C9");
        let err = svc
            .resolve_incident(&ChannelId::new("C9"), &user("U1"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, IncidentError::LedgerNotFound(_)));
        assert_eq!(svc.platform().topic("C9"), "");
    }

    #[tokio::test]
    async fn test_action_item_idempotent() {
        let svc = service();
        let channel = svc.create_incident(create_request(Severity::Sev3)).await.unwrap();

        let first = svc
            .add_action_item(&channel, &user("U1"), "Page on-call")
            .await
            .unwrap();
        let second = svc
            .add_action_item(&channel, &user("U1"), "Page on-call")
            .await
            .unwrap();

        assert_eq!(first, AppendOutcome::Appended);
        assert_eq!(second, AppendOutcome::Duplicate);
        assert_eq!(
            svc.platform()
                .ledger_lines(channel.as_str(), LedgerKind::ActionItems)
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_update_form_prefilled_from_topic() {
        let svc = service();
        svc.platform().add_channel("C9");
        svc.platform()
            .put_topic("C9", "SEV-1 incident: X | Commander: <@U7> | Comms: <@U8>");

        svc.open_update_form("trigger-1", &ChannelId::new("C9"))
            .await
            .unwrap();

        let (trigger, form) = svc.platform().modals().pop().unwrap();
        assert_eq!(trigger, "trigger-1");
        assert_eq!(
            form.kind,
            FormKind::Update {
                channel: ChannelId::new("C9")
            }
        );
        assert_eq!(form.commander, Some(user("U7")));
        assert_eq!(form.comms_rep, Some(user("U8")));
    }

    #[tokio::test]
    async fn test_update_form_opens_without_topic() {
        let svc = service();
        svc.platform()
            .fail("get_topic", PlatformError::Timeout("conversations.info".into()));

        svc.open_update_form("trigger-1", &ChannelId::new("C9"))
            .await
            .unwrap();

        let (_, form) = svc.platform().modals().pop().unwrap();
        assert_eq!(form.commander, None);
    }

    #[test]
    fn test_help_lists_every_command() {
        let text = crate::blocks::fallback_text(&help_blocks());
        for verb in ["create", "update", "action-item", "timeline", "resolve", "help"] {
            assert!(text.contains(&format!("/incident {verb}")), "missing {verb}");
        }
    }
}
