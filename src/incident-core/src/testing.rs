//! In-memory [`ChatPlatform`] for tests.
//!
//! Records every channel, topic, message, pin, ephemeral post and opened
//! modal. Individual operations can be made to fail by name.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::blocks::{Block, fallback_text};
use crate::error::{PlatformError, PlatformResult};
use crate::forms::IncidentForm;
use crate::ledger::LedgerKind;
use crate::platform::{ChannelId, ChatPlatform, MessageTs, PinnedMessage, UserId};

#[derive(Debug, Default)]
struct ChannelState {
    name: String,
    private: bool,
    topic: String,
    members: Vec<UserId>,
    messages: Vec<(MessageTs, Vec<Block>)>,
    /// Fallback text that differs from the blocks' own text.
    texts: HashMap<MessageTs, String>,
    pins: Vec<MessageTs>,
}

#[derive(Debug, Default)]
struct State {
    channels: HashMap<ChannelId, ChannelState>,
    taken_names: HashSet<String>,
    failing: HashMap<&'static str, PlatformError>,
    ephemerals: Vec<(ChannelId, UserId, Vec<Block>)>,
    modals: Vec<(String, IncidentForm)>,
    invite_calls: usize,
    next_id: u64,
}

impl State {
    fn check(&self, op: &'static str) -> PlatformResult<()> {
        match self.failing.get(op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn channel_mut(&mut self, channel: &ChannelId) -> PlatformResult<&mut ChannelState> {
        self.channels
            .get_mut(channel)
            .ok_or_else(|| PlatformError::Api(format!("channel_not_found: {channel}")))
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory chat platform.
#[derive(Debug, Default)]
pub struct MemoryPlatform {
    state: Mutex<State>,
}

impl MemoryPlatform {
    /// Empty workspace.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register an existing channel with the given ID.
    pub fn add_channel(&self, id: &str) {
        self.lock().channels.insert(
            ChannelId::new(id),
            ChannelState {
                name: id.to_string(),
                ..Default::default()
            },
        );
    }

    /// Mark a channel name as already in use.
    pub fn take_name(&self, name: &str) {
        self.lock().taken_names.insert(name.to_string());
    }

    /// Make every call of `op` (a trait method name) fail with `err`.
    pub fn fail(&self, op: &'static str, err: PlatformError) {
        self.lock().failing.insert(op, err);
    }

    /// Overwrite a channel topic without going through the trait.
    pub fn put_topic(&self, channel: &str, topic: &str) {
        if let Some(state) = self.lock().channels.get_mut(&ChannelId::new(channel)) {
            state.topic = topic.to_string();
        }
    }

    /// Post and pin a message with explicit fallback text, as when the
    /// platform returns blocks the client could not read.
    pub fn pin_raw(&self, channel: &str, text: &str, blocks: Vec<Block>) -> MessageTs {
        let mut state = self.lock();
        let ts = MessageTs::new(format!("1700000000.{:06}", state.next_id()));
        if let Some(c) = state.channels.get_mut(&ChannelId::new(channel)) {
            c.messages.push((ts.clone(), blocks));
            c.texts.insert(ts.clone(), text.to_string());
            c.pins.push(ts.clone());
        }
        ts
    }

    /// Current topic of a channel.
    pub fn topic(&self, channel: &str) -> String {
        self.lock()
            .channels
            .get(&ChannelId::new(channel))
            .map(|c| c.topic.clone())
            .unwrap_or_default()
    }

    /// Name and privacy of a channel.
    pub fn channel_name(&self, channel: &str) -> Option<(String, bool)> {
        self.lock()
            .channels
            .get(&ChannelId::new(channel))
            .map(|c| (c.name.clone(), c.private))
    }

    /// Channel created under `name`, if any.
    pub fn channel_named(&self, name: &str) -> Option<ChannelId> {
        self.lock()
            .channels
            .iter()
            .find(|(_, c)| c.name == name)
            .map(|(id, _)| id.clone())
    }

    /// Members invited to a channel, in invitation order.
    pub fn members(&self, channel: &str) -> Vec<UserId> {
        self.lock()
            .channels
            .get(&ChannelId::new(channel))
            .map(|c| c.members.clone())
            .unwrap_or_default()
    }

    /// Number of invite calls made.
    pub fn invite_calls(&self) -> usize {
        self.lock().invite_calls
    }

    /// Pinned messages of a channel.
    pub fn pins(&self, channel: &str) -> Vec<PinnedMessage> {
        let state = self.lock();
        let Some(c) = state.channels.get(&ChannelId::new(channel)) else {
            return Vec::new();
        };
        c.pins
            .iter()
            .filter_map(|ts| c.messages.iter().find(|(m, _)| m == ts))
            .map(|(ts, blocks)| PinnedMessage {
                ts: ts.clone(),
                text: c
                    .texts
                    .get(ts)
                    .cloned()
                    .unwrap_or_else(|| fallback_text(blocks)),
                blocks: blocks.clone(),
            })
            .collect()
    }

    /// Entry lines of a ledger, header excluded.
    pub fn ledger_lines(&self, channel: &str, kind: LedgerKind) -> Vec<String> {
        self.pins(channel)
            .into_iter()
            .find(|pin| pin.contains_marker(kind.marker()))
            .map(|pin| {
                pin.blocks
                    .iter()
                    .skip(1)
                    .filter_map(Block::text)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Ephemeral posts made so far.
    pub fn ephemerals(&self) -> Vec<(ChannelId, UserId, Vec<Block>)> {
        self.lock().ephemerals.clone()
    }

    /// Modals opened so far, with their trigger IDs.
    pub fn modals(&self) -> Vec<(String, IncidentForm)> {
        self.lock().modals.clone()
    }
}

#[async_trait]
impl ChatPlatform for MemoryPlatform {
    async fn create_channel(&self, name: &str, private: bool) -> PlatformResult<ChannelId> {
        let mut state = self.lock();
        state.check("create_channel")?;
        if !state.taken_names.insert(name.to_string()) {
            return Err(PlatformError::NameTaken(name.to_string()));
        }
        let id = ChannelId::new(format!("C{:04}", state.next_id()));
        state.channels.insert(
            id.clone(),
            ChannelState {
                name: name.to_string(),
                private,
                ..Default::default()
            },
        );
        Ok(id)
    }

    async fn invite_users(&self, channel: &ChannelId, users: &[UserId]) -> PlatformResult<()> {
        let mut state = self.lock();
        state.check("invite_users")?;
        state.invite_calls += 1;
        let c = state.channel_mut(channel)?;
        for user in users {
            if !c.members.contains(user) {
                c.members.push(user.clone());
            }
        }
        Ok(())
    }

    async fn get_topic(&self, channel: &ChannelId) -> PlatformResult<String> {
        let mut state = self.lock();
        state.check("get_topic")?;
        Ok(state.channel_mut(channel)?.topic.clone())
    }

    async fn set_topic(&self, channel: &ChannelId, topic: &str) -> PlatformResult<()> {
        let mut state = self.lock();
        state.check("set_topic")?;
        state.channel_mut(channel)?.topic = topic.to_string();
        Ok(())
    }

    async fn post_message(
        &self,
        channel: &ChannelId,
        blocks: &[Block],
    ) -> PlatformResult<MessageTs> {
        let mut state = self.lock();
        state.check("post_message")?;
        let ts = MessageTs::new(format!("1700000000.{:06}", state.next_id()));
        state
            .channel_mut(channel)?
            .messages
            .push((ts.clone(), blocks.to_vec()));
        Ok(ts)
    }

    async fn update_message(
        &self,
        channel: &ChannelId,
        ts: &MessageTs,
        blocks: &[Block],
    ) -> PlatformResult<()> {
        let mut state = self.lock();
        state.check("update_message")?;
        let message = state
            .channel_mut(channel)?
            .messages
            .iter_mut()
            .find(|(m, _)| m == ts)
            .ok_or_else(|| PlatformError::Api("message_not_found".to_string()))?;
        message.1 = blocks.to_vec();
        Ok(())
    }

    async fn pin_message(&self, channel: &ChannelId, ts: &MessageTs) -> PlatformResult<()> {
        let mut state = self.lock();
        state.check("pin_message")?;
        state.channel_mut(channel)?.pins.push(ts.clone());
        Ok(())
    }

    async fn list_pins(&self, channel: &ChannelId) -> PlatformResult<Vec<PinnedMessage>> {
        self.lock().check("list_pins")?;
        Ok(self.pins(channel.as_str()))
    }

    async fn post_ephemeral(
        &self,
        channel: &ChannelId,
        user: &UserId,
        blocks: &[Block],
    ) -> PlatformResult<()> {
        let mut state = self.lock();
        state.check("post_ephemeral")?;
        state
            .ephemerals
            .push((channel.clone(), user.clone(), blocks.to_vec()));
        Ok(())
    }

    async fn open_modal(&self, trigger_id: &str, form: &IncidentForm) -> PlatformResult<()> {
        let mut state = self.lock();
        state.check("open_modal")?;
        state.modals.push((trigger_id.to_string(), form.clone()));
        Ok(())
    }
}
