//! In-process platform for tests and local experiments.
//!
//! `MemoryGuild` keeps one guild's channels, messages and admin set behind a
//! `parking_lot::Mutex`, records every mutating call, and can be told to fail
//! specific operations so error paths can be exercised deterministically.

use super::{AuthorityLookup, ChannelDirectory, ResponseSink};
use crate::error::{PlatformError, PlatformResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use ticketd_proto::{
    ActionRow, ChannelId, ChannelInfo, ChannelKind, CreateChannel, GuildId, InteractionResponse,
    MessageId, OutgoingMessage, OverwriteTarget, PermissionEdit, PermissionOverwrite, Permissions,
    UserId,
};

/// Operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Fetch,
    Create,
    Rename,
    Delete,
    EditOverwrite,
    SendMessage,
    EditComponents,
    AdminLookup,
}

/// A mutating call, in the order it was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create { channel: ChannelId, name: String },
    Rename { channel: ChannelId, name: String },
    Delete { channel: ChannelId },
    EditOverwrite { channel: ChannelId, member: UserId, edit: PermissionEdit },
    SendMessage { channel: ChannelId, message: MessageId },
    EditComponents { channel: ChannelId, message: MessageId },
}

#[derive(Debug, Clone)]
struct StoredMessage {
    channel: ChannelId,
    body: OutgoingMessage,
}

#[derive(Debug, Default)]
struct GuildState {
    channels: BTreeMap<ChannelId, ChannelInfo>,
    messages: BTreeMap<MessageId, StoredMessage>,
    admins: HashSet<UserId>,
    failing: HashSet<Op>,
    calls: Vec<Call>,
}

/// One guild held in memory.
#[derive(Debug)]
pub struct MemoryGuild {
    guild: GuildId,
    state: Mutex<GuildState>,
    next_id: AtomicU64,
}

impl MemoryGuild {
    pub fn new(guild: GuildId) -> Self {
        Self {
            guild,
            state: Mutex::new(GuildState::default()),
            next_id: AtomicU64::new(1_000),
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild
    }

    fn allocate(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn check(&self, op: Op) -> PlatformResult<()> {
        if self.state.lock().failing.contains(&op) {
            Err(PlatformError::Rejected(format!("{op:?} failure injected")))
        } else {
            Ok(())
        }
    }

    // ------------------------------------------------------------------
    // Seeding
    // ------------------------------------------------------------------

    /// Add a category channel.
    pub fn add_category(&self, name: &str) -> ChannelId {
        let id = ChannelId(self.allocate());
        self.state.lock().channels.insert(
            id,
            ChannelInfo {
                id,
                guild_id: Some(self.guild),
                kind: ChannelKind::Category,
                name: name.to_string(),
                topic: None,
                parent_id: None,
                permission_overwrites: Vec::new(),
            },
        );
        id
    }

    /// Add an open ticket channel owned by `owner`, with a control message.
    pub fn add_ticket(&self, name: &str, owner: UserId) -> (ChannelId, MessageId) {
        let id = ChannelId(self.allocate());
        let message = MessageId(self.allocate());
        let mut state = self.state.lock();
        state.channels.insert(
            id,
            ChannelInfo {
                id,
                guild_id: Some(self.guild),
                kind: ChannelKind::Text,
                name: name.to_string(),
                topic: Some(owner.to_string()),
                parent_id: None,
                permission_overwrites: vec![
                    PermissionOverwrite::role(
                        self.guild.everyone_role(),
                        Permissions::empty(),
                        Permissions::VIEW_CHANNEL,
                    ),
                    PermissionOverwrite::member(
                        owner,
                        Permissions::VIEW_CHANNEL
                            | Permissions::SEND_MESSAGES
                            | Permissions::READ_MESSAGE_HISTORY,
                        Permissions::empty(),
                    ),
                ],
            },
        );
        state.messages.insert(
            message,
            StoredMessage {
                channel: id,
                body: OutgoingMessage::default(),
            },
        );
        (id, message)
    }

    /// Add a plain text channel with no owner.
    pub fn add_text_channel(&self, name: &str) -> ChannelId {
        let id = ChannelId(self.allocate());
        self.state.lock().channels.insert(
            id,
            ChannelInfo {
                id,
                guild_id: Some(self.guild),
                kind: ChannelKind::Text,
                name: name.to_string(),
                topic: None,
                parent_id: None,
                permission_overwrites: Vec::new(),
            },
        );
        id
    }

    pub fn grant_admin(&self, user: UserId) {
        self.state.lock().admins.insert(user);
    }

    /// Make `op` fail until [`MemoryGuild::recover`] is called.
    pub fn fail(&self, op: Op) {
        self.state.lock().failing.insert(op);
    }

    pub fn recover(&self, op: Op) {
        self.state.lock().failing.remove(&op);
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    pub fn channel(&self, id: ChannelId) -> Option<ChannelInfo> {
        self.state.lock().channels.get(&id).cloned()
    }

    pub fn channels(&self) -> Vec<ChannelInfo> {
        self.state.lock().channels.values().cloned().collect()
    }

    /// Current component rows of a message.
    pub fn components(&self, message: MessageId) -> Option<Vec<ActionRow>> {
        self.state
            .lock()
            .messages
            .get(&message)
            .map(|m| m.body.components.clone())
    }

    /// Every message posted to `channel`, oldest first.
    pub fn messages_in(&self, channel: ChannelId) -> Vec<OutgoingMessage> {
        self.state
            .lock()
            .messages
            .values()
            .filter(|m| m.channel == channel)
            .map(|m| m.body.clone())
            .collect()
    }

    /// Text content of every message posted to `channel`.
    pub fn contents_in(&self, channel: ChannelId) -> Vec<String> {
        self.messages_in(channel)
            .into_iter()
            .filter_map(|m| m.content)
            .collect()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }
}

#[async_trait]
impl ChannelDirectory for MemoryGuild {
    async fn fetch(&self, channel: ChannelId) -> PlatformResult<ChannelInfo> {
        self.check(Op::Fetch)?;
        self.channel(channel)
            .ok_or_else(|| PlatformError::NotFound(format!("channel {channel}")))
    }

    async fn find_by_topic(
        &self,
        guild: GuildId,
        topic: &str,
    ) -> PlatformResult<Option<ChannelInfo>> {
        self.check(Op::Fetch)?;
        Ok(self
            .state
            .lock()
            .channels
            .values()
            .find(|c| {
                c.guild_id == Some(guild)
                    && c.kind == ChannelKind::Text
                    && c.topic.as_deref() == Some(topic)
            })
            .cloned())
    }

    async fn create(&self, guild: GuildId, request: CreateChannel) -> PlatformResult<ChannelInfo> {
        self.check(Op::Create)?;
        let id = ChannelId(self.allocate());
        let info = ChannelInfo {
            id,
            guild_id: Some(guild),
            kind: request.kind,
            name: request.name.clone(),
            topic: request.topic,
            parent_id: request.parent_id,
            permission_overwrites: request.permission_overwrites,
        };
        let mut state = self.state.lock();
        state.channels.insert(id, info.clone());
        state.calls.push(Call::Create {
            channel: id,
            name: request.name,
        });
        Ok(info)
    }

    async fn rename(&self, channel: ChannelId, name: &str) -> PlatformResult<()> {
        self.check(Op::Rename)?;
        let mut state = self.state.lock();
        let info = state
            .channels
            .get_mut(&channel)
            .ok_or_else(|| PlatformError::NotFound(format!("channel {channel}")))?;
        info.name = name.to_string();
        state.calls.push(Call::Rename {
            channel,
            name: name.to_string(),
        });
        Ok(())
    }

    async fn delete(&self, channel: ChannelId) -> PlatformResult<()> {
        self.check(Op::Delete)?;
        let mut state = self.state.lock();
        state
            .channels
            .remove(&channel)
            .ok_or_else(|| PlatformError::NotFound(format!("channel {channel}")))?;
        state.messages.retain(|_, m| m.channel != channel);
        state.calls.push(Call::Delete { channel });
        Ok(())
    }

    async fn edit_member_overwrite(
        &self,
        channel: ChannelId,
        member: UserId,
        edit: PermissionEdit,
    ) -> PlatformResult<()> {
        self.check(Op::EditOverwrite)?;
        let mut state = self.state.lock();
        let info = state
            .channels
            .get_mut(&channel)
            .ok_or_else(|| PlatformError::NotFound(format!("channel {channel}")))?;
        let target = OverwriteTarget::Member(member);
        let idx = match info
            .permission_overwrites
            .iter()
            .position(|ow| ow.target == target)
        {
            Some(idx) => idx,
            None => {
                info.permission_overwrites.push(PermissionOverwrite::member(
                    member,
                    Permissions::empty(),
                    Permissions::empty(),
                ));
                info.permission_overwrites.len() - 1
            }
        };
        let ow = &mut info.permission_overwrites[idx];
        edit.apply(&mut ow.allow, &mut ow.deny);
        state.calls.push(Call::EditOverwrite {
            channel,
            member,
            edit,
        });
        Ok(())
    }

    async fn send_message(
        &self,
        channel: ChannelId,
        message: OutgoingMessage,
    ) -> PlatformResult<MessageId> {
        self.check(Op::SendMessage)?;
        let id = MessageId(self.allocate());
        let mut state = self.state.lock();
        if !state.channels.contains_key(&channel) {
            return Err(PlatformError::NotFound(format!("channel {channel}")));
        }
        state.messages.insert(
            id,
            StoredMessage {
                channel,
                body: message,
            },
        );
        state.calls.push(Call::SendMessage {
            channel,
            message: id,
        });
        Ok(id)
    }

    async fn edit_components(
        &self,
        channel: ChannelId,
        message: MessageId,
        rows: Vec<ActionRow>,
    ) -> PlatformResult<()> {
        self.check(Op::EditComponents)?;
        let mut state = self.state.lock();
        let stored = state
            .messages
            .get_mut(&message)
            .filter(|m| m.channel == channel)
            .ok_or_else(|| PlatformError::NotFound(format!("message {message}")))?;
        stored.body.components = rows;
        state.calls.push(Call::EditComponents { channel, message });
        Ok(())
    }
}

#[async_trait]
impl AuthorityLookup for MemoryGuild {
    async fn is_admin(&self, guild: GuildId, user: UserId) -> PlatformResult<bool> {
        self.check(Op::AdminLookup)?;
        Ok(guild == self.guild && self.state.lock().admins.contains(&user))
    }
}

/// Records what a handler answered.
///
/// An `UpdateComponents` response is also applied to the originating message
/// in the bound guild, the way the real platform would.
#[derive(Debug, Default)]
pub struct MemorySink {
    responses: Mutex<Vec<InteractionResponse>>,
    origin: Option<(std::sync::Arc<MemoryGuild>, ChannelId, MessageId)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose component updates land on `message` in `guild`.
    pub fn bound(guild: std::sync::Arc<MemoryGuild>, channel: ChannelId, message: MessageId) -> Self {
        Self {
            origin: Some((guild, channel, message)),
            ..Self::default()
        }
    }

    pub fn responses(&self) -> Vec<InteractionResponse> {
        self.responses.lock().clone()
    }

    /// Content of the first response, if it was a message.
    pub fn reply_text(&self) -> Option<String> {
        self.responses.lock().iter().find_map(|r| match r {
            InteractionResponse::Message(m) => m.content.clone(),
            _ => None,
        })
    }

    /// Components set by the first response, if it was an update.
    pub fn updated_rows(&self) -> Option<Vec<ActionRow>> {
        self.responses.lock().iter().find_map(|r| match r {
            InteractionResponse::UpdateComponents(rows) => Some(rows.clone()),
            _ => None,
        })
    }
}

#[async_trait]
impl ResponseSink for MemorySink {
    async fn respond(&self, response: InteractionResponse) -> PlatformResult<()> {
        if let (InteractionResponse::UpdateComponents(rows), Some((guild, channel, message))) =
            (&response, &self.origin)
        {
            let mut state = guild.state.lock();
            if let Some(stored) = state
                .messages
                .get_mut(message)
                .filter(|m| m.channel == *channel)
            {
                stored.body.components = rows.clone();
            }
        }
        self.responses.lock().push(response);
        Ok(())
    }
}
