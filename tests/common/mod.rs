//! Integration test common infrastructure.
//!
//! Builds the full handler stack over an in-memory guild and provides
//! interaction builders for buttons, select menus and slash commands.

#![allow(dead_code)]

use std::sync::Arc;
use ticketd::config::{Config, EmbedDocument, EmbedStore};
use ticketd::error::HandlerError;
use ticketd::handlers::{Dispatcher, Responder, Services};
use ticketd::platform::memory::{Call, MemoryGuild, MemorySink};
use ticketd::state::OperationRegistry;
use ticketd::tickets::{LifecycleController, Outcome, TicketAction, TransitionRequest};
use ticketd_proto::{
    ApplicationId, ChannelId, CommandOption, GuildId, Interaction, InteractionId, InteractionKind,
    MessageId, UserId, UserRef,
};

pub const GUILD: GuildId = GuildId(1);
pub const APPLICATION: ApplicationId = ApplicationId(900);
pub const OWNER: UserId = UserId(10);
pub const ADMIN: UserId = UserId(20);
pub const STRANGER: UserId = UserId(30);

const BASE_CONFIG: &str = r#"
[bot]
application_id = "900"
public_key = "0000000000000000000000000000000000000000000000000000000000000000"
token = "test"
"#;

pub struct Harness {
    pub guild: Arc<MemoryGuild>,
    pub registry: Arc<OperationRegistry>,
    pub dispatcher: Dispatcher,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config("")
    }

    /// `extra` is appended right after the `[bot]` table, so bare keys land
    /// there and later tables can follow.
    pub fn with_config(extra: &str) -> Self {
        let config = Config::parse(&format!("{BASE_CONFIG}{extra}\n")).expect("test config");
        let guild = Arc::new(MemoryGuild::new(GUILD));
        guild.grant_admin(ADMIN);
        let registry = Arc::new(OperationRegistry::new());
        let services = Services::new(
            &config,
            guild.clone(),
            guild.clone(),
            Arc::new(EmbedStore::in_memory(EmbedDocument::default())),
            registry.clone(),
        );
        Self {
            guild,
            registry,
            dispatcher: Dispatcher::new(services),
        }
    }

    pub fn lifecycle(&self) -> &LifecycleController {
        &self.dispatcher.services().lifecycle
    }

    /// An open ticket owned by [`OWNER`] with its control message.
    pub fn ticket(&self) -> (ChannelId, MessageId) {
        self.guild.add_ticket("ticket-ana-1", OWNER)
    }

    /// Send a transition straight to the lifecycle controller.
    pub async fn press(
        &self,
        action: TicketAction,
        channel: ChannelId,
        message: MessageId,
        requester: UserId,
    ) -> (Result<Outcome, HandlerError>, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::bound(self.guild.clone(), channel, message));
        let responder = Responder::new(sink.clone());
        let request = TransitionRequest {
            action,
            guild: GUILD,
            channel,
            message: Some(message),
            requester,
        };
        let result = self.lifecycle().handle(request, &responder).await;
        (result, sink)
    }

    /// Press `action` and wait for its deferred effect, if any.
    pub async fn press_and_settle(
        &self,
        action: TicketAction,
        channel: ChannelId,
        message: MessageId,
        requester: UserId,
    ) -> Arc<MemorySink> {
        let (result, sink) = self.press(action, channel, message, requester).await;
        settle(result.expect("transition admitted")).await;
        sink
    }

    pub async fn dispatch(&self, interaction: Interaction, sink: Arc<MemorySink>) -> Arc<MemorySink> {
        let responder = Responder::new(sink.clone());
        self.dispatcher.dispatch(&interaction, &responder).await;
        sink
    }

    pub async fn click(
        &self,
        custom_id: &str,
        channel: ChannelId,
        message: MessageId,
        user: UserId,
    ) -> Arc<MemorySink> {
        let kind = InteractionKind::Button {
            custom_id: custom_id.to_string(),
        };
        let sink = Arc::new(MemorySink::bound(self.guild.clone(), channel, message));
        self.dispatch(interaction(kind, channel, Some(message), user_ref(user)), sink)
            .await
    }

    pub async fn select(&self, value: &str, channel: ChannelId, user: UserRef) -> Arc<MemorySink> {
        let kind = InteractionKind::Select {
            custom_id: "ticket_select".to_string(),
            values: vec![value.to_string()],
        };
        self.dispatch(interaction(kind, channel, None, user), Arc::new(MemorySink::new()))
            .await
    }

    pub async fn command(
        &self,
        name: &str,
        options: &[(&str, &str)],
        channel: ChannelId,
        user: UserId,
    ) -> Arc<MemorySink> {
        let kind = InteractionKind::Command {
            name: name.to_string(),
            options: options
                .iter()
                .map(|(name, value)| CommandOption {
                    name: name.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        };
        self.dispatch(
            interaction(kind, channel, None, user_ref(user)),
            Arc::new(MemorySink::new()),
        )
        .await
    }

    /// Custom ids of the first component row of `message`.
    pub fn control_ids(&self, message: MessageId) -> Vec<String> {
        self.guild
            .components(message)
            .and_then(|rows| rows.into_iter().next())
            .map(|row| row.custom_ids().into_iter().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Whether any rename or overwrite edit touched `channel`.
    pub fn mutated(&self, channel: ChannelId) -> bool {
        self.guild.calls().iter().any(|call| match call {
            Call::Rename { channel: c, .. } | Call::EditOverwrite { channel: c, .. } => *c == channel,
            _ => false,
        })
    }
}

/// Wait for a scheduled transition to fire or be canceled.
pub async fn settle(outcome: Outcome) {
    if let Outcome::Scheduled(handle) = outcome {
        handle.await.expect("deferred task panicked");
    }
}

pub fn user_ref(id: UserId) -> UserRef {
    UserRef {
        id,
        username: format!("user{id}"),
    }
}

pub fn interaction(
    kind: InteractionKind,
    channel: ChannelId,
    message: Option<MessageId>,
    user: UserRef,
) -> Interaction {
    Interaction {
        id: InteractionId(1),
        application_id: APPLICATION,
        token: "token".to_string(),
        kind,
        user,
        guild_id: Some(GUILD),
        channel_id: Some(channel),
        message_id: message,
    }
}

pub fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
