//! Outgoing messages and interaction responses.

use crate::component::ActionRow;
use crate::embed::Embed;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Message flag that restricts visibility to the invoking user.
pub const EPHEMERAL_FLAG: u64 = 1 << 6;

/// A message to post in a channel or as an interaction reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Plain text content.
    pub content: Option<String>,
    /// Embeds.
    pub embeds: Vec<Embed>,
    /// Component rows.
    pub components: Vec<ActionRow>,
    /// Only visible to the interaction's user. Ignored for channel posts.
    pub ephemeral: bool,
}

impl OutgoingMessage {
    /// A public text message.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// A text message only the invoking user can see.
    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ephemeral: true,
            ..Self::default()
        }
    }

    /// A public message carrying a single embed.
    pub fn embed(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
            ..Self::default()
        }
    }

    /// Add an embed.
    pub fn with_embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    /// Add a component row.
    pub fn with_row(mut self, row: ActionRow) -> Self {
        self.components.push(row);
        self
    }

    /// Restrict visibility to the invoking user.
    pub fn into_ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }
}

impl Serialize for OutgoingMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(content) = &self.content {
            map.serialize_entry("content", content)?;
        }
        if !self.embeds.is_empty() {
            map.serialize_entry("embeds", &self.embeds)?;
        }
        if !self.components.is_empty() {
            map.serialize_entry("components", &self.components)?;
        }
        if self.ephemeral {
            map.serialize_entry("flags", &EPHEMERAL_FLAG)?;
        }
        map.end()
    }
}

/// The initial response to an interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionResponse {
    /// Acknowledge a PING (type 1).
    Pong,
    /// Reply with a new message (type 4).
    Message(OutgoingMessage),
    /// Acknowledge now, reply later (type 5).
    DeferredMessage {
        /// Whether the eventual reply is ephemeral.
        ephemeral: bool,
    },
    /// Acknowledge a component interaction without changing the message (type 6).
    DeferredUpdate,
    /// Replace the originating message's components (type 7).
    UpdateComponents(Vec<ActionRow>),
}

impl InteractionResponse {
    /// Wire discriminator.
    pub fn wire_type(&self) -> u8 {
        match self {
            Self::Pong => 1,
            Self::Message(_) => 4,
            Self::DeferredMessage { .. } => 5,
            Self::DeferredUpdate => 6,
            Self::UpdateComponents(_) => 7,
        }
    }
}

impl Serialize for InteractionResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Flags {
            flags: u64,
        }

        #[derive(Serialize)]
        struct Components<'a> {
            components: &'a [ActionRow],
        }

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", &self.wire_type())?;
        match self {
            Self::Pong | Self::DeferredUpdate => {}
            Self::Message(msg) => map.serialize_entry("data", msg)?,
            Self::DeferredMessage { ephemeral } => {
                if *ephemeral {
                    map.serialize_entry("data", &Flags { flags: EPHEMERAL_FLAG })?;
                }
            }
            Self::UpdateComponents(rows) => {
                map.serialize_entry("data", &Components { components: rows })?
            }
        }
        map.end()
    }
}
