//! # ticketd-proto
//!
//! Wire model for the chat platform consumed by `ticketd`: snowflake
//! identifiers, permission bitsets, channel objects, message components,
//! embeds, and interaction payloads.
//!
//! ## Quick Start
//!
//! ```rust
//! use ticketd_proto::{Interaction, InteractionKind};
//!
//! let raw = r#"{
//!     "id": "1", "application_id": "2", "type": 3, "token": "tok",
//!     "guild_id": "3", "channel_id": "4",
//!     "member": { "user": { "id": "5", "username": "ana" } },
//!     "message": { "id": "6" },
//!     "data": { "custom_id": "ticket_close", "component_type": 2 }
//! }"#;
//!
//! let interaction = Interaction::decode(raw.as_bytes()).expect("valid payload");
//! assert!(matches!(interaction.kind, InteractionKind::Button { .. }));
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod channel;
pub mod component;
pub mod embed;
pub mod error;
pub mod id;
pub mod interaction;
pub mod message;
pub mod permissions;

pub use channel::{
    ChannelInfo, ChannelKind, CreateChannel, OverwriteTarget, PermissionEdit, PermissionOverwrite,
};
pub use component::{ActionRow, Button, ButtonStyle, Component, Emoji, SelectMenu, SelectOption};
pub use embed::Embed;
pub use error::ProtoError;
pub use id::{ApplicationId, ChannelId, GuildId, InteractionId, MessageId, RoleId, UserId};
pub use interaction::{CommandOption, Inbound, Interaction, InteractionKind, UserRef};
pub use message::{InteractionResponse, OutgoingMessage};
pub use permissions::Permissions;
