//! Chat platform collaborators.
//!
//! The ticket core never talks to the platform directly. It goes through
//! three narrow traits:
//!
//! - [`ChannelDirectory`]: channel lookup and mutation, message posting
//! - [`AuthorityLookup`]: "is this member an administrator?"
//! - [`ResponseSink`]: the per-interaction reply transport
//!
//! [`discord::DiscordRest`] implements the first two over the REST API;
//! [`memory::MemoryGuild`] implements all three in-process for tests.

pub mod discord;
pub mod memory;

use crate::error::PlatformResult;
use async_trait::async_trait;
use ticketd_proto::{
    ActionRow, ChannelId, ChannelInfo, CreateChannel, GuildId, InteractionResponse, MessageId,
    OutgoingMessage, PermissionEdit, UserId,
};

/// Channel lookup and mutation.
#[async_trait]
pub trait ChannelDirectory: Send + Sync {
    /// Fetch a channel by id.
    async fn fetch(&self, channel: ChannelId) -> PlatformResult<ChannelInfo>;

    /// Find a text channel in `guild` whose topic equals `topic`.
    async fn find_by_topic(&self, guild: GuildId, topic: &str)
    -> PlatformResult<Option<ChannelInfo>>;

    /// Create a guild channel.
    async fn create(&self, guild: GuildId, request: CreateChannel) -> PlatformResult<ChannelInfo>;

    /// Rename a channel.
    async fn rename(&self, channel: ChannelId, name: &str) -> PlatformResult<()>;

    /// Delete a channel.
    async fn delete(&self, channel: ChannelId) -> PlatformResult<()>;

    /// Merge `edit` into the member's overwrite on `channel`.
    async fn edit_member_overwrite(
        &self,
        channel: ChannelId,
        member: UserId,
        edit: PermissionEdit,
    ) -> PlatformResult<()>;

    /// Post a message.
    async fn send_message(
        &self,
        channel: ChannelId,
        message: OutgoingMessage,
    ) -> PlatformResult<MessageId>;

    /// Replace the component rows of an existing message.
    async fn edit_components(
        &self,
        channel: ChannelId,
        message: MessageId,
        rows: Vec<ActionRow>,
    ) -> PlatformResult<()>;
}

/// Administrator lookup.
#[async_trait]
pub trait AuthorityLookup: Send + Sync {
    /// Whether `user` holds the administrator permission or the configured
    /// admin role in `guild`.
    async fn is_admin(&self, guild: GuildId, user: UserId) -> PlatformResult<bool>;
}

/// Transport for answering one interaction.
///
/// Implementations do not enforce at-most-once semantics; that is the job
/// of [`crate::handlers::Responder`].
#[async_trait]
pub trait ResponseSink: Send + Sync {
    /// Deliver the initial response.
    async fn respond(&self, response: InteractionResponse) -> PlatformResult<()>;
}
