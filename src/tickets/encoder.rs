//! Ticket state as seen on the platform.
//!
//! A ticket's open/closed state is not stored anywhere in the daemon. It is
//! read from and written to two facts on the channel itself: a `closed-`
//! name prefix and the owner's send-permission overwrite.

use crate::error::LifecycleError;
use crate::platform::ChannelDirectory;
use ticketd_proto::{ChannelInfo, PermissionEdit, UserId};

/// Name prefix marking a closed ticket.
pub const CLOSED_PREFIX: &str = "closed-";

pub fn is_closed(channel: &ChannelInfo) -> bool {
    channel.name.starts_with(CLOSED_PREFIX)
}

/// Name with the closed prefix applied exactly once.
pub fn closed_name(name: &str) -> String {
    if name.starts_with(CLOSED_PREFIX) {
        name.to_string()
    } else {
        format!("{CLOSED_PREFIX}{name}")
    }
}

/// Name with one closed prefix stripped.
pub fn open_name(name: &str) -> &str {
    name.strip_prefix(CLOSED_PREFIX).unwrap_or(name)
}

/// Owner overwrite while closed: can read, cannot post.
pub const CLOSED_OWNER: PermissionEdit = PermissionEdit {
    view_channel: Some(true),
    send_messages: Some(false),
    read_message_history: None,
};

/// Owner overwrite while open.
pub const OPEN_OWNER: PermissionEdit = PermissionEdit {
    view_channel: Some(true),
    send_messages: Some(true),
    read_message_history: None,
};

/// Revoke the owner's send permission and apply the closed prefix.
///
/// Both steps always run. Failures are returned, not raised.
pub async fn apply_closed(
    directory: &dyn ChannelDirectory,
    channel: &ChannelInfo,
    owner: UserId,
) -> Vec<LifecycleError> {
    let mut failures = Vec::new();
    if let Err(source) = directory
        .edit_member_overwrite(channel.id, owner, CLOSED_OWNER)
        .await
    {
        failures.push(LifecycleError::ExternalMutationFailed {
            op: "revoke_send",
            source,
        });
    }
    if !is_closed(channel) {
        if let Err(source) = directory.rename(channel.id, &closed_name(&channel.name)).await {
            failures.push(LifecycleError::ExternalMutationFailed {
                op: "rename",
                source,
            });
        }
    }
    failures
}

/// Restore the owner's send permission and strip the closed prefix.
pub async fn apply_open(
    directory: &dyn ChannelDirectory,
    channel: &ChannelInfo,
    owner: UserId,
) -> Vec<LifecycleError> {
    let mut failures = Vec::new();
    if let Err(source) = directory
        .edit_member_overwrite(channel.id, owner, OPEN_OWNER)
        .await
    {
        failures.push(LifecycleError::ExternalMutationFailed {
            op: "restore_send",
            source,
        });
    }
    if is_closed(channel) {
        if let Err(source) = directory.rename(channel.id, open_name(&channel.name)).await {
            failures.push(LifecycleError::ExternalMutationFailed {
                op: "rename",
                source,
            });
        }
    }
    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::memory::{Call, MemoryGuild, Op};
    use ticketd_proto::GuildId;

    #[test]
    fn prefix_is_applied_and_stripped_once() {
        assert_eq!(closed_name("ticket-ana-1"), "closed-ticket-ana-1");
        assert_eq!(closed_name("closed-ticket-ana-1"), "closed-ticket-ana-1");
        assert_eq!(open_name("closed-ticket-ana-1"), "ticket-ana-1");
        assert_eq!(open_name("closed-closed-x"), "closed-x");
        assert_eq!(open_name("ticket-ana-1"), "ticket-ana-1");
    }

    #[tokio::test]
    async fn close_then_open_round_trips_channel_state() {
        let guild = MemoryGuild::new(GuildId(1));
        let owner = UserId(10);
        let (id, _) = guild.add_ticket("ticket-ana-1", owner);

        let channel = guild.channel(id).unwrap();
        assert!(apply_closed(&guild, &channel, owner).await.is_empty());
        let channel = guild.channel(id).unwrap();
        assert!(is_closed(&channel));
        assert_eq!(channel.name, "closed-ticket-ana-1");
        assert_eq!(channel.member_can_send(owner), Some(false));

        assert!(apply_open(&guild, &channel, owner).await.is_empty());
        let channel = guild.channel(id).unwrap();
        assert_eq!(channel.name, "ticket-ana-1");
        assert_eq!(channel.member_can_send(owner), Some(true));
    }

    #[tokio::test]
    async fn rename_is_skipped_when_already_in_state() {
        let guild = MemoryGuild::new(GuildId(1));
        let owner = UserId(10);
        let (id, _) = guild.add_ticket("ticket-ana-1", owner);

        let channel = guild.channel(id).unwrap();
        apply_open(&guild, &channel, owner).await;
        assert!(!guild.calls().iter().any(|c| matches!(c, Call::Rename { .. })));
    }

    #[tokio::test]
    async fn failed_step_does_not_stop_the_next() {
        let guild = MemoryGuild::new(GuildId(1));
        let owner = UserId(10);
        let (id, _) = guild.add_ticket("ticket-ana-1", owner);
        guild.fail(Op::EditOverwrite);

        let channel = guild.channel(id).unwrap();
        let failures = apply_closed(&guild, &channel, owner).await;
        assert_eq!(failures.len(), 1);
        assert_eq!(guild.channel(id).unwrap().name, "closed-ticket-ana-1");
    }
}
