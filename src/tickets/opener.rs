//! Ticket creation from the panel's select menu.

use super::controls::Controls;
use super::kinds::{TicketKind, TicketKinds};
use super::panel::ticket_embed;
use crate::audit::AuditLog;
use crate::config::EmbedStore;
use crate::error::HandlerResult;
use crate::handlers::Responder;
use crate::metrics;
use crate::platform::ChannelDirectory;
use rand::Rng;
use std::sync::Arc;
use ticketd_proto::{
    ChannelId, ChannelKind, CreateChannel, GuildId, OutgoingMessage, PermissionOverwrite,
    Permissions, RoleId, UserId, UserRef,
};
use tracing::{debug, info};

const NAME_STEM_MAX: usize = 12;

/// `ticket-<stem>-<suffix>` where the stem is the lowercased username
/// restricted to `[a-z0-9]` and capped at 12 characters.
pub fn ticket_name(username: &str, suffix: u16) -> String {
    let stem: String = username
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .take(NAME_STEM_MAX)
        .collect();
    format!("ticket-{stem}-{suffix}")
}

/// Overwrites of a new ticket: hidden from everyone, open to the owner, the
/// bot and the admin role.
pub fn ticket_overwrites(
    guild: GuildId,
    owner: UserId,
    bot: UserId,
    admin_role: Option<RoleId>,
) -> Vec<PermissionOverwrite> {
    let member =
        Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES | Permissions::READ_MESSAGE_HISTORY;
    let staff = member | Permissions::MANAGE_CHANNELS;
    let mut overwrites = vec![
        PermissionOverwrite::role(
            guild.everyone_role(),
            Permissions::empty(),
            Permissions::VIEW_CHANNEL,
        ),
        PermissionOverwrite::member(owner, member, Permissions::empty()),
        PermissionOverwrite::member(bot, staff, Permissions::empty()),
    ];
    if let Some(role) = admin_role {
        overwrites.push(PermissionOverwrite::role(role, staff, Permissions::empty()));
    }
    overwrites
}

pub struct TicketOpener {
    directory: Arc<dyn ChannelDirectory>,
    kinds: TicketKinds,
    embeds: Arc<EmbedStore>,
    controls: Controls,
    bot: UserId,
    admin_role: Option<RoleId>,
    audit: AuditLog,
}

impl TicketOpener {
    pub fn new(
        directory: Arc<dyn ChannelDirectory>,
        kinds: TicketKinds,
        embeds: Arc<EmbedStore>,
        controls: Controls,
        bot: UserId,
        admin_role: Option<RoleId>,
        audit: AuditLog,
    ) -> Self {
        Self {
            directory,
            kinds,
            embeds,
            controls,
            bot,
            admin_role,
            audit,
        }
    }

    /// Open a ticket of kind `key` for `user`.
    ///
    /// Unknown keys are ignored. A user with an open ticket is pointed at it
    /// instead of getting a second one.
    pub async fn open(
        &self,
        guild: GuildId,
        user: &UserRef,
        key: &str,
        responder: &Responder,
    ) -> HandlerResult {
        let Some(kind) = self.kinds.get(key) else {
            debug!(key, "Ignoring unknown ticket kind");
            return Ok(());
        };

        let topic = user.id.to_string();
        if let Some(existing) = self.directory.find_by_topic(guild, &topic).await? {
            return responder
                .reply(OutgoingMessage::ephemeral(format!(
                    "Você já tem um ticket aberto: {}",
                    existing.id.mention()
                )))
                .await;
        }

        let parent = self.resolve_category(kind).await;
        let suffix = rand::thread_rng().gen_range(0..1000);
        let request = CreateChannel {
            name: ticket_name(&user.username, suffix),
            kind: ChannelKind::Text,
            topic: Some(topic),
            parent_id: parent,
            permission_overwrites: ticket_overwrites(guild, user.id, self.bot, self.admin_role),
        };
        let channel = self.directory.create(guild, request).await?;

        let doc = self.embeds.snapshot();
        let greeting = OutgoingMessage {
            content: self.admin_role.map(RoleId::mention),
            ..OutgoingMessage::embed(ticket_embed(&doc.ticket, user.id, &kind.label))
        }
        .with_row(self.controls.open());
        self.directory.send_message(channel.id, greeting).await?;

        metrics::record_ticket_opened();
        info!(channel = %channel.id, user = %user.id, kind = %kind.key, "Ticket opened");
        self.audit
            .record(format!(
                "ticket opened: {} ({}) by {} [{}]",
                channel.name, channel.id, user.id, kind.key
            ))
            .await;

        responder
            .reply(OutgoingMessage::ephemeral(format!(
                "Ticket criado: {}",
                channel.id.mention()
            )))
            .await
    }

    /// The kind's category if it exists and is a category; otherwise none.
    async fn resolve_category(&self, kind: &TicketKind) -> Option<ChannelId> {
        let id = kind.category_id?;
        match self.directory.fetch(id).await {
            Ok(channel) if channel.kind == ChannelKind::Category => Some(id),
            Ok(_) => {
                debug!(category = %id, kind = %kind.key, "Configured category is not a category");
                None
            }
            Err(e) => {
                debug!(category = %id, kind = %kind.key, error = %e, "Configured category not found");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_sanitized_and_capped() {
        assert_eq!(ticket_name("Ana.Maria_99", 7), "ticket-anamaria99-7");
        assert_eq!(ticket_name("averyveryverylongname", 999), "ticket-averyveryver-999");
        assert_eq!(ticket_name("João", 1), "ticket-joo-1");
        assert_eq!(ticket_name("__", 0), "ticket--0");
    }

    #[test]
    fn overwrites_include_admin_role_only_when_set() {
        let base = ticket_overwrites(GuildId(1), UserId(2), UserId(3), None);
        assert_eq!(base.len(), 3);
        assert!(base[0].deny.contains(Permissions::VIEW_CHANNEL));
        assert!(!base[1].allow.contains(Permissions::MANAGE_CHANNELS));
        assert!(base[2].allow.contains(Permissions::MANAGE_CHANNELS));

        let with_role = ticket_overwrites(GuildId(1), UserId(2), UserId(3), Some(RoleId(4)));
        assert_eq!(with_role.len(), 4);
    }
}
