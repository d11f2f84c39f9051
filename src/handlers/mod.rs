//! Interaction handlers.
//!
//! The [`Dispatcher`] routes each decoded interaction:
//!
//! - slash commands → the [`CommandHandler`] registered under its name
//! - `ticket_select` menu → [`TicketOpener`]
//! - `ticket_close` / `ticket_reopen` / `ticket_delete` buttons →
//!   [`LifecycleController`]
//!
//! Anything else is ignored. Errors that escape a handler are logged, counted
//! and answered once with a generic notice if nothing was sent yet.

mod commands;
mod responder;

pub use commands::definitions as command_definitions;
pub use responder::Responder;

use crate::audit::AuditLog;
use crate::config::{Config, EmbedStore};
use crate::error::{HandlerError, HandlerResult, LifecycleError};
use crate::metrics;
use crate::platform::{AuthorityLookup, ChannelDirectory};
use crate::state::OperationRegistry;
use crate::telemetry::{InteractionTimer, spans};
use crate::tickets::lifecycle::rejection_notice;
use crate::tickets::{
    Controls, LifecycleController, SELECT_ID, TicketAction, TicketKinds, TicketOpener,
    TransitionRequest,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use ticketd_proto::{ChannelId, GuildId, Interaction, InteractionKind, OutgoingMessage};
use tracing::{Instrument, debug, warn};

const UNEXPECTED: &str = "Erro inesperado.";
const NO_PERMISSION: &str = "Sem permissão.";

/// Everything handlers share.
pub struct Services {
    pub directory: Arc<dyn ChannelDirectory>,
    pub authority: Arc<dyn AuthorityLookup>,
    pub embeds: Arc<EmbedStore>,
    pub kinds: TicketKinds,
    pub lifecycle: LifecycleController,
    pub opener: TicketOpener,
    /// Target of `/panelpost`.
    pub panel_post_channel: Option<ChannelId>,
}

impl Services {
    pub fn new(
        config: &Config,
        directory: Arc<dyn ChannelDirectory>,
        authority: Arc<dyn AuthorityLookup>,
        embeds: Arc<EmbedStore>,
        registry: Arc<OperationRegistry>,
    ) -> Self {
        let kinds = TicketKinds::from_config(&config.tickets);
        let controls = Controls::new(&config.emojis);
        let audit = AuditLog::new(Arc::clone(&directory), config.bot.log_channel_id);
        let lifecycle = LifecycleController::new(
            registry,
            Arc::clone(&directory),
            Arc::clone(&authority),
            controls.clone(),
            audit.clone(),
            config.tickets.close_delay(),
        );
        let opener = TicketOpener::new(
            Arc::clone(&directory),
            kinds.clone(),
            Arc::clone(&embeds),
            controls,
            config.bot.application_id.bot_user(),
            config.bot.admin_role_id,
            audit,
        );
        Self {
            directory,
            authority,
            embeds,
            kinds,
            lifecycle,
            opener,
            panel_post_channel: config.tickets.panel_post_channel_id,
        }
    }
}

/// Per-interaction context passed to command handlers.
pub struct Context<'a> {
    pub interaction: &'a Interaction,
    pub guild: GuildId,
    pub channel: ChannelId,
    pub responder: &'a Responder,
    pub services: &'a Services,
}

impl Context<'_> {
    /// Reply with an ephemeral text.
    pub async fn notice(&self, text: impl Into<String>) -> HandlerResult {
        self.responder.reply(OutgoingMessage::ephemeral(text)).await
    }
}

/// A slash command. Every command is restricted to administrators; the
/// dispatcher checks before calling `handle`.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult;
}

pub struct Dispatcher {
    services: Services,
    commands: HashMap<&'static str, Box<dyn CommandHandler>>,
}

impl Dispatcher {
    pub fn new(services: Services) -> Self {
        Self {
            services,
            commands: commands::handlers().into_iter().collect(),
        }
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Handle one interaction end to end.
    pub async fn dispatch(&self, interaction: &Interaction, responder: &Responder) {
        let kind = interaction.kind.label();
        let span = spans::interaction(interaction);
        let _timer = InteractionTimer::new(kind);

        let result = self.route(interaction, responder).instrument(span).await;
        if let Err(e) = result {
            metrics::record_interaction_error(kind, e.error_code());
            warn!(id = %interaction.id, kind, error = %e, "Interaction failed");
            if !responder.has_responded() {
                if let Err(e) = responder.reply(OutgoingMessage::ephemeral(UNEXPECTED)).await {
                    debug!(error = %e, "Failed to report unexpected error");
                }
            }
        }
    }

    async fn route(&self, interaction: &Interaction, responder: &Responder) -> HandlerResult {
        let (Some(guild), Some(channel)) = (interaction.guild_id, interaction.channel_id) else {
            debug!(id = %interaction.id, "Ignoring interaction outside a guild channel");
            return Ok(());
        };
        let ctx = Context {
            interaction,
            guild,
            channel,
            responder,
            services: &self.services,
        };

        match &interaction.kind {
            InteractionKind::Command { name, .. } => self.command(name, &ctx).await,
            InteractionKind::Select { custom_id, values } if custom_id == SELECT_ID => {
                match values.first() {
                    Some(key) => {
                        self.services
                            .opener
                            .open(guild, &interaction.user, key, responder)
                            .await
                    }
                    None => Ok(()),
                }
            }
            InteractionKind::Button { custom_id } => match TicketAction::from_custom_id(custom_id) {
                Some(action) => self.transition(action, &ctx).await,
                None => {
                    debug!(custom_id, "Ignoring unknown button");
                    Ok(())
                }
            },
            InteractionKind::Select { custom_id, .. } => {
                debug!(custom_id, "Ignoring unknown select menu");
                Ok(())
            }
        }
    }

    async fn command(&self, name: &str, ctx: &Context<'_>) -> HandlerResult {
        let Some(handler) = self.commands.get(name) else {
            debug!(command = name, "Ignoring unknown command");
            return Ok(());
        };
        let admin = self
            .services
            .authority
            .is_admin(ctx.guild, ctx.interaction.user.id)
            .await?;
        if !admin {
            return ctx.notice(NO_PERMISSION).await;
        }
        handler.handle(ctx).await
    }

    async fn transition(&self, action: TicketAction, ctx: &Context<'_>) -> HandlerResult {
        let request = TransitionRequest {
            action,
            guild: ctx.guild,
            channel: ctx.channel,
            message: ctx.interaction.message_id,
            requester: ctx.interaction.user.id,
        };
        match self.services.lifecycle.handle(request, ctx.responder).await {
            Ok(_) => Ok(()),
            Err(HandlerError::Lifecycle(e)) => match rejection_notice(&e) {
                Some(text) => ctx.notice(text).await,
                None if matches!(e, LifecycleError::NotATicket) => {
                    debug!(channel = %ctx.channel, "Ignoring button outside a ticket");
                    Ok(())
                }
                None => Err(e.into()),
            },
            Err(e) => Err(e),
        }
    }
}
