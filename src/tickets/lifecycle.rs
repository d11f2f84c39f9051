//! Ticket lifecycle controller.
//!
//! Drives close, reopen and delete for one channel at a time:
//!
//! 1. **Authority.** Close and reopen need the owner or an administrator;
//!    delete needs an administrator.
//! 2. **Admission.** The [`OperationRegistry`] rejects overlapping requests,
//!    lets a request of a different kind preempt a deferred action that has
//!    not fired yet, and skips the lock when the channel is already in the
//!    requested state.
//! 3. **Effect.** Close and delete show a disabled placeholder row and run
//!    after the configured delay; reopen runs inline.
//!
//! Mutations inside a transition are best-effort: each failure is logged and
//! counted and the remaining steps still run. The lock is released when the
//! [`TransitionGuard`](crate::state::TransitionGuard) drops, on every path.

use super::controls::Controls;
use super::encoder::{self, is_closed};
use super::TicketAction;
use crate::audit::AuditLog;
use crate::error::{HandlerError, LifecycleError, PlatformError, PlatformResult};
use crate::handlers::Responder;
use crate::metrics;
use crate::platform::{AuthorityLookup, ChannelDirectory};
use crate::state::{Admission, OperationRegistry};
use crate::telemetry::spans;
use std::sync::Arc;
use std::time::Duration;
use ticketd_proto::{ChannelId, ChannelInfo, GuildId, MessageId, OutgoingMessage, UserId};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, warn};

const BUSY_NOTICE: &str = "Uma ação já está em andamento. Aguarde.";
const CLOSED_NOTICE: &str = "🔒 Ticket **fechado**. O autor não pode mais enviar mensagens.";
const REOPENED_NOTICE: &str = "🔓 Ticket **reaberto**.";
const DELETE_FAILED_NOTICE: &str = "Não consegui excluir. Verifique permissões.";

/// Ephemeral text shown for a rejected request, if it warrants one.
pub fn rejection_notice(error: &LifecycleError) -> Option<&'static str> {
    match error {
        LifecycleError::Busy => Some(BUSY_NOTICE),
        LifecycleError::PermissionDenied(TicketAction::Close) => {
            Some("Apenas o autor ou admin pode fechar.")
        }
        LifecycleError::PermissionDenied(TicketAction::Reopen) => {
            Some("Apenas o autor ou admin pode reabrir.")
        }
        LifecycleError::PermissionDenied(TicketAction::Delete) => {
            Some("Somente administradores podem excluir.")
        }
        _ => None,
    }
}

/// One button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRequest {
    pub action: TicketAction,
    pub guild: GuildId,
    pub channel: ChannelId,
    /// The control message whose buttons were pressed.
    pub message: Option<MessageId>,
    pub requester: UserId,
}

/// What an admitted request did.
#[derive(Debug)]
pub enum Outcome {
    /// Already in the requested state; controls were re-rendered.
    Rerendered,
    /// A deferred close or delete was scheduled. The handle resolves once it
    /// has fired or been canceled.
    Scheduled(JoinHandle<()>),
    /// The ticket was reopened.
    Reopened,
}

/// Collaborators a transition body needs after the interaction is gone.
#[derive(Clone)]
struct Effects {
    directory: Arc<dyn ChannelDirectory>,
    controls: Controls,
    audit: AuditLog,
}

impl Effects {
    async fn show(&self, channel: ChannelId, message: Option<MessageId>, closed: bool) {
        let Some(message) = message else {
            return;
        };
        let rows = vec![self.controls.for_state(closed)];
        note(
            channel,
            "edit_controls",
            self.directory.edit_components(channel, message, rows).await,
        );
    }

    async fn notice(&self, channel: ChannelId, text: &str) {
        note(
            channel,
            "notice",
            self.directory
                .send_message(channel, OutgoingMessage::text(text))
                .await,
        );
    }
}

fn note<T>(channel: ChannelId, op: &'static str, result: PlatformResult<T>) {
    if let Err(source) = result {
        report(channel, vec![LifecycleError::ExternalMutationFailed { op, source }]);
    }
}

fn report(channel: ChannelId, failures: Vec<LifecycleError>) {
    for failure in failures {
        if let LifecycleError::ExternalMutationFailed { op, .. } = &failure {
            metrics::record_external_failure(op);
        }
        warn!(%channel, error = %failure, "Ticket mutation failed");
    }
}

pub struct LifecycleController {
    registry: Arc<OperationRegistry>,
    authority: Arc<dyn AuthorityLookup>,
    effects: Effects,
    delay: Duration,
}

impl LifecycleController {
    pub fn new(
        registry: Arc<OperationRegistry>,
        directory: Arc<dyn ChannelDirectory>,
        authority: Arc<dyn AuthorityLookup>,
        controls: Controls,
        audit: AuditLog,
        delay: Duration,
    ) -> Self {
        Self {
            registry,
            authority,
            effects: Effects {
                directory,
                controls,
                audit,
            },
            delay,
        }
    }

    pub fn registry(&self) -> &Arc<OperationRegistry> {
        &self.registry
    }

    /// Handle a button press.
    ///
    /// Rejections come back as [`LifecycleError::PermissionDenied`],
    /// [`LifecycleError::Busy`] or [`LifecycleError::NotATicket`] with no
    /// mutation applied and nothing sent through `responder`.
    pub async fn handle(
        &self,
        request: TransitionRequest,
        responder: &Responder,
    ) -> Result<Outcome, HandlerError> {
        let action = request.action;
        let channel = self.effects.directory.fetch(request.channel).await?;
        let owner = channel.owner().ok_or(LifecycleError::NotATicket)?;

        if !self.authorized(&request, owner).await? {
            metrics::record_transition(action.as_str(), "denied");
            debug!(channel = %channel.id, requester = %request.requester, %action, "Transition denied");
            return Err(LifecycleError::PermissionDenied(action).into());
        }

        let closed = is_closed(&channel);
        let in_target = match action {
            TicketAction::Close => closed,
            TicketAction::Reopen => !closed,
            TicketAction::Delete => false,
        };
        let admission = self
            .registry
            .begin(channel.id, action, in_target)
            .inspect_err(|_| {
                metrics::record_busy(action.as_str());
                debug!(channel = %request.channel, %action, "Transition busy");
            })?;

        let guard = match admission {
            Admission::Unlocked => {
                self.rerender(responder, closed).await;
                return Ok(Outcome::Rerendered);
            }
            // Took the lock only to cancel a pending action of another kind.
            Admission::Locked(_guard) if in_target => {
                self.rerender(responder, closed).await;
                metrics::record_transition(action.as_str(), "preempted");
                return Ok(Outcome::Rerendered);
            }
            Admission::Locked(guard) => guard,
        };

        responder
            .update(vec![Controls::placeholder(action)])
            .await?;

        match action {
            TicketAction::Close => {
                let body = run_close(self.effects.clone(), channel, owner, request)
                    .instrument(spans::deferred("close", request.channel, request.requester));
                metrics::record_transition("close", "scheduled");
                Ok(Outcome::Scheduled(guard.schedule(action, self.delay, body)))
            }
            TicketAction::Delete => {
                let body = run_delete(self.effects.clone(), channel, request)
                    .instrument(spans::deferred("delete", request.channel, request.requester));
                metrics::record_transition("delete", "scheduled");
                Ok(Outcome::Scheduled(guard.schedule(action, self.delay, body)))
            }
            TicketAction::Reopen => {
                run_reopen(&self.effects, &channel, owner, &request).await;
                drop(guard);
                Ok(Outcome::Reopened)
            }
        }
    }

    async fn authorized(
        &self,
        request: &TransitionRequest,
        owner: UserId,
    ) -> Result<bool, PlatformError> {
        if request.action != TicketAction::Delete && request.requester == owner {
            return Ok(true);
        }
        self.authority
            .is_admin(request.guild, request.requester)
            .await
    }

    async fn rerender(&self, responder: &Responder, closed: bool) {
        let rows = vec![self.effects.controls.for_state(closed)];
        if let Err(e) = responder.update(rows).await {
            debug!(error = %e, "Failed to re-render controls");
        }
    }
}

async fn run_close(
    effects: Effects,
    clicked: ChannelInfo,
    owner: UserId,
    request: TransitionRequest,
) {
    let channel = match effects.directory.fetch(clicked.id).await {
        Ok(fresh) => fresh,
        Err(e) => {
            debug!(channel = %clicked.id, error = %e, "Refetch failed, using clicked state");
            clicked
        }
    };
    report(
        channel.id,
        encoder::apply_closed(effects.directory.as_ref(), &channel, owner).await,
    );
    effects.show(channel.id, request.message, true).await;
    effects.notice(channel.id, CLOSED_NOTICE).await;

    metrics::record_transition("close", "completed");
    effects
        .audit
        .record(format!(
            "ticket closed: {} ({}) by {}",
            encoder::closed_name(&channel.name),
            channel.id,
            request.requester
        ))
        .await;
}

async fn run_reopen(
    effects: &Effects,
    channel: &ChannelInfo,
    owner: UserId,
    request: &TransitionRequest,
) {
    report(
        channel.id,
        encoder::apply_open(effects.directory.as_ref(), channel, owner).await,
    );
    effects.show(channel.id, request.message, false).await;
    effects.notice(channel.id, REOPENED_NOTICE).await;

    metrics::record_transition("reopen", "completed");
    effects
        .audit
        .record(format!(
            "ticket reopened: {} ({}) by {}",
            encoder::open_name(&channel.name),
            channel.id,
            request.requester
        ))
        .await;
}

async fn run_delete(effects: Effects, channel: ChannelInfo, request: TransitionRequest) {
    match effects.directory.delete(channel.id).await {
        Ok(()) => {
            metrics::record_transition("delete", "completed");
            effects
                .audit
                .record(format!(
                    "ticket deleted: {} ({}) by {}",
                    channel.name, channel.id, request.requester
                ))
                .await;
        }
        Err(source) => {
            let error = LifecycleError::DeletionFailed(source);
            warn!(channel = %channel.id, error = %error, "Ticket deletion failed");
            metrics::record_transition("delete", "failed");
            effects.show(channel.id, request.message, true).await;
            effects.notice(channel.id, DELETE_FAILED_NOTICE).await;
            effects
                .audit
                .record(format!(
                    "ticket delete failed: {} ({}) by {}: {error}",
                    channel.name, channel.id, request.requester
                ))
                .await;
        }
    }
}
