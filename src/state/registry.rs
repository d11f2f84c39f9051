//! Per-channel operation registry.
//!
//! One [`OperationRecord`] per channel id, created lazily and never removed.
//! A record is `locked` while a transition is in flight, including while its
//! deferred action waits to fire. Every read-modify-write happens inside a
//! single `DashMap` entry guard and no guard is held across an `.await`.
//!
//! Lock ownership is tracked by an epoch. [`OperationRegistry::begin`] bumps
//! it and hands out a [`TransitionGuard`]; dropping the guard releases the
//! lock only if no later transition has taken the record over since.

use crate::error::LifecycleError;
use crate::metrics;
use crate::tickets::TicketAction;
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use ticketd_proto::ChannelId;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug)]
struct PendingAction {
    action: TicketAction,
    token: CancellationToken,
}

#[derive(Debug, Default)]
struct OperationRecord {
    locked: bool,
    pending: Option<PendingAction>,
    epoch: u64,
}

impl OperationRecord {
    fn cancel_pending(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                pending.token.cancel();
                metrics::pending_actions_add(-1);
                true
            }
            None => false,
        }
    }
}

/// Point-in-time view of a channel's record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationSnapshot {
    pub locked: bool,
    /// Kind of the deferred action waiting to fire, if any.
    pub pending: Option<TicketAction>,
}

/// Result of asking to start a transition.
#[derive(Debug)]
pub enum Admission {
    /// The channel is already in the requested state and nothing was in
    /// flight. No lock was taken.
    Unlocked,
    /// The lock is held until the guard drops.
    Locked(TransitionGuard),
}

/// Process-wide channel id → operation record map.
#[derive(Debug, Default)]
pub struct OperationRegistry {
    records: DashMap<ChannelId, OperationRecord>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the record for `channel`, creating it if absent.
    pub fn get(&self, channel: ChannelId) -> OperationSnapshot {
        let record = self.records.entry(channel).or_default();
        OperationSnapshot {
            locked: record.locked,
            pending: record.pending.as_ref().map(|p| p.action),
        }
    }

    /// Force the lock flag.
    ///
    /// Unlocking also cancels any pending action and invalidates outstanding
    /// guards, so a record is never unlocked with a timer still armed.
    pub fn set_locked(&self, channel: ChannelId, locked: bool) {
        let mut record = self.records.entry(channel).or_default();
        if !locked {
            record.cancel_pending();
            record.epoch += 1;
        }
        record.locked = locked;
    }

    /// Cancel and clear the pending action without running it.
    ///
    /// The lock stays with the transition that armed the action; its task
    /// observes the cancellation and releases it. Returns whether anything
    /// was pending.
    pub fn cancel_pending(&self, channel: ChannelId) -> bool {
        self.records.entry(channel).or_default().cancel_pending()
    }

    /// Try to start `action` on `channel`.
    ///
    /// - Locked with a pending action of a different kind: the pending action
    ///   is canceled and the caller takes the lock over.
    /// - Locked otherwise (same-kind duplicate, or a transition executing):
    ///   [`LifecycleError::Busy`].
    /// - Unlocked and `already_in_target`: [`Admission::Unlocked`].
    /// - Unlocked: the lock is taken.
    pub fn begin(
        self: &Arc<Self>,
        channel: ChannelId,
        action: TicketAction,
        already_in_target: bool,
    ) -> Result<Admission, LifecycleError> {
        let mut record = self.records.entry(channel).or_default();
        if record.locked {
            let preemptible = record
                .pending
                .as_ref()
                .is_some_and(|pending| pending.action != action);
            if !preemptible {
                return Err(LifecycleError::Busy);
            }
            if let Some(pending) = &record.pending {
                debug!(%channel, preempted = %pending.action, by = %action, "Canceling pending action");
            }
            record.cancel_pending();
        } else if already_in_target {
            return Ok(Admission::Unlocked);
        }
        record.locked = true;
        record.epoch += 1;
        let epoch = record.epoch;
        drop(record);

        Ok(Admission::Locked(TransitionGuard {
            registry: Arc::clone(self),
            channel,
            epoch,
        }))
    }

    fn arm(&self, channel: ChannelId, epoch: u64, action: TicketAction) -> CancellationToken {
        let token = CancellationToken::new();
        let mut record = self.records.entry(channel).or_default();
        if record.epoch == epoch {
            record.cancel_pending();
            record.pending = Some(PendingAction {
                action,
                token: token.clone(),
            });
            metrics::pending_actions_add(1);
        } else {
            token.cancel();
        }
        token
    }

    fn claim(&self, channel: ChannelId, epoch: u64, token: &CancellationToken) -> bool {
        let mut record = self.records.entry(channel).or_default();
        if token.is_cancelled() || record.epoch != epoch {
            return false;
        }
        if record.pending.take().is_some() {
            metrics::pending_actions_add(-1);
        }
        true
    }

    fn release(&self, channel: ChannelId, epoch: u64) {
        if let Some(mut record) = self.records.get_mut(&channel) {
            if record.epoch == epoch {
                record.cancel_pending();
                record.locked = false;
            }
        }
    }
}

/// Ownership of a channel's lock for one transition.
#[derive(Debug)]
pub struct TransitionGuard {
    registry: Arc<OperationRegistry>,
    channel: ChannelId,
    epoch: u64,
}

impl TransitionGuard {
    /// Run `body` after `delay` unless canceled first.
    ///
    /// The action is registered as pending before this returns. When the
    /// delay elapses the task re-checks its token and epoch under the record
    /// lock before polling `body`. The lock is released when the task ends,
    /// whether the body ran or not.
    pub fn schedule<F>(self, action: TicketAction, delay: Duration, body: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = self.registry.arm(self.channel, self.epoch, action);
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(channel = %self.channel, %action, "Deferred action canceled");
                }
                _ = tokio::time::sleep(delay) => {
                    if self.registry.claim(self.channel, self.epoch, &token) {
                        body.await;
                    } else {
                        debug!(channel = %self.channel, %action, "Deferred action lost its claim");
                    }
                }
            }
            drop(self);
        })
    }
}

impl Drop for TransitionGuard {
    fn drop(&mut self) {
        self.registry.release(self.channel, self.epoch);
    }
}
