//! Telemetry utilities for interaction timing and span construction.

use std::time::Instant;

/// Guard for timing interaction handling and recording metrics.
///
/// Records latency when dropped.
pub struct InteractionTimer {
    kind: &'static str,
    start: Instant,
}

impl InteractionTimer {
    /// Start timing an interaction.
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            start: Instant::now(),
        }
    }
}

impl Drop for InteractionTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_interaction(self.kind, duration);
    }
}

/// Standardized span constructors.
pub mod spans {
    use ticketd_proto::{ChannelId, Interaction, UserId};
    use tracing::{Span, info_span};

    /// Span covering one inbound interaction.
    pub fn interaction(interaction: &Interaction) -> Span {
        let channel = interaction.channel_id.map(|c| c.get()).unwrap_or_default();
        info_span!(
            "interaction",
            id = %interaction.id,
            kind = interaction.kind.label(),
            user = %interaction.user.id,
            channel,
        )
    }

    /// Span covering a deferred transition body.
    pub fn deferred(action: &str, channel: ChannelId, requester: UserId) -> Span {
        info_span!("deferred", action = %action, channel = %channel, requester = %requester)
    }
}
