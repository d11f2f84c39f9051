//! Audit trail of ticket events.
//!
//! Every line goes to `tracing` under the `tickets` target. When a log channel
//! is configured the line is also posted there as a code block; failures to
//! post are logged at debug and otherwise ignored.

use crate::platform::ChannelDirectory;
use std::sync::Arc;
use ticketd_proto::{ChannelId, OutgoingMessage};
use tracing::{debug, info};

#[derive(Clone)]
pub struct AuditLog {
    directory: Arc<dyn ChannelDirectory>,
    channel: Option<ChannelId>,
}

impl AuditLog {
    pub fn new(directory: Arc<dyn ChannelDirectory>, channel: Option<ChannelId>) -> Self {
        Self { directory, channel }
    }

    pub async fn record(&self, line: impl Into<String>) {
        let line = line.into();
        info!(target: "tickets", "{line}");
        let Some(channel) = self.channel else {
            return;
        };
        let message = OutgoingMessage::text(format!("```{line}```"));
        if let Err(e) = self.directory.send_message(channel, message).await {
            debug!(%channel, error = %e, "Failed to post audit line");
        }
    }
}
