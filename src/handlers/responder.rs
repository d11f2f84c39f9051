//! At-most-once interaction replies.

use crate::error::{HandlerError, HandlerResult};
use crate::platform::ResponseSink;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use ticketd_proto::{ActionRow, InteractionResponse, OutgoingMessage};

/// Wraps a [`ResponseSink`] and refuses a second initial response.
///
/// `reply` and `update` are initial responses; whichever comes first wins and
/// any later one fails with [`HandlerError::AlreadyResponded`] without
/// reaching the sink.
pub struct Responder {
    sink: Arc<dyn ResponseSink>,
    responded: AtomicBool,
}

impl Responder {
    pub fn new(sink: Arc<dyn ResponseSink>) -> Self {
        Self {
            sink,
            responded: AtomicBool::new(false),
        }
    }

    pub fn has_responded(&self) -> bool {
        self.responded.load(Ordering::Acquire)
    }

    /// Answer with a message.
    pub async fn reply(&self, message: OutgoingMessage) -> HandlerResult {
        self.initial(InteractionResponse::Message(message)).await
    }

    /// Answer a component interaction by replacing the rows of its message.
    pub async fn update(&self, rows: Vec<ActionRow>) -> HandlerResult {
        self.initial(InteractionResponse::UpdateComponents(rows)).await
    }

    async fn initial(&self, response: InteractionResponse) -> HandlerResult {
        if self.responded.swap(true, Ordering::AcqRel) {
            return Err(HandlerError::AlreadyResponded);
        }
        self.sink.respond(response).await?;
        Ok(())
    }
}
