//! Unified error handling for ticketd.
//!
//! This module provides the error hierarchy for the daemon, with automatic
//! conversions and static codes for metric labels.

use crate::tickets::TicketAction;
use thiserror::Error;

// ============================================================================
// Platform Errors (collaborator calls)
// ============================================================================

/// Errors raised by the chat platform collaborators.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("platform returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("rejected: {0}")]
    Rejected(String),

    #[error("malformed payload: {0}")]
    Decode(#[from] ticketd_proto::ProtoError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PlatformError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::Status { .. } => "status",
            Self::NotFound(_) => "not_found",
            Self::Rejected(_) => "rejected",
            Self::Decode(_) => "decode",
            Self::Json(_) => "json",
        }
    }
}

/// Result type for collaborator calls.
pub type PlatformResult<T> = Result<T, PlatformError>;

// ============================================================================
// Lifecycle Errors (state machine)
// ============================================================================

/// Errors produced by the ticket lifecycle state machine.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Requester is neither the owner nor an administrator (or not an
    /// administrator, for delete).
    #[error("permission denied for {0}")]
    PermissionDenied(TicketAction),

    /// Another transition is in flight for this channel.
    #[error("a transition is already in flight")]
    Busy,

    /// The channel carries no owner in its topic.
    #[error("channel is not a ticket")]
    NotATicket,

    /// A best-effort mutation failed. Logged, never surfaced to the user.
    #[error("{op} failed: {source}")]
    ExternalMutationFailed {
        op: &'static str,
        #[source]
        source: PlatformError,
    },

    /// The channel could not be deleted; it was reverted to closed.
    #[error("deletion failed: {0}")]
    DeletionFailed(#[source] PlatformError),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

impl LifecycleError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::PermissionDenied(_) => "permission_denied",
            Self::Busy => "busy",
            Self::NotATicket => "not_a_ticket",
            Self::ExternalMutationFailed { .. } => "external_mutation_failed",
            Self::DeletionFailed(_) => "deletion_failed",
            Self::Platform(e) => e.error_code(),
        }
    }
}

// ============================================================================
// Handler Errors (interaction processing)
// ============================================================================

/// Errors that can occur while handling one interaction.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// The interaction was already answered; a second initial response was refused.
    #[error("interaction already responded")]
    AlreadyResponded,
}

impl HandlerError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Lifecycle(e) => e.error_code(),
            Self::Platform(e) => e.error_code(),
            Self::AlreadyResponded => "already_responded",
        }
    }
}

/// Result type for interaction handlers.
pub type HandlerResult = Result<(), HandlerError>;
