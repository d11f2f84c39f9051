//! Ticket channels: state encoding, controls, rendering and the lifecycle
//! controller that drives close / reopen / delete.

pub mod controls;
pub mod encoder;
pub mod kinds;
pub mod lifecycle;
pub mod opener;
pub mod panel;

pub use controls::Controls;
pub use kinds::{TicketKind, TicketKinds};
pub use lifecycle::{LifecycleController, Outcome, TransitionRequest};
pub use opener::TicketOpener;

use std::fmt;

/// Custom id of the close button.
pub const CLOSE_ID: &str = "ticket_close";
/// Custom id of the reopen button.
pub const REOPEN_ID: &str = "ticket_reopen";
/// Custom id of the delete button.
pub const DELETE_ID: &str = "ticket_delete";
/// Custom id of the panel's category select menu.
pub const SELECT_ID: &str = "ticket_select";

/// A user-triggered lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TicketAction {
    Close,
    Reopen,
    Delete,
}

impl TicketAction {
    /// Map a button custom id to its action.
    pub fn from_custom_id(id: &str) -> Option<Self> {
        match id {
            CLOSE_ID => Some(Self::Close),
            REOPEN_ID => Some(Self::Reopen),
            DELETE_ID => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn custom_id(self) -> &'static str {
        match self {
            Self::Close => CLOSE_ID,
            Self::Reopen => REOPEN_ID,
            Self::Delete => DELETE_ID,
        }
    }

    /// Lowercase name for logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Close => "close",
            Self::Reopen => "reopen",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for TicketAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_ids_map_both_ways() {
        for action in [TicketAction::Close, TicketAction::Reopen, TicketAction::Delete] {
            assert_eq!(TicketAction::from_custom_id(action.custom_id()), Some(action));
        }
        assert_eq!(TicketAction::from_custom_id(SELECT_ID), None);
    }
}
