//! Selectable ticket categories.

use super::controls::parse_emoji;
use crate::config::TicketsConfig;
use ticketd_proto::{ChannelId, Emoji};

/// One ticket category as offered in the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketKind {
    pub key: String,
    pub label: String,
    pub description: String,
    pub emoji: Option<Emoji>,
    /// Category channel new tickets are created under.
    pub category_id: Option<ChannelId>,
}

/// The configured kinds in menu order.
#[derive(Debug, Clone, Default)]
pub struct TicketKinds {
    kinds: Vec<TicketKind>,
}

impl TicketKinds {
    /// Build from config. A kind without its own category inherits
    /// `default_category_id`.
    pub fn from_config(config: &TicketsConfig) -> Self {
        let kinds = config
            .kinds
            .iter()
            .map(|k| TicketKind {
                key: k.key.clone(),
                label: k.label.clone(),
                description: k.description.clone(),
                emoji: k
                    .emoji
                    .as_deref()
                    .filter(|e| !e.trim().is_empty())
                    .map(|e| parse_emoji(e, e)),
                category_id: k.category_id.or(config.default_category_id),
            })
            .collect();
        Self { kinds }
    }

    pub fn get(&self, key: &str) -> Option<&TicketKind> {
        self.kinds.iter().find(|k| k.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TicketKind> {
        self.kinds.iter()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
