//! Button rows attached to the ticket's control message.

use super::{CLOSE_ID, DELETE_ID, REOPEN_ID, TicketAction};
use crate::config::EmojiConfig;
use regex::Regex;
use std::sync::LazyLock;
use ticketd_proto::{ActionRow, Button, ButtonStyle, Emoji};
use tracing::debug;

static CUSTOM_EMOJI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<a?:\w+:(\d{17,20})>$").expect("static regex"));
static EMOJI_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{17,20}$").expect("static regex"));

/// Parse `<:name:id>`, `<a:name:id>`, a bare id, or a unicode emoji.
/// Blank input yields `fallback`.
pub fn parse_emoji(raw: &str, fallback: &str) -> Emoji {
    let raw = raw.trim();
    if raw.is_empty() {
        return Emoji::Unicode(fallback.to_string());
    }
    let id = CUSTOM_EMOJI
        .captures(raw)
        .map(|caps| caps[1].to_string())
        .or_else(|| EMOJI_ID.is_match(raw).then(|| raw.to_string()));
    let Some(id) = id else {
        return Emoji::Unicode(raw.to_string());
    };
    match id.parse() {
        Ok(id) => Emoji::Custom(id),
        // 20 digits can exceed u64; keep the text as-is.
        Err(e) => {
            debug!(emoji = raw, error = %e, "Emoji id out of range, using it as text");
            Emoji::Unicode(raw.to_string())
        }
    }
}

/// Renders the open, closed and in-progress button rows.
#[derive(Debug, Clone)]
pub struct Controls {
    lock: Emoji,
    reopen: Emoji,
    delete: Emoji,
}

impl Controls {
    pub fn new(emojis: &EmojiConfig) -> Self {
        Self {
            lock: parse_emoji(&emojis.lock, "🔒"),
            reopen: parse_emoji(&emojis.reopen, "🔓"),
            delete: parse_emoji(&emojis.delete, "🗑️"),
        }
    }

    fn delete_button(&self) -> Button {
        Button::new(DELETE_ID, "Excluir", ButtonStyle::Danger).with_emoji(self.delete.clone())
    }

    /// Close + Delete.
    pub fn open(&self) -> ActionRow {
        ActionRow::buttons([
            Button::new(CLOSE_ID, "Fechar", ButtonStyle::Secondary).with_emoji(self.lock.clone()),
            self.delete_button(),
        ])
    }

    /// Reopen + Delete.
    pub fn closed(&self) -> ActionRow {
        ActionRow::buttons([
            Button::new(REOPEN_ID, "Reabrir", ButtonStyle::Secondary)
                .with_emoji(self.reopen.clone()),
            self.delete_button(),
        ])
    }

    pub fn for_state(&self, closed: bool) -> ActionRow {
        if closed { self.closed() } else { self.open() }
    }

    /// Two disabled buttons shown while `action` is in flight.
    pub fn placeholder(action: TicketAction) -> ActionRow {
        let label = match action {
            TicketAction::Close => "Fechando...",
            TicketAction::Reopen => "Reabrindo...",
            TicketAction::Delete => "Excluindo...",
        };
        ActionRow::buttons([
            Button::new("disabled1", label, ButtonStyle::Secondary).disabled(),
            Button::new("disabled2", "Aguarde", ButtonStyle::Secondary).disabled(),
        ])
    }
}

impl Default for Controls {
    fn default() -> Self {
        Self::new(&EmojiConfig::default())
    }
}
