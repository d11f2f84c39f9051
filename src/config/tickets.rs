//! Ticket categories, transition delay and panel placement.

use super::defaults::{
    default_close_delay_ms, default_delete_emoji, default_embeds_path, default_kinds,
    default_lock_emoji, default_reopen_emoji,
};
use serde::Deserialize;
use std::time::Duration;
use ticketd_proto::ChannelId;

/// Ticket behaviour configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TicketsConfig {
    /// Delay before a close or delete takes effect (default: 2500).
    /// A reopen or delete issued inside this window cancels a pending close.
    #[serde(default = "default_close_delay_ms")]
    pub close_delay_ms: u64,
    /// Category used when a kind has none of its own.
    #[serde(default)]
    pub default_category_id: Option<ChannelId>,
    /// Channel the panel is posted to at startup when `auto_post_panel` is set.
    #[serde(default)]
    pub panel_channel_id: Option<ChannelId>,
    /// Channel targeted by `/panelpost`.
    #[serde(default)]
    pub panel_post_channel_id: Option<ChannelId>,
    /// Post the panel once at startup.
    #[serde(default)]
    pub auto_post_panel: bool,
    /// Path of the editable embed document.
    #[serde(default = "default_embeds_path")]
    pub embeds_path: String,
    /// Selectable ticket categories, in menu order.
    #[serde(default = "default_kinds")]
    pub kinds: Vec<KindConfig>,
}

impl TicketsConfig {
    pub fn close_delay(&self) -> Duration {
        Duration::from_millis(self.close_delay_ms)
    }
}

impl Default for TicketsConfig {
    fn default() -> Self {
        Self {
            close_delay_ms: default_close_delay_ms(),
            default_category_id: None,
            panel_channel_id: None,
            panel_post_channel_id: None,
            auto_post_panel: false,
            embeds_path: default_embeds_path(),
            kinds: default_kinds(),
        }
    }
}

/// One entry of the ticket-type select menu.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KindConfig {
    /// Select value; must be unique.
    pub key: String,
    /// Menu label, also used in the ticket embed title.
    pub label: String,
    /// Menu description.
    pub description: String,
    /// Unicode emoji, `<:name:id>` or a bare custom emoji id.
    #[serde(default)]
    pub emoji: Option<String>,
    /// Category to create tickets of this kind under.
    #[serde(default)]
    pub category_id: Option<ChannelId>,
}

/// Emojis on the ticket control buttons.
#[derive(Debug, Clone, Deserialize)]
pub struct EmojiConfig {
    #[serde(default = "default_lock_emoji")]
    pub lock: String,
    #[serde(default = "default_reopen_emoji")]
    pub reopen: String,
    #[serde(default = "default_delete_emoji")]
    pub delete: String,
}

impl Default for EmojiConfig {
    fn default() -> Self {
        Self {
            lock: default_lock_emoji(),
            reopen: default_reopen_emoji(),
            delete: default_delete_emoji(),
        }
    }
}
