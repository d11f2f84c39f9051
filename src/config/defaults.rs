//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

use super::tickets::KindConfig;
use std::net::SocketAddr;

/// Returns `true` (for serde defaults).
pub fn default_true() -> bool {
    true
}

// =============================================================================
// Bot Defaults
// =============================================================================

pub fn default_api_base() -> String {
    "https://discord.com/api/v10".to_string()
}

// =============================================================================
// HTTP Defaults
// =============================================================================

pub fn default_http_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// The platform drops interactions not answered within 3 seconds.
pub fn default_response_timeout_ms() -> u64 {
    2500
}

// =============================================================================
// Ticket Defaults
// =============================================================================

pub fn default_close_delay_ms() -> u64 {
    2500
}

pub fn default_embeds_path() -> String {
    "embeds.json".to_string()
}

pub fn default_kinds() -> Vec<KindConfig> {
    let kind = |key: &str, label: &str, description: &str, emoji: &str| KindConfig {
        key: key.to_string(),
        label: label.to_string(),
        description: description.to_string(),
        emoji: Some(emoji.to_string()),
        category_id: None,
    };
    vec![
        kind("suporte", "Suporte", "Ajuda ou dúvidas gerais", "🛠️"),
        kind("compra", "Compra", "Compra, dúvida e suporte de produtos", "🛒"),
        kind("creator", "Content Creator", "Torne-se um Content Creator da Rage", "🎬"),
        kind("resethwid", "Reset HWID", "Redefina o HWID do seu produto.", "♻️"),
    ]
}

// =============================================================================
// Emoji Defaults
// =============================================================================

pub fn default_lock_emoji() -> String {
    "🔒".to_string()
}

pub fn default_reopen_emoji() -> String {
    "🔓".to_string()
}

pub fn default_delete_emoji() -> String {
    "🗑️".to_string()
}

// =============================================================================
// Embed Defaults
// =============================================================================

pub fn default_panel_image() -> String {
    "https://i.imgur.com/2nL4D94.png".to_string()
}

pub fn default_embed_color() -> u32 {
    0xffffff
}
