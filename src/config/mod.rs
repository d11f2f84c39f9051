//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Root config struct and loading (Config, BotConfig)
//! - [`listen`]: Interactions endpoint configuration (HttpConfig)
//! - [`tickets`]: Ticket categories, delays and panel placement (TicketsConfig, KindConfig, EmojiConfig)
//! - [`embeds`]: Operator-editable panel/ticket embed text, persisted as JSON (EmbedStore)
//! - [`validation`]: Startup validation

mod defaults;
mod embeds;
mod listen;
mod tickets;
mod types;
mod validation;

pub use embeds::{EmbedDocument, EmbedFieldError, EmbedStore, PanelEmbed, TicketEmbed, parse_color};
pub use listen::HttpConfig;
pub use tickets::{EmojiConfig, KindConfig, TicketsConfig};
pub use types::{BotConfig, Config, ConfigError};
pub use validation::{ValidationError, validate};
