//! Operator-editable embed text for the panel and ticket messages.
//!
//! The document is a small JSON file edited at runtime through the
//! `/panelset` and `/ticketset` commands. A missing or unreadable file falls
//! back to the built-in defaults; write failures are logged and otherwise
//! ignored so a read-only filesystem never breaks the commands.

use super::defaults::{default_embed_color, default_panel_image};
use parking_lot::RwLock;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{info, warn};

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#?([0-9a-fA-F]{6})$").expect("static regex"));

/// Parse a `#rrggbb` (or `rrggbb`) colour.
pub fn parse_color(value: &str) -> Option<u32> {
    let caps = HEX_COLOR.captures(value.trim())?;
    u32::from_str_radix(&caps[1], 16).ok()
}

/// Rejected embed edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmbedFieldError {
    #[error("invalid color: {0}")]
    InvalidColor(String),
    #[error("unknown field: {0}")]
    UnknownField(String),
}

/// The ticket-selection panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelEmbed {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
    pub color: u32,
}

/// The greeting posted in each new ticket channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketEmbed {
    pub title_prefix: String,
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
    pub color: u32,
}

/// The persisted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedDocument {
    pub panel: PanelEmbed,
    pub ticket: TicketEmbed,
}

impl Default for EmbedDocument {
    fn default() -> Self {
        Self {
            panel: PanelEmbed {
                title: "Rage System".to_string(),
                description: "Estamos aqui para ajudar você da melhor forma possível. Abra um novo \
                              ticket para registrar sua solicitação, dúvida, compras ou problema. \
                              Nossa equipe entrará em contato o mais breve possível."
                    .to_string(),
                image: Some(default_panel_image()),
                color: default_embed_color(),
            },
            ticket: TicketEmbed {
                title_prefix: "Ticket • ".to_string(),
                description: "aguarde um atendente. Use os botões abaixo para fechar, reabrir ou \
                              excluir."
                    .to_string(),
                image: None,
                color: default_embed_color(),
            },
        }
    }
}

/// Thread-safe embed document with best-effort persistence.
#[derive(Debug)]
pub struct EmbedStore {
    path: Option<PathBuf>,
    doc: RwLock<EmbedDocument>,
}

impl EmbedStore {
    /// Load from `path`, falling back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let doc = match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(doc) => {
                    info!(path = %path.display(), "Loaded embed document");
                    doc
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Embed document unreadable, using defaults");
                    EmbedDocument::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => EmbedDocument::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read embed document, using defaults");
                EmbedDocument::default()
            }
        };
        Self {
            path: Some(path.to_path_buf()),
            doc: RwLock::new(doc),
        }
    }

    /// A store that never touches the filesystem.
    pub fn in_memory(doc: EmbedDocument) -> Self {
        Self {
            path: None,
            doc: RwLock::new(doc),
        }
    }

    /// Clone of the current document.
    pub fn snapshot(&self) -> EmbedDocument {
        self.doc.read().clone()
    }

    /// Edit one panel field: `title`, `description`, `image` or `color`.
    pub fn set_panel_field(&self, field: &str, value: &str) -> Result<(), EmbedFieldError> {
        {
            let mut doc = self.doc.write();
            let panel = &mut doc.panel;
            match field {
                "title" => panel.title = value.to_string(),
                "description" => panel.description = value.to_string(),
                "image" => panel.image = Some(value.to_string()),
                "color" => {
                    panel.color = parse_color(value)
                        .ok_or_else(|| EmbedFieldError::InvalidColor(value.to_string()))?
                }
                other => return Err(EmbedFieldError::UnknownField(other.to_string())),
            }
        }
        self.save();
        Ok(())
    }

    /// Edit one ticket field: `titleprefix`, `description`, `image` or `color`.
    pub fn set_ticket_field(&self, field: &str, value: &str) -> Result<(), EmbedFieldError> {
        {
            let mut doc = self.doc.write();
            let ticket = &mut doc.ticket;
            match field {
                "titleprefix" => ticket.title_prefix = value.to_string(),
                "description" => ticket.description = value.to_string(),
                "image" => ticket.image = Some(value.to_string()),
                "color" => {
                    ticket.color = parse_color(value)
                        .ok_or_else(|| EmbedFieldError::InvalidColor(value.to_string()))?
                }
                other => return Err(EmbedFieldError::UnknownField(other.to_string())),
            }
        }
        self.save();
        Ok(())
    }

    fn save(&self) {
        let Some(path) = &self.path else {
            return;
        };
        let json = match serde_json::to_string_pretty(&*self.doc.read()) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to encode embed document");
                return;
            }
        };
        if let Err(e) = std::fs::write(path, json) {
            warn!(path = %path.display(), error = %e, "Failed to save embed document");
        }
    }
}
