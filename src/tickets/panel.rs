//! Panel and ticket embeds.

use super::SELECT_ID;
use super::kinds::TicketKinds;
use crate::config::{PanelEmbed, TicketEmbed};
use ticketd_proto::{ActionRow, Embed, OutgoingMessage, SelectMenu, SelectOption, UserId};

const SELECT_PLACEHOLDER: &str = "Escolha uma categoria de ticket";

pub fn panel_embed(panel: &PanelEmbed) -> Embed {
    Embed::titled(&panel.title)
        .description(&panel.description)
        .color(panel.color)
        .image(panel.image.clone())
}

/// Category select menu, one option per kind.
pub fn kind_menu(kinds: &TicketKinds) -> ActionRow {
    ActionRow::select(SelectMenu {
        custom_id: SELECT_ID.to_string(),
        placeholder: Some(SELECT_PLACEHOLDER.to_string()),
        options: kinds
            .iter()
            .map(|k| SelectOption {
                label: k.label.clone(),
                value: k.key.clone(),
                description: Some(k.description.clone()),
                emoji: k.emoji.clone(),
            })
            .collect(),
    })
}

/// The full panel: embed plus menu.
pub fn panel_message(panel: &PanelEmbed, kinds: &TicketKinds) -> OutgoingMessage {
    OutgoingMessage::embed(panel_embed(panel)).with_row(kind_menu(kinds))
}

/// Greeting embed of a ticket channel.
pub fn ticket_embed(ticket: &TicketEmbed, owner: UserId, label: &str) -> Embed {
    Embed::titled(format!("{}{}", ticket.title_prefix, label))
        .description(format!("{} {}", owner.mention(), ticket.description))
        .color(ticket.color)
        .image(ticket.image.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EmbedDocument, TicketsConfig};

    #[test]
    fn panel_lists_every_kind() {
        let doc = EmbedDocument::default();
        let kinds = TicketKinds::from_config(&TicketsConfig::default());
        let message = panel_message(&doc.panel, &kinds);
        assert_eq!(message.embeds[0].title.as_deref(), Some("Rage System"));
        assert_eq!(message.components.len(), 1);
        let json = serde_json::to_value(&message.components[0]).unwrap();
        let options = json["components"][0]["options"].as_array().unwrap();
        assert_eq!(options.len(), 4);
        assert_eq!(options[3]["value"], "resethwid");
        assert_eq!(json["components"][0]["placeholder"], SELECT_PLACEHOLDER);
    }

    #[test]
    fn ticket_embed_mentions_owner() {
        let doc = EmbedDocument::default();
        let embed = ticket_embed(&doc.ticket, UserId(42), "Suporte");
        assert_eq!(embed.title.as_deref(), Some("Ticket • Suporte"));
        assert!(embed.description.unwrap().starts_with("<@42> aguarde"));
        assert_eq!(embed.image, None);
    }
}
