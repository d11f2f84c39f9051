//! Administrator slash commands for the panel and ticket embeds.

use super::{CommandHandler, Context};
use crate::config::EmbedFieldError;
use crate::error::HandlerResult;
use crate::tickets::panel::{panel_embed, panel_message, ticket_embed};
use async_trait::async_trait;
use serde_json::{Value, json};
use ticketd_proto::OutgoingMessage;

const INVALID_COLOR: &str = "Cor inválida. Use hex, ex: #ffffff";

/// Every command by name.
pub fn handlers() -> Vec<(&'static str, Box<dyn CommandHandler>)> {
    let handlers: Vec<(&'static str, Box<dyn CommandHandler>)> = vec![
        ("ticketsetup", Box::new(TicketSetupHandler) as Box<dyn CommandHandler>),
        ("panelset", Box::new(PanelSetHandler)),
        ("ticketset", Box::new(TicketSetHandler)),
        ("panelshow", Box::new(PanelShowHandler)),
        ("ticketshow", Box::new(TicketShowHandler)),
        ("panelpost", Box::new(PanelPostHandler)),
    ];
    handlers
}

/// Guild command registration payload.
pub fn definitions() -> Value {
    let field_option = |choices: &[&str]| {
        json!({
            "name": "field", "description": "Campo", "type": 3, "required": true,
            "choices": choices.iter().map(|c| json!({ "name": c, "value": c })).collect::<Vec<_>>(),
        })
    };
    let value_option = json!({ "name": "value", "description": "Valor", "type": 3, "required": true });
    json!([
        { "name": "ticketsetup", "description": "Enviar o painel de tickets neste canal" },
        { "name": "panelset", "description": "Definir embed do painel",
          "options": [field_option(&["title", "description", "image", "color"]), value_option] },
        { "name": "ticketset", "description": "Definir embed do ticket",
          "options": [field_option(&["titleprefix", "description", "image", "color"]), value_option] },
        { "name": "panelshow", "description": "Pré-visualizar embed do painel" },
        { "name": "ticketshow", "description": "Pré-visualizar embed do ticket" },
        { "name": "panelpost", "description": "Publicar o painel no canal configurado" },
    ])
}

fn field_args<'a>(ctx: &'a Context<'_>) -> (&'a str, &'a str) {
    (
        ctx.interaction.option("field").unwrap_or_default(),
        ctx.interaction.option("value").unwrap_or_default(),
    )
}

async fn edit_outcome(
    ctx: &Context<'_>,
    result: Result<(), EmbedFieldError>,
    done: &str,
) -> HandlerResult {
    match result {
        Ok(()) => ctx.notice(done).await,
        Err(EmbedFieldError::InvalidColor(_)) => ctx.notice(INVALID_COLOR).await,
        Err(EmbedFieldError::UnknownField(field)) => {
            ctx.notice(format!("Campo desconhecido: {field}")).await
        }
    }
}

/// `/ticketsetup`: post the panel in the current channel.
pub struct TicketSetupHandler;

#[async_trait]
impl CommandHandler for TicketSetupHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        let doc = ctx.services.embeds.snapshot();
        ctx.services
            .directory
            .send_message(ctx.channel, panel_message(&doc.panel, &ctx.services.kinds))
            .await?;
        ctx.notice("Painel enviado.").await
    }
}

/// `/panelset field value`
pub struct PanelSetHandler;

#[async_trait]
impl CommandHandler for PanelSetHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        let (field, value) = field_args(ctx);
        let result = ctx.services.embeds.set_panel_field(field, value);
        edit_outcome(ctx, result, "Panel atualizado.").await
    }
}

/// `/ticketset field value`
pub struct TicketSetHandler;

#[async_trait]
impl CommandHandler for TicketSetHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        let (field, value) = field_args(ctx);
        let result = ctx.services.embeds.set_ticket_field(field, value);
        edit_outcome(ctx, result, "Ticket embed atualizado.").await
    }
}

pub struct PanelShowHandler;

#[async_trait]
impl CommandHandler for PanelShowHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        let doc = ctx.services.embeds.snapshot();
        ctx.responder
            .reply(OutgoingMessage::embed(panel_embed(&doc.panel)).into_ephemeral())
            .await
    }
}

pub struct TicketShowHandler;

#[async_trait]
impl CommandHandler for TicketShowHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        let doc = ctx.services.embeds.snapshot();
        let preview = ticket_embed(&doc.ticket, ctx.interaction.user.id, "Prévia");
        ctx.responder
            .reply(OutgoingMessage::embed(preview).into_ephemeral())
            .await
    }
}

/// `/panelpost`: post the panel to the configured channel.
pub struct PanelPostHandler;

#[async_trait]
impl CommandHandler for PanelPostHandler {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult {
        let target = match ctx.services.panel_post_channel {
            Some(id) => ctx.services.directory.fetch(id).await.ok(),
            None => None,
        };
        let Some(target) = target else {
            return ctx.notice("Canal alvo não encontrado.").await;
        };
        let doc = ctx.services.embeds.snapshot();
        ctx.services
            .directory
            .send_message(target.id, panel_message(&doc.panel, &ctx.services.kinds))
            .await?;
        ctx.notice(format!("Painel publicado em {}.", target.id.mention()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definitions_cover_every_handler() {
        let defs = definitions();
        let names: Vec<&str> = defs
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["name"].as_str().unwrap())
            .collect();
        let handled: Vec<&str> = handlers().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, handled);
        assert_eq!(defs[2]["options"][0]["choices"][0]["value"], "titleprefix");
    }
}
