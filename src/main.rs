//! ticketd - support-ticket channel daemon.

use std::sync::Arc;
use ticketd::config::{Config, EmbedStore};
use ticketd::handlers::{Dispatcher, Services, command_definitions};
use ticketd::http::{self, AppState};
use ticketd::platform::ChannelDirectory;
use ticketd::platform::discord::{DiscordRest, SignatureVerifier};
use ticketd::state::OperationRegistry;
use ticketd::tickets::panel::panel_message;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(
        application = %config.bot.application_id,
        kinds = config.tickets.kinds.len(),
        "Starting ticketd"
    );

    ticketd::metrics::init();

    let verifier = SignatureVerifier::from_hex(&config.bot.public_key)?;
    let embeds = Arc::new(EmbedStore::load(&config.tickets.embeds_path));
    let rest = Arc::new(DiscordRest::new(&config.bot));

    if config.bot.register_commands {
        if let Err(e) = rest.register_commands(&command_definitions()).await {
            warn!(error = %e, "Failed to register slash commands");
        }
    }

    let services = Services::new(
        &config,
        rest.clone(),
        rest.clone(),
        embeds,
        Arc::new(OperationRegistry::new()),
    );

    if config.tickets.auto_post_panel {
        match config.tickets.panel_channel_id {
            Some(channel) => {
                let doc = services.embeds.snapshot();
                match rest
                    .send_message(channel, panel_message(&doc.panel, &services.kinds))
                    .await
                {
                    Ok(_) => info!(%channel, "Panel posted"),
                    Err(e) => warn!(%channel, error = %e, "Failed to post panel"),
                }
            }
            None => warn!("auto_post_panel is set but panel_channel_id is missing"),
        }
    }

    let state = AppState {
        dispatcher: Arc::new(Dispatcher::new(services)),
        verifier,
        rest,
        response_timeout: config.http.response_timeout(),
    };
    let app = http::router(Arc::new(state), config.http.metrics);

    http::serve(config.http.address, app, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
        info!("Shutting down");
    })
    .await?;

    Ok(())
}
