//! HTTP server: the interactions webhook and the Prometheus endpoint.
//!
//! `POST /interactions` verifies the request signature, answers PINGs, and
//! hands everything else to the [`Dispatcher`] on its own task. The first
//! response the dispatcher produces becomes the HTTP body. If it takes longer
//! than the configured timeout, a deferred acknowledgement is returned instead
//! and the late response goes out through the interaction webhook.

use crate::error::PlatformResult;
use crate::handlers::{Dispatcher, Responder};
use crate::platform::ResponseSink;
use crate::platform::discord::{DiscordRest, SIGNATURE_HEADER, SignatureVerifier, TIMESTAMP_HEADER};
use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use ticketd_proto::{Inbound, Interaction, InteractionId, InteractionKind, InteractionResponse};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Shared state of the interactions endpoint.
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub verifier: SignatureVerifier,
    pub rest: Arc<DiscordRest>,
    pub response_timeout: Duration,
}

/// Build the router. `/metrics` is only mounted when `metrics` is set.
pub fn router(state: Arc<AppState>, metrics: bool) -> Router {
    let mut app = Router::new().route("/interactions", post(interactions));
    if metrics {
        app = app.route("/metrics", get(metrics_handler));
    }
    app.with_state(state)
}

/// Serve `app` on `address` until `shutdown` resolves.
pub async fn serve(
    address: SocketAddr,
    app: Router,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(address).await?;
    info!(%address, "HTTP server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

/// Handler for GET /metrics - returns Prometheus metrics in text format.
async fn metrics_handler() -> String {
    crate::metrics::gather_metrics()
}

async fn interactions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    };
    if let Err(e) = state
        .verifier
        .verify(header(SIGNATURE_HEADER), header(TIMESTAMP_HEADER), &body)
    {
        debug!(error = %e, "Rejected unsigned interaction");
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let interaction = match Inbound::decode(&body) {
        Ok(Inbound::Ping) => return Json(InteractionResponse::Pong).into_response(),
        Ok(Inbound::Interaction(interaction)) => interaction,
        Err(e) => {
            warn!(error = %e, "Undecodable interaction");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    Json(run(&state, interaction).await).into_response()
}

/// Dispatch on a separate task and wait for the first response.
async fn run(state: &AppState, interaction: Interaction) -> InteractionResponse {
    let component = !matches!(interaction.kind, InteractionKind::Command { .. });
    let deferred = if component {
        InteractionResponse::DeferredUpdate
    } else {
        InteractionResponse::DeferredMessage { ephemeral: true }
    };
    let (tx, mut rx) = oneshot::channel();
    let sink = Arc::new(HttpSink {
        first: Mutex::new(Some(tx)),
        rest: Arc::clone(&state.rest),
        interaction: interaction.id,
        token: interaction.token.clone(),
        deferred_update: component,
    });

    let dispatcher = Arc::clone(&state.dispatcher);
    tokio::spawn(async move {
        let responder = Responder::new(sink);
        dispatcher.dispatch(&interaction, &responder).await;
    });

    match tokio::time::timeout(state.response_timeout, &mut rx).await {
        Ok(Ok(response)) => response,
        // Finished without answering.
        Ok(Err(_)) => deferred,
        Err(_) => {
            // A response may have landed between the timeout and closing.
            rx.close();
            rx.try_recv().unwrap_or(deferred)
        }
    }
}

/// Delivers the first response through the pending HTTP request and later
/// ones through the REST API.
struct HttpSink {
    first: Mutex<Option<oneshot::Sender<InteractionResponse>>>,
    rest: Arc<DiscordRest>,
    interaction: InteractionId,
    token: String,
    /// The deferred acknowledgement, if one is sent, is a `DeferredUpdate`:
    /// `@original` is then the component's message, not a reply.
    deferred_update: bool,
}

#[async_trait]
impl ResponseSink for HttpSink {
    async fn respond(&self, response: InteractionResponse) -> PlatformResult<()> {
        let sender = self.first.lock().take();
        let response = match sender {
            Some(tx) => match tx.send(response) {
                Ok(()) => return Ok(()),
                // The request already returned a deferred acknowledgement.
                Err(response) => response,
            },
            None => {
                return self
                    .rest
                    .create_response(self.interaction, &self.token, &response)
                    .await;
            }
        };
        debug!(interaction = %self.interaction, "Applying late response");
        match &response {
            InteractionResponse::Message(message) if self.deferred_update => {
                self.rest.create_followup(&self.token, message).await
            }
            InteractionResponse::Message(message) => {
                let body = serde_json::to_value(message)?;
                self.rest.edit_original(&self.token, &body).await
            }
            InteractionResponse::UpdateComponents(rows) => {
                let body = json!({ "components": rows });
                self.rest.edit_original(&self.token, &body).await
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, EmbedDocument, EmbedStore};
    use crate::handlers::Services;
    use crate::platform::discord::verify::tests::key_pair;
    use crate::platform::memory::MemoryGuild;
    use crate::state::OperationRegistry;
    use axum::body::Body;
    use crate::tickets::{Controls, TicketAction};
    use axum::http::{Method, Request, Uri};
    use ring::signature::{Ed25519KeyPair, KeyPair};
    use ticketd_proto::{GuildId, OutgoingMessage, UserId};
    use tower::ServiceExt;

    const CONFIG: &str = r#"
[bot]
application_id = "1000"
public_key = "0000000000000000000000000000000000000000000000000000000000000000"
token = "test"
api_base = "http://127.0.0.1:9"
"#;

    fn app(pair: &Ed25519KeyPair, guild: Arc<MemoryGuild>) -> Router {
        let config = Config::parse(CONFIG).unwrap();
        let services = Services::new(
            &config,
            guild.clone(),
            guild,
            Arc::new(EmbedStore::in_memory(EmbedDocument::default())),
            Arc::new(OperationRegistry::new()),
        );
        let state = AppState {
            dispatcher: Arc::new(Dispatcher::new(services)),
            verifier: SignatureVerifier::from_hex(&hex::encode(pair.public_key().as_ref())).unwrap(),
            rest: Arc::new(DiscordRest::new(&config.bot)),
            response_timeout: Duration::from_secs(2),
        };
        router(Arc::new(state), true)
    }

    fn signed(pair: &Ed25519KeyPair, body: &str) -> Request<Body> {
        let timestamp = "1700000000";
        let signature = pair.sign(&[timestamp.as_bytes(), body.as_bytes()].concat());
        Request::post("/interactions")
            .header(SIGNATURE_HEADER, hex::encode(signature.as_ref()))
            .header(TIMESTAMP_HEADER, timestamp)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn ping_gets_pong() {
        let pair = key_pair();
        let app = app(&pair, Arc::new(MemoryGuild::new(GuildId(1))));
        let body = r#"{"id":"1","application_id":"1000","type":1,"token":"t"}"#;

        let response = app.oneshot(signed(&pair, body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "type": 1 }));
    }

    #[tokio::test]
    async fn bad_signature_is_unauthorized() {
        let pair = key_pair();
        let app = app(&pair, Arc::new(MemoryGuild::new(GuildId(1))));
        let mut request = signed(&pair, r#"{"id":"1","application_id":"1000","type":1,"token":"t"}"#);
        request
            .headers_mut()
            .insert(TIMESTAMP_HEADER, "1700000001".parse().unwrap());

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn command_reply_is_returned_inline() {
        let pair = key_pair();
        let guild = Arc::new(MemoryGuild::new(GuildId(1)));
        let channel = guild.add_text_channel("geral");
        let body = format!(
            r#"{{"id":"2","application_id":"1000","type":2,"token":"t","guild_id":"1",
                "channel_id":"{channel}","member":{{"user":{{"id":"5","username":"ana"}}}},
                "data":{{"name":"panelshow"}}}}"#
        );

        let response = app(&pair, guild.clone())
            .oneshot(signed(&pair, &body))
            .await
            .unwrap();
        let value = json_body(response).await;
        assert_eq!(value["type"], 4);
        assert_eq!(value["data"]["content"], "Sem permissão.");

        guild.grant_admin(UserId(5));
        let response = app(&pair, guild).oneshot(signed(&pair, &body)).await.unwrap();
        let value = json_body(response).await;
        assert_eq!(value["type"], 4);
        assert_eq!(value["data"]["embeds"][0]["title"], "Rage System");
    }

    type Recorded = Arc<Mutex<Vec<(String, String, serde_json::Value)>>>;

    /// A REST API stand-in that records every call and answers 204.
    async fn recording_api() -> (String, Recorded) {
        let calls: Recorded = Arc::default();
        let record = Arc::clone(&calls);
        let api = Router::new().fallback(move |method: Method, uri: Uri, body: Bytes| {
            let record = Arc::clone(&record);
            async move {
                let body = serde_json::from_slice(&body).unwrap_or_default();
                record
                    .lock()
                    .push((method.to_string(), uri.path().to_string(), body));
                StatusCode::NO_CONTENT
            }
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, api).await.unwrap() });
        (format!("http://{address}"), calls)
    }

    /// A sink whose HTTP request already returned its deferred acknowledgement.
    fn timed_out_sink(api_base: &str, deferred_update: bool) -> HttpSink {
        let mut config = Config::parse(CONFIG).unwrap();
        config.bot.api_base = api_base.to_string();
        let (tx, mut rx) = oneshot::channel();
        rx.close();
        HttpSink {
            first: Mutex::new(Some(tx)),
            rest: Arc::new(DiscordRest::new(&config.bot)),
            interaction: InteractionId(7),
            token: "tok".to_string(),
            deferred_update,
        }
    }

    #[tokio::test]
    async fn late_notice_on_a_button_is_a_followup() {
        let (base, calls) = recording_api().await;
        let sink = timed_out_sink(&base, true);
        let busy = OutgoingMessage::ephemeral("Uma ação já está em andamento. Aguarde.");

        sink.respond(InteractionResponse::Message(busy)).await.unwrap();

        let calls = calls.lock().clone();
        assert_eq!(calls.len(), 1);
        let (method, path, body) = &calls[0];
        assert_eq!(method, "POST");
        assert_eq!(path, "/webhooks/1000/tok");
        assert_eq!(body["content"], "Uma ação já está em andamento. Aguarde.");
        assert_eq!(body["flags"], 64);
    }

    #[tokio::test]
    async fn late_component_update_edits_the_message() {
        let (base, calls) = recording_api().await;
        let sink = timed_out_sink(&base, true);
        let rows = vec![Controls::placeholder(TicketAction::Close)];

        sink.respond(InteractionResponse::UpdateComponents(rows))
            .await
            .unwrap();

        let calls = calls.lock().clone();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "PATCH");
        assert_eq!(calls[0].1, "/webhooks/1000/tok/messages/@original");
        assert!(calls[0].2["components"].is_array());
    }

    #[tokio::test]
    async fn late_command_reply_fills_the_deferred_message() {
        let (base, calls) = recording_api().await;
        let sink = timed_out_sink(&base, false);

        sink.respond(InteractionResponse::Message(OutgoingMessage::ephemeral(
            "Painel enviado.",
        )))
        .await
        .unwrap();

        let calls = calls.lock().clone();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "PATCH");
        assert_eq!(calls[0].1, "/webhooks/1000/tok/messages/@original");
        assert_eq!(calls[0].2["content"], "Painel enviado.");
    }

    #[tokio::test]
    async fn metrics_are_exposed() {
        crate::metrics::init();
        let pair = key_pair();
        let app = app(&pair, Arc::new(MemoryGuild::new(GuildId(1))));
        let response = app
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
