//! WebSocket relay for driver and passenger clients.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Path, State, WebSocketUpgrade,
        ws::{Message, WebSocket, rejection::WebSocketUpgradeRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;
use zonglist_core::{ClientContext, SessionStore};
use zonglist_resolver::MetadataResolver;
use zonglist_session::{Listener, SessionManager, SubtreeKind};

use crate::{
    dispatch,
    protocol::{ClientMessage, ServerMessage},
};

/// Relay handler state.
pub struct RelayState<S>
where
    S: SessionStore,
{
    /// The one session this relay hosts.
    pub session_id: String,
    /// Manager used as the template for per-connection managers.
    pub manager: SessionManager<S>,
    /// Search backend.
    pub resolver: Arc<dyn MetadataResolver>,
}

impl<S> RelayState<S>
where
    S: SessionStore,
{
    #[must_use]
    pub fn new(
        session_id: impl Into<String>,
        manager: SessionManager<S>,
        resolver: Arc<dyn MetadataResolver>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            manager,
            resolver,
        }
    }
}

impl<S> Clone for RelayState<S>
where
    S: SessionStore,
{
    fn clone(&self) -> Self {
        Self {
            session_id: self.session_id.clone(),
            manager: self.manager.clone(),
            resolver: Arc::clone(&self.resolver),
        }
    }
}

/// WebSocket upgrade handler for `/ws/{session_id}`.
///
/// Only the hosted session is served; other ids get 404.
pub async fn ws_handler<S>(
    Path(session_id): Path<String>,
    State(state): State<RelayState<S>>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response
where
    S: SessionStore + 'static,
{
    if session_id != state.session_id {
        tracing::warn!(%session_id, "Rejected connection to unknown session");
        return (StatusCode::NOT_FOUND, format!("Unknown session: {session_id}")).into_response();
    }
    match ws {
        Ok(ws) => ws
            .on_upgrade(move |socket| handle_socket(socket, state, session_id))
            .into_response(),
        Err(rejection) => rejection.into_response(),
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn handle_socket<S>(socket: WebSocket, state: RelayState<S>, session_id: String)
where
    S: SessionStore + 'static,
{
    let (mut sender, mut receiver) = socket.split();
    let manager = state.manager.for_client(ClientContext::anonymous());
    tracing::info!(%session_id, client = %manager.context().identity, "Client connected");

    // Channel for sending messages to the client
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(j) => j,
                Err(e) => {
                    tracing::error!("Failed to serialize message: {e}");
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut listeners: Vec<Listener> = Vec::with_capacity(SubtreeKind::ALL.len());
    for kind in SubtreeKind::ALL {
        let feed = match manager.subscribe(&session_id, kind).await {
            Ok(feed) => feed,
            Err(e) => {
                tracing::warn!(%session_id, error = %e, "Subscription failed");
                let _ = tx.send(ServerMessage::error(e));
                drop(listeners);
                drop(tx);
                let _ = send_task.await;
                return;
            }
        };
        let events = tx.clone();
        listeners.push(feed.spawn_callback(move |event| {
            let msg = match event {
                Ok(event) => ServerMessage::from(event),
                Err(e) => ServerMessage::error(e),
            };
            let _ = events.send(msg);
        }));
    }

    // Handle incoming messages
    while let Some(msg) = receiver.next().await {
        let msg = match msg {
            Ok(Message::Text(text)) => text.to_string(),
            Ok(Message::Binary(data)) => match String::from_utf8(data.to_vec()) {
                Ok(s) => s,
                Err(_) => continue,
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::error!("WebSocket error: {e}");
                break;
            }
        };

        let client_msg: ClientMessage = match serde_json::from_str(&msg) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("Invalid client message: {e}");
                let _ = tx.send(ServerMessage::Error {
                    message: format!("Invalid message: {e}"),
                });
                continue;
            }
        };

        let reply = dispatch(&manager, state.resolver.as_ref(), &session_id, client_msg).await;
        let _ = tx.send(reply);
    }

    drop(listeners);
    send_task.abort();
    tracing::info!(%session_id, client = %manager.context().identity, "Client disconnected");
}

/// Create the relay router.
///
/// Serves `/ws/{session_id}` and `/health`.
#[must_use]
pub fn create_router<S>(state: RelayState<S>) -> Router
where
    S: SessionStore + 'static,
{
    Router::new()
        .route("/ws/{session_id}", get(ws_handler::<S>))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
