//! WebSocket push layer.
//!
//! Each connection watches one session: on every state-changed event the
//! socket receives a fresh sanitized snapshot. The socket holds no game
//! logic, it only fans out what the service emits.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use std::sync::Arc;

use crate::protocol::{ClientMessage, ServerMessage, SessionView};
use crate::session::{EventKind, GameService};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub session: String,
    pub player_id: Option<String>,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(service): State<Arc<GameService>>,
) -> impl IntoResponse {
    tracing::info!(session = %params.session, player = ?params.player_id, "websocket connect");
    ws.on_upgrade(move |socket| handle_socket(socket, params, service))
}

async fn current_view(service: &GameService, params: &WsQuery) -> Option<SessionView> {
    match service.get_session(&params.session).await {
        Ok(session) => Some(SessionView::project(&session, params.player_id.as_deref())),
        Err(e) => {
            tracing::warn!(session = %params.session, "state fetch failed: {e}");
            None
        }
    }
}

async fn handle_socket(socket: WebSocket, params: WsQuery, service: Arc<GameService>) {
    let (mut sender, mut receiver) = socket.split();

    let Some(view) = current_view(&service, &params).await else {
        let error = ServerMessage::Error {
            code: "NOT_FOUND".to_string(),
            msg: format!("session {} not found", params.session),
        };
        if let Ok(json) = serde_json::to_string(&error) {
            let _ = sender.send(Message::Text(json.into())).await;
        }
        return;
    };

    let welcome = ServerMessage::Welcome {
        protocol: "1.0".to_string(),
        session: view,
    };
    if let Ok(json) = serde_json::to_string(&welcome) {
        if sender.send(Message::Text(json.into())).await.is_err() {
            return;
        }
    }

    let mut events = service.subscribe();

    loop {
        tokio::select! {
            event = events.recv() => {
                let Ok(event) = event else { break };
                if event.session_id != params.session {
                    continue;
                }
                let Some(view) = current_view(&service, &params).await else { break };
                let msg = ServerMessage::State { event: event.kind, session: view };
                if let Ok(json) = serde_json::to_string(&msg) {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
            }

            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Sync) => {
                                let Some(view) = current_view(&service, &params).await else { break };
                                let msg = ServerMessage::State { event: EventKind::Sync, session: view };
                                if let Ok(json) = serde_json::to_string(&msg) {
                                    if sender.send(Message::Text(json.into())).await.is_err() {
                                        break;
                                    }
                                }
                            }
                            Err(e) => {
                                let error = ServerMessage::Error {
                                    code: "PARSE_ERROR".to_string(),
                                    msg: format!("invalid message: {e}"),
                                };
                                if let Ok(json) = serde_json::to_string(&error) {
                                    let _ = sender.send(Message::Text(json.into())).await;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!("websocket error: {e}");
                        break;
                    }
                }
            }
        }
    }

    tracing::info!(session = %params.session, "websocket closed");
}
