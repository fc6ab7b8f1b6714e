use axum::{
    extract::{Query, State, WebSocketUpgrade, ws::{Message, WebSocket}},
    response::Response,
};
use bson::oid::ObjectId;
use futures::{SinkExt, StreamExt};
use huddle_services::realtime::{ConnectionId, Payload, Topic};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::protocol::{ClientFrame, ServerFrame};
use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: String,
}

pub async fn ws_upgrade(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    // Verify JWT before accepting the WebSocket
    let claims = state.auth.verify_access_token(&params.token)?;
    let user_id = claims
        .user_id()
        .map_err(|_| ApiError::BadRequest("Invalid user ID".to_string()))?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user_id)))
}

async fn handle_socket(socket: WebSocket, state: AppState, user_id: ObjectId) {
    let connection_id = ConnectionId::new();
    info!(?user_id, %connection_id, "WebSocket connected");

    let (mut sink, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Payload>(state.settings.ws.outbound_buffer.max(1));

    // Single writer: replies and broadcasts share one queue, so they stay ordered.
    let writer = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if sink.send(Message::text(payload.to_string())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    state.chat.connect(connection_id, user_id, tx.clone());
    reply(
        &tx,
        &ServerFrame::Connected {
            connection_id: connection_id.to_string(),
            user_id: user_id.to_hex(),
        },
    )
    .await;

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let frame = handle_client_message(&state, connection_id, &text).await;
                reply(&tx, &frame).await;
            }
            Ok(Message::Close(_)) => break,
            Err(e) => {
                warn!(?user_id, %connection_id, %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    state.chat.disconnect(connection_id);
    drop(tx);
    writer.abort();

    info!(?user_id, %connection_id, "WebSocket disconnected");
}

async fn handle_client_message(state: &AppState, connection_id: ConnectionId, text: &str) -> ServerFrame {
    let frame: ClientFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => return ServerFrame::error(format!("malformed frame: {e}")),
    };

    debug!(%connection_id, ?frame, "WS message received");

    match frame {
        ClientFrame::Ping => ServerFrame::Pong,
        ClientFrame::Subscribe { topic } => {
            let parsed: Topic = match topic.parse() {
                Ok(t) => t,
                Err(e) => return ServerFrame::error(format!("{e}")),
            };
            match state.chat.subscribe(connection_id, parsed).await {
                Ok(()) => ServerFrame::Subscribed { topic },
                Err(e) => ServerFrame::error(e.to_string()),
            }
        }
        ClientFrame::Unsubscribe { topic } => match topic.parse::<Topic>() {
            Ok(parsed) => ServerFrame::Unsubscribed {
                removed: state.chat.unsubscribe(connection_id, parsed),
                topic,
            },
            Err(e) => ServerFrame::error(e.to_string()),
        },
    }
}

async fn reply(tx: &mpsc::Sender<Payload>, frame: &ServerFrame) {
    match serde_json::to_string(frame) {
        Ok(json) => {
            let _ = tx.send(Arc::from(json)).await;
        }
        Err(e) => warn!(%e, "Failed to encode WS reply"),
    }
}
