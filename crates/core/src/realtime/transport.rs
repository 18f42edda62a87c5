// realtime/transport.rs
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use log::{debug, warn};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::commands::CommandService;
use crate::events::ChannelSink;

#[derive(Clone)]
struct RealtimeState {
    commands: Arc<CommandService>,
}

/// Builds the router exposing the realtime endpoint at `/ws`.
pub fn realtime_router(commands: Arc<CommandService>) -> Router {
    let state = Arc::new(RealtimeState { commands });
    Router::new()
        .route("/ws", get(websocket_handler))
        .with_state(state)
}

async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<RealtimeState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<RealtimeState>) {
    let connection_id = uuid::Uuid::new_v4().to_string();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    state
        .commands
        .connect(&connection_id, Arc::new(ChannelSink::new(event_tx)));

    let (mut ws_tx, mut ws_rx) = socket.split();

    // Writer task: drains the connection's event channel onto the socket.
    // A send failure ends the task; the sink then reports unwritable and
    // the broadcaster skips this client.
    let writer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(err) => {
                    warn!("failed to encode outbound event: {}", err);
                    continue;
                }
            };
            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = ws_rx.next().await {
        match message {
            Message::Text(text) => state.commands.handle_message(&connection_id, &text).await,
            Message::Close(_) => break,
            _ => {}
        }
    }

    debug!("connection {} closed", connection_id);
    state.commands.disconnect(&connection_id);
    writer.abort();
}

/// Binds `addr` and serves the realtime endpoint until the task is
/// cancelled.
pub async fn start_server(addr: &str, commands: Arc<CommandService>) -> anyhow::Result<()> {
    let router = realtime_router(commands);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
