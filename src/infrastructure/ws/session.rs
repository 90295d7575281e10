use crate::core::relay::Relay;
use crate::infrastructure::ws::protocol::{ClientEvent, ServerEvent};
use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tracing::{debug, info, warn};

/// Drive one client WebSocket until either direction ends.
///
/// Device lines are pumped from the session's queue into the socket by a
/// separate task, so a stalled socket only ever backs up its own queue.
/// Commands are forwarded one at a time in the order the client sent them.
pub async fn run_session(socket: WebSocket, peer: Option<SocketAddr>, relay: Relay) {
    let (id, mut inbox) = relay.connect(peer).await;
    info!(session = %id, peer = ?peer, "Web client connected");

    let (mut sink, mut stream) = socket.split();

    let mut outbound = tokio::spawn(async move {
        while let Some(line) = inbox.recv().await {
            let text = match ServerEvent::SerialData(line.to_string()).to_text() {
                Ok(text) => text,
                Err(e) => {
                    warn!("Failed to encode serial-data event: {}", e);
                    continue;
                }
            };
            if let Err(e) = sink.send(Message::Text(text)).await {
                debug!("Client socket write failed: {}", e);
                break;
            }
        }
    });

    let commands = relay.clone();
    let mut inbound = tokio::spawn(async move {
        while let Some(message) = stream.next().await {
            match message {
                Ok(Message::Text(text)) => match ClientEvent::parse(&text) {
                    Ok(ClientEvent::SendJson(payload)) => {
                        commands.forward_command(&id, &payload).await;
                    }
                    Err(e) => debug!(session = %id, "Ignoring client frame: {}", e),
                },
                Ok(Message::Close(_)) => break,
                Ok(Message::Binary(_)) => debug!(session = %id, "Ignoring binary frame"),
                Ok(_) => {}
                Err(e) => {
                    debug!(session = %id, "Client socket read failed: {}", e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut outbound => inbound.abort(),
        _ = &mut inbound => outbound.abort(),
    }

    relay.disconnect(&id).await;
    info!(session = %id, "Web client disconnected");
}
