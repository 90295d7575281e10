use crate::core::relay::{Relay, RelayStatus};
use crate::domain::error::{RelayError, RelayResult};
use crate::infrastructure::ws::session::run_session;
use axum::extract::{ConnectInfo, State, WebSocketUpgrade};
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// HTTP server exposing the relay to WebSocket clients
pub struct RelayServer {
    listener: Option<TcpListener>,
    bind_addr: SocketAddr,
    relay: Relay,
    shutdown_sender: Option<oneshot::Sender<()>>,
    server_handle: Option<tokio::task::JoinHandle<()>>,
}

impl RelayServer {
    pub async fn bind(bind_addr: &str, relay: Relay) -> RelayResult<Self> {
        let listener = TcpListener::bind(bind_addr).await.map_err(|e| {
            RelayError::Network(std::io::Error::new(
                e.kind(),
                format!("Failed to bind to {}: {}", bind_addr, e),
            ))
        })?;
        let actual_addr = listener.local_addr()?;

        info!("Relay server bound to {}", actual_addr);

        Ok(Self {
            listener: Some(listener),
            bind_addr: actual_addr,
            relay,
            shutdown_sender: None,
            server_handle: None,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Routes: `GET /ws` (client socket) and `GET /health`; any origin allowed
    pub fn router(relay: Relay) -> Router {
        Router::new()
            .route("/ws", get(ws_handler))
            .route("/health", get(health))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(relay)
    }

    pub async fn start(&mut self) -> RelayResult<()> {
        let Some(listener) = self.listener.take() else {
            return Err(RelayError::Protocol("Server is already running".to_string()));
        };

        let (shutdown_sender, shutdown_receiver) = oneshot::channel::<()>();
        let app = Self::router(self.relay.clone());
        let addr = self.bind_addr;

        let server_handle = tokio::spawn(async move {
            let result = axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async {
                let _ = shutdown_receiver.await;
            })
            .await;

            if let Err(e) = result {
                error!("Relay server on {} failed: {}", addr, e);
            }
        });

        self.shutdown_sender = Some(shutdown_sender);
        self.server_handle = Some(server_handle);
        info!("Web server running on http://{}", self.bind_addr);

        Ok(())
    }

    pub async fn stop(&mut self) -> RelayResult<()> {
        if let Some(handle) = self.server_handle.take() {
            info!("Stopping relay server");

            if let Some(sender) = self.shutdown_sender.take() {
                let _ = sender.send(());
            }

            match tokio::time::timeout(SHUTDOWN_GRACE, handle).await {
                Ok(Ok(())) => info!("Relay server stopped"),
                Ok(Err(e)) => warn!("Server task completed with error: {}", e),
                Err(_) => warn!("Relay server did not stop within {:?}", SHUTDOWN_GRACE),
            }
        }

        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.server_handle.is_some()
    }
}

impl Drop for RelayServer {
    fn drop(&mut self) {
        if self.server_handle.is_some() {
            warn!("RelayServer dropped while still running - server may not shutdown gracefully");
        }
    }
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(relay): State<Relay>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| run_session(socket, Some(peer), relay))
}

async fn health(State(relay): State<Relay>) -> Json<RelayStatus> {
    Json(relay.status().await)
}
