//! WebSocket Game Server
//!
//! Async WebSocket server in front of the fair engine.
//! Validates wagers, plays games and answers commitment requests.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, RwLock, broadcast};
use tokio::time::interval;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use futures_util::{SinkExt, StreamExt};
use tracing::{info, warn, error, debug, instrument};
use uuid::Uuid;

use crate::chain::ChainError;
use crate::game::engine::FairEngine;
use crate::network::protocol::{ClientMessage, ServerMessage, ErrorCode};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Idle connections older than this are dropped by the sweep.
    pub idle_timeout: Duration,
    /// How often the idle sweep runs.
    pub sweep_interval: Duration,
    /// Smallest accepted wager.
    pub min_amount: f64,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            max_connections: 1000,
            idle_timeout: Duration::from_secs(300),
            sweep_interval: Duration::from_secs(15),
            min_amount: 1.0,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Connected client state.
struct ConnectedClient {
    /// Session identifier sent in the welcome message.
    session_id: Uuid,
    /// Last activity.
    last_activity: Instant,
    /// Games played on this connection.
    games_played: u64,
    /// Fired by the idle sweep to close the socket.
    close_tx: oneshot::Sender<()>,
}

type ClientMap = Arc<RwLock<BTreeMap<SocketAddr, ConnectedClient>>>;

/// The game server.
pub struct GameServer {
    /// Server configuration.
    config: ServerConfig,
    /// Shared engine.
    engine: FairEngine,
    /// Connected clients.
    clients: ClientMap,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a new game server.
    pub fn new(config: ServerConfig, engine: FairEngine) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            engine,
            clients: Arc::new(RwLock::new(BTreeMap::new())),
            shutdown_tx,
        }
    }

    /// Bind the configured address and run until shutdown.
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Run on an already-bound listener.
    #[instrument(skip(self, listener))]
    pub async fn serve(&self, listener: TcpListener) -> Result<(), GameServerError> {
        info!("Game server listening on {}", listener.local_addr()?);

        let cleanup_clients = self.clients.clone();
        let idle_timeout = self.config.idle_timeout;
        let sweep_interval = self.config.sweep_interval;

        // Spawn cleanup task
        let cleanup_handle = tokio::spawn(async move {
            Self::run_cleanup_loop(cleanup_clients, idle_timeout, sweep_interval).await;
        });

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let clients_count = self.clients.read().await.len();
                            if clients_count >= self.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                Self::reject_connection(stream, addr);
                                continue;
                            }

                            info!("New connection from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        cleanup_handle.abort();

        Ok(())
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let clients = self.clients.clone();
        let engine = self.engine.clone();
        let config = self.config.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(64);

            // Register client
            let session_id = Uuid::new_v4();
            let (close_tx, mut close_rx) = oneshot::channel();
            {
                let mut clients = clients.write().await;
                clients.insert(addr, ConnectedClient {
                    session_id,
                    last_activity: Instant::now(),
                    games_played: 0,
                    close_tx,
                });
            }

            // Spawn message sender task
            let sender_task = tokio::spawn(async move {
                while let Some(msg) = msg_rx.recv().await {
                    let text = match msg.to_json() {
                        Ok(t) => t,
                        Err(e) => {
                            error!("Failed to serialize message: {}", e);
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                let _ = ws_sender.close().await;
            });

            let _ = msg_tx.send(ServerMessage::Welcome {
                session_id: session_id.to_string(),
                server_version: config.version.clone(),
            }).await;

            // Handle incoming messages
            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                let reply = match ClientMessage::from_json(&text) {
                                    Ok(client_msg) => {
                                        let played = matches!(client_msg, ClientMessage::Play(_));
                                        let reply = Self::handle_client_message(client_msg, &engine, &config);
                                        Self::touch(&clients, addr, played && matches!(reply, ServerMessage::GameResult { .. })).await;
                                        reply
                                    }
                                    Err(e) => {
                                        debug!("Invalid message from {}: {}", addr, e);
                                        ServerMessage::error(ErrorCode::InvalidInput, "Invalid message format")
                                    }
                                };

                                if msg_tx.send(reply).await.is_err() {
                                    break;
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Client {} disconnected", addr);
                                break;
                            }
                            Some(Err(e)) => {
                                error!("WebSocket error for {}: {}", addr, e);
                                break;
                            }
                            _ => {}
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        let _ = msg_tx.send(ServerMessage::Shutdown {
                            reason: "Server shutting down".to_string(),
                        }).await;
                        break;
                    }
                    _ = &mut close_rx => {
                        debug!("Closing idle client {}", addr);
                        let _ = msg_tx.send(ServerMessage::Shutdown {
                            reason: "Idle timeout".to_string(),
                        }).await;
                        break;
                    }
                }
            }

            // Let queued replies flush before the socket drops
            drop(msg_tx);
            let _ = sender_task.await;

            // Remove client
            {
                let mut clients = clients.write().await;
                if let Some(client) = clients.remove(&addr) {
                    info!(
                        session = %client.session_id,
                        games = client.games_played,
                        "Client {} cleaned up", addr
                    );
                }
            }
        });
    }

    /// Tell an over-limit client why it is refused, then close.
    fn reject_connection(stream: TcpStream, addr: SocketAddr) {
        tokio::spawn(async move {
            let mut ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    debug!("WebSocket handshake failed for rejected {}: {}", addr, e);
                    return;
                }
            };

            let reply = ServerMessage::error(ErrorCode::ServerOverloaded, "Connection limit reached");
            match reply.to_json() {
                Ok(text) => {
                    let _ = ws_stream.send(Message::Text(text)).await;
                }
                Err(e) => error!("Failed to serialize message: {}", e),
            }
            let _ = ws_stream.close(None).await;
        });
    }

    /// Answer one client message.
    ///
    /// Wager validation happens here, before the engine is called.
    pub fn handle_client_message(
        msg: ClientMessage,
        engine: &FairEngine,
        config: &ServerConfig,
    ) -> ServerMessage {
        match msg {
            ClientMessage::Play(req) => {
                let amount = match req.validate(config.min_amount) {
                    Ok(amount) => amount,
                    Err(e) => return ServerMessage::Error(e),
                };

                match engine.play_game(amount) {
                    Ok(game) => ServerMessage::GameResult { game },
                    Err(e @ ChainError::Exhausted { .. }) => {
                        error!("Refusing play: {}", e);
                        ServerMessage::error(ErrorCode::ChainExhausted, "No games left on this chain")
                    }
                    Err(e) => {
                        error!("Play failed: {}", e);
                        ServerMessage::error(ErrorCode::InternalError, "Internal error")
                    }
                }
            }
            ClientMessage::Commitment => ServerMessage::Commitment {
                commitment: engine.commitment().clone(),
            },
            ClientMessage::Ping { timestamp } => ServerMessage::Pong {
                timestamp,
                server_time: chrono::Utc::now().timestamp_millis().max(0) as u64,
            },
        }
    }

    /// Record activity for a client.
    async fn touch(clients: &ClientMap, addr: SocketAddr, played: bool) {
        let mut clients = clients.write().await;
        if let Some(client) = clients.get_mut(&addr) {
            client.last_activity = Instant::now();
            if played {
                client.games_played += 1;
            }
        }
    }

    /// Drop clients idle for longer than `idle_timeout`.
    async fn run_cleanup_loop(clients: ClientMap, idle_timeout: Duration, sweep_interval: Duration) {
        let mut interval = interval(sweep_interval);

        loop {
            interval.tick().await;
            let removed = Self::sweep_idle(&clients, idle_timeout).await;
            if removed > 0 {
                info!("Removed {} idle clients", removed);
            }
        }
    }

    /// Remove idle clients and signal their connection tasks to close.
    async fn sweep_idle(clients: &ClientMap, idle_timeout: Duration) -> usize {
        let now = Instant::now();
        let mut clients = clients.write().await;

        let idle: Vec<SocketAddr> = clients
            .iter()
            .filter(|(_, c)| now.duration_since(c.last_activity) > idle_timeout)
            .map(|(addr, _)| *addr)
            .collect();

        for addr in &idle {
            if let Some(client) = clients.remove(addr) {
                info!(session = %client.session_id, "Client {} idle, closing", addr);
                let _ = client.close_tx.send(());
            }
        }

        idle.len()
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get active connection count.
    pub async fn connection_count(&self) -> usize {
        self.clients.read().await.len()
    }
}
