// src/reload/server.rs

//! WebSocket live-reload server.

use std::fmt;
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use tungstenite::protocol::Message;
use tungstenite::WebSocket;

use super::message::{ReloadEvent, ReloadMessage};
use super::ReloadSink;

/// How many successive ports to try when the configured one is taken.
const MAX_PORT_RETRIES: u16 = 10;

/// A client that has not finished its handshake by then is dropped.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

type Clients = Arc<Mutex<Vec<WebSocket<TcpStream>>>>;

/// Broadcasts [`ReloadEvent`]s to every connected browser.
///
/// Binds `127.0.0.1:<port>` (or the next free port), accepts clients on a
/// background thread (each handshake on its own thread) and drops clients
/// whose socket fails on send.
#[derive(Clone)]
pub struct ReloadServer {
    port: u16,
    clients: Clients,
}

impl fmt::Debug for ReloadServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReloadServer")
            .field("port", &self.port)
            .field("clients", &self.client_count())
            .finish()
    }
}

impl ReloadServer {
    /// Bind the server and start accepting clients.
    pub fn start(base_port: u16) -> Result<Self> {
        let (listener, port) = try_bind_port(base_port, MAX_PORT_RETRIES)?;
        if port != base_port {
            warn!(requested = base_port, port, "reload port taken; using the next free one");
        }

        let clients: Clients = Arc::new(Mutex::new(Vec::new()));
        let accept_clients = Arc::clone(&clients);

        thread::Builder::new()
            .name("assetpipe-reload".into())
            .spawn(move || accept_loop(listener, accept_clients))
            .context("spawning reload accept thread")?;

        info!(port, "reload server listening");
        Ok(Self { port, clients })
    }

    /// The port actually bound.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn client_count(&self) -> usize {
        lock(&self.clients).len()
    }

    fn broadcast(&self, message: &ReloadMessage) {
        let json = message.to_json();
        let mut clients = lock(&self.clients);
        let before = clients.len();

        clients.retain_mut(|ws| match ws.send(Message::Text(json.clone().into())) {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "dropping disconnected reload client");
                false
            }
        });

        debug!(
            message = %json,
            delivered = clients.len(),
            dropped = before - clients.len(),
            "broadcast reload message"
        );
    }
}

impl ReloadSink for ReloadServer {
    fn notify(&self, event: ReloadEvent) {
        self.broadcast(&ReloadMessage::from(&event));
    }
}

fn lock(clients: &Clients) -> MutexGuard<'_, Vec<WebSocket<TcpStream>>> {
    clients.lock().unwrap_or_else(PoisonError::into_inner)
}

fn accept_loop(listener: TcpListener, clients: Clients) {
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, "reload accept error");
                continue;
            }
        };

        let clients = Arc::clone(&clients);
        let spawned = thread::Builder::new()
            .name("assetpipe-reload-handshake".into())
            .spawn(move || handshake(stream, clients));
        if let Err(e) = spawned {
            warn!(error = %e, "failed to spawn reload handshake thread");
        }
    }
}

fn handshake(stream: TcpStream, clients: Clients) {
    let peer = stream.peer_addr().ok();
    if let Err(e) = stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT)) {
        debug!(?peer, error = %e, "failed to set reload handshake timeout");
        return;
    }

    let mut ws = match tungstenite::accept(stream) {
        Ok(ws) => ws,
        Err(e) => {
            debug!(?peer, error = %e, "reload handshake failed");
            return;
        }
    };
    // Clients are only written to after this point.
    let _ = ws.get_ref().set_read_timeout(None);

    if let Err(e) = ws.send(Message::Text(ReloadMessage::connected().to_json().into())) {
        debug!(?peer, error = %e, "failed to greet reload client");
        return;
    }
    let mut guard = lock(&clients);
    guard.push(ws);
    debug!(?peer, total = guard.len(), "reload client connected");
}

/// Try binding to `base_port`, moving up one port at a time if it is in use.
fn try_bind_port(base_port: u16, max_retries: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(("127.0.0.1", port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "failed to bind reload server after {max_retries} attempts: {}",
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}
