use crate::error::{BlockchainError, Result};
use crate::network::message::{read_message, send_message, write_message, Message, PeerAddr};
use log::{info, warn};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Seconds of silence after which a peer is swept from the registry
const PEER_INACTIVITY_LIMIT: Duration = Duration::from_secs(40);
/// How often the sweeper runs
const SWEEP_INTERVAL: Duration = Duration::from_secs(10);
/// Accept-loop poll interval while waiting for connections
const ACCEPT_POLL: Duration = Duration::from_millis(100);
const IO_TIMEOUT: Duration = Duration::from_millis(3000);

/// The rendezvous service: an address book peers register with.
///
/// Handles one JSON message per inbound connection (JOIN, LEAVE or
/// KEEP_ALIVE), then closes it. Any membership activity triggers a full-list
/// PEER_UPDATE broadcast to every registered peer.
pub struct DiscoveryService {
    inner: Arc<DiscoveryInner>,
    local_addr: PeerAddr,
    listener_handle: Option<JoinHandle<()>>,
    sweeper_handle: Option<JoinHandle<()>>,
}

struct DiscoveryInner {
    registry: Mutex<HashMap<PeerAddr, Instant>>,
    shutdown: AtomicBool,
}

impl DiscoveryInner {
    fn new() -> DiscoveryInner {
        DiscoveryInner {
            registry: Mutex::new(HashMap::new()),
            shutdown: AtomicBool::new(false),
        }
    }

    fn lock_registry(&self) -> std::sync::MutexGuard<'_, HashMap<PeerAddr, Instant>> {
        self.registry
            .lock()
            .expect("Failed to acquire registry lock - this should never happen")
    }

    /// Record or refresh a peer's last-seen time.
    fn touch(&self, addr: PeerAddr) {
        self.lock_registry().insert(addr, Instant::now());
    }

    fn remove(&self, addr: &PeerAddr) {
        self.lock_registry().remove(addr);
    }

    fn peer_list(&self) -> Vec<PeerAddr> {
        self.lock_registry().keys().cloned().collect()
    }

    /// Drop peers silent for longer than `limit`, returning the removed set.
    fn sweep(&self, limit: Duration) -> Vec<PeerAddr> {
        let now = Instant::now();
        let mut registry = self.lock_registry();
        let expired: Vec<PeerAddr> = registry
            .iter()
            .filter(|(_, last_seen)| now.duration_since(**last_seen) > limit)
            .map(|(addr, _)| addr.clone())
            .collect();
        for addr in &expired {
            registry.remove(addr);
        }
        expired
    }

    /// Best-effort PEER_UPDATE broadcast of the full current list.
    fn broadcast_update(&self) {
        let peers = self.peer_list();
        let update = Message::PeerUpdate {
            peers: peers.clone(),
        };
        for peer in &peers {
            if let Err(e) = send_message(peer, &update) {
                warn!("Failed to notify {peer}: {e}");
            }
        }
    }

    /// Handle exactly one message from an accepted connection.
    fn handle_connection(&self, stream: &TcpStream) -> Result<()> {
        let message = read_message(stream)?;
        match message {
            Message::Join { ip, port } => {
                let addr = PeerAddr::new(&ip, port);
                info!("Peer joined: {addr}");
                self.touch(addr);
                // Reply with the full list on the same connection, then
                // notify everyone (the joiner included)
                let reply = Message::PeerList {
                    peers: self.peer_list(),
                };
                write_message(stream, &reply)?;
                self.broadcast_update();
            }
            Message::Leave { ip, port } => {
                let addr = PeerAddr::new(&ip, port);
                info!("Peer left: {addr}");
                self.remove(&addr);
                self.broadcast_update();
            }
            Message::KeepAlive { ip, port } => {
                self.touch(PeerAddr::new(&ip, port));
                self.broadcast_update();
            }
            other => {
                return Err(BlockchainError::Protocol(format!(
                    "Unexpected message for discovery service: {other:?}"
                )));
            }
        }
        Ok(())
    }
}

impl DiscoveryService {
    /// Bind `addr` and start the accept loop and the inactivity sweeper.
    pub fn start(addr: &str) -> Result<DiscoveryService> {
        let listener = TcpListener::bind(addr)
            .map_err(|e| BlockchainError::Network(format!("Failed to bind to {addr}: {e}")))?;
        listener
            .set_nonblocking(true)
            .map_err(|e| BlockchainError::Network(format!("Failed to set nonblocking: {e}")))?;
        let local = listener
            .local_addr()
            .map_err(|e| BlockchainError::Network(format!("Failed to read local addr: {e}")))?;
        let local_addr = PeerAddr::new(&local.ip().to_string(), local.port());

        info!("Discovery service listening on {local_addr}");

        let inner = Arc::new(DiscoveryInner::new());

        let accept_inner = Arc::clone(&inner);
        let listener_handle = thread::spawn(move || {
            while !accept_inner.shutdown.load(Ordering::Relaxed) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let _ = stream.set_read_timeout(Some(IO_TIMEOUT));
                        let _ = stream.set_write_timeout(Some(IO_TIMEOUT));
                        if let Err(e) = accept_inner.handle_connection(&stream) {
                            warn!("Dropped discovery connection: {e}");
                        }
                    }
                    Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
                    Err(e) => {
                        warn!("Failed to accept connection: {e}");
                        thread::sleep(ACCEPT_POLL);
                    }
                }
            }
        });

        let sweep_inner = Arc::clone(&inner);
        let sweeper_handle = thread::spawn(move || loop {
            let started = Instant::now();
            while started.elapsed() < SWEEP_INTERVAL {
                if sweep_inner.shutdown.load(Ordering::Relaxed) {
                    return;
                }
                thread::sleep(ACCEPT_POLL);
            }

            let removed = sweep_inner.sweep(PEER_INACTIVITY_LIMIT);
            if !removed.is_empty() {
                for addr in &removed {
                    info!("Swept inactive peer: {addr}");
                }
                sweep_inner.broadcast_update();
            }
        });

        Ok(DiscoveryService {
            inner,
            local_addr,
            listener_handle: Some(listener_handle),
            sweeper_handle: Some(sweeper_handle),
        })
    }

    /// The bound address (useful when started on port 0).
    pub fn local_addr(&self) -> PeerAddr {
        self.local_addr.clone()
    }

    pub fn peer_list(&self) -> Vec<PeerAddr> {
        self.inner.peer_list()
    }

    /// Signal both loops and join them.
    pub fn shutdown(&mut self) {
        self.inner.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.listener_handle.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.sweeper_handle.take() {
            let _ = handle.join();
        }
    }

    /// Block until the service is shut down from another thread.
    pub fn wait(&mut self) {
        if let Some(handle) = self.listener_handle.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.sweeper_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for DiscoveryService {
    fn drop(&mut self) {
        self.shutdown();
    }
}
