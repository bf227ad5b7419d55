use crate::core::{Block, BlockChain, Transaction, GENESIS_PREV_HASH};
use crate::error::{BlockchainError, Result};
use crate::network::message::{
    read_message, send_expect_reply, send_message, Message, PeerAddr,
};
use crate::network::peer_table::PeerTable;
use crate::storage::{BlockPool, PendingPool};
use log::{info, warn};
use std::io::ErrorKind;
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Seconds between liveness pings to the discovery service
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(10);
/// Accept-loop poll interval while waiting for connections
const ACCEPT_POLL: Duration = Duration::from_millis(100);
const IO_TIMEOUT: Duration = Duration::from_millis(3000);

/// The chain, the pending pool, and the observed-block pool.
///
/// These are one shared resource: every mutation site takes the one mutex
/// guarding the triple, so gossip handling, submission, and proposal are
/// serialized against each other.
struct NodeState {
    chain: BlockChain,
    pending: PendingPool,
    block_pool: BlockPool,
}

struct PeerInner {
    self_addr: PeerAddr,
    tracker_addr: PeerAddr,
    state: Mutex<NodeState>,
    peers: PeerTable,
    shutdown: AtomicBool,
    revalidate_forks: AtomicBool,
}

/// A gossip peer: one chain state machine, one pending pool, one
/// observed-block pool, and one peer address table.
pub struct Peer {
    inner: Arc<PeerInner>,
    listener_handle: Option<JoinHandle<()>>,
    keep_alive_handle: Option<JoinHandle<()>>,
}

impl PeerInner {
    fn lock_state(&self) -> MutexGuard<'_, NodeState> {
        self.state
            .lock()
            .expect("Failed to acquire node state lock - this should never happen")
    }

    /// Dispatch one inbound gossip message.
    fn handle_message(&self, message: Message) {
        match message {
            Message::NewTransaction { data } => {
                if data.verify_signature() {
                    self.lock_state().pending.add(data);
                } else {
                    warn!("Dropped transaction with bad signature");
                }
            }
            Message::NewBlock { data } => self.handle_new_block(data),
            Message::PeerList { peers } | Message::PeerUpdate { peers } => {
                self.peers.replace_all(peers, &self.self_addr);
            }
            other => warn!("Unexpected message for peer: {other:?}"),
        }
    }

    /// Pool the block, try a direct tip extension, then reconcile forks.
    fn handle_new_block(&self, block: Block) {
        let block_id = match block.id() {
            Ok(id) => id,
            Err(e) => {
                warn!("Dropped block with unhashable header: {e}");
                return;
            }
        };

        let mut state = self.lock_state();
        state.block_pool.insert(block_id, block.clone());

        let tip_id = state.chain.tip().and_then(|tip| tip.id().ok());
        if tip_id.as_deref() == Some(block.header.prev_block_hash.as_str())
            && state.chain.try_extend(&block)
        {
            state.pending.prune_confirmed(&block);
        }

        // Fork resolution runs on every received block, extended or not
        let best = find_longest_chain(&state.block_pool);
        if best.len() > state.chain.len() {
            if self.revalidate_forks.load(Ordering::Relaxed)
                && best.iter().any(|b| b.validate().is_err())
            {
                warn!("Kept current chain: replacement candidate failed re-validation");
                return;
            }
            info!(
                "Adopting longer fork: height {} -> {}",
                state.chain.len().saturating_sub(1),
                best.len() - 1
            );
            state.chain.replace_blocks(best);
            let blocks = state.chain.blocks().to_vec();
            state.pending.retain_unchained(&blocks);
        }
    }
}

impl Peer {
    /// Create a peer around an existing chain. The observed-block pool is
    /// seeded with the accepted blocks so fork walks can terminate.
    pub fn new(ip: &str, port: u16, tracker_addr: PeerAddr, chain: BlockChain) -> Result<Peer> {
        let mut block_pool = BlockPool::new();
        for block in chain.blocks() {
            block_pool.insert(block.id()?, block.clone());
        }

        Ok(Peer {
            inner: Arc::new(PeerInner {
                self_addr: PeerAddr::new(ip, port),
                tracker_addr,
                state: Mutex::new(NodeState {
                    chain,
                    pending: PendingPool::new(),
                    block_pool,
                }),
                peers: PeerTable::new(),
                shutdown: AtomicBool::new(false),
                revalidate_forks: AtomicBool::new(false),
            }),
            listener_handle: None,
            keep_alive_handle: None,
        })
    }

    /// Re-run full block validation along a winning fork before swapping it
    /// in. Off by default, matching the linkage-only selection rule.
    pub fn set_revalidate_forks(&self, enabled: bool) {
        self.inner.revalidate_forks.store(enabled, Ordering::Relaxed);
    }

    /// Bind the listener, register with the discovery service, and start the
    /// listener and keep-alive loops.
    pub fn connect(&mut self) -> Result<()> {
        let bind_addr = format!("{}:{}", self.inner.self_addr.ip, self.inner.self_addr.port);
        let listener = TcpListener::bind(&bind_addr)
            .map_err(|e| BlockchainError::Network(format!("Failed to bind to {bind_addr}: {e}")))?;
        listener
            .set_nonblocking(true)
            .map_err(|e| BlockchainError::Network(format!("Failed to set nonblocking: {e}")))?;

        // Port 0 resolves to a real port at bind time
        let local = listener
            .local_addr()
            .map_err(|e| BlockchainError::Network(format!("Failed to read local addr: {e}")))?;
        if self.inner.self_addr.port != local.port() {
            let inner = Arc::get_mut(&mut self.inner).ok_or_else(|| {
                BlockchainError::Network("Peer already started".to_string())
            })?;
            inner.self_addr.port = local.port();
        }

        info!("Peer listening on {}", self.inner.self_addr);

        let join = Message::Join {
            ip: self.inner.self_addr.ip.clone(),
            port: self.inner.self_addr.port,
        };
        match send_expect_reply(&self.inner.tracker_addr, &join)? {
            Message::PeerList { peers } => {
                self.inner.peers.replace_all(peers, &self.inner.self_addr);
            }
            other => {
                return Err(BlockchainError::Protocol(format!(
                    "Unexpected reply to JOIN: {other:?}"
                )));
            }
        }

        let listen_inner = Arc::clone(&self.inner);
        self.listener_handle = Some(thread::spawn(move || {
            while !listen_inner.shutdown.load(Ordering::Relaxed) {
                match listener.accept() {
                    Ok((stream, _)) => Self::handle_connection(&listen_inner, &stream),
                    Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
                    Err(e) => {
                        warn!("Failed to accept connection: {e}");
                        thread::sleep(ACCEPT_POLL);
                    }
                }
            }
        }));

        let alive_inner = Arc::clone(&self.inner);
        self.keep_alive_handle = Some(thread::spawn(move || loop {
            let ping = Message::KeepAlive {
                ip: alive_inner.self_addr.ip.clone(),
                port: alive_inner.self_addr.port,
            };
            if let Err(e) = send_message(&alive_inner.tracker_addr, &ping) {
                warn!("Keep-alive failed: {e}");
            }

            let started = Instant::now();
            while started.elapsed() < KEEP_ALIVE_INTERVAL {
                if alive_inner.shutdown.load(Ordering::Relaxed) {
                    return;
                }
                thread::sleep(ACCEPT_POLL);
            }
        }));

        Ok(())
    }

    /// One message per accepted connection, then close. A bad peer never
    /// takes the listener loop down.
    fn handle_connection(inner: &Arc<PeerInner>, stream: &TcpStream) {
        let _ = stream.set_read_timeout(Some(IO_TIMEOUT));
        match read_message(stream) {
            Ok(message) => inner.handle_message(message),
            Err(e) => warn!("Dropped gossip connection: {e}"),
        }
    }

    pub fn local_addr(&self) -> PeerAddr {
        self.inner.self_addr.clone()
    }

    pub fn known_peers(&self) -> Vec<PeerAddr> {
        self.inner.peers.snapshot()
    }

    pub fn chain_len(&self) -> usize {
        self.inner.lock_state().chain.len()
    }

    pub fn chain_blocks(&self) -> Vec<Block> {
        self.inner.lock_state().chain.blocks().to_vec()
    }

    pub fn pending_count(&self) -> usize {
        self.inner.lock_state().pending.len()
    }

    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.inner.lock_state().pending.snapshot()
    }

    /// Construct, sign, pend, and broadcast a new transfer.
    ///
    /// Broadcast is best-effort; a peer that cannot be reached is dropped
    /// from the address table.
    pub fn submit_transaction(
        &self,
        sender: &str,
        recipient: &str,
        artwork_id: &str,
        key: &str,
    ) -> Transaction {
        let mut tx = Transaction::new(sender, recipient, artwork_id);
        tx.sign(key);

        self.inner.lock_state().pending.add(tx.clone());
        self.broadcast_transaction(&tx);
        tx
    }

    fn broadcast_transaction(&self, tx: &Transaction) {
        let message = Message::NewTransaction { data: tx.clone() };
        for peer in self.inner.peers.snapshot() {
            if let Err(e) = send_message(&peer, &message) {
                warn!("Dropping unreachable peer {peer}: {e}");
                self.inner.peers.evict(&peer);
            }
        }
    }

    /// Try to extend the local chain with `block`, then broadcast it to
    /// every known peer whatever the local outcome. Send failures are
    /// ignored and do not prune the address table.
    pub fn propose_block(&self, block: &Block) -> bool {
        let extended = {
            let mut state = self.inner.lock_state();
            if let Ok(id) = block.id() {
                state.block_pool.insert(id, block.clone());
            }
            let extended = state.chain.try_extend(block);
            if extended {
                state.pending.prune_confirmed(block);
            }
            extended
        };

        let message = Message::NewBlock {
            data: block.clone(),
        };
        for peer in self.inner.peers.snapshot() {
            if let Err(e) = send_message(&peer, &message) {
                warn!("Failed to send block to {peer}: {e}");
            }
        }

        extended
    }

    /// Mine the current pending pool into a candidate block on top of the
    /// local tip. The chain is snapshotted so gossip keeps flowing during
    /// the search; the peer's shutdown flag doubles as the cancellation
    /// token.
    pub fn mine_pending(&self) -> Result<Block> {
        let (chain, transactions) = {
            let state = self.inner.lock_state();
            (state.chain.clone(), state.pending.snapshot())
        };
        chain.build_next(transactions, &self.inner.shutdown)
    }

    /// Send LEAVE to the discovery service, stop both loops, and join them.
    pub fn close(&mut self) {
        self.inner.shutdown.store(true, Ordering::Relaxed);

        let leave = Message::Leave {
            ip: self.inner.self_addr.ip.clone(),
            port: self.inner.self_addr.port,
        };
        if let Err(e) = send_message(&self.inner.tracker_addr, &leave) {
            warn!("Failed to send LEAVE: {e}");
        }

        if let Some(handle) = self.listener_handle.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.keep_alive_handle.take() {
            let _ = handle.join();
        }
    }

    /// Block until the peer is shut down from another thread.
    pub fn wait(&mut self) {
        if let Some(handle) = self.listener_handle.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.keep_alive_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Peer {
    fn drop(&mut self) {
        if self.listener_handle.is_some() || self.keep_alive_handle.is_some() {
            self.close();
        }
    }
}

/// Longest-valid-chain selection over the observed-block pool.
///
/// Every pooled block is walked backward through its ancestry; candidates
/// that reach the genesis sentinel compete on length, and a candidate with a
/// missing ancestor is discarded. Linkage is the only thing checked here.
pub fn find_longest_chain(pool: &BlockPool) -> Vec<Block> {
    let mut best: Vec<Block> = Vec::new();

    for start in pool.values() {
        let mut candidate = vec![start.clone()];
        let mut prev = start.header.prev_block_hash.clone();

        let complete = loop {
            if prev == GENESIS_PREV_HASH {
                break true;
            }
            match pool.get(&prev) {
                Some(parent) => {
                    candidate.push(parent.clone());
                    prev = parent.header.prev_block_hash.clone();
                }
                None => break false,
            }
        };

        if complete && candidate.len() > best.len() {
            candidate.reverse();
            best = candidate;
        }
    }

    best
}
