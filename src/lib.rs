//! # Provenance Chain
//!
//! A minimal proof-of-work blockchain used as an art-ownership registry.
//! Independent peers discover each other through a lightweight rendezvous
//! service and gossip blocks and transactions directly to one another.
//!
//! ## Layout
//! - `core/`: blocks, transactions, Merkle aggregation, proof-of-work mining,
//!   difficulty retargeting, and the chain state machine
//! - `network/`: the gossip wire protocol, the peer node with longest-chain
//!   fork resolution, and the discovery service
//! - `storage/`: the peer's in-memory pools and the JSON chain file
//! - `config/`: environment-backed node configuration
//! - `utils/`: hashing and HMAC signing primitives
//! - `cli/`: command-line interface for the registry binary

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod network;
pub mod storage;
pub mod utils;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt};
pub use config::{Config, GLOBAL_CONFIG};
pub use core::{
    adjust_difficulty, calculate_merkle_root, mine_block, Block, BlockChain, BlockHeader,
    ProofOfWork, Transaction, GENESIS_PREV_HASH, MINT_SENDER,
};
pub use error::{BlockchainError, ChainStateError, InvalidBlockReason, Result};
pub use network::{find_longest_chain, DiscoveryService, Message, Peer, PeerAddr, PeerTable};
pub use storage::{load_chain, save_chain, BlockPool, PendingPool};
pub use utils::{hmac_sha256_sign, hmac_sha256_verify, sha256_digest, sha256_hex};
