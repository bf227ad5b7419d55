//! Error handling for the registry
//!
//! This module provides the error types shared by every component, from block
//! validation up through the gossip layer.

use std::fmt;

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, BlockchainError>;

/// Why a block failed its self-contained validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidBlockReason {
    /// Recomputed Merkle root does not match the header
    MerkleMismatch,
    /// Header hash does not meet the difficulty target
    InsufficientWork,
    /// A transaction signature failed verification
    BadSignature,
}

impl fmt::Display for InvalidBlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidBlockReason::MerkleMismatch => write!(f, "merkle root mismatch"),
            InvalidBlockReason::InsufficientWork => write!(f, "insufficient proof-of-work"),
            InvalidBlockReason::BadSignature => write!(f, "bad transaction signature"),
        }
    }
}

/// Why the chain state machine refused an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainStateError {
    /// Mutation requested before the genesis block exists
    NotBootstrapped,
    /// Bootstrap requested on a chain that already has blocks
    AlreadyBootstrapped,
    /// A mint names an artwork id already minted on this chain
    DuplicateMint(String),
    /// A block's parent hash does not match the expected block id
    ParentMismatch,
}

impl fmt::Display for ChainStateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainStateError::NotBootstrapped => write!(f, "chain is not bootstrapped"),
            ChainStateError::AlreadyBootstrapped => write!(f, "chain is already bootstrapped"),
            ChainStateError::DuplicateMint(artwork_id) => {
                write!(f, "artwork {artwork_id:?} was already minted")
            }
            ChainStateError::ParentMismatch => write!(f, "previous-hash mismatch"),
        }
    }
}

/// Error types for registry operations
#[derive(Debug, Clone)]
pub enum BlockchainError {
    /// Block validation errors, with the first failing check
    InvalidBlock(InvalidBlockReason),
    /// Chain state machine errors
    ChainState(ChainStateError),
    /// Network communication errors (always non-fatal at the gossip boundary)
    Network(String),
    /// Malformed or unparseable wire messages
    Protocol(String),
    /// Serialization/deserialization errors
    Serialization(String),
    /// File I/O errors
    Io(String),
    /// Configuration errors
    Config(String),
    /// Mining errors (cancellation, exhausted search)
    Mining(String),
}

impl fmt::Display for BlockchainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockchainError::InvalidBlock(reason) => write!(f, "Invalid block: {reason}"),
            BlockchainError::ChainState(err) => write!(f, "Chain state error: {err}"),
            BlockchainError::Network(msg) => write!(f, "Network error: {msg}"),
            BlockchainError::Protocol(msg) => write!(f, "Protocol error: {msg}"),
            BlockchainError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            BlockchainError::Io(msg) => write!(f, "I/O error: {msg}"),
            BlockchainError::Config(msg) => write!(f, "Configuration error: {msg}"),
            BlockchainError::Mining(msg) => write!(f, "Mining error: {msg}"),
        }
    }
}

impl std::error::Error for BlockchainError {}

impl From<std::io::Error> for BlockchainError {
    fn from(err: std::io::Error) -> Self {
        BlockchainError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BlockchainError {
    fn from(err: serde_json::Error) -> Self {
        BlockchainError::Serialization(err.to_string())
    }
}
