//! Core registry functionality
//!
//! The block and transaction data model, Merkle aggregation, proof-of-work
//! mining with difficulty retargeting, and the chain state machine.

pub mod block;
pub mod blockchain;
pub mod difficulty;
pub mod merkle;
pub mod proof_of_work;
pub mod transaction;

pub use block::{Block, BlockHeader, GENESIS_PREV_HASH, HEADER_BYTES};
pub use blockchain::BlockChain;
pub use difficulty::{adjust_difficulty, RETARGET_WINDOW, TARGET_BLOCK_TIME_SECS};
pub use merkle::{calculate_merkle_root, verify_merkle_root};
pub use proof_of_work::{mine_block, ProofOfWork};
pub use transaction::{Transaction, MINT_SENDER};
