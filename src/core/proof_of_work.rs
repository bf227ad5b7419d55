use crate::core::{adjust_difficulty, calculate_merkle_root, Block, BlockHeader, Transaction};
use crate::error::{BlockchainError, Result};
use crate::utils::{current_timestamp_ms, sha256_digest};
use log::info;
use num_bigint::{BigInt, Sign};
use std::sync::atomic::{AtomicBool, Ordering};

/// How many nonces to try between cancellation checks
const CANCEL_CHECK_INTERVAL: u32 = 4096;

/// Nonce search for a block header.
///
/// A header meets difficulty `d` when its hash, read as a 256-bit big-endian
/// unsigned integer, is at most `2^(256-d) - 1`.
pub struct ProofOfWork {
    header: BlockHeader,
    target: BigInt,
}

impl ProofOfWork {
    pub fn new(header: BlockHeader) -> ProofOfWork {
        let target = Self::target_for(header.difficulty);
        ProofOfWork { header, target }
    }

    fn target_for(difficulty: u32) -> BigInt {
        let shift = 256u32.saturating_sub(difficulty);
        (BigInt::from(1) << shift) - 1
    }

    /// Check a header against the target implied by its own difficulty.
    pub fn meets_target(header: &BlockHeader) -> Result<bool> {
        let hash = sha256_digest(&header.to_bytes()?);
        let hash_int = BigInt::from_bytes_be(Sign::Plus, &hash);
        Ok(hash_int <= Self::target_for(header.difficulty))
    }

    /// Search for a nonce that meets the target, starting from the header's
    /// current nonce.
    ///
    /// The search is CPU-bound and unbounded; `cancel` is polled every few
    /// thousand nonces and aborts with a `Mining` error when set. If the
    /// 32-bit nonce space is exhausted the timestamp is refreshed and the
    /// search restarts from zero.
    pub fn run(mut self, cancel: &AtomicBool) -> Result<BlockHeader> {
        let mut since_check: u32 = 0;
        loop {
            if since_check == 0 && cancel.load(Ordering::Relaxed) {
                return Err(BlockchainError::Mining("search cancelled".to_string()));
            }
            since_check = (since_check + 1) % CANCEL_CHECK_INTERVAL;

            let hash = sha256_digest(&self.header.to_bytes()?);
            let hash_int = BigInt::from_bytes_be(Sign::Plus, &hash);
            if hash_int <= self.target {
                return Ok(self.header);
            }

            if self.header.nonce == u32::MAX {
                // Nonce space exhausted: move to a fresh search space
                self.header.timestamp_ms = current_timestamp_ms()?;
                self.header.nonce = 0;
            } else {
                self.header.nonce += 1;
            }
        }
    }
}

/// Build and mine a block.
///
/// When `difficulty` is not supplied it is derived by retargeting over
/// `chain_headers` (defaulting to 1 with no history).
#[allow(clippy::too_many_arguments)]
pub fn mine_block(
    block_num: u32,
    prev_hash: &str,
    transactions: Vec<Transaction>,
    difficulty: Option<u32>,
    chain_headers: &[BlockHeader],
    window: usize,
    target_time_secs: u64,
    cancel: &AtomicBool,
) -> Result<Block> {
    let difficulty = match difficulty {
        Some(bits) => bits,
        None => adjust_difficulty(chain_headers, window, target_time_secs),
    };

    let merkle_root = calculate_merkle_root(&transactions)?;
    let timestamp_ms = current_timestamp_ms()?;
    let header = BlockHeader::new(
        block_num,
        prev_hash,
        &merkle_root,
        timestamp_ms,
        difficulty,
        0,
    );

    info!("Mining block {block_num} at difficulty {difficulty}");
    let header = ProofOfWork::new(header).run(cancel)?;
    info!(
        "Mined block {block_num}: {} (nonce {})",
        header.hash()?,
        header.nonce
    );

    Ok(Block::new(header, transactions))
}
