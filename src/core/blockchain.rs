use crate::core::{
    mine_block, Block, BlockHeader, Transaction, GENESIS_PREV_HASH, RETARGET_WINDOW,
    TARGET_BLOCK_TIME_SECS,
};
use crate::error::{BlockchainError, ChainStateError, Result};
use log::{info, warn};
use std::collections::HashSet;
use std::sync::atomic::AtomicBool;

/// The chain state machine: the accepted block sequence plus the index of
/// every artwork id ever minted on it.
///
/// `try_extend` is the single mutating entry point for chain growth and is
/// not re-entrant-safe; callers sharing a chain across threads must serialize
/// access externally.
#[derive(Debug, Clone, Default)]
pub struct BlockChain {
    blocks: Vec<Block>,
    minted_artworks: HashSet<String>,
}

impl BlockChain {
    pub fn new() -> BlockChain {
        BlockChain {
            blocks: Vec::new(),
            minted_artworks: HashSet::new(),
        }
    }

    pub fn is_bootstrapped(&self) -> bool {
        !self.blocks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[Block] {
        self.blocks.as_slice()
    }

    pub fn tip(&self) -> Option<&Block> {
        self.blocks.last()
    }

    pub fn headers(&self) -> Vec<BlockHeader> {
        self.blocks.iter().map(|b| b.header.clone()).collect()
    }

    pub fn already_minted(&self, artwork_id: &str) -> bool {
        self.minted_artworks.contains(artwork_id)
    }

    /// Mine the genesis block: a single mint of `artwork_id` from `creator`
    /// to `recipient`, at fixed difficulty 1, parented on the genesis
    /// sentinel.
    pub fn bootstrap(
        &mut self,
        creator: &str,
        recipient: &str,
        artwork_id: &str,
        cancel: &AtomicBool,
    ) -> Result<()> {
        if self.is_bootstrapped() {
            return Err(BlockchainError::ChainState(
                ChainStateError::AlreadyBootstrapped,
            ));
        }

        let mut mint = Transaction::new(creator, recipient, artwork_id);
        mint.sign(creator);

        let genesis = mine_block(
            0,
            GENESIS_PREV_HASH,
            vec![mint],
            Some(1),
            &[],
            RETARGET_WINDOW,
            TARGET_BLOCK_TIME_SECS,
            cancel,
        )?;

        info!("Bootstrapped chain with genesis mint of {artwork_id:?}");
        self.blocks.push(genesis);
        self.minted_artworks.insert(artwork_id.to_string());
        Ok(())
    }

    /// Mine a candidate block on top of the current tip, with difficulty
    /// retargeted over the full header history.
    ///
    /// The candidate is returned unattached; the chain is not mutated until
    /// it is passed to [`try_extend`](Self::try_extend).
    pub fn build_next(&self, transactions: Vec<Transaction>, cancel: &AtomicBool) -> Result<Block> {
        let tip = self
            .tip()
            .ok_or(BlockchainError::ChainState(ChainStateError::NotBootstrapped))?;

        mine_block(
            self.blocks.len() as u32,
            &tip.id()?,
            transactions,
            None,
            &self.headers(),
            RETARGET_WINDOW,
            TARGET_BLOCK_TIME_SECS,
            cancel,
        )
    }

    /// Try to append `block` to the tip. Returns false — leaving the chain
    /// untouched — unless the block parents the tip, validates, and mints
    /// nothing already minted.
    pub fn try_extend(&mut self, block: &Block) -> bool {
        let tip_id = match self.tip().map(|tip| tip.id()) {
            Some(Ok(id)) => id,
            Some(Err(e)) => {
                warn!("Cannot hash tip: {e}");
                return false;
            }
            None => {
                warn!("Rejected block: chain is not bootstrapped");
                return false;
            }
        };

        if block.header.prev_block_hash != tip_id {
            warn!("Rejected block {}: previous-hash mismatch", block.header.block_num);
            return false;
        }

        if let Err(e) = block.validate() {
            warn!("Rejected block {}: {e}", block.header.block_num);
            return false;
        }

        // All-or-nothing: check every mint before registering any
        for tx in block.get_transactions() {
            if tx.is_mint() && self.already_minted(tx.get_artwork_id()) {
                warn!(
                    "Rejected block {}: duplicate mint of {:?}",
                    block.header.block_num,
                    tx.get_artwork_id()
                );
                return false;
            }
        }

        for tx in block.get_transactions() {
            if tx.is_mint() {
                self.minted_artworks.insert(tx.get_artwork_id().to_string());
            }
        }

        self.blocks.push(block.clone());
        info!("Chain extended to height {}", self.blocks.len() - 1);
        true
    }

    /// Replace the accepted chain wholesale (fork resolution swap-in),
    /// re-deriving the minted-artwork index from the new blocks.
    pub fn replace_blocks(&mut self, blocks: Vec<Block>) {
        self.minted_artworks = blocks
            .iter()
            .flat_map(|b| b.get_transactions())
            .filter(|tx| tx.is_mint())
            .map(|tx| tx.get_artwork_id().to_string())
            .collect();
        self.blocks = blocks;
    }

    /// Re-validate a reconstructed chain: genesis sentinel, linkage, block
    /// numbering, and every block's own `validate()`.
    ///
    /// The deserialization path only rebuilds objects; callers loading a
    /// chain from disk are responsible for running this.
    pub fn verify_blocks(blocks: &[Block]) -> Result<()> {
        let mut expected_prev = GENESIS_PREV_HASH.to_string();
        let mut minted: HashSet<&str> = HashSet::new();
        for (index, block) in blocks.iter().enumerate() {
            if block.header.block_num as usize != index
                || block.header.prev_block_hash != expected_prev
            {
                return Err(BlockchainError::ChainState(ChainStateError::ParentMismatch));
            }
            block.validate()?;
            for tx in block.get_transactions() {
                if tx.is_mint() && !minted.insert(tx.get_artwork_id()) {
                    return Err(BlockchainError::ChainState(ChainStateError::DuplicateMint(
                        tx.get_artwork_id().to_string(),
                    )));
                }
            }
            expected_prev = block.id()?;
        }
        Ok(())
    }

    /// Rebuild a chain state machine from stored blocks.
    pub fn from_blocks(blocks: Vec<Block>) -> BlockChain {
        let mut chain = BlockChain::new();
        chain.replace_blocks(blocks);
        chain
    }
}
