use crate::core::{Block, Transaction};
use std::collections::{HashMap, HashSet};

/// Signed transactions waiting to be chained.
///
/// Order is irrelevant; duplicates (by content hash) are dropped on insert.
/// This type is not internally synchronized — the peer guards it together
/// with the chain and the block pool under one lock.
#[derive(Debug, Default)]
pub struct PendingPool {
    transactions: Vec<Transaction>,
}

impl PendingPool {
    pub fn new() -> PendingPool {
        PendingPool {
            transactions: Vec::new(),
        }
    }

    pub fn add(&mut self, tx: Transaction) {
        let hash = tx.hash();
        if !self.transactions.iter().any(|t| t.hash() == hash) {
            self.transactions.push(tx);
        }
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn snapshot(&self) -> Vec<Transaction> {
        self.transactions.clone()
    }

    /// Drop every pending transaction confirmed by `block`.
    pub fn prune_confirmed(&mut self, block: &Block) {
        let confirmed: HashSet<String> =
            block.get_transactions().iter().map(|tx| tx.hash()).collect();
        self.transactions.retain(|tx| !confirmed.contains(&tx.hash()));
    }

    /// Keep only transactions not present in any of `blocks` (used after a
    /// wholesale chain swap).
    pub fn retain_unchained(&mut self, blocks: &[Block]) {
        let chained: HashSet<String> = blocks
            .iter()
            .flat_map(|b| b.get_transactions())
            .map(|tx| tx.hash())
            .collect();
        self.transactions.retain(|tx| !chained.contains(&tx.hash()));
    }
}

/// Every block this peer has ever observed, keyed by block id.
///
/// A superset of the accepted chain, used to reconstruct forks. Entries are
/// never evicted; in a long-running deployment this grows without bound,
/// which is an accepted capacity limit here.
#[derive(Debug, Default)]
pub struct BlockPool {
    blocks: HashMap<String, Block>,
}

impl BlockPool {
    pub fn new() -> BlockPool {
        BlockPool {
            blocks: HashMap::new(),
        }
    }

    pub fn insert(&mut self, id: String, block: Block) {
        self.blocks.insert(id, block);
    }

    pub fn get(&self, id: &str) -> Option<&Block> {
        self.blocks.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.blocks.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{mine_block, GENESIS_PREV_HASH};
    use std::sync::atomic::AtomicBool;

    fn signed(sender: &str, recipient: &str, artwork_id: &str) -> Transaction {
        let mut tx = Transaction::new(sender, recipient, artwork_id);
        tx.sign(sender);
        tx
    }

    fn mined(transactions: Vec<Transaction>) -> Block {
        let cancel = AtomicBool::new(false);
        mine_block(
            0,
            GENESIS_PREV_HASH,
            transactions,
            Some(1),
            &[],
            10,
            20,
            &cancel,
        )
        .unwrap()
    }

    #[test]
    fn test_pending_pool_dedup() {
        let mut pool = PendingPool::new();
        pool.add(signed("A", "B", "ART1"));
        pool.add(signed("A", "B", "ART1"));
        pool.add(signed("A", "C", "ART2"));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_prune_confirmed() {
        let mut pool = PendingPool::new();
        let confirmed = signed("A", "B", "ART1");
        let waiting = signed("A", "C", "ART2");
        pool.add(confirmed.clone());
        pool.add(waiting.clone());

        let block = mined(vec![confirmed]);
        pool.prune_confirmed(&block);

        assert_eq!(pool.snapshot(), vec![waiting]);
    }

    #[test]
    fn test_retain_unchained() {
        let mut pool = PendingPool::new();
        let chained = signed("A", "B", "ART1");
        let waiting = signed("A", "C", "ART2");
        pool.add(chained.clone());
        pool.add(waiting.clone());

        let blocks = vec![mined(vec![chained])];
        pool.retain_unchained(&blocks);

        assert_eq!(pool.snapshot(), vec![waiting]);
    }

    #[test]
    fn test_block_pool_keyed_by_id() {
        let mut pool = BlockPool::new();
        let block = mined(vec![signed("MINT", "B", "ART1")]);
        let id = block.id().unwrap();

        pool.insert(id.clone(), block.clone());
        // Re-inserting the same block does not grow the pool
        pool.insert(id.clone(), block);
        assert_eq!(pool.len(), 1);
        assert!(pool.contains(&id));
    }
}
