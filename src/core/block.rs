use crate::core::{verify_merkle_root, ProofOfWork, Transaction};
use crate::error::{BlockchainError, InvalidBlockReason, Result};
use crate::utils::{hex_decode, sha256_hex};
use serde::{Deserialize, Serialize};

/// `prev_block_hash` of the genesis block; terminates chain walks.
pub const GENESIS_PREV_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Serialized header size: 4 + 32 + 32 + 8 + 4 + 4 bytes.
pub const HEADER_BYTES: usize = 84;

/// Block metadata, including the proof-of-work fields.
///
/// The hashing serialization is fixed-width big-endian in declaration order;
/// both hash fields are stored as 64-character hex strings and serialized as
/// their 32 raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub block_num: u32,
    pub prev_block_hash: String,
    pub merkle_root_hash: String,
    pub timestamp_ms: u64,
    /// Required number of leading zero bits in the header hash
    pub difficulty: u32,
    pub nonce: u32,
}

impl BlockHeader {
    pub fn new(
        block_num: u32,
        prev_block_hash: &str,
        merkle_root_hash: &str,
        timestamp_ms: u64,
        difficulty: u32,
        nonce: u32,
    ) -> BlockHeader {
        BlockHeader {
            block_num,
            prev_block_hash: prev_block_hash.to_string(),
            merkle_root_hash: merkle_root_hash.to_string(),
            timestamp_ms,
            difficulty,
            nonce,
        }
    }

    /// Serialize the header for hashing.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let prev_bytes = hex_decode(&self.prev_block_hash)?;
        let merkle_bytes = hex_decode(&self.merkle_root_hash)?;
        if prev_bytes.len() != 32 || merkle_bytes.len() != 32 {
            return Err(BlockchainError::Serialization(
                "header hash fields must be 32 bytes".to_string(),
            ));
        }

        let mut data = Vec::with_capacity(HEADER_BYTES);
        data.extend(self.block_num.to_be_bytes());
        data.extend(prev_bytes);
        data.extend(merkle_bytes);
        data.extend(self.timestamp_ms.to_be_bytes());
        data.extend(self.difficulty.to_be_bytes());
        data.extend(self.nonce.to_be_bytes());
        Ok(data)
    }

    /// Header identity: SHA-256 hex of the serialized header.
    pub fn hash(&self) -> Result<String> {
        Ok(sha256_hex(&self.to_bytes()?))
    }
}

/// A block: header plus the ordered transactions committed by its Merkle root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(header: BlockHeader, transactions: Vec<Transaction>) -> Block {
        Block {
            header,
            transactions,
        }
    }

    /// The block's unique id (its header hash).
    pub fn id(&self) -> Result<String> {
        self.header.hash()
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        self.transactions.as_slice()
    }

    /// Validate the block from its own contents only.
    ///
    /// Checks, in order: the Merkle commitment, the proof-of-work target at
    /// the header's own difficulty, and every transaction signature. The
    /// error carries the first failing check.
    pub fn validate(&self) -> Result<()> {
        if !verify_merkle_root(&self.transactions, &self.header.merkle_root_hash)? {
            return Err(BlockchainError::InvalidBlock(
                InvalidBlockReason::MerkleMismatch,
            ));
        }

        if !ProofOfWork::meets_target(&self.header)? {
            return Err(BlockchainError::InvalidBlock(
                InvalidBlockReason::InsufficientWork,
            ));
        }

        for tx in &self.transactions {
            if !tx.verify_signature() {
                return Err(BlockchainError::InvalidBlock(
                    InvalidBlockReason::BadSignature,
                ));
            }
        }

        Ok(())
    }

    /// Convenience wrapper for callers that only need a yes/no answer.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mine_block;
    use crate::error::InvalidBlockReason;
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
    fn test_header_serialization_is_84_bytes() {
        let header = BlockHeader::new(7, GENESIS_PREV_HASH, GENESIS_PREV_HASH, 1234, 5, 42);
        let bytes = header.to_bytes().unwrap();
        assert_eq!(bytes.len(), HEADER_BYTES);

        // Field order and endianness: block_num first, nonce last
        assert_eq!(&bytes[..4], &7u32.to_be_bytes());
        assert_eq!(&bytes[36..44], &1234u64.to_be_bytes());
        assert_eq!(&bytes[76..80], &5u32.to_be_bytes());
        assert_eq!(&bytes[80..], &42u32.to_be_bytes());
    }

    #[test]
    fn test_header_hash_depends_on_nonce() {
        let header = BlockHeader::new(0, GENESIS_PREV_HASH, GENESIS_PREV_HASH, 0, 1, 0);
        let mut bumped = header.clone();
        bumped.nonce = 1;
        assert_ne!(header.hash().unwrap(), bumped.hash().unwrap());
    }

    #[test]
    fn test_header_rejects_short_hash_fields() {
        let header = BlockHeader::new(0, "abcd", GENESIS_PREV_HASH, 0, 1, 0);
        assert!(header.to_bytes().is_err());
    }

    #[test]
    fn test_mined_block_validates() {
        let block = mined(vec![signed("MINT", "Gallery", "ART1")]);
        assert!(block.validate().is_ok());
    }

    #[test]
    fn test_tampered_transaction_breaks_merkle() {
        let mut block = mined(vec![signed("MINT", "Gallery", "ART1")]);
        // Flip the artwork id after mining; the committed root no longer matches
        block.transactions[0] = signed("MINT", "Gallery", "ART2");

        match block.validate() {
            Err(BlockchainError::InvalidBlock(reason)) => {
                assert_eq!(reason, InvalidBlockReason::MerkleMismatch)
            }
            other => panic!("expected merkle mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_unsigned_transaction_fails_validation() {
        let unsigned = Transaction::new("Alice", "Bob", "ART1");
        let block = mined(vec![unsigned]);

        match block.validate() {
            Err(BlockchainError::InvalidBlock(reason)) => {
                assert_eq!(reason, InvalidBlockReason::BadSignature)
            }
            other => panic!("expected bad signature, got {other:?}"),
        }
    }

    #[test]
    fn test_block_record_roundtrip() {
        let block = mined(vec![signed("MINT", "Gallery", "ART1")]);
        let json = serde_json::to_string(&block).unwrap();
        let back: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(block, back);
        assert_eq!(block.id().unwrap(), back.id().unwrap());
    }
}
