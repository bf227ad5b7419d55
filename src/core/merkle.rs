use crate::core::Transaction;
use crate::error::Result;
use crate::utils::{hex_decode, sha256_digest, sha256_hex};
use data_encoding::HEXLOWER;

/// Compute the Merkle root over an ordered transaction sequence.
///
/// Leaves are the transactions' content hashes as raw bytes. Levels with an
/// odd count duplicate their last element before pairing; each parent is the
/// SHA-256 of the concatenated pair. The tie-break must be reproduced exactly
/// for cross-implementation compatibility.
///
/// An empty sequence yields the hash of the empty byte string.
pub fn calculate_merkle_root(transactions: &[Transaction]) -> Result<String> {
    if transactions.is_empty() {
        return Ok(sha256_hex(b""));
    }

    let mut current: Vec<Vec<u8>> = Vec::with_capacity(transactions.len());
    for tx in transactions {
        current.push(hex_decode(&tx.hash())?);
    }

    // A single leaf pairs with itself, so every non-empty input goes through
    // at least one reduction round
    loop {
        if current.len() % 2 == 1 {
            let last = current
                .last()
                .expect("level is non-empty inside the reduction loop")
                .clone();
            current.push(last);
        }

        let mut next_level = Vec::with_capacity(current.len() / 2);
        for pair in current.chunks_exact(2) {
            let mut combined = Vec::with_capacity(pair[0].len() + pair[1].len());
            combined.extend_from_slice(&pair[0]);
            combined.extend_from_slice(&pair[1]);
            next_level.push(sha256_digest(&combined));
        }

        if next_level.len() == 1 {
            return Ok(HEXLOWER.encode(&next_level[0]));
        }
        current = next_level;
    }
}

/// Verify that a transaction sequence produces the expected root.
pub fn verify_merkle_root(transactions: &[Transaction], expected_root: &str) -> Result<bool> {
    Ok(calculate_merkle_root(transactions)? == expected_root)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed(sender: &str, recipient: &str, artwork_id: &str) -> Transaction {
        let mut tx = Transaction::new(sender, recipient, artwork_id);
        tx.sign(sender);
        tx
    }

    fn hash_pair(left: &[u8], right: &[u8]) -> Vec<u8> {
        let mut combined = left.to_vec();
        combined.extend_from_slice(right);
        sha256_digest(&combined)
    }

    #[test]
    fn test_empty_sequence_sentinel_root() {
        let root = calculate_merkle_root(&[]).unwrap();
        assert_eq!(root, sha256_hex(b""));
    }

    #[test]
    fn test_single_leaf_duplicates_itself() {
        let tx = signed("S1", "R1", "ART2");
        let leaf = hex_decode(&tx.hash()).unwrap();

        let root = calculate_merkle_root(&[tx]).unwrap();
        assert_eq!(root, HEXLOWER.encode(&hash_pair(&leaf, &leaf)));
    }

    #[test]
    fn test_two_leaves() {
        let tx1 = signed("S1", "R1", "ART2");
        let tx2 = signed("S2", "R2", "ART3");
        let leaf1 = hex_decode(&tx1.hash()).unwrap();
        let leaf2 = hex_decode(&tx2.hash()).unwrap();

        let root = calculate_merkle_root(&[tx1, tx2]).unwrap();
        assert_eq!(root, HEXLOWER.encode(&hash_pair(&leaf1, &leaf2)));
    }

    #[test]
    fn test_odd_count_duplicates_last() {
        let tx1 = signed("S1", "R1", "A");
        let tx2 = signed("S2", "R2", "B");
        let tx3 = signed("S3", "R3", "C");

        let leaf1 = hex_decode(&tx1.hash()).unwrap();
        let leaf2 = hex_decode(&tx2.hash()).unwrap();
        let leaf3 = hex_decode(&tx3.hash()).unwrap();

        let left = hash_pair(&leaf1, &leaf2);
        let right = hash_pair(&leaf3, &leaf3);
        let expected = hash_pair(&left, &right);

        let root = calculate_merkle_root(&[tx1, tx2, tx3]).unwrap();
        assert_eq!(root, HEXLOWER.encode(&expected));
    }

    #[test]
    fn test_deterministic() {
        let txs = vec![signed("S1", "R1", "A"), signed("S2", "R2", "B")];
        assert_eq!(
            calculate_merkle_root(&txs).unwrap(),
            calculate_merkle_root(&txs).unwrap()
        );
    }

    #[test]
    fn test_order_matters() {
        let tx1 = signed("S1", "R1", "A");
        let tx2 = signed("S2", "R2", "B");
        let forward = calculate_merkle_root(&[tx1.clone(), tx2.clone()]).unwrap();
        let reversed = calculate_merkle_root(&[tx2, tx1]).unwrap();
        assert_ne!(forward, reversed);
    }
}
