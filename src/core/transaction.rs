use crate::utils::{hmac_sha256_sign, hmac_sha256_verify, sha256_hex};
use serde::{Deserialize, Serialize};

/// Sender identifier that marks a minting (artwork creation) transaction
pub const MINT_SENDER: &str = "MINT";

/// An ownership-transfer record for a single artwork.
///
/// A transaction is constructed unsigned, signed once, and then immutable
/// apart from the signature field. The signature is HMAC-SHA256 over the
/// canonical payload keyed by the sender identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transaction {
    sender: String,
    recipient: String,
    artwork_id: String,
    #[serde(default)]
    signature: String,
}

impl Transaction {
    /// Create an unsigned transaction.
    pub fn new(sender: &str, recipient: &str, artwork_id: &str) -> Transaction {
        Transaction {
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            artwork_id: artwork_id.to_string(),
            signature: String::new(),
        }
    }

    /// Create a mint transaction establishing first ownership of an artwork.
    pub fn new_mint(recipient: &str, artwork_id: &str) -> Transaction {
        Self::new(MINT_SENDER, recipient, artwork_id)
    }

    pub fn get_sender(&self) -> &str {
        self.sender.as_str()
    }

    pub fn get_recipient(&self) -> &str {
        self.recipient.as_str()
    }

    pub fn get_artwork_id(&self) -> &str {
        self.artwork_id.as_str()
    }

    pub fn get_signature(&self) -> &str {
        self.signature.as_str()
    }

    pub fn is_mint(&self) -> bool {
        self.sender == MINT_SENDER
    }

    /// Canonical signable payload: `sender|recipient|artwork_id`.
    pub fn signature_message(&self) -> String {
        format!("{}|{}|{}", self.sender, self.recipient, self.artwork_id)
    }

    /// Content hash: SHA-256 hex of the canonical payload (signature excluded).
    pub fn hash(&self) -> String {
        sha256_hex(self.signature_message().as_bytes())
    }

    /// Compute and store the HMAC-SHA256 signature using `key`.
    pub fn sign(&mut self, key: &str) {
        self.signature = hmac_sha256_sign(&self.signature_message(), key);
    }

    /// Verify the stored signature against the sender identifier.
    ///
    /// An unsigned transaction never verifies.
    pub fn verify_signature(&self) -> bool {
        if self.signature.is_empty() {
            return false;
        }
        hmac_sha256_verify(&self.signature_message(), &self.signature, &self.sender)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_message_layout() {
        let tx = Transaction::new("Alice", "Bob", "MonaLisa");
        assert_eq!(tx.signature_message(), "Alice|Bob|MonaLisa");
    }

    #[test]
    fn test_sign_and_verify() {
        let mut tx = Transaction::new("Alice", "Bob", "MonaLisa");
        assert!(!tx.verify_signature());

        tx.sign("Alice");
        assert!(tx.verify_signature());
    }

    #[test]
    fn test_verify_rejects_wrong_key() {
        let mut tx = Transaction::new("Alice", "Bob", "MonaLisa");
        // Signed by someone who is not the claimed sender
        tx.sign("Mallory");
        assert!(!tx.verify_signature());
    }

    #[test]
    fn test_hash_ignores_signature() {
        let mut tx = Transaction::new("Alice", "Bob", "MonaLisa");
        let before = tx.hash();
        tx.sign("Alice");
        assert_eq!(before, tx.hash());
    }

    #[test]
    fn test_mint_sentinel() {
        let tx = Transaction::new_mint("Gallery", "ART1");
        assert!(tx.is_mint());
        assert_eq!(tx.get_sender(), MINT_SENDER);

        let transfer = Transaction::new("Alice", "Bob", "ART1");
        assert!(!transfer.is_mint());
    }

    #[test]
    fn test_record_roundtrip_unsigned() {
        let tx = Transaction::new("Alice", "Bob", "MonaLisa");
        let json = serde_json::to_string(&tx).unwrap();
        // Empty signature is serialized as an empty string, not dropped
        assert!(json.contains("\"signature\":\"\""));

        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(tx, back);
    }

    #[test]
    fn test_record_roundtrip_signed() {
        let mut tx = Transaction::new("Alice", "Bob", "MonaLisa");
        tx.sign("Alice");

        let json = serde_json::to_string(&tx).unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(tx, back);
        assert!(back.verify_signature());
    }
}
