//! Block skeletons searched over by the miner.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::hash::{hash_commit, Digest};

/// A block in the mining context.
///
/// Created with `nonce = 0`. The miner is the only writer of `nonce`; once a
/// satisfying nonce is found the block is treated as immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Position in the chain.
    pub index: u64,
    /// Hex hash of the previous block (`"0"` for genesis).
    pub previous_hash: String,
    /// Opaque transaction data.
    pub payload: String,
    /// Unix time in seconds.
    pub timestamp: u64,
    /// Proof-of-work counter.
    pub nonce: u64,
}

impl Block {
    /// Create a new block with a zero nonce.
    pub fn new(
        index: u64,
        previous_hash: impl Into<String>,
        payload: impl Into<String>,
        timestamp: u64,
    ) -> Self {
        Block {
            index,
            previous_hash: previous_hash.into(),
            payload: payload.into(),
            timestamp,
            nonce: 0,
        }
    }

    /// Create a new block stamped with the current time.
    pub fn now(index: u64, previous_hash: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::new(index, previous_hash, payload, current_timestamp())
    }

    /// Everything except the nonce, in hashing order.
    ///
    /// The miner appends the decimal nonce to this prefix for each attempt.
    pub fn preimage_prefix(&self) -> String {
        format!(
            "{}{}{}{}",
            self.index, self.previous_hash, self.payload, self.timestamp
        )
    }

    /// `index ++ previous_hash ++ payload ++ timestamp ++ nonce`.
    pub fn preimage(&self) -> String {
        format!("{}{}", self.preimage_prefix(), self.nonce)
    }

    /// Compute the block hash.
    pub fn hash(&self) -> Digest {
        hash_commit(self.preimage())
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Block ID: {}", self.index)?;
        writeln!(f, "Previous Hash: {}", self.previous_hash)?;
        writeln!(f, "Transactions: {}", self.payload)?;
        writeln!(f, "Timestamp: {}", self.timestamp)?;
        write!(f, "Nonce: {}", self.nonce)
    }
}

/// Get the current Unix timestamp.
pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preimage_concatenates_fields() {
        let mut block = Block::new(7, "abc", "payload", 1_700_000_000);
        block.nonce = 42;
        assert_eq!(block.preimage(), "7abcpayload170000000042");
        assert_eq!(block.hash(), hash_commit("7abcpayload170000000042"));
    }

    #[test]
    fn test_nonce_changes_hash() {
        let mut block = Block::new(1, "0", "data", 0);
        let before = block.hash();
        block.nonce += 1;
        assert_ne!(block.hash(), before);
    }

    #[test]
    fn test_new_block_starts_at_zero_nonce() {
        let block = Block::now(3, "prev", "data");
        assert_eq!(block.nonce, 0);
        assert!(block.timestamp > 0);
    }

    #[test]
    fn test_display() {
        let block = Block::new(1, "0", "Genesis", 5);
        let text = block.to_string();
        assert!(text.starts_with("Block ID: 1\n"));
        assert!(text.ends_with("Nonce: 0"));
    }
}
