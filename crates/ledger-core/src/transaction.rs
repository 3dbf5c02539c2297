//! Minimal transaction record committed by blocks and trees.

use serde::{Deserialize, Serialize};

use crate::hash::{hash_commit, Digest};

/// A transfer description with a content-derived identifier.
///
/// Balances and signatures are carried, not checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub inputs: String,
    pub outputs: String,
    pub signature: String,
    pub id: Digest,
}

impl Transaction {
    pub fn new(
        inputs: impl Into<String>,
        outputs: impl Into<String>,
        signature: impl Into<String>,
    ) -> Self {
        let inputs = inputs.into();
        let outputs = outputs.into();
        let id = Self::compute_id(&inputs, &outputs);
        Transaction {
            inputs,
            outputs,
            signature: signature.into(),
            id,
        }
    }

    /// `Hash(inputs ++ outputs)`; the signature is not covered.
    pub fn compute_id(inputs: &str, outputs: &str) -> Digest {
        hash_commit(format!("{}{}", inputs, outputs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merkle::CommitmentTree;

    #[test]
    fn test_id_ignores_signature() {
        let a = Transaction::new("alice", "bob", "sig-1");
        let b = Transaction::new("alice", "bob", "sig-2");
        assert_eq!(a.id, b.id);
        assert_eq!(a.id, hash_commit("alicebob"));
    }

    #[test]
    fn test_transactions_commit_and_prove() {
        let txs: Vec<Transaction> = (0..5)
            .map(|i| Transaction::new(format!("in{}", i), format!("out{}", i), ""))
            .collect();
        let tree = CommitmentTree::from_serialized(&txs).unwrap();
        let root = tree.root().unwrap();

        let record = serde_json::to_vec(&txs[3]).unwrap();
        let proof = tree.proof(&record).unwrap();
        assert!(proof.verify(root));
    }
}
