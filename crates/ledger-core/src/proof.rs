//! Inclusion proofs: generation from a tree and tree-free verification.
//!
//! The primary proof format is untagged: a leaf digest plus sibling digests
//! ordered from the leaf towards the root, with no record of which side each
//! sibling sat on. The verifier therefore tries both concatenation orders at
//! every level, which costs up to `2^path_len` hashes. [`TaggedProof`] keeps
//! the side of every sibling and verifies in a single pass.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ProofError;
use crate::hash::Digest;
use crate::merkle::{CommitmentNode, CommitmentTree};

/// Which side of the running hash a sibling is concatenated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// Untagged inclusion proof: `{leafDigest, path}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InclusionProof {
    pub leaf_digest: Digest,
    /// Sibling digests, closest to the leaf first.
    pub path: Vec<Digest>,
}

impl InclusionProof {
    /// Parse a proof received as hex strings.
    pub fn from_hex<S: AsRef<str>>(leaf_digest: &str, path: &[S]) -> Result<Self, ProofError> {
        let leaf_digest = Digest::from_hex(leaf_digest).map_err(ProofError::MalformedLeaf)?;
        let path = path
            .iter()
            .enumerate()
            .map(|(position, entry)| {
                Digest::from_hex(entry.as_ref())
                    .map_err(|source| ProofError::MalformedDigest { position, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(InclusionProof { leaf_digest, path })
    }

    /// Check this proof against a known root.
    pub fn verify(&self, root: &Digest) -> bool {
        verify(root, &self.leaf_digest, &self.path)
    }
}

/// One sibling together with the side it occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    pub sibling: Digest,
    pub side: Side,
}

/// Inclusion proof that records the side of each sibling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaggedProof {
    pub leaf_digest: Digest,
    pub path: Vec<ProofStep>,
}

impl TaggedProof {
    /// Drop the side tags.
    pub fn untagged(&self) -> InclusionProof {
        InclusionProof {
            leaf_digest: self.leaf_digest,
            path: self.path.iter().map(|step| step.sibling).collect(),
        }
    }

    /// Single-pass verification.
    pub fn verify(&self, root: &Digest) -> bool {
        let computed = self.path.iter().fold(self.leaf_digest, |current, step| match step.side {
            Side::Left => step.sibling.combine(&current),
            Side::Right => current.combine(&step.sibling),
        });
        &computed == root
    }
}

/// Depth-first search for the first leaf whose payload equals `target`.
///
/// Steps are pushed while unwinding, so the sibling nearest the leaf comes
/// first.
fn search(node: &CommitmentNode, target: &[u8], path: &mut Vec<ProofStep>) -> Option<Digest> {
    let Some((left, right)) = node.children() else {
        return (node.payload() == target).then(|| *node.digest());
    };

    if let Some(found) = search(left, target, path) {
        path.push(ProofStep { sibling: *right.digest(), side: Side::Right });
        return Some(found);
    }

    if let Some(found) = search(right, target, path) {
        path.push(ProofStep { sibling: *left.digest(), side: Side::Left });
        return Some(found);
    }

    None
}

impl CommitmentTree {
    /// Tagged proof for the first leaf holding `record`, or `None` if absent.
    ///
    /// This walks the whole tree, so a lookup is O(n) in the number of leaves
    /// even though the proof itself is O(log n). There is no record-to-leaf
    /// index; callers proving many records should build one themselves.
    pub fn tagged_proof(&self, record: impl AsRef<[u8]>) -> Option<TaggedProof> {
        let root = self.root_node()?;
        let mut path = Vec::new();
        let leaf_digest = search(root, record.as_ref(), &mut path);

        debug!(found = leaf_digest.is_some(), path_len = path.len(), "inclusion proof lookup");

        leaf_digest.map(|leaf_digest| TaggedProof { leaf_digest, path })
    }

    /// Untagged proof for the first leaf holding `record`, or `None` if absent.
    ///
    /// A present record in a single-leaf tree yields an empty path; `None` is
    /// the only signal for "not found".
    pub fn proof(&self, record: impl AsRef<[u8]>) -> Option<InclusionProof> {
        self.tagged_proof(record).map(|proof| proof.untagged())
    }
}

/// Recompute a root from `leaf` and an untagged `path` and compare to `root`.
///
/// With an empty path this is `leaf == root`: any proof claiming the root
/// itself as the leaf verifies, which is also the correct answer for a
/// single-leaf tree.
pub fn verify(root: &Digest, leaf: &Digest, path: &[Digest]) -> bool {
    match path.split_first() {
        None => leaf == root,
        Some((sibling, rest)) => {
            verify(root, &sibling.combine(leaf), rest) || verify(root, &leaf.combine(sibling), rest)
        }
    }
}

/// [`verify`] for hex strings from untrusted input.
pub fn verify_hex<S: AsRef<str>>(root: &str, leaf: &str, path: &[S]) -> Result<bool, ProofError> {
    let root = Digest::from_hex(root).map_err(ProofError::MalformedRoot)?;
    let proof = InclusionProof::from_hex(leaf, path)?;
    Ok(proof.verify(&root))
}
