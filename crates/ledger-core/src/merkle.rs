//! Commitment tree over an ordered sequence of records.
//!
//! The tree is split by position, never by content: a run of `n >= 2`
//! records puts `n / 2` on the left and the remainder on the right, down to
//! single-record leaves. No padding or duplication happens for odd counts, so
//! the shape is a function of `n` alone and the root is reproducible from the
//! ordered records.

use core::fmt;

use serde::Serialize;
use tracing::debug;

use crate::error::CommitError;
use crate::hash::{concat_hex, hash_commit, Digest};

/// One node of a commitment tree.
///
/// Leaves carry the record bytes as payload; internal nodes carry the hex
/// concatenation of their children's digests. In both cases
/// `digest == Hash(payload)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitmentNode {
    digest: Digest,
    payload: Vec<u8>,
    children: Option<Box<(CommitmentNode, CommitmentNode)>>,
}

impl CommitmentNode {
    fn leaf(record: &[u8]) -> Self {
        CommitmentNode {
            digest: hash_commit(record),
            payload: record.to_vec(),
            children: None,
        }
    }

    fn internal(left: CommitmentNode, right: CommitmentNode) -> Self {
        let payload = concat_hex(&left.digest, &right.digest).into_bytes();
        CommitmentNode {
            digest: hash_commit(&payload),
            payload,
            children: Some(Box::new((left, right))),
        }
    }

    /// The node's commitment.
    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    /// The bytes that were hashed to produce [`digest`](Self::digest).
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    pub fn left(&self) -> Option<&CommitmentNode> {
        self.children.as_deref().map(|(left, _)| left)
    }

    pub fn right(&self) -> Option<&CommitmentNode> {
        self.children.as_deref().map(|(_, right)| right)
    }

    /// Both children of an internal node.
    pub(crate) fn children(&self) -> Option<(&CommitmentNode, &CommitmentNode)> {
        self.children.as_deref().map(|(left, right)| (left, right))
    }

    /// Number of leaves below (and including) this node.
    pub fn leaf_count(&self) -> usize {
        match self.children() {
            None => 1,
            Some((left, right)) => left.leaf_count() + right.leaf_count(),
        }
    }

    /// Longest leaf distance in edges; a leaf has depth 0.
    pub fn depth(&self) -> usize {
        match self.children() {
            None => 0,
            Some((left, right)) => 1 + left.depth().max(right.depth()),
        }
    }
}

/// Build the subtree for a non-empty run of records.
fn build_node<R: AsRef<[u8]>>(records: &[R]) -> CommitmentNode {
    if records.len() == 1 {
        return CommitmentNode::leaf(records[0].as_ref());
    }

    let mid = records.len() / 2;
    let left = build_node(&records[..mid]);
    let right = build_node(&records[mid..]);
    CommitmentNode::internal(left, right)
}

/// A Merkle tree committing to an ordered sequence of records.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommitmentTree {
    root: Option<CommitmentNode>,
}

impl CommitmentTree {
    /// Build a tree over `records` in order.
    ///
    /// Zero records produce an empty tree with no root.
    pub fn build<R: AsRef<[u8]>>(records: &[R]) -> Self {
        let root = (!records.is_empty()).then(|| build_node(records));

        debug!(
            records = records.len(),
            root = %root.as_ref().map(|n| n.digest.to_hex()).unwrap_or_default(),
            "built commitment tree"
        );

        CommitmentTree { root }
    }

    /// Build a tree over the JSON encoding of each item.
    pub fn from_serialized<T: Serialize>(items: &[T]) -> Result<Self, CommitError> {
        let records = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::to_vec(item).map_err(|source| CommitError::Encoding { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::build(&records))
    }

    /// The root commitment, or `None` for an empty tree.
    pub fn root(&self) -> Option<&Digest> {
        self.root.as_ref().map(|node| &node.digest)
    }

    pub fn root_node(&self) -> Option<&CommitmentNode> {
        self.root.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn leaf_count(&self) -> usize {
        self.root.as_ref().map_or(0, CommitmentNode::leaf_count)
    }

    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, CommitmentNode::depth)
    }
}

/// Sideways drawing: right subtrees above their parent, left subtrees below.
fn render_node(
    f: &mut fmt::Formatter<'_>,
    node: &CommitmentNode,
    prefix: &str,
    is_left: bool,
) -> fmt::Result {
    if let Some(right) = node.right() {
        let child_prefix = format!("{}{}", prefix, if is_left { "│   " } else { "    " });
        render_node(f, right, &child_prefix, false)?;
    }

    writeln!(
        f,
        "{}{}{}",
        prefix,
        if is_left { "└── " } else { "┌── " },
        node.digest
    )?;

    if let Some(left) = node.left() {
        let child_prefix = format!("{}{}", prefix, if is_left { "    " } else { "│   " });
        render_node(f, left, &child_prefix, true)?;
    }
    Ok(())
}

impl fmt::Display for CommitmentTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.root {
            Some(root) => render_node(f, root, "", true),
            None => writeln!(f, "(empty)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("transaction{}", i)).collect()
    }

    fn assert_floor_split(node: &CommitmentNode, n: usize) {
        assert_eq!(node.leaf_count(), n);
        match node.children() {
            None => assert_eq!(n, 1),
            Some((left, right)) => {
                assert_floor_split(left, n / 2);
                assert_floor_split(right, n - n / 2);
            }
        }
    }

    fn assert_payload_invariant(node: &CommitmentNode) {
        assert_eq!(node.digest(), &hash_commit(node.payload()));
        if let Some((left, right)) = node.children() {
            assert_eq!(node.payload(), concat_hex(left.digest(), right.digest()).as_bytes());
            assert_payload_invariant(left);
            assert_payload_invariant(right);
        }
    }

    #[test]
    fn test_empty_tree_has_no_root() {
        let tree = CommitmentTree::build::<&str>(&[]);
        assert!(tree.is_empty());
        assert_eq!(tree.root(), None);
        assert_eq!(tree.leaf_count(), 0);
    }

    #[test]
    fn test_single_record_is_leaf() {
        let tree = CommitmentTree::build(&["only"]);
        let root = tree.root_node().unwrap();
        assert!(root.is_leaf());
        assert_eq!(root.payload(), b"only");
        assert_eq!(tree.root(), Some(&hash_commit("only")));
    }

    #[test]
    fn test_three_record_root() {
        let tree = CommitmentTree::build(&["t1", "t2", "t3"]);

        let h1 = hash_commit("t1");
        let h23 = hash_commit("t2").combine(&hash_commit("t3"));
        let expected = h1.combine(&h23);

        assert_eq!(tree.root(), Some(&expected));
        assert!(tree.root_node().unwrap().left().unwrap().is_leaf());
        assert_eq!(tree.root_node().unwrap().right().unwrap().leaf_count(), 2);
    }

    #[test]
    fn test_floor_split_shapes() {
        let expected_sides = [(2, 1, 1), (3, 1, 2), (5, 2, 3), (19, 9, 10), (20, 10, 10)];

        assert!(CommitmentTree::build(&records(1)).root_node().unwrap().is_leaf());

        for (n, left, right) in expected_sides {
            let tree = CommitmentTree::build(&records(n));
            let root = tree.root_node().unwrap();
            assert_eq!(root.left().unwrap().leaf_count(), left, "left side for n={}", n);
            assert_eq!(root.right().unwrap().leaf_count(), right, "right side for n={}", n);
            assert_floor_split(root, n);
        }
    }

    #[test]
    fn test_depth_follows_split() {
        assert_eq!(CommitmentTree::build(&records(1)).depth(), 0);
        assert_eq!(CommitmentTree::build(&records(3)).depth(), 2);
        assert_eq!(CommitmentTree::build(&records(16)).depth(), 4);
        assert_eq!(CommitmentTree::build(&records(19)).depth(), 5);
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let input = records(37);
        let a = CommitmentTree::build(&input);
        let b = CommitmentTree::build(&input.clone());
        assert_eq!(a.root(), b.root());
        assert_eq!(a, b);
    }

    #[test]
    fn test_order_changes_root() {
        let a = CommitmentTree::build(&["x", "y"]);
        let b = CommitmentTree::build(&["y", "x"]);
        assert_ne!(a.root(), b.root());
    }

    #[test]
    fn test_payload_invariant_holds_everywhere() {
        let tree = CommitmentTree::build(&records(11));
        assert_payload_invariant(tree.root_node().unwrap());
    }

    #[test]
    fn test_from_serialized_commits_json() {
        #[derive(Serialize)]
        struct Entry {
            amount: u64,
        }

        let tree = CommitmentTree::from_serialized(&[Entry { amount: 1 }, Entry { amount: 2 }]).unwrap();
        let expected = CommitmentTree::build(&[r#"{"amount":1}"#, r#"{"amount":2}"#]);
        assert_eq!(tree.root(), expected.root());
    }

    #[test]
    fn test_from_serialized_reports_encoding_error() {
        use std::collections::HashMap;

        // JSON object keys must be strings.
        let mut bad = HashMap::new();
        bad.insert(vec![1u8], 1u8);

        let err = CommitmentTree::from_serialized(&[HashMap::new(), bad]).unwrap_err();
        assert!(matches!(err, CommitError::Encoding { index: 1, .. }));
    }

    #[test]
    fn test_display_draws_right_above_left() {
        let tree = CommitmentTree::build(&["a", "b"]);
        let root = tree.root().unwrap();
        let expected = format!(
            "│   ┌── {}\n└── {}\n    └── {}\n",
            hash_commit("b"),
            root,
            hash_commit("a"),
        );
        assert_eq!(tree.to_string(), expected);
        assert_eq!(CommitmentTree::default().to_string(), "(empty)\n");
    }
}
