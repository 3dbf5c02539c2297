//! Commitment and proof-of-work primitives for ledger-style data.
//!
//! This crate provides:
//! - SHA256 commitments with a strict lowercase-hex digest type
//! - A Merkle commitment tree split by record position
//! - Inclusion proof generation and tree-free verification
//! - Nonce search with cooperative cancellation and parallel races
//! - Feedback-controlled difficulty adjustment
//! - A thin append-only ledger tying the miner and controller together

pub mod block;
pub mod chain;
pub mod config;
pub mod difficulty;
pub mod error;
pub mod hash;
pub mod merkle;
pub mod miner;
pub mod proof;
pub mod transaction;

pub use block::Block;
pub use chain::Ledger;
pub use config::MiningConfig;
pub use difficulty::{Adjustment, DifficultyController, DifficultyState, SharedDifficulty};
pub use error::{CommitError, ConfigError, DigestError, MiningError, ProofError};
pub use hash::{hash_commit, Digest};
pub use merkle::{CommitmentNode, CommitmentTree};
pub use miner::{mine_block, CancelToken, Miner, MiningReport, RaceWinner};
pub use proof::{verify, verify_hex, InclusionProof, ProofStep, Side, TaggedProof};
pub use transaction::Transaction;
