//! Error types for the commitment and mining engine.

use std::path::PathBuf;
use thiserror::Error;

/// A hex string that does not describe a 256-bit digest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DigestError {
    /// Wrong number of hex characters.
    #[error("expected 64 hex characters, got {0}")]
    Length(usize),

    /// Anything outside `[0-9a-f]`, including uppercase hex.
    #[error("invalid character {ch:?} at offset {offset}")]
    Character { ch: char, offset: usize },
}

/// Failure to turn a record into its committed byte form.
#[derive(Debug, Error)]
pub enum CommitError {
    #[error("failed to encode record {index}: {source}")]
    Encoding {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Untrusted proof data that cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProofError {
    #[error("malformed root digest: {0}")]
    MalformedRoot(#[source] DigestError),

    #[error("malformed leaf digest: {0}")]
    MalformedLeaf(#[source] DigestError),

    /// `position` counts from the sibling closest to the leaf.
    #[error("malformed digest at path position {position}: {source}")]
    MalformedDigest {
        position: usize,
        #[source]
        source: DigestError,
    },
}

/// Ways a nonce search ends without producing a block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MiningError {
    /// The cancellation signal was observed; `nonce` is the last value tried.
    #[error("mining cancelled at nonce {nonce} after {attempts} attempts")]
    Cancelled { nonce: u64, attempts: u64 },

    /// Every nonce up to `u64::MAX` was tried.
    #[error("nonce space exhausted after {attempts} attempts")]
    NonceExhausted { attempts: u64 },

    /// `Miner::race` was handed no candidates.
    #[error("no candidate blocks to mine")]
    NoCandidates,
}

/// Invalid or unreadable mining configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
