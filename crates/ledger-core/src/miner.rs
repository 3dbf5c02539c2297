//! Proof-of-work nonce search.
//!
//! A search increments the block's nonce until the block hash has
//! `difficulty` leading `'0'` hex characters. There is no internal attempt
//! limit; a [`CancelToken`] polled every `check_interval` attempts is the
//! only way to stop a search that is taking too long.

use core::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::block::Block;
use crate::error::MiningError;
use crate::hash::{hash_commit, Digest};

/// Cooperative cancellation signal shared between a miner and its caller.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every search holding this token to stop.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Re-arm the token for another search.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Result of a successful search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MiningReport {
    /// The satisfying nonce (also written into the block).
    pub nonce: u64,
    /// The block hash at that nonce.
    pub hash: Digest,
    /// Number of hashes computed.
    pub attempts: u64,
    /// Wall-clock time spent searching.
    pub elapsed: Duration,
}

impl MiningReport {
    /// Elapsed time in seconds, as consumed by the difficulty controller.
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

/// The block that won a [`Miner::race`].
#[derive(Debug, Clone)]
pub struct RaceWinner {
    /// Position of the winning candidate in the input.
    pub index: usize,
    pub block: Block,
    pub report: MiningReport,
}

/// Nonce search with cooperative cancellation.
#[derive(Debug, Clone)]
pub struct Miner {
    cancel: CancelToken,
    check_interval: u64,
}

impl Default for Miner {
    fn default() -> Self {
        Miner {
            cancel: CancelToken::new(),
            check_interval: 1,
        }
    }
}

impl Miner {
    /// Create a miner polling its own cancel token on every attempt.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an externally owned cancel token.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Poll for cancellation every `interval` attempts (minimum 1).
    pub fn with_check_interval(mut self, interval: u64) -> Self {
        self.check_interval = interval.max(1);
        self
    }

    /// A handle that cancels this miner's searches.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Mine `block` in place.
    ///
    /// On success the block's nonce satisfies `difficulty`. On cancellation the
    /// nonce is left at the last value tried.
    pub fn mine(&self, block: &mut Block, difficulty: u32) -> Result<MiningReport, MiningError> {
        let result = search(block, difficulty, self.check_interval, &|| self.cancel.is_cancelled());
        log_outcome(block, &result);
        result
    }

    /// Mine several candidate blocks in parallel; the first success stops the
    /// rest.
    ///
    /// When several candidates finish in the same instant the lowest index
    /// wins. Cancelling this miner's token cancels the whole race.
    pub fn race(&self, candidates: Vec<Block>, difficulty: u32) -> Result<RaceWinner, MiningError> {
        if candidates.is_empty() {
            return Err(MiningError::NoCandidates);
        }

        let won = AtomicBool::new(false);
        let stop = || won.load(Ordering::Relaxed) || self.cancel.is_cancelled();

        let results: Vec<Result<RaceWinner, MiningError>> = candidates
            .into_par_iter()
            .enumerate()
            .map(|(index, mut block)| -> Result<RaceWinner, MiningError> {
                let report = search(&mut block, difficulty, self.check_interval, &stop)?;
                won.store(true, Ordering::Relaxed);
                Ok(RaceWinner { index, block, report })
            })
            .collect();

        let mut first_err = None;
        for result in results {
            match result {
                Ok(winner) => {
                    info!(
                        index = winner.index,
                        nonce = winner.report.nonce,
                        hash = %winner.report.hash,
                        "race won"
                    );
                    return Ok(winner);
                }
                Err(err) => {
                    first_err.get_or_insert(err);
                }
            }
        }
        Err(first_err.unwrap_or(MiningError::NoCandidates))
    }
}

/// Mine `block` with no cancellation point.
pub fn mine_block(block: &mut Block, difficulty: u32) -> Result<MiningReport, MiningError> {
    Miner::new().mine(block, difficulty)
}

fn search(
    block: &mut Block,
    difficulty: u32,
    check_interval: u64,
    stop: &(dyn Fn() -> bool + Sync),
) -> Result<MiningReport, MiningError> {
    let start = Instant::now();

    // Pre-build everything but the nonce
    let prefix = block.preimage_prefix();
    let mut preimage = String::with_capacity(prefix.len() + 20);
    preimage.push_str(&prefix);

    let mut attempts = 0u64;
    loop {
        preimage.truncate(prefix.len());
        // Writing into a String cannot fail.
        let _ = write!(preimage, "{}", block.nonce);

        let hash = hash_commit(&preimage);
        attempts += 1;

        if hash.meets_difficulty(difficulty) {
            return Ok(MiningReport {
                nonce: block.nonce,
                hash,
                attempts,
                elapsed: start.elapsed(),
            });
        }

        if attempts % check_interval == 0 && stop() {
            return Err(MiningError::Cancelled { nonce: block.nonce, attempts });
        }

        block.nonce = block
            .nonce
            .checked_add(1)
            .ok_or(MiningError::NonceExhausted { attempts })?;
    }
}

fn log_outcome(block: &Block, result: &Result<MiningReport, MiningError>) {
    match result {
        Ok(report) => info!(
            index = block.index,
            nonce = report.nonce,
            hash = %report.hash,
            attempts = report.attempts,
            elapsed_secs = report.elapsed_secs(),
            "block mined"
        ),
        Err(err) => warn!(index = block.index, error = %err, "mining stopped"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_difficulty_zero_returns_immediately() {
        let mut block = Block::new(1, "0", "data", 100);
        let report = mine_block(&mut block, 0).unwrap();
        assert_eq!(block.nonce, 0);
        assert_eq!(report.nonce, 0);
        assert_eq!(report.attempts, 1);
        assert_eq!(report.hash, block.hash());
    }

    #[test]
    fn test_mined_hash_meets_difficulty() {
        let mut block = Block::new(1, "0", "Transaction data 1", 1_700_000_000);
        let report = mine_block(&mut block, 2).unwrap();

        assert_eq!(block.nonce, report.nonce);
        assert_eq!(block.hash(), report.hash);
        assert!(report.hash.to_hex().starts_with("00"));
        assert_eq!(report.attempts, report.nonce + 1);

        // Every nonce before the winner failed.
        let mut probe = block.clone();
        for nonce in 0..report.nonce {
            probe.nonce = nonce;
            assert!(!probe.hash().meets_difficulty(2));
        }
    }

    #[test]
    fn test_pre_cancelled_search_keeps_nonce() {
        let miner = Miner::new();
        miner.cancel_token().cancel();

        let mut block = Block::new(1, "0", "data", 0);
        let err = miner.mine(&mut block, 64).unwrap_err();
        assert_eq!(err, MiningError::Cancelled { nonce: 0, attempts: 1 });
        assert_eq!(block.nonce, 0);
    }

    #[test]
    fn test_cancel_from_another_thread() {
        let token = CancelToken::new();
        let miner = Miner::new().with_cancel_token(token.clone()).with_check_interval(64);

        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            token.cancel();
        });

        let mut block = Block::new(1, "0", "unreachable", 0);
        let err = miner.mine(&mut block, 64).unwrap_err();
        canceller.join().unwrap();

        match err {
            MiningError::Cancelled { nonce, attempts } => {
                assert_eq!(nonce, block.nonce);
                assert_eq!(attempts, nonce + 1);
                assert_eq!(attempts % 64, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_nonce_exhaustion() {
        let mut block = Block::new(1, "0", "data", 0);
        block.nonce = u64::MAX;
        let err = mine_block(&mut block, 64).unwrap_err();
        assert_eq!(err, MiningError::NonceExhausted { attempts: 1 });
        assert_eq!(block.nonce, u64::MAX);
    }

    #[test]
    fn test_race_returns_a_valid_winner() {
        let candidates: Vec<Block> = (0..4)
            .map(|i| Block::new(5, "prev", format!("alternative {}", i), 42))
            .collect();

        let winner = Miner::new().race(candidates.clone(), 2).unwrap();
        assert!(winner.index < 4);
        assert_eq!(winner.block.payload, candidates[winner.index].payload);
        assert_eq!(winner.block.hash(), winner.report.hash);
        assert!(winner.report.hash.meets_difficulty(2));
    }

    #[test]
    fn test_race_without_candidates() {
        let err = Miner::new().race(Vec::new(), 1).unwrap_err();
        assert_eq!(err, MiningError::NoCandidates);
    }

    #[test]
    fn test_race_honours_cancel_token() {
        let miner = Miner::new();
        miner.cancel_token().cancel();
        let candidates = vec![Block::new(1, "0", "a", 0), Block::new(1, "0", "b", 0)];
        let err = miner.race(candidates, 64).unwrap_err();
        assert!(matches!(err, MiningError::Cancelled { .. }));
    }

    #[test]
    fn test_token_reset() {
        let token = CancelToken::new();
        token.cancel();
        assert!(token.is_cancelled());
        token.reset();
        assert!(!token.is_cancelled());
    }
}
