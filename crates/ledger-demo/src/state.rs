//! Mining statistics for the demo run.

use ledger_core::{Digest, MiningReport};
use serde::{Deserialize, Serialize};

/// Mining statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MiningStats {
    /// Blocks appended, genesis excluded.
    pub blocks_mined: u64,
    /// Total hashes computed.
    pub total_hashes: u64,
    /// Current hash rate (hashes per second).
    pub hash_rate: f64,
    /// Time spent inside nonce searches, in seconds.
    pub elapsed_secs: f64,
    /// Difficulty the next block will be mined at.
    pub difficulty: u32,
    /// Number of difficulty changes observed.
    pub adjustments: u32,
    /// Best hash found (most leading zeros).
    pub best_hash: Option<String>,
    /// Number of leading zero hex characters in best hash.
    pub best_leading_zeros: u32,
}

impl MiningStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one successful search into the totals.
    pub fn record(&mut self, report: &MiningReport) {
        self.blocks_mined += 1;
        self.total_hashes += report.attempts;
        self.elapsed_secs += report.elapsed_secs();
        self.update_best(&report.hash);
        self.update_hash_rate();
    }

    fn update_best(&mut self, hash: &Digest) {
        let zeros = hash.leading_zero_nibbles();
        if self.best_hash.is_none() || zeros > self.best_leading_zeros {
            self.best_hash = Some(hash.to_hex());
            self.best_leading_zeros = zeros;
        }
    }

    /// Update hash rate based on elapsed time.
    pub fn update_hash_rate(&mut self) {
        if self.elapsed_secs > 0.0 {
            self.hash_rate = self.total_hashes as f64 / self.elapsed_secs;
        }
    }

    /// Format hash rate for display.
    pub fn format_hash_rate(&self) -> String {
        if self.hash_rate >= 1_000_000_000.0 {
            format!("{:.2} GH/s", self.hash_rate / 1_000_000_000.0)
        } else if self.hash_rate >= 1_000_000.0 {
            format!("{:.2} MH/s", self.hash_rate / 1_000_000.0)
        } else if self.hash_rate >= 1_000.0 {
            format!("{:.2} KH/s", self.hash_rate / 1_000.0)
        } else {
            format!("{:.2} H/s", self.hash_rate)
        }
    }

    /// Pretty JSON for the console.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
