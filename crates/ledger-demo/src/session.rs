//! Drives the ledger for the console walkthrough.

use ledger_core::{CommitmentTree, Ledger, MiningConfig, MiningError};
use tracing::info;

use crate::state::MiningStats;

/// A ledger plus the statistics of everything mined on it.
pub struct MiningSession {
    ledger: Ledger,
    stats: MiningStats,
}

impl MiningSession {
    /// Create the ledger (mining genesis) for `config`.
    pub fn new(config: &MiningConfig) -> Result<Self, MiningError> {
        let ledger = Ledger::new(config)?;
        let stats = MiningStats {
            difficulty: ledger.difficulty(),
            ..MiningStats::new()
        };
        Ok(MiningSession { ledger, stats })
    }

    /// Mine `count` blocks, each committing its own batch of transactions.
    pub fn run(&mut self, count: u64) -> Result<(), MiningError> {
        for i in 1..=count {
            let records: Vec<String> = (1..=4).map(|t| format!("block{}-tx{}", i, t)).collect();
            let tree = CommitmentTree::build(&records);
            let payload = match tree.root() {
                Some(root) => format!("Transaction data {} (root {})", i, root),
                None => format!("Transaction data {}", i),
            };

            let before = self.ledger.difficulty();
            let report = self.ledger.append(payload)?;
            self.stats.record(&report);

            let after = self.ledger.difficulty();
            if after != before {
                self.stats.adjustments += 1;
            }
            self.stats.difficulty = after;

            if let Some(block) = self.ledger.tip() {
                info!(block = i, difficulty = before, "block added to the chain");
                println!("\n{}", block);
            }
        }
        Ok(())
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn stats(&self) -> &MiningStats {
        &self.stats
    }
}
