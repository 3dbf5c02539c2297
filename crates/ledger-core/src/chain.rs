//! Append-only ledger that mines every block it accepts.

use tracing::info;

use crate::block::{current_timestamp, Block};
use crate::config::MiningConfig;
use crate::difficulty::{Adjustment, DifficultyController};
use crate::error::MiningError;
use crate::miner::{CancelToken, Miner, MiningReport};

/// Payload of the first block.
pub const GENESIS_PAYLOAD: &str = "Genesis";

/// `previous_hash` of the first block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// An ordered chain of mined blocks with its difficulty controller.
#[derive(Debug)]
pub struct Ledger {
    blocks: Vec<Block>,
    miner: Miner,
    controller: DifficultyController,
}

impl Ledger {
    /// Create a ledger and mine its genesis block.
    pub fn new(config: &MiningConfig) -> Result<Self, MiningError> {
        let miner = Miner::new().with_check_interval(config.cancel_check_interval);
        Self::with_miner(config, miner)
    }

    /// Like [`new`](Self::new), mining through a caller-supplied miner.
    pub fn with_miner(config: &MiningConfig, miner: Miner) -> Result<Self, MiningError> {
        let mut ledger = Ledger {
            blocks: Vec::new(),
            miner,
            controller: DifficultyController::new(config),
        };
        let genesis = Block::new(0, GENESIS_PREVIOUS_HASH, GENESIS_PAYLOAD, current_timestamp());
        ledger.append_block(genesis)?;
        Ok(ledger)
    }

    /// Mine and append a block carrying `payload`.
    pub fn append(&mut self, payload: impl Into<String>) -> Result<MiningReport, MiningError> {
        let block = Block::new(self.blocks.len() as u64, "", payload, current_timestamp());
        self.append_block(block)
    }

    /// Link `block` to the current tip, mine it at the current difficulty and
    /// append it.
    ///
    /// A failed search leaves the chain untouched.
    pub fn append_block(&mut self, mut block: Block) -> Result<MiningReport, MiningError> {
        if let Some(tip) = self.blocks.last() {
            block.previous_hash = tip.hash().to_hex();
        }

        let report = self.miner.mine(&mut block, self.controller.difficulty())?;
        self.blocks.push(block);

        if let Some(Adjustment { previous, current, .. }) = self.controller.record_block(report.elapsed) {
            info!(height = self.blocks.len(), previous, current, "ledger difficulty window closed");
        }
        Ok(report)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn tip(&self) -> Option<&Block> {
        self.blocks.last()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Difficulty the next block will be mined at.
    pub fn difficulty(&self) -> u32 {
        self.controller.difficulty()
    }

    pub fn controller(&self) -> &DifficultyController {
        &self.controller
    }

    /// A handle that cancels the search for the block being appended.
    pub fn cancel_token(&self) -> CancelToken {
        self.miner.cancel_token()
    }

    /// True when every block names its predecessor's hash.
    pub fn is_linked(&self) -> bool {
        self.blocks
            .windows(2)
            .all(|pair| pair[1].previous_hash == pair[0].hash().to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_config() -> MiningConfig {
        MiningConfig {
            difficulty: 1,
            target_interval_seconds: 1000.0,
            adjustment_window_blocks: 2,
            buffer_seconds: 0.0,
            ..MiningConfig::default()
        }
    }

    #[test]
    fn test_starts_with_mined_genesis() {
        let ledger = Ledger::new(&quick_config()).unwrap();
        let genesis = ledger.tip().unwrap();

        assert_eq!(ledger.len(), 1);
        assert_eq!(genesis.index, 0);
        assert_eq!(genesis.previous_hash, GENESIS_PREVIOUS_HASH);
        assert_eq!(genesis.payload, GENESIS_PAYLOAD);
        assert!(genesis.hash().meets_difficulty(1));
    }

    #[test]
    fn test_append_links_and_orders_blocks() {
        let mut ledger = Ledger::new(&quick_config()).unwrap();
        for i in 1..=4 {
            let report = ledger.append(format!("Transaction data {}", i)).unwrap();
            assert_eq!(ledger.tip().unwrap().hash(), report.hash);
        }

        assert_eq!(ledger.len(), 5);
        assert!(ledger.is_linked());
        for (i, block) in ledger.blocks().iter().enumerate() {
            assert_eq!(block.index, i as u64);
        }
    }

    #[test]
    fn test_fast_blocks_raise_ledger_difficulty() {
        let mut ledger = Ledger::new(&quick_config()).unwrap();
        assert_eq!(ledger.difficulty(), 1);

        // Genesis plus one block closes the first window.
        ledger.append("one").unwrap();
        assert_eq!(ledger.difficulty(), 2);

        let report = ledger.append("two").unwrap();
        assert!(report.hash.meets_difficulty(2));
    }

    #[test]
    fn test_cancelled_genesis() {
        let config = MiningConfig {
            difficulty: 64,
            ..quick_config()
        };
        let miner = Miner::new();
        miner.cancel_token().cancel();

        let err = Ledger::with_miner(&config, miner).unwrap_err();
        assert!(matches!(err, MiningError::Cancelled { nonce: 0, .. }));
    }
}
