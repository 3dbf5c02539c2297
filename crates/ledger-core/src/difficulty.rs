//! Feedback control of mining difficulty.
//!
//! Every `adjustment_window_blocks` recorded blocks the controller compares
//! the average mining time with the target interval. Faster than
//! `target - buffer` raises difficulty by one; slower than `target + buffer`
//! lowers it by one, never below 1. Inside the buffer nothing changes. The
//! accumulators reset after every recalibration either way.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::info;

use crate::config::MiningConfig;

/// Snapshot of the controller's mutable state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyState {
    pub current_difficulty: u32,
    pub target_interval_seconds: f64,
    pub blocks_since_adjustment: u32,
    pub total_time_since_adjustment: f64,
}

/// Outcome of one recalibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Adjustment {
    pub average_secs: f64,
    pub previous: u32,
    pub current: u32,
}

impl Adjustment {
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

/// Tracks recent mining times and recalibrates difficulty.
#[derive(Debug, Clone)]
pub struct DifficultyController {
    state: DifficultyState,
    buffer_secs: f64,
    window: u32,
}

impl DifficultyController {
    /// Start from `config.difficulty` with empty accumulators.
    pub fn new(config: &MiningConfig) -> Self {
        DifficultyController {
            state: DifficultyState {
                current_difficulty: config.difficulty.max(1),
                target_interval_seconds: config.target_interval_seconds,
                blocks_since_adjustment: 0,
                total_time_since_adjustment: 0.0,
            },
            buffer_secs: config.buffer_seconds,
            window: config.adjustment_window_blocks.max(1),
        }
    }

    pub fn difficulty(&self) -> u32 {
        self.state.current_difficulty
    }

    pub fn state(&self) -> &DifficultyState {
        &self.state
    }

    /// Record one mined block; recalibrates when the window fills.
    pub fn record_block(&mut self, elapsed: Duration) -> Option<Adjustment> {
        self.state.blocks_since_adjustment += 1;
        self.state.total_time_since_adjustment += elapsed.as_secs_f64();

        if self.state.blocks_since_adjustment % self.window == 0 {
            self.adjust()
        } else {
            None
        }
    }

    /// Recalibrate from the blocks recorded so far.
    ///
    /// Returns `None` if nothing has been recorded since the last call.
    pub fn adjust(&mut self) -> Option<Adjustment> {
        if self.state.blocks_since_adjustment == 0 {
            return None;
        }

        let average_secs =
            self.state.total_time_since_adjustment / f64::from(self.state.blocks_since_adjustment);
        let target = self.state.target_interval_seconds;
        let previous = self.state.current_difficulty;

        // Too fast means the search is too cheap.
        if average_secs < target - self.buffer_secs {
            self.state.current_difficulty = previous.saturating_add(1);
        } else if average_secs > target + self.buffer_secs && previous > 1 {
            self.state.current_difficulty = previous - 1;
        }

        self.state.blocks_since_adjustment = 0;
        self.state.total_time_since_adjustment = 0.0;

        let adjustment = Adjustment {
            average_secs,
            previous,
            current: self.state.current_difficulty,
        };
        info!(
            average_secs,
            previous,
            current = adjustment.current,
            "difficulty recalibrated"
        );
        Some(adjustment)
    }
}

/// A controller shared by several miners under a single lock.
#[derive(Debug, Clone)]
pub struct SharedDifficulty(Arc<Mutex<DifficultyController>>);

impl SharedDifficulty {
    pub fn new(controller: DifficultyController) -> Self {
        SharedDifficulty(Arc::new(Mutex::new(controller)))
    }

    pub fn difficulty(&self) -> u32 {
        self.0.lock().difficulty()
    }

    pub fn record_block(&self, elapsed: Duration) -> Option<Adjustment> {
        self.0.lock().record_block(elapsed)
    }

    pub fn adjust(&self) -> Option<Adjustment> {
        self.0.lock().adjust()
    }

    pub fn state(&self) -> DifficultyState {
        self.0.lock().state().clone()
    }
}
