use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Knobs that tune the scan-and-drain pipeline.
///
/// All fields carry defaults so a configuration file only needs to mention
/// the values it wants to change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Fixed cadence of scheduler ticks (milliseconds).
    pub scan_interval_ms: u64,
    /// Number of concurrent movers spawned for every cycle.
    pub worker_count: usize,
    /// Pause before each enqueue while the inbox listing is pushed onto the
    /// queue (milliseconds). Zero disables pacing.
    pub enqueue_delay_ms: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            scan_interval_ms: Self::DEFAULT_SCAN_INTERVAL_MS,
            worker_count: Self::DEFAULT_WORKER_COUNT,
            enqueue_delay_ms: 0,
        }
    }
}

impl TransferConfig {
    pub const DEFAULT_SCAN_INTERVAL_MS: u64 = 5_000;
    pub const DEFAULT_WORKER_COUNT: usize = 3;

    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }

    pub fn enqueue_delay(&self) -> Duration {
        Duration::from_millis(self.enqueue_delay_ms)
    }

    /// Pool size actually used; a pool never runs with zero workers.
    pub fn workers(&self) -> usize {
        self.worker_count.max(1)
    }
}
