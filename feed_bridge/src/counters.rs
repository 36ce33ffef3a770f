//! Per-stream ingestion counters with throttled status logging.
//!
//! Each stream kind has a running total of records received and the total at
//! which a status line was last written. A line is written only when the total
//! has moved at least `threshold` records past the last logged value, so a
//! burst of tiny batches costs one log line per `threshold` records rather than
//! one per batch.
//!
//! Design notes:
//! - The trigger is checked against the running total, not the batch size. A
//!   large batch can overshoot the threshold (delta 1042 is logged as-is).
//! - Callbacks are expected to arrive from the runtime's driver thread only, but
//!   each counter sits behind its own `Mutex` so the check-and-update stays
//!   atomic if they ever come from several threads.
//! - There is no reset; counters live as long as the process.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use feed_common::StreamKind;
use log::info;

/// Default number of records between two status lines.
pub const LOG_THRESHOLD: u64 = 1000;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct CounterState {
    count: u64,
    last_logged: u64,
}

/// A status line emitted because a counter moved past the threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdCrossing {
    /// Stream whose counter crossed.
    pub kind: StreamKind,
    /// Source identifier of the batch that triggered the line.
    pub source: String,
    /// Running total after the batch was added.
    pub total: u64,
    /// Size of the batch that triggered the line.
    pub batch_size: u64,
}

impl fmt::Display for ThresholdCrossing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} - {} - {}",
            self.kind, self.source, self.total, self.batch_size
        )
    }
}

/// Point-in-time copy of both running totals.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Ticker snapshots received so far.
    pub bids_asks: u64,
    /// Trades received so far.
    pub trades: u64,
}

/// Process-wide running totals for every stream kind.
pub struct StreamCounters {
    threshold: u64,
    bids_asks: Mutex<CounterState>,
    trades: Mutex<CounterState>,
}

impl Default for StreamCounters {
    fn default() -> Self {
        Self::new(LOG_THRESHOLD)
    }
}

impl StreamCounters {
    /// Create counters that log every `threshold` records. A zero threshold is
    /// treated as 1.
    pub fn new(threshold: u64) -> Self {
        Self {
            threshold: threshold.max(1),
            bids_asks: Mutex::new(CounterState::default()),
            trades: Mutex::new(CounterState::default()),
        }
    }

    /// Records between two status lines.
    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    // Plain integers cannot be left half-updated, so a poisoned lock is safe to reuse.
    fn state(&self, kind: StreamKind) -> MutexGuard<'_, CounterState> {
        let slot = match kind {
            StreamKind::BidsAsks => &self.bids_asks,
            StreamKind::Trades => &self.trades,
        };
        slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a decoded batch to the counter for `kind`.
    ///
    /// Returns the crossing (after logging it) when this batch moved the total
    /// at least `threshold` past the last logged value. An empty batch changes
    /// nothing.
    pub fn record(&self, kind: StreamKind, source: &str, batch_size: usize) -> Option<ThresholdCrossing> {
        if batch_size == 0 {
            return None;
        }
        let batch_size = u64::try_from(batch_size).unwrap_or(u64::MAX);

        let crossing = {
            let mut state = self.state(kind);
            state.count = state.count.saturating_add(batch_size);
            if state.count - state.last_logged < self.threshold {
                return None;
            }
            state.last_logged = state.count;
            ThresholdCrossing {
                kind,
                source: source.to_string(),
                total: state.count,
                batch_size,
            }
        };

        info!("{}", crossing);
        Some(crossing)
    }

    /// Running total for `kind`.
    pub fn count(&self, kind: StreamKind) -> u64 {
        self.state(kind).count
    }

    /// Total at which `kind` was last logged.
    pub fn last_logged(&self, kind: StreamKind) -> u64 {
        self.state(kind).last_logged
    }

    /// Both running totals.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            bids_asks: self.count(StreamKind::BidsAsks),
            trades: self.count(StreamKind::Trades),
        }
    }
}
