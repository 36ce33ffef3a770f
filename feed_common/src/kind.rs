//! Stream kinds pushed by the foreign runtime.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Kind of market-data stream a batch belongs to.
///
/// The display form is the name of the host callback the runtime invokes for
/// this kind, which is also the tag printed in throttled status lines.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    Hash,
    Eq,
    PartialEq,
)]
pub enum StreamKind {
    /// Best bid/ask ticker snapshots.
    #[strum(serialize = "onBidsAsksReceived")]
    BidsAsks,
    /// Individual trade executions.
    #[strum(serialize = "onTradesReceived")]
    Trades,
}

impl StreamKind {
    /// Method on the runtime's broker object that starts a stream of this kind.
    pub fn watch_method(self) -> &'static str {
        match self {
            StreamKind::BidsAsks => "watchBidsAsks",
            StreamKind::Trades => "watchTrades",
        }
    }

    /// Short noun used in runtime-side log lines (`bidsAsks`, `trades`).
    pub fn label(self) -> &'static str {
        match self {
            StreamKind::BidsAsks => "bidsAsks",
            StreamKind::Trades => "trades",
        }
    }
}
