//! Typed market-data records decoded from runtime payloads.
//!
//! Field names on the wire follow the producer's camelCase convention
//! (`bidVolume`, `takerOrMaker`); unknown fields are ignored so newer producers
//! can add data without breaking the bridge.
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal;
use crate::kind::StreamKind;

/// Best bid/ask state for a symbol at a point in time.
///
/// Any of the quote fields may be absent: a market can legitimately have no
/// quote on one side of the book.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerSnapshot {
    /// Market symbol, e.g. `BTC/USDT`. Never empty.
    pub symbol: String,
    /// Milliseconds since the Unix epoch.
    #[serde(default, deserialize_with = "decimal::optional_millis")]
    pub timestamp: Option<i64>,
    /// Best bid price.
    #[serde(default, deserialize_with = "decimal::optional")]
    pub bid: Option<Decimal>,
    /// Quantity available at the best bid.
    #[serde(default, deserialize_with = "decimal::optional")]
    pub bid_volume: Option<Decimal>,
    /// Best ask price.
    #[serde(default, deserialize_with = "decimal::optional")]
    pub ask: Option<Decimal>,
    /// Quantity available at the best ask.
    #[serde(default, deserialize_with = "decimal::optional")]
    pub ask_volume: Option<Decimal>,
}

/// A completed, matched trade report.
///
/// `side` and `taker_or_maker` are passed through as the producer sent them;
/// they are not checked against a closed set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeExecution {
    /// Milliseconds since the Unix epoch.
    #[serde(deserialize_with = "decimal::required_millis")]
    pub timestamp: i64,
    /// Market symbol.
    pub symbol: String,
    /// Aggressor side token, usually `buy` or `sell`.
    #[serde(default)]
    pub side: Option<String>,
    /// Liquidity role token, usually `taker` or `maker`.
    #[serde(default)]
    pub taker_or_maker: Option<String>,
    /// Execution price.
    #[serde(deserialize_with = "decimal::required")]
    pub price: Decimal,
    /// Executed quantity.
    #[serde(deserialize_with = "decimal::required")]
    pub amount: Decimal,
}

/// All records decoded from a single pushed batch. A batch is always
/// homogeneous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedBatch {
    /// Ticker snapshots from an `onBidsAsksReceived` push.
    Tickers(Vec<TickerSnapshot>),
    /// Trades from an `onTradesReceived` push.
    Trades(Vec<TradeExecution>),
}

impl DecodedBatch {
    /// Empty batch of the given kind.
    pub fn empty(kind: StreamKind) -> Self {
        match kind {
            StreamKind::BidsAsks => DecodedBatch::Tickers(Vec::new()),
            StreamKind::Trades => DecodedBatch::Trades(Vec::new()),
        }
    }

    /// Stream kind of the records in this batch.
    pub fn kind(&self) -> StreamKind {
        match self {
            DecodedBatch::Tickers(_) => StreamKind::BidsAsks,
            DecodedBatch::Trades(_) => StreamKind::Trades,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        match self {
            DecodedBatch::Tickers(tickers) => tickers.len(),
            DecodedBatch::Trades(trades) => trades.len(),
        }
    }

    /// Returns `true` if the batch holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
