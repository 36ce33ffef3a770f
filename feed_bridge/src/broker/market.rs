//! Synthetic market the broker streams from.
//!
//! Each symbol follows a small random walk around its last mid price. Ticker
//! updates are produced only for symbols whose quote changed on this step, and
//! trades only when the step generated some, mirroring a live exchange cache
//! that is polled for "what is new since last time".

use rand::Rng;
use rand::rngs::StdRng;
use rust_decimal::Decimal;

use feed_common::{TickerSnapshot, TradeExecution};

/// Chance that a symbol's quote moves on a given step.
const UPDATE_PROBABILITY: f64 = 0.6;
/// Chance that a moved quote has one side of the book missing.
const ONE_SIDED_PROBABILITY: f64 = 0.02;
/// Upper bound of trades generated per symbol per step.
const MAX_TRADES_PER_STEP: u32 = 3;

fn min_price() -> Decimal {
    Decimal::new(1, 2)
}

/// Calculate the next price using a random walk of at most 1% around `current`.
///
/// The result is rounded to 6 decimal places and floored at 0.01.
pub fn next_price<R: Rng>(rng: &mut R, current: Decimal) -> Decimal {
    let change_bp: i64 = rng.random_range(-100..=100);
    let next = current * (Decimal::ONE + Decimal::new(change_bp, 4));
    next.round_dp(6).max(min_price())
}

/// Starting mid price for a symbol, keyed on its base asset.
pub fn initial_price(symbol: &str) -> Decimal {
    let base = symbol.split('/').next().unwrap_or(symbol);
    match base {
        "BTC" => Decimal::new(65_000, 0),
        "ETH" => Decimal::new(3_200, 0),
        "SOL" => Decimal::new(150, 0),
        "XRP" => Decimal::new(6, 1),
        _ => Decimal::new(100, 0),
    }
}

struct SymbolState {
    symbol: String,
    mid: Decimal,
    last_ticker: Option<TickerSnapshot>,
}

/// Random-walk market over a fixed symbol list.
pub struct SyntheticMarket {
    rng: StdRng,
    symbols: Vec<SymbolState>,
}

impl SyntheticMarket {
    /// Create a market for `symbols`, drawing randomness from `rng`.
    pub fn new(symbols: &[String], rng: StdRng) -> Self {
        let symbols = symbols
            .iter()
            .map(|s| SymbolState {
                symbol: s.clone(),
                mid: initial_price(s),
                last_ticker: None,
            })
            .collect();
        Self { rng, symbols }
    }

    /// Step every symbol and return the tickers that differ from the last one
    /// returned for that symbol.
    pub fn changed_tickers(&mut self, timestamp: i64) -> Vec<TickerSnapshot> {
        let mut changed = Vec::new();
        for state in &mut self.symbols {
            if !self.rng.random_bool(UPDATE_PROBABILITY) {
                continue;
            }
            state.mid = next_price(&mut self.rng, state.mid);
            let half_spread = (state.mid * Decimal::new(25, 5)).round_dp(6);

            let mut ticker = TickerSnapshot {
                symbol: state.symbol.clone(),
                timestamp: Some(timestamp),
                bid: Some(state.mid - half_spread),
                bid_volume: Some(Decimal::new(self.rng.random_range(1..5_000), 3)),
                ask: Some(state.mid + half_spread),
                ask_volume: Some(Decimal::new(self.rng.random_range(1..5_000), 3)),
            };
            if self.rng.random_bool(ONE_SIDED_PROBABILITY) {
                if self.rng.random_bool(0.5) {
                    ticker.bid = None;
                    ticker.bid_volume = None;
                } else {
                    ticker.ask = None;
                    ticker.ask_volume = None;
                }
            }

            if state.last_ticker.as_ref() == Some(&ticker) {
                continue;
            }
            state.last_ticker = Some(ticker.clone());
            changed.push(ticker);
        }
        changed
    }

    /// Step every symbol and return the trades that happened on this step.
    pub fn new_trades(&mut self, timestamp: i64) -> Vec<TradeExecution> {
        let mut trades = Vec::new();
        for state in &mut self.symbols {
            let count = self.rng.random_range(0..=MAX_TRADES_PER_STEP);
            for _ in 0..count {
                state.mid = next_price(&mut self.rng, state.mid);
                let side = if self.rng.random_bool(0.5) { "buy" } else { "sell" };
                let role = if self.rng.random_bool(0.5) { "taker" } else { "maker" };
                trades.push(TradeExecution {
                    timestamp,
                    symbol: state.symbol.clone(),
                    side: Some(side.to_string()),
                    taker_or_maker: Some(role.to_string()),
                    price: state.mid,
                    amount: Decimal::new(self.rng.random_range(1..100_000), 5),
                });
            }
        }
        trades
    }
}
