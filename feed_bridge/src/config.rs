//! Command-line and environment configuration for the bridge binary.
//!
//! `Args` is the raw `clap` interface; `Settings` is the validated form the
//! rest of the process is built from.
use std::time::Duration;

use clap::Parser;
use feed_common::BridgeError;

use crate::broker::BrokerSettings;
use crate::counters::LOG_THRESHOLD;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Sources to subscribe to at startup (comma separated or repeated).
    #[clap(long = "source", env = "FEED_SOURCES", value_delimiter = ',', default_value = "GATEIO")]
    pub sources: Vec<String>,

    /// Symbols the runtime's broker quotes for every source.
    #[clap(
        long,
        env = "FEED_SYMBOLS",
        value_delimiter = ',',
        default_value = "BTC/USDT,ETH/USDT,SOL/USDT,XRP/USDT"
    )]
    pub symbols: Vec<String>,

    /// Records between two status lines per stream kind.
    #[clap(long, env = "FEED_LOG_THRESHOLD", default_value_t = LOG_THRESHOLD)]
    pub log_threshold: u64,

    /// Broker processing interval in milliseconds.
    #[clap(long, env = "FEED_INTERVAL_MS", default_value_t = 100)]
    pub interval_ms: u64,

    /// Fixed seed for the broker's synthetic market.
    #[clap(long, env = "FEED_SEED")]
    pub seed: Option<u64>,

    /// Do not subscribe to bids/asks at startup.
    #[clap(long)]
    pub no_bids_asks: bool,

    /// Do not subscribe to trades at startup.
    #[clap(long)]
    pub no_trades: bool,
}

/// Validated process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Sources to subscribe to at startup.
    pub sources: Vec<String>,
    /// Symbols quoted by the broker.
    pub symbols: Vec<String>,
    /// Records between two status lines.
    pub log_threshold: u64,
    /// Broker processing interval.
    pub interval: Duration,
    /// Fixed market seed.
    pub seed: Option<u64>,
    /// Subscribe to bids/asks at startup.
    pub bids_asks: bool,
    /// Subscribe to trades at startup.
    pub trades: bool,
}

fn clean(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().trim_matches('"').to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

impl TryFrom<Args> for Settings {
    type Error = BridgeError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let sources = clean(args.sources);
        let symbols = clean(args.symbols);
        if args.log_threshold == 0 {
            return Err(BridgeError::Config("--log-threshold must be greater than 0".to_string()));
        }
        if args.interval_ms == 0 {
            return Err(BridgeError::Config("--interval-ms must be greater than 0".to_string()));
        }
        if symbols.is_empty() {
            return Err(BridgeError::Config("--symbols must name at least one symbol".to_string()));
        }
        Ok(Settings {
            sources,
            symbols,
            log_threshold: args.log_threshold,
            interval: Duration::from_millis(args.interval_ms),
            seed: args.seed,
            bids_asks: !args.no_bids_asks,
            trades: !args.no_trades,
        })
    }
}

impl Settings {
    /// Broker configuration derived from these settings.
    pub fn broker_settings(&self) -> BrokerSettings {
        BrokerSettings {
            interval: self.interval,
            symbols: self.symbols.clone(),
            seed: self.seed,
        }
    }
}
