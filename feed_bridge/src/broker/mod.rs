//! The `tradesDataBroker` script object: the producer side of the feed.
//!
//! `watchBidsAsks(source)` and `watchTrades(source)` validate their argument
//! synchronously and then start the stream as a runtime task, so a bad call
//! raises to the host but a failing stream only logs inside the runtime.
//!
//! A running stream polls its market every processing interval, collects what
//! changed since the previous poll, and pushes it to the host sink as one JSON
//! batch. Empty polls push nothing. Once a minute the stream logs how many
//! records it pushed, and it warns when a poll takes close to the whole
//! interval.

pub mod mapping;
pub mod market;

use std::time::{Duration, Instant};

use chrono::Utc;
use feed_common::StreamKind;
use log::{debug, error, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::Value;

use crate::runtime::scheduler::Scope;
use crate::runtime::script::{ScriptError, ScriptObject, string_arg};
use market::SyntheticMarket;

/// Default time between two polls of a stream.
pub const PROCESSING_INTERVAL: Duration = Duration::from_millis(100);
/// Window of the "records per minute" debug line.
const RATE_WINDOW: Duration = Duration::from_secs(60);
/// Slack before a slow poll is reported.
const OVERLOAD_SLACK: Duration = Duration::from_millis(10);

/// Name of the per-tick processing step, as it appears in error lines.
fn process_name(kind: StreamKind) -> &'static str {
    match kind {
        StreamKind::BidsAsks => "processBidsAsks",
        StreamKind::Trades => "processTrades",
    }
}

/// Broker configuration.
#[derive(Debug, Clone)]
pub struct BrokerSettings {
    /// Time between two polls of each stream.
    pub interval: Duration,
    /// Symbols every stream quotes.
    pub symbols: Vec<String>,
    /// Fixed RNG seed; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            interval: PROCESSING_INTERVAL,
            symbols: vec!["BTC/USDT".to_string(), "ETH/USDT".to_string()],
            seed: None,
        }
    }
}

/// Script object exposing `watchBidsAsks` and `watchTrades`.
pub struct TradesDataBroker {
    settings: BrokerSettings,
    streams_started: u64,
}

impl TradesDataBroker {
    /// Create a broker with the given settings.
    pub fn new(settings: BrokerSettings) -> Self {
        Self {
            settings,
            streams_started: 0,
        }
    }

    fn watch(&mut self, kind: StreamKind, source: &str, scope: &mut Scope<'_>) {
        self.streams_started += 1;
        let rng = match self.settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(self.streams_started)),
            None => StdRng::from_os_rng(),
        };
        let settings = self.settings.clone();
        let source = source.to_string();

        scope.spawn(move |scope| match FeedStream::open(kind, &source, &settings, rng.clone()) {
            Ok(mut stream) => {
                info!("Watching {} for {} ({} symbols)", kind.label(), source, settings.symbols.len());
                scope.set_interval(settings.interval, move |scope| stream.poll(scope));
            }
            Err(e) => error!("Error watching {} for exchange {}. {}", kind.label(), source, e),
        });
    }
}

impl ScriptObject for TradesDataBroker {
    fn invoke(&mut self, method: &str, args: &[Value], scope: &mut Scope<'_>) -> Result<(), ScriptError> {
        let kind = match method {
            "watchBidsAsks" => StreamKind::BidsAsks,
            "watchTrades" => StreamKind::Trades,
            other => return Err(ScriptError::UnknownMethod(format!("tradesDataBroker.{}", other))),
        };
        let source = string_arg(method, args)?;
        self.watch(kind, source, scope);
        Ok(())
    }
}

/// One running stream of one kind for one source.
struct FeedStream {
    kind: StreamKind,
    source: String,
    interval: Duration,
    market: SyntheticMarket,
    started: Instant,
    window_start: Instant,
    received_in_window: u64,
    received_total: u64,
}

impl FeedStream {
    fn open(kind: StreamKind, source: &str, settings: &BrokerSettings, rng: StdRng) -> Result<Self, ScriptError> {
        let exchange = mapping::exchange_name(source);
        if !mapping::is_supported_exchange(&exchange) {
            return Err(ScriptError::Thrown(format!(
                "Failed to create exchange, unknown broker: {}",
                source
            )));
        }
        if settings.symbols.is_empty() {
            return Err(ScriptError::Thrown(format!("No symbols to watch on {}", exchange)));
        }
        let now = Instant::now();
        Ok(Self {
            kind,
            source: source.to_string(),
            interval: settings.interval,
            market: SyntheticMarket::new(&settings.symbols, rng),
            started: now,
            window_start: now,
            received_in_window: 0,
            received_total: 0,
        })
    }

    fn collect(&mut self) -> Result<Option<(usize, String)>, serde_json::Error> {
        let timestamp = Utc::now().timestamp_millis();
        let (count, json) = match self.kind {
            StreamKind::BidsAsks => {
                let tickers = self.market.changed_tickers(timestamp);
                (tickers.len(), serde_json::to_string(&tickers)?)
            }
            StreamKind::Trades => {
                let trades = self.market.new_trades(timestamp);
                (trades.len(), serde_json::to_string(&trades)?)
            }
        };
        Ok((count > 0).then_some((count, json)))
    }

    fn poll(&mut self, scope: &mut Scope<'_>) {
        let poll_start = Instant::now();
        let mut host_time = Duration::ZERO;

        match self.collect() {
            Ok(Some((count, json))) => {
                self.received_in_window += count as u64;
                self.received_total += count as u64;
                match scope.host() {
                    Some(host) => {
                        let host_start = Instant::now();
                        host.on_batch(self.kind, &self.source, Some(&json));
                        host_time = host_start.elapsed();
                    }
                    None => error!("Error in {}. Host callbacks are not bound", process_name(self.kind)),
                }
            }
            Ok(None) => {}
            Err(e) => error!("Error in {}. {}", process_name(self.kind), e),
        }

        if self.window_start.elapsed() >= RATE_WINDOW {
            debug!(
                "[{}] Received {} {} per minute, total run time: {} seconds",
                self.source,
                self.received_in_window,
                self.kind.label(),
                self.started.elapsed().as_secs()
            );
            self.received_in_window = 0;
            self.window_start = Instant::now();
        }

        let duration = poll_start.elapsed();
        if duration > self.interval.saturating_sub(OVERLOAD_SLACK) {
            warn!(
                "[{}] Processing {} took {} ms, runtime might become overloaded (host processing time: {} ms)",
                self.source,
                self.kind.label(),
                duration.as_millis(),
                host_time.as_millis()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::ScriptRuntime;
    use crate::sink::StreamSink;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Capture(Mutex<Vec<(StreamKind, String, String)>>);

    impl StreamSink for Capture {
        fn on_batch(&self, kind: StreamKind, source: &str, payload: Option<&str>) {
            self.0
                .lock()
                .unwrap()
                .push((kind, source.to_string(), payload.unwrap_or_default().to_string()));
        }
    }

    fn runtime(capture: &Arc<Capture>) -> ScriptRuntime {
        let mut runtime = ScriptRuntime::new();
        runtime.bind_host(Arc::clone(capture) as Arc<dyn StreamSink>);
        runtime.set_global(
            "tradesDataBroker",
            Box::new(TradesDataBroker::new(BrokerSettings {
                interval: Duration::from_millis(100),
                symbols: vec!["BTC/USDT".to_string(), "ETH/USDT".to_string(), "SOL/USDT".to_string()],
                seed: Some(42),
            })),
        );
        runtime
    }

    fn drive(runtime: &mut ScriptRuntime, steps: u32) {
        runtime.run_till_no_more_tasks();
        let base = Instant::now();
        for step in 1..=steps {
            runtime.run_due(base + Duration::from_millis(200) * step);
        }
    }

    #[test]
    fn process_names_follow_the_stream_kind() {
        assert_eq!(process_name(StreamKind::Trades), "processTrades");
        assert_eq!(process_name(StreamKind::BidsAsks), "processBidsAsks");
    }

    #[test]
    fn bad_arguments_raise_synchronously() {
        let capture = Arc::new(Capture::default());
        let mut runtime = runtime(&capture);
        assert!(matches!(
            runtime.invoke_global("tradesDataBroker", "watchTrades", &[json!(5)]),
            Err(ScriptError::TypeError(_))
        ));
        assert!(matches!(
            runtime.invoke_global("tradesDataBroker", "watchOrders", &[json!("GATEIO")]),
            Err(ScriptError::UnknownMethod(_))
        ));
    }

    #[test]
    fn trades_stream_pushes_non_empty_json_batches() {
        let capture = Arc::new(Capture::default());
        let mut runtime = runtime(&capture);
        runtime
            .invoke_global("tradesDataBroker", "watchTrades", &[json!("GATEIO")])
            .unwrap();
        drive(&mut runtime, 20);

        let pushed = capture.0.lock().unwrap();
        assert!(!pushed.is_empty());
        for (kind, source, payload) in pushed.iter() {
            assert_eq!(*kind, StreamKind::Trades);
            assert_eq!(source, "GATEIO");
            let trades = feed_common::decoder::decode_trades(Some(payload)).unwrap();
            assert!(!trades.is_empty());
        }
    }

    #[test]
    fn bids_asks_stream_decodes_cleanly() {
        let capture = Arc::new(Capture::default());
        let mut runtime = runtime(&capture);
        runtime
            .invoke_global("tradesDataBroker", "watchBidsAsks", &[json!("KRAKEN")])
            .unwrap();
        drive(&mut runtime, 20);

        let pushed = capture.0.lock().unwrap();
        assert!(!pushed.is_empty());
        for (kind, _, payload) in pushed.iter() {
            assert_eq!(*kind, StreamKind::BidsAsks);
            let tickers = feed_common::decoder::decode_tickers(Some(payload)).unwrap();
            assert!(!tickers.is_empty() && tickers.len() <= 3);
        }
    }

    #[test]
    fn unknown_source_fails_inside_the_runtime() {
        let capture = Arc::new(Capture::default());
        let mut runtime = runtime(&capture);
        runtime
            .invoke_global("tradesDataBroker", "watchTrades", &[json!("NOWHERE")])
            .unwrap();
        drive(&mut runtime, 5);
        assert!(capture.0.lock().unwrap().is_empty());
        assert_eq!(runtime.pending_tasks(), 0);
    }

    #[test]
    fn watching_twice_starts_two_streams() {
        let capture = Arc::new(Capture::default());
        let mut runtime = runtime(&capture);
        for _ in 0..2 {
            runtime
                .invoke_global("tradesDataBroker", "watchTrades", &[json!("GATEIO")])
                .unwrap();
        }
        runtime.run_till_no_more_tasks();
        assert_eq!(runtime.pending_tasks(), 2);
    }
}
