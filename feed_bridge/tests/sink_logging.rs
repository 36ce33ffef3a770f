//! Log output of the host sink, observed through a recording logger.

use std::cell::RefCell;
use std::sync::{Arc, Once};

use feed_bridge::{BridgeSink, DiscardConsumer, StreamCounters, StreamSink};
use log::{Level, LevelFilter, Log, Metadata, Record};

const TRADE: &str = r#"{"timestamp":1700000000000,"symbol":"BTC/USDT","side":"buy","takerOrMaker":"taker","price":"100.6","amount":"0.01"}"#;

thread_local! {
    static LINES: RefCell<Vec<(Level, String)>> = const { RefCell::new(Vec::new()) };
}

/// Keeps lines per test thread, so parallel tests do not see each other.
struct Recorder;

impl Log for Recorder {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        LINES.with(|lines| lines.borrow_mut().push((record.level(), record.args().to_string())));
    }

    fn flush(&self) {}
}

static RECORDER: Recorder = Recorder;
static INIT: Once = Once::new();

fn recorded() -> Vec<(Level, String)> {
    INIT.call_once(|| {
        log::set_logger(&RECORDER).expect("logger already installed");
        log::set_max_level(LevelFilter::Trace);
    });
    LINES.with(|lines| lines.borrow_mut().drain(..).collect())
}

fn sink() -> BridgeSink<DiscardConsumer> {
    BridgeSink::new(Arc::new(StreamCounters::default()), DiscardConsumer)
}

#[test]
fn empty_batches_log_nothing() {
    recorded();
    let sink = sink();

    sink.on_trades_received("GATEIO", None);
    sink.on_trades_received("GATEIO", Some(""));
    sink.on_trades_received("GATEIO", Some("[]"));
    sink.on_trades_received("GATEIO", Some("null"));
    sink.on_bids_asks_received("GATEIO", None);
    sink.on_bids_asks_received("GATEIO", Some("[]"));

    assert_eq!(recorded(), Vec::new());
}

#[test]
fn thousand_single_record_batches_log_one_line() {
    recorded();
    let sink = sink();
    let payload = format!("[{}]", TRADE);

    for _ in 0..1000 {
        sink.on_trades_received("GATEIO", Some(&payload));
    }

    assert_eq!(
        recorded(),
        vec![(Level::Info, "[onTradesReceived] GATEIO - 1000 - 1".to_string())]
    );
}

#[test]
fn dropped_batch_logs_one_error() {
    recorded();
    let sink = sink();

    sink.on_trades_received("GATEIO", Some(r#"{"symbol":"BTC/USDT"}"#));

    let lines = recorded();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].0, Level::Error);
    assert!(lines[0].1.starts_with("[onTradesReceived] GATEIO - dropping batch"));
}
