//! Feed bridge binary.
//!
//! Boots the script runtime with the `tradesDataBroker` global and the host
//! callback sink, starts the configured subscriptions from a worker thread, and
//! then drives the runtime on the main thread forever:
//!
//! - `BridgeSink` — decodes every pushed batch and updates `StreamCounters`,
//!   which print one status line per threshold crossing.
//! - `SubscriptionDispatcher` — issues `watchBidsAsks`/`watchTrades` for each
//!   source through a `RuntimeHandle`, so startup subscriptions never block the
//!   driver loop.
//! - `RuntimeDriver` — runs queued host calls and due script tasks until idle,
//!   then waits for the next one.
//!
//! A failed subscription is logged and the bridge keeps running; there is no
//! retry and no graceful shutdown.
#![warn(missing_docs)]
use std::sync::Arc;
use std::thread;

use clap::Parser;
use feed_bridge::broker::TradesDataBroker;
use feed_bridge::config::{Args, Settings};
use feed_bridge::runtime::{RuntimeDriver, RuntimeHandle, ScriptRuntime};
use feed_bridge::{
    BROKER_BINDING, BridgeSink, DiscardConsumer, StreamCounters, StreamSink, SubscriptionDispatcher,
};
use feed_common::{BridgeError, Result};
use log::{error, info};

fn main() -> Result<(), BridgeError> {
    init_logger();
    let settings = Settings::try_from(Args::parse())?;
    info!("Initializing feed bridge: {:?}", settings);

    let counters = Arc::new(StreamCounters::new(settings.log_threshold));
    let sink: Arc<dyn StreamSink> = Arc::new(BridgeSink::new(Arc::clone(&counters), DiscardConsumer));

    let mut runtime = ScriptRuntime::new();
    runtime.bind_host(sink);
    runtime.set_global(
        BROKER_BINDING,
        Box::new(TradesDataBroker::new(settings.broker_settings())),
    );

    let (driver, handle) = RuntimeDriver::new(runtime);
    thread::Builder::new()
        .name("subscriptions".to_string())
        .spawn(move || start_subscriptions(SubscriptionDispatcher::new(handle), &settings))?;

    info!("Runtime driver started");
    driver.run()
}

fn start_subscriptions(dispatcher: SubscriptionDispatcher<RuntimeHandle>, settings: &Settings) {
    for source in &settings.sources {
        if settings.bids_asks {
            if let Err(e) = dispatcher.begin_bids_asks(source) {
                error!("Failed to watch bids/asks for {}: {}", source, e);
            }
        }
        if settings.trades {
            if let Err(e) = dispatcher.begin_trades(source) {
                error!("Failed to watch trades for {}: {}", source, e);
            }
        }
    }
    info!("Startup subscriptions issued for {} sources", settings.sources.len());
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
