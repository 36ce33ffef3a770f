//! Host callback surface the runtime pushes batches into.
//!
//! The runtime holds the host as an `Arc<dyn StreamSink>` and calls it with the
//! raw JSON of every batch. `BridgeSink` is the production implementation: it
//! decodes, counts, and hands records downstream. Nothing it does can fail back
//! into the runtime; a batch that cannot be decoded is logged and dropped.
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use feed_common::decoder;
use feed_common::{Result, StreamKind};
use log::error;

use crate::consumer::RecordConsumer;
use crate::counters::StreamCounters;

/// Callback table the runtime invokes for every pushed batch.
pub trait StreamSink: Send + Sync {
    /// One batch of `kind` from `source`. `payload` is the raw JSON text, or
    /// `None` when the runtime pushed nothing.
    fn on_batch(&self, kind: StreamKind, source: &str, payload: Option<&str>);

    /// `onBidsAsksReceived(source, payload)`.
    fn on_bids_asks_received(&self, source: &str, payload: Option<&str>) {
        self.on_batch(StreamKind::BidsAsks, source, payload)
    }

    /// `onTradesReceived(source, payload)`.
    fn on_trades_received(&self, source: &str, payload: Option<&str>) {
        self.on_batch(StreamKind::Trades, source, payload)
    }
}

/// Decodes pushed batches, updates the counters, and forwards records to a
/// consumer.
pub struct BridgeSink<C> {
    counters: Arc<StreamCounters>,
    consumer: C,
}

impl<C: RecordConsumer> BridgeSink<C> {
    /// Build a sink over shared counters and a downstream consumer.
    pub fn new(counters: Arc<StreamCounters>, consumer: C) -> Self {
        Self { counters, consumer }
    }

    /// Counters updated by this sink.
    pub fn counters(&self) -> &Arc<StreamCounters> {
        &self.counters
    }

    /// Decode one batch, count it and pass it on. Returns the number of
    /// records accepted; a decode failure leaves counters untouched.
    pub fn ingest(&self, kind: StreamKind, source: &str, payload: Option<&str>) -> Result<usize> {
        let batch = decoder::decode(kind, payload)?;
        let size = batch.len();
        if size == 0 {
            return Ok(0);
        }
        self.counters.record(kind, source, size);

        let delivered = panic::catch_unwind(AssertUnwindSafe(|| self.consumer.consume(source, batch)));
        if delivered.is_err() {
            error!("[{}] {} - consumer panicked while handling {} records", kind, source, size);
        }
        Ok(size)
    }
}

impl<C: RecordConsumer> StreamSink for BridgeSink<C> {
    fn on_batch(&self, kind: StreamKind, source: &str, payload: Option<&str>) {
        if let Err(e) = self.ingest(kind, source, payload) {
            error!("[{}] {} - dropping batch: {}", kind, source, e);
        }
    }
}
