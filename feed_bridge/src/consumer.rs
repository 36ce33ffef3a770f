//! Downstream consumers of decoded batches.
//!
//! The sink hands every non-empty decoded batch to a `RecordConsumer`. The
//! bridge binary only counts, so it runs with `DiscardConsumer`; embedders
//! that want the records use `ChannelConsumer` and read `FeedEvent`s from the
//! other end of a crossbeam channel.
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::Sender;
use feed_common::DecodedBatch;
use log::warn;

/// Receives every decoded, non-empty batch.
///
/// Called on the runtime's driver thread; implementations must not block for
/// long or the producer stalls.
pub trait RecordConsumer: Send + Sync {
    /// Take ownership of the records of one batch.
    fn consume(&self, source: &str, batch: DecodedBatch);
}

/// Drops every batch. Counting happens before the consumer is called.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardConsumer;

impl RecordConsumer for DiscardConsumer {
    fn consume(&self, _source: &str, _batch: DecodedBatch) {}
}

/// A decoded batch together with the source that pushed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEvent {
    /// Source identifier, e.g. `GATEIO`.
    pub source: String,
    /// The decoded records.
    pub batch: DecodedBatch,
}

/// Forwards batches as `FeedEvent`s into a channel.
///
/// Once the receiving side is gone, the disconnect is logged once and later
/// batches are dropped silently.
pub struct ChannelConsumer {
    tx: Sender<FeedEvent>,
    disconnected: AtomicBool,
}

impl ChannelConsumer {
    /// Wrap the sending half of a channel.
    pub fn new(tx: Sender<FeedEvent>) -> Self {
        Self {
            tx,
            disconnected: AtomicBool::new(false),
        }
    }
}

impl RecordConsumer for ChannelConsumer {
    fn consume(&self, source: &str, batch: DecodedBatch) {
        if self.disconnected.load(Ordering::Relaxed) {
            return;
        }
        let event = FeedEvent {
            source: source.to_string(),
            batch,
        };
        if self.tx.send(event).is_err() && !self.disconnected.swap(true, Ordering::Relaxed) {
            warn!("Feed event receiver dropped; further batches from {} are discarded", source);
        }
    }
}

impl<T: RecordConsumer + ?Sized> RecordConsumer for std::sync::Arc<T> {
    fn consume(&self, source: &str, batch: DecodedBatch) {
        (**self).consume(source, batch)
    }
}
