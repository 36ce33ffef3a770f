//! Market-feed ingestion bridge.
//!
//! A cooperative script runtime produces batches of ticker snapshots and
//! trades and pushes them, as JSON text, into host callbacks. This crate is the
//! host side of that boundary and wires together:
//!
//! - `dispatcher` — asks the runtime's `tradesDataBroker` to start a named feed;
//!   setup failures come back to the caller as `BridgeUnavailable`.
//! - `sink` — the callback table the runtime pushes into; decodes each batch,
//!   counts it and hands it downstream, and never fails back into the runtime.
//! - `counters` — per-kind running totals with a throttled status line.
//! - `consumer` — downstream destinations for decoded records.
//! - `runtime` — the single-threaded script runtime, its scheduler and the
//!   driver loop that owns it.
//! - `broker` — the runtime-side producer object.
//! - `config` — CLI/env configuration for the binary.
//!
//! Concurrency: the runtime, and therefore every callback, runs on the driver
//! thread. Other threads reach the runtime only through a `RuntimeHandle`,
//! which queues the call for the driver and blocks on its reply.
#![warn(missing_docs)]
pub mod broker;
pub mod config;
pub mod consumer;
pub mod counters;
pub mod dispatcher;
pub mod runtime;
pub mod sink;

pub use consumer::{ChannelConsumer, DiscardConsumer, FeedEvent, RecordConsumer};
pub use counters::{CounterSnapshot, StreamCounters, ThresholdCrossing};
pub use dispatcher::{BROKER_BINDING, RuntimeInvoker, SubscriptionDispatcher};
pub use sink::{BridgeSink, StreamSink};
