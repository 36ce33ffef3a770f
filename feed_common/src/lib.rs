//!
//! Types shared by the feed bridge and anything consuming its output.
//!
//! This crate aggregates:
//! - `error` — unified error type `BridgeError` used across the workspace.
//! - `result` — handy `Result<T, BridgeError>` alias.
//! - `kind` — the stream kinds the foreign runtime pushes.
//! - `records` — typed ticker and trade records.
//! - `decimal` — exact number parsing for price and volume fields.
//! - `decoder` — turns raw JSON batches into typed records.
#![warn(missing_docs)]
pub mod error;
pub mod result;
pub mod kind;
pub mod records;
pub mod decimal;
pub mod decoder;

pub use error::BridgeError;
pub use result::Result;
pub use kind::StreamKind;
pub use records::{DecodedBatch, TickerSnapshot, TradeExecution};
