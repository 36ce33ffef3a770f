//! Error types shared between the decoder and the bridge.
//!
//! The `BridgeError` enum separates per-batch failures (a payload that cannot be
//! decoded, which the bridge recovers from locally) from setup failures (the
//! foreign runtime cannot be reached), which are surfaced to the caller.
use std::io;

use thiserror::Error;

/// Unified error type shared by the decoder and the bridge.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// I/O error, e.g. when a worker thread cannot be spawned.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Payload is valid JSON but does not have the expected shape or values.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Payload could not be parsed as JSON at all.
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// The foreign runtime or its subscription object is not reachable, or the
    /// subscribe call raised inside the runtime.
    #[error("Bridge unavailable: {0}")]
    BridgeUnavailable(String),

    /// Invalid command-line or environment configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}
