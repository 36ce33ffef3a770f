//! Typed record decoder for runtime payloads.
//!
//! A payload is a JSON array of objects, all of the same stream kind. An empty
//! or missing payload is a no-op batch, not an error. Anything else that is not
//! an array of well-formed records fails the whole batch with
//! [`BridgeError::Decode`] or [`BridgeError::Json`]; the caller decides what to
//! do with a rejected batch.
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::BridgeError;
use crate::kind::StreamKind;
use crate::records::{DecodedBatch, TickerSnapshot, TradeExecution};
use crate::result::Result;

/// Decode a payload of the given kind into typed records.
pub fn decode(kind: StreamKind, payload: Option<&str>) -> Result<DecodedBatch> {
    match kind {
        StreamKind::BidsAsks => decode_tickers(payload).map(DecodedBatch::Tickers),
        StreamKind::Trades => decode_trades(payload).map(DecodedBatch::Trades),
    }
}

/// Decode a bids/asks payload.
pub fn decode_tickers(payload: Option<&str>) -> Result<Vec<TickerSnapshot>> {
    let tickers: Vec<TickerSnapshot> = decode_array(payload)?;
    if let Some(pos) = tickers.iter().position(|t| t.symbol.trim().is_empty()) {
        return Err(BridgeError::Decode(format!("element {}: empty symbol", pos)));
    }
    Ok(tickers)
}

/// Decode a trades payload.
pub fn decode_trades(payload: Option<&str>) -> Result<Vec<TradeExecution>> {
    decode_array(payload)
}

fn decode_array<T: DeserializeOwned>(payload: Option<&str>) -> Result<Vec<T>> {
    let text = match payload {
        Some(text) if !text.trim().is_empty() => text,
        _ => return Ok(Vec::new()),
    };

    let elements = match serde_json::from_str::<Value>(text)? {
        Value::Array(elements) => elements,
        Value::Null => return Ok(Vec::new()),
        other => {
            return Err(BridgeError::Decode(format!(
                "expected a JSON array, got {}",
                json_type(&other)
            )));
        }
    };

    let mut records = Vec::with_capacity(elements.len());
    for (pos, element) in elements.into_iter().enumerate() {
        if !element.is_object() {
            return Err(BridgeError::Decode(format!(
                "element {}: expected an object, got {}",
                pos,
                json_type(&element)
            )));
        }
        let record = serde_json::from_value(element)
            .map_err(|e| BridgeError::Decode(format!("element {}: {}", pos, e)))?;
        records.push(record);
    }
    Ok(records)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
