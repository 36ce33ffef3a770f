//! Subscription dispatcher: asks the runtime's broker to start a feed.
//!
//! Each call resolves the `tradesDataBroker` global inside the runtime at call
//! time and invokes `watchBidsAsks(source)` or `watchTrades(source)` on it.
//! The call is fire-and-forget: it returns as soon as the broker accepted the
//! request, and data arrives later through the host sink.
//!
//! Setup failures are not swallowed. A missing binding, a stopped runtime
//! driver, or an error thrown by the broker method all come back to the caller
//! as `BridgeError::BridgeUnavailable`. There is no retry and no
//! de-duplication: calling `begin_trades` twice asks the broker twice.
use feed_common::{Result, StreamKind};
use log::info;
use serde_json::Value;

/// Global binding name of the broker object inside the runtime.
pub const BROKER_BINDING: &str = "tradesDataBroker";

/// Synchronous call into the runtime.
#[cfg_attr(test, mockall::automock)]
pub trait RuntimeInvoker: Send + Sync {
    /// Resolve global `binding`, call `method(args...)` on it and wait for the
    /// call to return.
    fn invoke(&self, binding: &str, method: &str, args: Vec<Value>) -> Result<()>;
}

/// Starts named subscriptions on the runtime's broker.
pub struct SubscriptionDispatcher<I> {
    invoker: I,
}

impl<I: RuntimeInvoker> SubscriptionDispatcher<I> {
    /// Create a dispatcher issuing calls through `invoker`.
    pub fn new(invoker: I) -> Self {
        Self { invoker }
    }

    /// Start streaming ticker snapshots for `source`.
    pub fn begin_bids_asks(&self, source: &str) -> Result<()> {
        self.begin(StreamKind::BidsAsks, source)
    }

    /// Start streaming trades for `source`.
    pub fn begin_trades(&self, source: &str) -> Result<()> {
        self.begin(StreamKind::Trades, source)
    }

    /// Start streaming `kind` for `source`.
    pub fn begin(&self, kind: StreamKind, source: &str) -> Result<()> {
        info!("Requesting {}.{}({})", BROKER_BINDING, kind.watch_method(), source);
        self.invoker.invoke(
            BROKER_BINDING,
            kind.watch_method(),
            vec![Value::String(source.to_string())],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feed_common::BridgeError;
    use mockall::predicate::eq;
    use serde_json::json;

    #[test]
    fn begin_calls_the_matching_broker_method() {
        let mut invoker = MockRuntimeInvoker::new();
        invoker
            .expect_invoke()
            .with(eq(BROKER_BINDING), eq("watchBidsAsks"), eq(vec![json!("GATEIO")]))
            .times(1)
            .returning(|_, _, _| Ok(()));
        invoker
            .expect_invoke()
            .with(eq(BROKER_BINDING), eq("watchTrades"), eq(vec![json!("GATEIO")]))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let dispatcher = SubscriptionDispatcher::new(invoker);
        dispatcher.begin_bids_asks("GATEIO").unwrap();
        dispatcher.begin_trades("GATEIO").unwrap();
    }

    #[test]
    fn failures_propagate_to_the_caller() {
        let mut invoker = MockRuntimeInvoker::new();
        invoker
            .expect_invoke()
            .returning(|_, _, _| Err(BridgeError::BridgeUnavailable("not initialized".to_string())));

        let dispatcher = SubscriptionDispatcher::new(invoker);
        assert!(matches!(
            dispatcher.begin_trades("GATEIO"),
            Err(BridgeError::BridgeUnavailable(_))
        ));
    }

    #[test]
    fn repeated_begin_is_not_deduplicated() {
        let mut invoker = MockRuntimeInvoker::new();
        invoker
            .expect_invoke()
            .with(eq(BROKER_BINDING), eq("watchTrades"), eq(vec![json!("KRAKEN")]))
            .times(2)
            .returning(|_, _, _| Ok(()));

        let dispatcher = SubscriptionDispatcher::new(invoker);
        dispatcher.begin_trades("KRAKEN").unwrap();
        dispatcher.begin_trades("KRAKEN").unwrap();
    }
}
