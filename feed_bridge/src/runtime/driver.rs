//! Driver loop that owns the runtime, and the handle other threads use to
//! call into it.
//!
//! The driver repeatedly drains pending host invocations, runs the scheduler
//! until nothing is runnable, then sleeps until either a new invocation arrives
//! or the next timer is due. Invocations are executed on the driver thread
//! between scheduler passes, so they never overlap with script tasks.
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded, select, unbounded};
use feed_common::{BridgeError, Result};
use log::{debug, warn};
use serde_json::Value;

use super::script::{ScriptError, ScriptRuntime};
use crate::dispatcher::RuntimeInvoker;

/// Longest the driver sleeps when there is nothing scheduled.
pub const IDLE_WAIT: Duration = Duration::from_millis(250);

/// A host call waiting to be executed on the driver thread.
struct Invocation {
    binding: String,
    method: String,
    args: Vec<Value>,
    reply: Sender<Result<(), ScriptError>>,
}

/// Owns a `ScriptRuntime` and runs it.
pub struct RuntimeDriver {
    runtime: ScriptRuntime,
    rx: Receiver<Invocation>,
    handles_gone: bool,
}

/// Cloneable, thread-safe entry point into a running `RuntimeDriver`.
///
/// Calls block until the driver has executed them. Never call through a handle
/// from the driver thread itself; the call would wait on its own loop.
#[derive(Clone)]
pub struct RuntimeHandle {
    tx: Sender<Invocation>,
}

impl RuntimeDriver {
    /// Wrap a runtime and return the driver with a handle connected to it.
    pub fn new(runtime: ScriptRuntime) -> (Self, RuntimeHandle) {
        let (tx, rx) = unbounded::<Invocation>();
        let driver = Self {
            runtime,
            rx,
            handles_gone: false,
        };
        (driver, RuntimeHandle { tx })
    }

    /// The driven runtime, for setup before the loop starts.
    pub fn runtime_mut(&mut self) -> &mut ScriptRuntime {
        &mut self.runtime
    }

    fn execute(&mut self, invocation: Invocation) {
        debug!("Invoking {}.{}", invocation.binding, invocation.method);
        let result = self
            .runtime
            .invoke_global(&invocation.binding, &invocation.method, &invocation.args);
        if invocation.reply.send(result).is_err() {
            warn!(
                "Caller of {}.{} went away before the reply",
                invocation.binding, invocation.method
            );
        }
    }

    fn drain_invocations(&mut self) -> usize {
        let mut handled = 0;
        loop {
            match self.rx.try_recv() {
                Ok(invocation) => {
                    self.execute(invocation);
                    handled += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.handles_gone = true;
                    break;
                }
            }
        }
        handled
    }

    /// One loop iteration: execute queued invocations, run the scheduler
    /// until idle, then wait at most `max_wait` for the next event. Returns
    /// the number of invocations and tasks executed.
    pub fn turn(&mut self, max_wait: Duration) -> usize {
        let mut handled = self.drain_invocations();
        handled += self.runtime.run_till_no_more_tasks();

        let wait = match self.runtime.next_deadline() {
            Some(deadline) => deadline.saturating_duration_since(Instant::now()).min(max_wait),
            None => max_wait,
        };
        if wait.is_zero() {
            return handled;
        }
        if self.handles_gone {
            thread::sleep(wait);
            return handled;
        }
        select! {
            recv(self.rx) -> msg => match msg {
                Ok(invocation) => {
                    self.execute(invocation);
                    handled += 1;
                }
                Err(_) => self.handles_gone = true,
            },
            default(wait) => {}
        }
        handled
    }

    /// Drive the runtime forever.
    pub fn run(mut self) -> ! {
        loop {
            self.turn(IDLE_WAIT);
        }
    }
}

impl RuntimeInvoker for RuntimeHandle {
    fn invoke(&self, binding: &str, method: &str, args: Vec<Value>) -> Result<()> {
        let (reply_tx, reply_rx) = bounded(1);
        let invocation = Invocation {
            binding: binding.to_string(),
            method: method.to_string(),
            args,
            reply: reply_tx,
        };
        self.tx
            .send(invocation)
            .map_err(|_| BridgeError::BridgeUnavailable("runtime driver is not running".to_string()))?;

        match reply_rx.recv() {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(BridgeError::BridgeUnavailable(format!(
                "{}.{} failed: {}",
                binding, method, e
            ))),
            Err(_) => Err(BridgeError::BridgeUnavailable(format!(
                "runtime driver stopped before {}.{} returned",
                binding, method
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::scheduler::Scope;
    use crate::runtime::script::ScriptObject;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counter(Arc<AtomicUsize>);

    impl ScriptObject for Counter {
        fn invoke(&mut self, method: &str, _args: &[Value], scope: &mut Scope<'_>) -> Result<(), ScriptError> {
            if method != "bump" {
                return Err(ScriptError::UnknownMethod(method.to_string()));
            }
            let hits = Arc::clone(&self.0);
            scope.spawn(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            });
            Ok(())
        }
    }

    #[test]
    fn handle_calls_are_executed_on_the_driver_thread() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut runtime = ScriptRuntime::new();
        runtime.set_global("counter", Box::new(Counter(Arc::clone(&hits))));
        let (mut driver, handle) = RuntimeDriver::new(runtime);

        let caller = thread::spawn(move || {
            let ok = handle.invoke("counter", "bump", vec![json!(1)]);
            let missing = handle.invoke("nobody", "bump", vec![]);
            let thrown = handle.invoke("counter", "explode", vec![]);
            (ok, missing, thrown)
        });

        while !caller.is_finished() {
            driver.turn(Duration::from_millis(10));
        }
        driver.turn(Duration::from_millis(1));

        let (ok, missing, thrown) = caller.join().unwrap();
        assert!(ok.is_ok());
        assert!(matches!(missing, Err(BridgeError::BridgeUnavailable(_))));
        assert!(matches!(thrown, Err(BridgeError::BridgeUnavailable(_))));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropped_driver_makes_the_bridge_unavailable() {
        let (driver, handle) = RuntimeDriver::new(ScriptRuntime::new());
        drop(driver);
        assert!(matches!(
            handle.invoke("tradesDataBroker", "watchTrades", vec![json!("GATEIO")]),
            Err(BridgeError::BridgeUnavailable(_))
        ));
    }
}
