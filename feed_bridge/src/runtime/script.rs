//! Script runtime: named global objects, the host binding and the scheduler.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use log::debug;
use serde_json::Value;
use thiserror::Error;

use super::scheduler::{Scheduler, Scope};
use crate::sink::StreamSink;

/// Error raised inside the runtime by a script call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// No global with this name exists.
    #[error("ReferenceError: {0} is not defined")]
    NotDefined(String),

    /// The object has no such method.
    #[error("TypeError: {0} is not a function")]
    UnknownMethod(String),

    /// Wrong number or type of arguments.
    #[error("TypeError: {0}")]
    TypeError(String),

    /// Any other error thrown by script code.
    #[error("Error: {0}")]
    Thrown(String),
}

/// An object reachable from script globals whose methods the host can call.
pub trait ScriptObject: Send {
    /// Call `method` with JSON-like arguments. Long-running work must be
    /// scheduled through `scope`, not done inline.
    fn invoke(&mut self, method: &str, args: &[Value], scope: &mut Scope<'_>) -> Result<(), ScriptError>;
}

/// Single-threaded, cooperatively scheduled script context.
///
/// The runtime is not synchronized: it is owned by one driver thread, and
/// other threads reach it only through a `RuntimeHandle`.
#[derive(Default)]
pub struct ScriptRuntime {
    globals: HashMap<String, Box<dyn ScriptObject>>,
    scheduler: Scheduler,
    host: Option<Arc<dyn StreamSink>>,
}

impl ScriptRuntime {
    /// Create an empty runtime with no globals and no host binding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the host callback table scripts push batches into.
    pub fn bind_host(&mut self, host: Arc<dyn StreamSink>) {
        self.host = Some(host);
    }

    /// Define or replace a global object.
    pub fn set_global(&mut self, name: &str, object: Box<dyn ScriptObject>) {
        debug!("Defining global {}", name);
        self.globals.insert(name.to_string(), object);
    }

    /// Remove a global object. Returns `true` if it existed.
    pub fn remove_global(&mut self, name: &str) -> bool {
        self.globals.remove(name).is_some()
    }

    /// Resolve the global `name` and call `method` on it synchronously.
    pub fn invoke_global(&mut self, name: &str, method: &str, args: &[Value]) -> Result<(), ScriptError> {
        let object = self
            .globals
            .get_mut(name)
            .ok_or_else(|| ScriptError::NotDefined(name.to_string()))?;
        let mut scope = self.scheduler.scope(self.host.as_ref(), Instant::now());
        object.invoke(method, args, &mut scope)
    }

    /// Run every task that is due now until none is runnable.
    pub fn run_till_no_more_tasks(&mut self) -> usize {
        self.run_due(Instant::now())
    }

    /// Run every task due at `now` until none is runnable.
    pub fn run_due(&mut self, now: Instant) -> usize {
        self.scheduler.run_till_no_more_tasks(now, self.host.as_ref())
    }

    /// Earliest instant at which a task becomes runnable.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// Number of armed timers.
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.pending()
    }
}

/// Extract the single string argument of a method taking `(name: string)`.
pub fn string_arg<'a>(method: &str, args: &'a [Value]) -> Result<&'a str, ScriptError> {
    match args {
        [Value::String(s)] => Ok(s),
        [other] => Err(ScriptError::TypeError(format!(
            "{} expects a string argument, got {}",
            method, other
        ))),
        _ => Err(ScriptError::TypeError(format!(
            "{} expects 1 argument, got {}",
            method,
            args.len()
        ))),
    }
}
