//! In-process cooperative script runtime.
//!
//! This is the foreign execution context the bridge talks to: a set of named
//! global objects, a host callback binding, and a single-threaded timer
//! scheduler. Everything runs on the thread that owns the `RuntimeDriver`:
//! - `scheduler` — timers, intervals and the run-until-idle pass.
//! - `script` — `ScriptRuntime`, the `ScriptObject` trait and `ScriptError`.
//! - `driver` — the never-ending driver loop and the cross-thread handle.

pub mod driver;
pub mod scheduler;
pub mod script;

pub use driver::{RuntimeDriver, RuntimeHandle};
pub use scheduler::{Scope, TimerId};
pub use script::{ScriptError, ScriptObject, ScriptRuntime};
