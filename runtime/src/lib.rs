//! traverse-runtime: the trace-variable model and traversal engine that
//! drives a [`traverse_core::Network`] to completion over an input range.
//!
//! Built on top of `traverse_core`'s arena and static graph shape, this
//! crate owns everything that changes per-run: the state graph a traversal
//! builds as it explores ([`state`]), the dynamic value and scoped
//! trace-variable map actions operate on ([`variable`], [`context`]), the
//! optional semantic actions themselves ([`action`]), the event sink a
//! caller plugs in for diagnostics ([`observer`]), and the engine that ties
//! all of it together ([`processor`]).
//!
//! # Modules
//!
//! - `variable`: the dynamic tagged value (`Variable`) and its coercions
//! - `context`: ancestor-chained trace-variable scoping (`Context`)
//! - `state`: the state graph (`StateKind`, `State`, `StateRef`)
//! - `action`: semantic actions run on state entry
//! - `observer`: the run's event sink (`Event`, `Observer`)
//! - `processor`: the traversal engine (`Processor`)
//! - `errors`: `EngineError`, `FlowControl`

pub mod action;
pub mod context;
pub mod errors;
pub mod observer;
pub mod processor;
pub mod state;
pub mod variable;

pub use action::{Action, ActionContext};
pub use context::{Context, ContextRef};
pub use errors::{EngineError, FlowControl};
pub use observer::{CountingObserver, Event, NullObserver, Observer};
pub use processor::Processor;
pub use state::{State, StateKind, StateRef};
pub use variable::{TypeId, Variable};
