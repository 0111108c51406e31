//! traverse-core: the network representation and arena for a
//! nondeterministic network-traversal parsing engine.
//!
//! This crate holds the dependency-light foundation the traversal engine
//! (`traverse-runtime`) builds on: a tail-evicting bump arena ([`pool`]),
//! the static graph shape ([`node`], [`arc`], [`network`]), arc decorations
//! ([`label`]), and the interfaces external code implements to plug an
//! input grammar into the engine ([`acceptor`]).
//!
//! # Modules
//!
//! - `pool`: fixed-capacity arena with tail-only eviction
//! - `label`: composable arc decoration
//! - `acceptor`: the `Acceptor`/`Spectrum` consumed interfaces
//! - `arc`: `Arc`, `ArcType`
//! - `node`: `Node`, `NodeId`
//! - `network`: minimal concrete network container
//! - `errors`: `PoolError`

pub mod acceptor;
pub mod arc;
pub mod errors;
pub mod label;
pub mod network;
pub mod node;
pub mod pool;

pub use acceptor::{Acceptor, Range, Spectrum};
pub use arc::{Arc, ArcType};
pub use errors::PoolError;
pub use label::Label;
pub use network::Network;
pub use node::{Node, NodeId};
pub use pool::{Pool, PoolRef};
