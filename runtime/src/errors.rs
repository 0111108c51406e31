//! Error taxonomy for the traversal engine.

use std::fmt;
use traverse_core::PoolError;

/// A cooperative "stop exploring this branch" signal raised by an action.
/// Not an error: the state-entry path catches it and converts it to a
/// `Deny` observer notification. Kept as its own tiny type (rather than a
/// variant of [`EngineError`]) so action signatures can return
/// `Result<(), FlowControl>` without pulling in the rest of the taxonomy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlowControl;

/// Errors the engine itself can raise. Everything here except the pool
/// variants is a [`LogicViolation`](EngineError::LogicViolation) or a
/// [`Variable`](crate::variable) coercion/arithmetic failure.
#[derive(Debug)]
pub enum EngineError {
    /// Dynamic-type coercion failed.
    BadCast { from: &'static str, to: &'static str },
    /// `%` or `/` with a zero divisor.
    DivisionByZero,
    /// Relational operator applied to incompatible types.
    IncomparableOperands,
    /// The arena backing this run is exhausted.
    PoolExhausted(PoolError),
    /// An internal invariant was violated; indicates a bug in the engine
    /// or in an external collaborator (acceptor/action), not in the input.
    LogicViolation(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::BadCast { from, to } => write!(f, "cannot coerce {from} to {to}"),
            EngineError::DivisionByZero => write!(f, "division by zero"),
            EngineError::IncomparableOperands => {
                write!(f, "comparison between incompatible operand types")
            }
            EngineError::PoolExhausted(e) => write!(f, "pool exhausted: {e}"),
            EngineError::LogicViolation(msg) => write!(f, "logic violation: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::PoolExhausted(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PoolError> for EngineError {
    fn from(e: PoolError) -> Self {
        EngineError::PoolExhausted(e)
    }
}
