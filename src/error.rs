//! Crate `error` provides the engine's terminal-failure vocabulary.
use crate::sat::SatKind;
use std::fmt;

/// Every non-recoverable way the engine can fail to produce SAFE/UNSAFE.
///
/// There is no recovery path for any of these at the engine level: a SAT
/// call reporting UNKNOWN, or an internal invariant breaking, both abort the
/// run and propagate up to the caller as one of these variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CarError {
    /// A `solve(kind)` call returned neither SAT nor UNSAT.
    SolverUnknown { kind: SatKind },
    /// An internal assertion failed: a non-monotone frame, an empty unsat
    /// core where one was expected, a latch index out of range, and so on.
    InvariantViolation(String),
    /// Reserved for the adapter boundary; the engine itself never
    /// constructs this, but callers building a `TransitionSystem` can reuse
    /// the type rather than inventing a parallel error enum.
    InputMalformed(String),
    /// A solver allocation failed; surfaced verbatim.
    ResourceExhausted(String),
}

impl fmt::Display for CarError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CarError::SolverUnknown { kind } => {
                write!(f, "SAT solver returned UNKNOWN for a {:?} query", kind)
            }
            CarError::InvariantViolation(msg) => write!(f, "invariant violated: {}", msg),
            CarError::InputMalformed(msg) => write!(f, "malformed input: {}", msg),
            CarError::ResourceExhausted(msg) => write!(f, "resource exhausted: {}", msg),
        }
    }
}

impl std::error::Error for CarError {}

/// Shorthand for the engine's fallible operations.
pub type CarResult<T> = Result<T, CarError>;
