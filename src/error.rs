//! Error taxonomy shared by the relational engine, the FD solver, and the SLG
//! tabling engine.
//!
//! Errors are values, not types: a single flat enum covers every fallible
//! public entry point in the crate. Propagation and search recover locally
//! from [`Error::Inconsistent`] / [`Error::DomainEmpty`] by backtracking;
//! [`Error::Cancelled`] and [`Error::SearchLimitReached`] bubble up to the
//! caller together with whatever partial result was available;
//! [`Error::InvalidArgument`] aborts the operation immediately.
use thiserror::Error;

/// Crate-wide result alias for fallible public operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Propagation or a global constraint found no feasible assignment.
    /// Recoverable only by backtracking.
    #[error("constraint store is inconsistent")]
    Inconsistent,

    /// A specific variable's domain became empty. Same recovery class as
    /// `Inconsistent`, used on the low-level propagation path.
    #[error("domain of variable {0} became empty")]
    DomainEmpty(usize),

    /// Node limit or cancellation cut search short.
    #[error("search limit reached")]
    SearchLimitReached,

    /// SLG fixpoint iteration exceeded the configured maximum; a bug signal
    /// rather than an expected outcome.
    #[error("SLG fixpoint computation diverged after {0} iterations")]
    FixpointDiverged(u32),

    /// Malformed constraint or request: size mismatch, negative capacity,
    /// an out-of-range state/symbol, a nil variable, etc. Never recovered
    /// internally.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation's `Context` was cancelled.
    #[error("operation was cancelled")]
    Cancelled,
}

impl Error {
    pub fn is_recoverable_by_backtracking(&self) -> bool {
        matches!(self, Error::Inconsistent | Error::DomainEmpty(_))
    }
}

/// Low-level propagation result. Propagation probes run in the hottest loop
/// of the whole engine (one call per dirty variable per constraint); a unit
/// error avoids allocating/formatting a full [`Error`] on every arc-consistency
/// check. The public boundary (`propagate`, `Model::solve`, ...) converts a
/// `PropagationFailed` into `Error::Inconsistent`. Mirrors the distilled
/// unification path's own `Result<State, ()>` convention.
pub type PropagationResult<T> = std::result::Result<T, PropagationFailed>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropagationFailed;

impl From<PropagationFailed> for Error {
    fn from(_: PropagationFailed) -> Error {
        Error::Inconsistent
    }
}
