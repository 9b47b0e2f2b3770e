use thiserror::Error;

/// Errors that can arise while building a ball tree.
///
/// Usage errors are recoverable at the call site (`main` reports them and
/// exits with a specific code); MPI and invariant errors are fatal, per the
/// error taxonomy: there is no retry semantics for a distributed collective
/// that has already partially completed.
#[derive(Debug, Error)]
pub enum BallTreeError {
    /// Bad CLI invocation. Carries the exit code the caller must use.
    #[error("{message}")]
    Usage { message: String, exit_code: i32 },

    /// A message-passing collective or point-to-point operation failed.
    #[error("MPI transport error: {0}")]
    Mpi(String),

    /// A structural invariant was violated (e.g. `r < l` on entry, or a
    /// projection count mismatch after redistribution). Debug builds assert
    /// on these as soon as they're detected; this variant exists so release
    /// builds have somewhere to propagate the condition instead of reading
    /// out of bounds.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, BallTreeError>;
