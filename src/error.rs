//! Error taxonomy for server state checks.

use thiserror::Error;

use crate::source::SourceError;

/// Errors a check can raise.
///
/// Nothing is recovered internally; every variant propagates to the caller,
/// and the CLI translates any of them into a non-zero exit. Note that a
/// drain check running out of retry budget is *not* an error; see
/// [`DrainOutcome::TimedOut`](crate::check::DrainOutcome).
#[derive(Debug, Error)]
pub enum CheckError {
    /// No row in the snapshot matched the requested backend. Raised by both
    /// check policies, at any iteration of the drain poll.
    #[error("Server status not found for {0}")]
    ServerNotFound(String),

    /// The ready check found rows that are not in the `UP` state.
    #[error("{invalid} of {total} {backend} servers are not enabled")]
    ServerNotEnabled {
        /// Rows not in the `UP` state.
        invalid: usize,
        /// Total rows reporting for the backend.
        total: usize,
        /// The backend identity that was checked.
        backend: String,
    },

    /// The drain check found the server still in the ready state before
    /// polling began. A usage-precondition violation, never retried: take
    /// the server out of rotation first.
    #[error("Server {0} must not be in ready state")]
    ServerNotDrained(String),

    /// Transport or parse failure from the stats source.
    #[error(transparent)]
    Source(#[from] SourceError),
}
