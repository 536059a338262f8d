//! Stats source abstraction for fetching HAProxy state snapshots.
//!
//! This module provides a trait-based abstraction for obtaining point-in-time
//! snapshots of HAProxy's runtime statistics from various sources (the admin
//! socket, CSV dump files, or scripted in-memory sequences).

mod file;
mod script;
mod snapshot;
mod socket;

pub use file::FileSource;
pub use script::ScriptedSource;
pub use snapshot::{StatRow, StatsSnapshot};
pub use socket::SocketSource;

use std::fmt::Debug;

use thiserror::Error;

/// Errors that can occur while fetching or parsing a stats snapshot.
///
/// These carry no check-level meaning; the check policies propagate them
/// unchanged as a generic fetch failure.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to reach the stats source (spawn, read, or write failure).
    #[error("Failed to query stats source: {0}")]
    Io(#[from] std::io::Error),

    /// The external stats command ran but exited unsuccessfully.
    #[error("Stats command failed ({status}): {stderr}")]
    Command {
        status: std::process::ExitStatus,
        stderr: String,
    },

    /// The stats output was not valid UTF-8.
    #[error("Stats output was not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// The stats output was not a usable stats table.
    #[error("Malformed stats output: {0}")]
    Parse(String),

    /// A scripted source had no snapshot left to return.
    #[error("Scripted source exhausted after {0} fetches")]
    Exhausted(usize),
}

/// Trait for fetching HAProxy stats snapshots.
///
/// Implementations perform one external query per call and return a fresh
/// [`StatsSnapshot`]; nothing is cached between calls. Fetching is neither
/// free nor instantaneous, so callers should not fetch more often than they
/// need. Retrying is the caller's concern, never the source's.
///
/// # Example
///
/// ```
/// use drainwatch::{ScriptedSource, StatsSource};
///
/// let mut source = ScriptedSource::from_csv(&["svname,status,scur\nweb01,UP,0\n"]).unwrap();
/// let snapshot = source.fetch().unwrap();
/// assert_eq!(snapshot.len(), 1);
/// ```
pub trait StatsSource: Send + Debug {
    /// Fetch a fresh snapshot of all reporting entities.
    fn fetch(&mut self) -> Result<StatsSnapshot, SourceError>;

    /// Returns a human-readable description of the source.
    ///
    /// Used in diagnostics to say where a check's data came from.
    fn description(&self) -> &str;
}
