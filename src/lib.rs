//! # drainwatch
//!
//! A deployment-gate tool for HAProxy backend servers.
//!
//! drainwatch answers two questions about a single named backend server,
//! using HAProxy's runtime statistics:
//!
//! - **Ready check**: is every reporting row for the server `UP`?
//! - **Drain check**: has the server's active session count reached zero,
//!   polling with a bounded retry budget?
//!
//! It is built for automation: a failed check exits non-zero, so a deploy
//! pipeline can gate a server shutdown on its traffic having drained.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  ┌─────────┐      ┌───────────────┐      ┌───────────┐   │
//! │  │  check  │─────▶│ StatsSnapshot │◀─────│  source   │   │
//! │  │(policy) │      │  (extract)    │      │  (fetch)  │   │
//! │  └────┬────┘      └───────────────┘      └───────────┘   │
//! │       │                                        ▲         │
//! │       ▼                                        │         │
//! │  Report / Sleep         SocketSource | FileSource |      │
//! │  (injected sinks)       ScriptedSource                   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: the fetch boundary ([`StatsSource`] trait) with
//!   implementations for the HAProxy admin socket, CSV dump files, and
//!   scripted in-memory sequences for tests
//! - **[`check`]**: the two check policies ([`ServerCheck`]), the retry
//!   policy for the drain poll loop, and the report sink the status lines
//!   go through
//! - **[`error`]**: the error taxonomy ([`CheckError`])
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Gate a deploy on the server being back in rotation
//! drainwatch --backend web01 --ready
//!
//! # Gate a shutdown on traffic having drained
//! drainwatch --backend web01 --drain
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use drainwatch::{RetryPolicy, ServerCheck, SocketSource};
//!
//! let source = Box::new(SocketSource::new("/var/run/haproxy.sock"));
//! let mut check = ServerCheck::new(source, "web01");
//! check.check_drained(&RetryPolicy::default())?;
//! # Ok::<(), drainwatch::CheckError>(())
//! ```
//!
//! ### With a scripted source (tests, dry runs)
//!
//! ```
//! use drainwatch::{ScriptedSource, ServerCheck};
//!
//! let csv = "svname,status,scur\nweb01,UP,3\n";
//! let source = ScriptedSource::from_csv(&[csv]).unwrap();
//! let mut check = ServerCheck::new(Box::new(source), "web01");
//! assert!(check.check_enabled().is_ok());
//! ```

pub mod check;
pub mod error;
pub mod source;

// Re-export main types for convenience
pub use check::{
    DrainOutcome, MemoryReport, RecordingSleep, Report, RetryPolicy, ServerCheck, Sleep,
    StdoutReport, ThreadSleep, ENABLED,
};
pub use error::CheckError;
pub use source::{
    FileSource, ScriptedSource, SocketSource, SourceError, StatRow, StatsSnapshot, StatsSource,
};
