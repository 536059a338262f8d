//! Check policies for backend server state.
//!
//! ## Submodules
//!
//! - [`report`]: the sink the user-facing status lines go through
//! - [`retry`]: the drain poll's retry policy and sleep capability
//! - [`server`]: the two check policies ([`ServerCheck`])
//!
//! ## Control flow
//!
//! ```text
//! ServerCheck::check_enabled      one fetch, per-row validation
//! ServerCheck::check_drained      precondition fetch, then a bounded
//!                                 fetch/sleep loop until sessions hit zero
//!                                 or the retry budget runs out
//! ```

pub mod report;
pub mod retry;
pub mod server;

pub use report::{MemoryReport, Report, StdoutReport};
pub use retry::{RecordingSleep, RetryPolicy, Sleep, ThreadSleep};
pub use server::{DrainOutcome, ServerCheck, ENABLED};
