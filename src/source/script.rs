//! Scripted stats source.
//!
//! Returns a prepared sequence of snapshots, one per fetch. This is the
//! seam that lets the check policies be exercised against canned state
//! transitions without a live HAProxy, and without real wall-clock time.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{SourceError, StatsSnapshot, StatsSource};

/// A stats source that replays a prepared sequence of snapshots.
///
/// Each fetch pops the next snapshot from the queue; fetching past the end
/// is a [`SourceError::Exhausted`]. The fetch counter is shared through
/// [`ScriptedSource::fetch_count`], so a test can hand the source to a
/// check and still assert how many external queries the check performed.
#[derive(Debug)]
pub struct ScriptedSource {
    snapshots: VecDeque<StatsSnapshot>,
    fetches: Arc<AtomicUsize>,
}

impl ScriptedSource {
    /// Create a source that returns `snapshots` in order, one per fetch.
    pub fn new(snapshots: Vec<StatsSnapshot>) -> Self {
        Self {
            snapshots: snapshots.into(),
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a source from raw `show stat` CSV texts, one per fetch.
    pub fn from_csv(texts: &[&str]) -> Result<Self, SourceError> {
        let snapshots = texts
            .iter()
            .map(|text| StatsSnapshot::parse(text))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(snapshots))
    }

    /// Shared handle to the number of fetches performed so far.
    pub fn fetch_count(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.fetches)
    }

    /// Number of snapshots left in the queue.
    pub fn remaining(&self) -> usize {
        self.snapshots.len()
    }
}

impl StatsSource for ScriptedSource {
    fn fetch(&mut self) -> Result<StatsSnapshot, SourceError> {
        let fetches = self.fetches.fetch_add(1, Ordering::Relaxed) + 1;
        self.snapshots
            .pop_front()
            .ok_or(SourceError::Exhausted(fetches))
    }

    fn description(&self) -> &str {
        "scripted"
    }
}
