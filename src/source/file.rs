//! File-based stats source.
//!
//! Reads a stats CSV dump from disk. Useful for running a check against a
//! captured `show stat` output without a live HAProxy.

use std::fs;
use std::path::{Path, PathBuf};

use super::{SourceError, StatsSnapshot, StatsSource};

/// A stats source that reads snapshots from a CSV dump file.
///
/// The file is re-read on every fetch so a drain check polling the source
/// always sees the file's current contents.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
}

impl FileSource {
    /// Create a file source for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self { path, description }
    }

    /// Returns the path being read.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StatsSource for FileSource {
    fn fetch(&mut self) -> Result<StatsSnapshot, SourceError> {
        let content = fs::read_to_string(&self.path)?;
        StatsSnapshot::parse(&content)
    }

    fn description(&self) -> &str {
        &self.description
    }
}
