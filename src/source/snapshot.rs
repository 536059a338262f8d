//! Stats snapshot type and its row-level views.
//!
//! The wire format is the comma-separated table HAProxy prints for
//! `show stat`: a header row naming the fields (optionally prefixed with a
//! `# ` marker) followed by one row per reporting entity. Only three fields
//! matter here: `svname` (entity name), `status` (state label) and `scur`
//! (current session count).

use serde::Deserialize;

use super::SourceError;

/// Fields a usable stats table must name in its header row.
const REQUIRED_FIELDS: [&str; 3] = ["svname", "status", "scur"];

/// One reporting row of the stats table.
///
/// A backend server may appear as several rows (one per process or listener);
/// all rows with the same `svname` belong to the same logical server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatRow {
    /// Name of the reporting entity, as matched against the check target.
    pub svname: String,
    /// Status label, e.g. `UP`, `DRAIN`, `MAINT`.
    pub status: String,
    /// Current session count.
    pub scur: u64,
}

/// A point-in-time snapshot of HAProxy server state.
///
/// Built fresh on every fetch and discarded after extraction; nothing is
/// cached or accumulated across snapshots.
#[derive(Debug, Clone, Default)]
pub struct StatsSnapshot {
    rows: Vec<StatRow>,
}

impl StatsSnapshot {
    /// Build a snapshot from already-parsed rows.
    pub fn from_rows(rows: Vec<StatRow>) -> Self {
        Self { rows }
    }

    /// Parse the CSV text produced by `show stat`.
    ///
    /// The first row must be a header naming at least `svname`, `status`
    /// and `scur`; a leading `#` marker on it is tolerated. Data rows that
    /// are missing fields or carry an unparsable session count are silently
    /// skipped, so comment artifacts in the table do not fail the fetch.
    pub fn parse(text: &str) -> Result<Self, SourceError> {
        // Drop the "# " marker HAProxy puts on the header row.
        let text = text
            .strip_prefix('#')
            .map(str::trim_start)
            .unwrap_or(text);

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| SourceError::Parse(e.to_string()))?;
        for field in REQUIRED_FIELDS {
            if !headers.iter().any(|h| h == field) {
                return Err(SourceError::Parse(format!(
                    "stats header is missing the {field} field"
                )));
            }
        }

        let rows = reader
            .deserialize::<StatRow>()
            .filter_map(Result::ok)
            .collect();

        Ok(Self { rows })
    }

    /// All rows, in table order.
    pub fn rows(&self) -> &[StatRow] {
        &self.rows
    }

    /// Number of rows in the snapshot.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the snapshot has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Status labels of every row whose `svname` equals `identity`, in row
    /// order. An empty result means the server is not in the snapshot.
    pub fn statuses_for(&self, identity: &str) -> Vec<&str> {
        self.rows
            .iter()
            .filter(|row| row.svname == identity)
            .map(|row| row.status.as_str())
            .collect()
    }

    /// Sum of current sessions across every row whose `svname` equals
    /// `identity`.
    ///
    /// Returns `None` when no row matches; `Some(0)` is a meaningful result
    /// (the server exists and has drained), distinct from not found.
    pub fn sessions_for(&self, identity: &str) -> Option<u64> {
        let mut found = false;
        let total = self
            .rows
            .iter()
            .filter(|row| row.svname == identity)
            .map(|row| {
                found = true;
                row.scur
            })
            .sum();
        found.then_some(total)
    }
}
