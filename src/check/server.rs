//! The two check policies: ready (enabled) and drain.
//!
//! Both policies work from repeated fresh snapshots of one named backend
//! server. A server may report as several rows; the ready check requires
//! every row to be `UP`, and the drain check sums sessions across rows.

use crate::error::CheckError;
use crate::source::StatsSource;

use super::report::{Report, StdoutReport};
use super::retry::{RetryPolicy, Sleep, ThreadSleep};

/// Status label of a server that is in rotation and receiving traffic.
pub const ENABLED: &str = "UP";

/// How a drain check that did not error came out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Session count reached zero within the retry budget.
    Drained {
        /// Highest session count observed across the poll iterations.
        max_sessions: u64,
        /// Poll iterations consumed before the zero reading.
        iterations: u32,
    },
    /// Retry budget exhausted with sessions still active. Deliberately not
    /// an error: the shutdown this check gates proceeds regardless, and the
    /// report line says so.
    TimedOut,
}

/// Checks the state of one named backend server.
///
/// Owns the stats source it polls, the backend identity (immutable for the
/// check's lifetime), and the injected report and sleep capabilities. Every
/// status or session read fetches a fresh snapshot through the source.
///
/// # Example
///
/// ```
/// use drainwatch::{ScriptedSource, ServerCheck};
///
/// let source = ScriptedSource::from_csv(&["svname,status,scur\nweb01,UP,4\n"]).unwrap();
/// let mut check = ServerCheck::new(Box::new(source), "web01");
/// assert!(check.check_enabled().is_ok());
/// ```
#[derive(Debug)]
pub struct ServerCheck {
    source: Box<dyn StatsSource>,
    backend: String,
    report: Box<dyn Report>,
    sleep: Box<dyn Sleep>,
}

impl ServerCheck {
    /// Create a check for `backend`, reporting to stdout and sleeping for
    /// real between drain polls.
    pub fn new(source: Box<dyn StatsSource>, backend: impl Into<String>) -> Self {
        Self {
            source,
            backend: backend.into(),
            report: Box::new(StdoutReport),
            sleep: Box::new(ThreadSleep),
        }
    }

    /// Replace the report sink.
    pub fn with_report(mut self, report: Box<dyn Report>) -> Self {
        self.report = report;
        self
    }

    /// Replace the sleep capability.
    pub fn with_sleep(mut self, sleep: Box<dyn Sleep>) -> Self {
        self.sleep = sleep;
        self
    }

    /// The backend identity this check targets.
    pub fn backend(&self) -> &str {
        &self.backend
    }

    /// Fetch a fresh snapshot and extract the backend's status labels.
    fn statuses(&mut self) -> Result<Vec<String>, CheckError> {
        let snapshot = self.source.fetch()?;
        let statuses: Vec<String> = snapshot
            .statuses_for(&self.backend)
            .into_iter()
            .map(str::to_owned)
            .collect();
        if statuses.is_empty() {
            return Err(CheckError::ServerNotFound(self.backend.clone()));
        }
        Ok(statuses)
    }

    /// Fetch a fresh snapshot and extract the backend's session count.
    fn sessions(&mut self) -> Result<u64, CheckError> {
        let snapshot = self.source.fetch()?;
        snapshot
            .sessions_for(&self.backend)
            .ok_or_else(|| CheckError::ServerNotFound(self.backend.clone()))
    }

    /// Ready check: every reporting row for the backend must be `UP`.
    ///
    /// Each row in any other state is reported individually before the
    /// aggregate [`CheckError::ServerNotEnabled`] is raised, so operators
    /// see which rows were problematic. No partial success: one bad row
    /// fails the whole check.
    pub fn check_enabled(&mut self) -> Result<(), CheckError> {
        let statuses = self.statuses()?;
        let total = statuses.len();

        let mut invalid = 0;
        for status in &statuses {
            if status != ENABLED {
                invalid += 1;
                let line = format!("ERROR: Server {} status is {}", self.backend, status);
                self.report.line(&line);
            }
        }

        if invalid > 0 {
            return Err(CheckError::ServerNotEnabled {
                invalid,
                total,
                backend: self.backend.clone(),
            });
        }

        self.report
            .line(&format!("{total} of {total} {} servers are enabled", self.backend));
        Ok(())
    }

    /// Drain check: poll until the backend's session count reaches zero or
    /// the retry budget runs out.
    ///
    /// Precondition: no row may be `UP`; this check never takes a server
    /// out of rotation itself, it only watches one that already is. The
    /// precondition is checked against the initial snapshot only; a server
    /// put back in rotation mid-poll is not detected.
    ///
    /// Running out of budget is an `Ok` outcome ([`DrainOutcome::TimedOut`]),
    /// not an error: the shutdown proceeds even when draining could not be
    /// confirmed in time.
    pub fn check_drained(&mut self, policy: &RetryPolicy) -> Result<DrainOutcome, CheckError> {
        let statuses = self.statuses()?;
        if statuses.iter().any(|status| status == ENABLED) {
            return Err(CheckError::ServerNotDrained(self.backend.clone()));
        }

        let mut max_sessions = 0;
        let mut loop_count = 0;
        while loop_count <= policy.loop_for {
            let current = self.sessions()?;
            max_sessions = max_sessions.max(current);

            if current == 0 {
                break;
            }

            loop_count += 1;
            tracing::debug!(
                backend = %self.backend,
                sessions = current,
                iteration = loop_count,
                "Backend still has active sessions"
            );
            self.report.line(&format!(
                "{} Sessions found, sleeping for {} seconds",
                current, policy.sleep_for
            ));
            self.sleep.sleep(policy.sleep_for);
        }

        if loop_count <= policy.loop_for {
            self.report.line(&format!(
                "{} Sessions Drained over {}(+/-{}) seconds",
                max_sessions,
                policy.elapsed(loop_count),
                policy.sleep_for
            ));
            Ok(DrainOutcome::Drained {
                max_sessions,
                iterations: loop_count,
            })
        } else {
            self.report.line(&format!(
                "Found active sessions after {} seconds, shutdown anyway",
                policy.budget()
            ));
            Ok(DrainOutcome::TimedOut)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::check::report::MemoryReport;
    use crate::check::retry::RecordingSleep;
    use crate::source::ScriptedSource;

    const BACKEND: &str = "my-server-backend-name";

    /// Build a `show stat` CSV text from (svname, status, scur) rows.
    fn stats(rows: &[(&str, &str, u64)]) -> String {
        let mut text = String::from("# pxname,svname,qcur,qmax,scur,status\n");
        for (svname, status, scur) in rows {
            text.push_str(&format!("ig-business,{svname},0,0,{scur},{status}\n"));
        }
        text
    }

    /// A check over scripted snapshots, with the report, sleep record and
    /// fetch counter handles a test needs for assertions.
    fn scripted_check(
        snapshots: &[String],
    ) -> (
        ServerCheck,
        MemoryReport,
        RecordingSleep,
        std::sync::Arc<std::sync::atomic::AtomicUsize>,
    ) {
        let texts: Vec<&str> = snapshots.iter().map(String::as_str).collect();
        let source = ScriptedSource::from_csv(&texts).unwrap();
        let fetches = source.fetch_count();
        let report = MemoryReport::new();
        let sleep = RecordingSleep::new();
        let check = ServerCheck::new(Box::new(source), BACKEND)
            .with_report(Box::new(report.clone()))
            .with_sleep(Box::new(sleep.clone()));
        (check, report, sleep, fetches)
    }

    #[test]
    fn test_enabled_server_not_found() {
        let (mut check, report, _, fetches) =
            scripted_check(&[stats(&[("ARandomBackend", "UP", 0)])]);

        let err = check.check_enabled().unwrap_err();
        assert_eq!(err.to_string(), format!("Server status not found for {BACKEND}"));
        assert_eq!(fetches.load(Ordering::Relaxed), 1);
        assert!(report.lines().is_empty());
    }

    #[test]
    fn test_enabled_single_row_up() {
        let (mut check, report, _, _) = scripted_check(&[stats(&[(BACKEND, "UP", 0)])]);

        check.check_enabled().unwrap();
        assert_eq!(
            report.last().unwrap(),
            format!("1 of 1 {BACKEND} servers are enabled")
        );
    }

    #[test]
    fn test_enabled_all_rows_up() {
        let (mut check, report, _, _) =
            scripted_check(&[stats(&[(BACKEND, "UP", 0), (BACKEND, "UP", 3)])]);

        check.check_enabled().unwrap();
        assert_eq!(
            report.last().unwrap(),
            format!("2 of 2 {BACKEND} servers are enabled")
        );
    }

    #[test]
    fn test_enabled_reports_each_invalid_row_then_fails() {
        let (mut check, report, _, _) =
            scripted_check(&[stats(&[(BACKEND, "UP", 0), (BACKEND, "MAINT", 0)])]);

        let err = check.check_enabled().unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("1 of 2 {BACKEND} servers are not enabled")
        );
        // The offending row was reported individually before the failure.
        assert_eq!(
            report.lines(),
            vec![format!("ERROR: Server {BACKEND} status is MAINT")]
        );
    }

    #[test]
    fn test_enabled_reports_every_invalid_row() {
        let (mut check, report, _, _) = scripted_check(&[stats(&[
            (BACKEND, "DRAIN", 1),
            (BACKEND, "UP", 0),
            (BACKEND, "MAINT", 0),
        ])]);

        let err = check.check_enabled().unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("2 of 3 {BACKEND} servers are not enabled")
        );
        assert_eq!(
            report.lines(),
            vec![
                format!("ERROR: Server {BACKEND} status is DRAIN"),
                format!("ERROR: Server {BACKEND} status is MAINT"),
            ]
        );
    }

    #[test]
    fn test_drain_server_not_found() {
        let (mut check, _, _, fetches) =
            scripted_check(&[stats(&[("ARandomBackendServer", "UP", 0)])]);

        let err = check
            .check_drained(&RetryPolicy::default())
            .unwrap_err();
        assert_eq!(err.to_string(), format!("Server status not found for {BACKEND}"));
        assert_eq!(fetches.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_drain_rejects_server_still_in_ready_state() {
        let (mut check, _, sleep, fetches) =
            scripted_check(&[stats(&[(BACKEND, "DRAIN", 0), (BACKEND, "UP", 0)])]);

        let err = check
            .check_drained(&RetryPolicy::default())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("Server {BACKEND} must not be in ready state")
        );
        // Precondition failure means no polling happened at all.
        assert_eq!(fetches.load(Ordering::Relaxed), 1);
        assert!(sleep.slept().is_empty());
    }

    #[test]
    fn test_drain_counts_down_to_zero() {
        // Status snapshot, then session counts 2, 1, 0.
        let snapshots = [
            stats(&[(BACKEND, "DRAIN", 2), (BACKEND, "MAINT", 0)]),
            stats(&[(BACKEND, "DRAIN", 2), (BACKEND, "MAINT", 0)]),
            stats(&[(BACKEND, "DRAIN", 1), (BACKEND, "MAINT", 0)]),
            stats(&[(BACKEND, "DRAIN", 0), (BACKEND, "MAINT", 0)]),
        ];
        let (mut check, report, sleep, fetches) = scripted_check(&snapshots);

        let outcome = check
            .check_drained(&RetryPolicy::new(0.001, 15))
            .unwrap();
        assert_eq!(
            outcome,
            DrainOutcome::Drained {
                max_sessions: 2,
                iterations: 2
            }
        );
        assert_eq!(
            report.last().unwrap(),
            "2 Sessions Drained over 0.002(+/-0.001) seconds"
        );
        assert_eq!(
            report.lines()[..2],
            [
                "2 Sessions found, sleeping for 0.001 seconds".to_string(),
                "1 Sessions found, sleeping for 0.001 seconds".to_string(),
            ]
        );
        // One status fetch plus three session fetches; the remaining
        // retry budget was not consumed.
        assert_eq!(fetches.load(Ordering::Relaxed), 4);
        assert_eq!(sleep.slept(), vec![0.001, 0.001]);
    }

    #[test]
    fn test_drain_already_at_zero() {
        let snapshots = [
            stats(&[(BACKEND, "MAINT", 0)]),
            stats(&[(BACKEND, "MAINT", 0)]),
        ];
        let (mut check, report, sleep, fetches) = scripted_check(&snapshots);

        let outcome = check.check_drained(&RetryPolicy::default()).unwrap();
        assert_eq!(
            outcome,
            DrainOutcome::Drained {
                max_sessions: 0,
                iterations: 0
            }
        );
        assert_eq!(
            report.last().unwrap(),
            "0 Sessions Drained over 0(+/-20) seconds"
        );
        assert_eq!(fetches.load(Ordering::Relaxed), 2);
        assert!(sleep.slept().is_empty());
    }

    #[test]
    fn test_drain_budget_exhausted_is_not_an_error() {
        // Never reaches zero: loop_for=2 allows three session fetches.
        let snapshots = [
            stats(&[(BACKEND, "DRAIN", 2)]),
            stats(&[(BACKEND, "DRAIN", 2)]),
            stats(&[(BACKEND, "DRAIN", 1)]),
            stats(&[(BACKEND, "DRAIN", 1)]),
        ];
        let (mut check, report, sleep, fetches) = scripted_check(&snapshots);

        let outcome = check
            .check_drained(&RetryPolicy::new(0.001, 2))
            .unwrap();
        assert_eq!(outcome, DrainOutcome::TimedOut);
        assert_eq!(
            report.last().unwrap(),
            "Found active sessions after 0.002 seconds, shutdown anyway"
        );
        assert_eq!(fetches.load(Ordering::Relaxed), 4);
        assert_eq!(sleep.slept().len(), 3);
    }

    #[test]
    fn test_drain_server_disappears_mid_poll() {
        let snapshots = [
            stats(&[(BACKEND, "DRAIN", 2)]),
            stats(&[(BACKEND, "DRAIN", 1)]),
            stats(&[("SomeOtherServer", "UP", 0)]),
        ];
        let (mut check, _, _, fetches) = scripted_check(&snapshots);

        let err = check
            .check_drained(&RetryPolicy::new(0.001, 15))
            .unwrap_err();
        assert_eq!(err.to_string(), format!("Server status not found for {BACKEND}"));
        assert_eq!(fetches.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_drain_sums_sessions_across_rows() {
        let snapshots = [
            stats(&[(BACKEND, "DRAIN", 2), (BACKEND, "DRAIN", 3)]),
            stats(&[(BACKEND, "DRAIN", 2), (BACKEND, "DRAIN", 3)]),
            stats(&[(BACKEND, "DRAIN", 0), (BACKEND, "DRAIN", 0)]),
        ];
        let (mut check, report, _, _) = scripted_check(&snapshots);

        let outcome = check
            .check_drained(&RetryPolicy::new(0.001, 15))
            .unwrap();
        assert_eq!(
            outcome,
            DrainOutcome::Drained {
                max_sessions: 5,
                iterations: 1
            }
        );
        assert!(report
            .lines()
            .contains(&"5 Sessions found, sleeping for 0.001 seconds".to_string()));
    }

    #[test]
    fn test_source_failure_propagates() {
        // Queue runs dry mid-poll: the fetch failure surfaces unchanged.
        let snapshots = [
            stats(&[(BACKEND, "DRAIN", 2)]),
            stats(&[(BACKEND, "DRAIN", 1)]),
        ];
        let (mut check, _, _, _) = scripted_check(&snapshots);

        let err = check
            .check_drained(&RetryPolicy::new(0.001, 15))
            .unwrap_err();
        assert!(matches!(err, CheckError::Source(_)));
    }
}
