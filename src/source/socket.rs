//! Admin-socket stats source.
//!
//! Queries HAProxy's runtime API over its local admin socket by piping
//! `show stat` through socat. This is the live source the CLI uses by
//! default.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::{SourceError, StatsSnapshot, StatsSource};

/// A stats source backed by the HAProxy admin socket.
///
/// Every fetch spawns `socat <socket> stdio`, writes `show stat` to its
/// stdin and parses the CSV table it prints. There is no connection reuse;
/// each fetch is one external query. Privilege escalation is the caller's
/// concern: run the whole tool under sudo if the socket requires it.
#[derive(Debug)]
pub struct SocketSource {
    socket: PathBuf,
    description: String,
}

impl SocketSource {
    /// Where HAProxy's admin socket conventionally lives.
    pub const DEFAULT_SOCKET: &'static str = "/var/run/haproxy.sock";

    /// Create a source for the admin socket at `socket`.
    pub fn new<P: AsRef<Path>>(socket: P) -> Self {
        let socket = socket.as_ref().to_path_buf();
        let description = format!("socket: {}", socket.display());
        Self {
            socket,
            description,
        }
    }

    /// Returns the socket path being queried.
    pub fn socket(&self) -> &Path {
        &self.socket
    }

    /// Run `show stat` against the socket and capture its output.
    fn show_stat(&self) -> Result<String, SourceError> {
        let mut child = Command::new("socat")
            .arg(&self.socket)
            .arg("stdio")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Taking stdin drops it at scope end, which closes the pipe so
        // socat sees EOF and terminates.
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(b"show stat\n")?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(SourceError::Command {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8(output.stdout)?)
    }
}

impl Default for SocketSource {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SOCKET)
    }
}

impl StatsSource for SocketSource {
    fn fetch(&mut self) -> Result<StatsSnapshot, SourceError> {
        let text = self.show_stat()?;
        let snapshot = StatsSnapshot::parse(&text)?;
        tracing::debug!(
            socket = %self.socket.display(),
            rows = snapshot.len(),
            "Fetched stats snapshot"
        );
        Ok(snapshot)
    }

    fn description(&self) -> &str {
        &self.description
    }
}
