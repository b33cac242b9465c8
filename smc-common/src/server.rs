//! Liveness monitoring of the external bridging server.
//!
//! The on-disk record is a claim, not evidence: `running` is asserted only
//! after the recorded pid is found in the process table and the recorded
//! port answers a TCP probe. Ordering is record → process → port so a
//! failure is attributed to the right step. No retries here; retry policy
//! belongs to the orchestrator.

use crate::probes::{PortProbe, ProcessProbe};
use crate::types::ServerHealth;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Bounded timeout for the localhost TCP probe.
pub const PORT_PROBE_TIMEOUT: Duration = Duration::from_millis(1500);

/// Record the toolkit writes for its local server. Read-only here.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerRecord {
    pub pid: Option<u32>,
    pub port: Option<u16>,
}

impl ServerRecord {
    /// Absence and unparsable content are reported as strings, not errors;
    /// both mean the server cannot be considered running.
    pub fn load(path: &Path) -> Result<Self, String> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err("Server info file not found".to_string());
            }
            Err(e) => return Err(format!("Server info file unreadable: {e}")),
        };
        serde_json::from_str(&text).map_err(|e| format!("Server info file unparsable: {e}"))
    }
}

/// Re-derives server health on every call; never caches or persists.
#[derive(Debug, Clone)]
pub struct ServerHealthMonitor<P, Q> {
    record_path: PathBuf,
    process: P,
    port: Q,
}

impl<P: ProcessProbe, Q: PortProbe> ServerHealthMonitor<P, Q> {
    pub fn new(record_path: PathBuf, process: P, port: Q) -> Self {
        Self {
            record_path,
            process,
            port,
        }
    }

    pub async fn check_server_status(&self) -> ServerHealth {
        let record = match ServerRecord::load(&self.record_path) {
            Ok(record) => record,
            Err(error) => {
                debug!(path = %self.record_path.display(), %error, "server record unavailable");
                return ServerHealth::record_failure(error);
            }
        };

        let process_alive = match record.pid {
            Some(pid) => self.process.pid_alive(pid).await,
            None => false,
        };
        // The port probe runs even for a dead process so callers can tell
        // "dead process" from "alive but unreachable".
        let port_reachable = match record.port {
            Some(port) => self.port.reachable(port, PORT_PROBE_TIMEOUT).await,
            None => false,
        };

        let error = if !process_alive {
            Some("Process not running".to_string())
        } else if !port_reachable {
            Some("Port not reachable".to_string())
        } else {
            None
        };
        ServerHealth {
            process_alive,
            port_reachable,
            pid: record.pid,
            port: record.port,
            record_error: None,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeProcess(bool);
    impl ProcessProbe for FakeProcess {
        async fn pid_alive(&self, _pid: u32) -> bool {
            self.0
        }
    }

    struct FakePort(bool);
    impl PortProbe for FakePort {
        async fn reachable(&self, _port: u16, _timeout: Duration) -> bool {
            self.0
        }
    }

    struct CountingPort(AtomicUsize, bool);
    impl PortProbe for CountingPort {
        async fn reachable(&self, _port: u16, _timeout: Duration) -> bool {
            self.0.fetch_add(1, Ordering::SeqCst);
            self.1
        }
    }

    fn write_record(dir: &tempfile::TempDir, json: &str) -> PathBuf {
        let path = dir.path().join("local-server-info.json");
        std::fs::write(&path, json).unwrap();
        path
    }

    #[tokio::test]
    async fn absent_record_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let monitor = ServerHealthMonitor::new(
            dir.path().join("missing.json"),
            FakeProcess(true),
            CountingPort(AtomicUsize::new(0), true),
        );
        let health = monitor.check_server_status().await;
        assert!(!health.running());
        assert_eq!(
            health.record_error.as_deref(),
            Some("Server info file not found")
        );
        // Remaining steps must not run at all.
        assert_eq!(monitor.port.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unparsable_record_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_record(&dir, "{ nope");
        let monitor = ServerHealthMonitor::new(path, FakeProcess(true), FakePort(true));
        let health = monitor.check_server_status().await;
        assert!(!health.running());
        assert!(
            health
                .record_error
                .as_deref()
                .unwrap()
                .starts_with("Server info file unparsable")
        );
    }

    #[tokio::test]
    async fn dead_pid_is_not_running() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_record(&dir, r#"{"pid": 999999, "port": 9999}"#);
        let monitor = ServerHealthMonitor::new(path, FakeProcess(false), FakePort(false));
        let health = monitor.check_server_status().await;
        assert!(!health.running());
        assert_eq!(health.error.as_deref(), Some("Process not running"));
        assert_eq!(health.pid, Some(999999));
        assert_eq!(health.port, Some(9999));
    }

    #[tokio::test]
    async fn conservative_liveness_requires_both_checks() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_record(&dir, r#"{"pid": 42, "port": 8080}"#);

        let dead_process =
            ServerHealthMonitor::new(path.clone(), FakeProcess(false), FakePort(true));
        let health = dead_process.check_server_status().await;
        assert!(!health.running());
        assert!(health.accessible());

        let dead_port = ServerHealthMonitor::new(path.clone(), FakeProcess(true), FakePort(false));
        let health = dead_port.check_server_status().await;
        assert!(!health.running());
        assert!(!health.accessible());

        let both = ServerHealthMonitor::new(path, FakeProcess(true), FakePort(true));
        assert!(both.check_server_status().await.running());
    }

    #[tokio::test]
    async fn consecutive_checks_agree_without_external_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_record(&dir, r#"{"pid": 42, "port": 8080}"#);
        let monitor = ServerHealthMonitor::new(path, FakeProcess(true), FakePort(true));
        let first = monitor.check_server_status().await;
        let second = monitor.check_server_status().await;
        assert_eq!(first, second);
    }
}
