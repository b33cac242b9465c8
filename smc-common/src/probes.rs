//! External-probe collaborators and their default system implementations.
//!
//! Every probe converts its failure modes into a plain boolean: the absence
//! of a tool, a dead process, or an unreachable port is an expected outcome
//! for this engine, not an error. Components take these traits as generics
//! so tests can substitute deterministic fakes.

use std::time::Duration;
use tokio::net::TcpStream;
use tokio::process::Command;
use tracing::debug;

/// Runs an external probe command and reports whether it exited cleanly.
pub trait CommandRunner {
    async fn probe(&self, program: &str, args: &[&str]) -> bool;

    /// Like `probe`, but captures stdout. `None` on spawn failure or a
    /// non-zero exit, both of which mean "tool absent" here.
    async fn probe_output(&self, program: &str, args: &[&str]) -> Option<String>;
}

/// Exact-pid lookup in the OS process table.
pub trait ProcessProbe {
    async fn pid_alive(&self, pid: u32) -> bool;
}

/// Bounded-timeout TCP reachability check against localhost.
pub trait PortProbe {
    async fn reachable(&self, port: u16, timeout: Duration) -> bool;
}

/// The host editor's command registry: readable list of identifiers, plus
/// invocation of one identifier with an optional hostname argument.
pub trait CapabilityRegistry {
    fn registered_commands(&self) -> Vec<String>;
    async fn invoke(&self, verb: &str, hostname: Option<&str>) -> anyhow::Result<()>;
}

/// Default runner backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    async fn probe(&self, program: &str, args: &[&str]) -> bool {
        match Command::new(program).args(args).output().await {
            Ok(out) => out.status.success(),
            Err(e) => {
                debug!(program, error = %e, "probe command failed to spawn");
                false
            }
        }
    }

    async fn probe_output(&self, program: &str, args: &[&str]) -> Option<String> {
        match Command::new(program).args(args).output().await {
            Ok(out) if out.status.success() => {
                Some(String::from_utf8_lossy(&out.stdout).into_owned())
            }
            Ok(_) => None,
            Err(e) => {
                debug!(program, error = %e, "probe command failed to spawn");
                None
            }
        }
    }
}

/// Default process probe: `ps -p <pid> -o pid=` with the output parsed as an
/// integer and compared for equality. A substring match on raw listing
/// output would let pid 123 collide with 1234.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessProbe;

impl ProcessProbe for SystemProcessProbe {
    async fn pid_alive(&self, pid: u32) -> bool {
        let pid_arg = pid.to_string();
        let out = match Command::new("ps")
            .args(["-p", &pid_arg, "-o", "pid="])
            .output()
            .await
        {
            Ok(out) => out,
            Err(e) => {
                debug!(pid, error = %e, "ps probe failed to spawn");
                return false;
            }
        };
        if !out.status.success() {
            return false;
        }
        String::from_utf8_lossy(&out.stdout)
            .lines()
            .any(|line| line.trim().parse::<u32>() == Ok(pid))
    }
}

/// Default port probe: TCP connect to `127.0.0.1:<port>` within the timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpPortProbe;

impl PortProbe for TcpPortProbe {
    async fn reachable(&self, port: u16, timeout: Duration) -> bool {
        match tokio::time::timeout(timeout, TcpStream::connect(("127.0.0.1", port))).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!(port, error = %e, "port probe refused");
                false
            }
            Err(_) => {
                debug!(port, "port probe timed out");
                false
            }
        }
    }
}
