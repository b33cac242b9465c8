//! Error taxonomy for the connection readiness and repair engine.
//!
//! Every recoverable failure carries a concrete next action. Probe failures
//! (process table, TCP, external commands) never surface here — they are
//! folded into structured check results at the call site. The one class of
//! hard failure is a file write during repair, since a partial rewrite could
//! corrupt the SSH config.

use std::path::PathBuf;
use thiserror::Error;

/// Engine-level errors, one variant per failure mode in the taxonomy.
#[derive(Debug, Error)]
pub enum SmcError {
    /// One or more prerequisite facts are false.
    #[error("prerequisites missing: {missing:?}")]
    PrerequisiteMissing { missing: Vec<String> },

    /// The bridging server was never observed running.
    #[error("local server is not running")]
    ServerNotRunning,

    /// The server process is alive but its port did not answer.
    #[error("local server process is alive but port {port} is unreachable")]
    ServerUnreachable { port: u16 },

    /// The server passed the first health check but failed the final one.
    #[error("local server stopped between verification and connect")]
    ServerStoppedBetweenChecks,

    /// SSH config file does not exist.
    #[error("SSH config not found at {path}")]
    ConfigMissing { path: PathBuf },

    /// SSH config exists but the expected host block is absent or broken.
    #[error("SSH config is malformed: {detail}")]
    ConfigMalformed { detail: String },

    /// Two host blocks share the same alias.
    #[error("duplicate host alias '{alias}' in SSH config")]
    ConfigDuplicateAlias { alias: String },

    /// Resource identifier could not be parsed or encoded.
    #[error("could not convert resource identifier: {detail}")]
    ConversionFailed { detail: String },

    /// No connect verb is registered in the host environment.
    #[error("no connect capability available in this environment")]
    NoCapabilityResolved,

    /// The toolkit has not yet written its connection script.
    #[error("connection script not found at {path}")]
    ScriptNotFound { path: PathBuf },

    /// A repair could not write the config file. Hard failure: a partial
    /// rewrite is worse than no rewrite.
    #[error("failed to write {path} during repair: {source}")]
    RepairWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Persisted state file could not be read or written.
    #[error("state store error at {path}: {detail}")]
    StateStore { path: PathBuf, detail: String },
}

impl SmcError {
    /// Suggested next action for the user. Every abort path must carry one.
    pub fn remediation(&self) -> String {
        match self {
            Self::PrerequisiteMissing { missing } => format!(
                "run `smc diagnose` and install the missing prerequisites: {}",
                missing.join(", ")
            ),
            Self::ServerNotRunning => {
                "start the local server from the toolkit, then run `smc connect` again".into()
            }
            Self::ServerUnreachable { .. } => {
                "restart the local server; the process is up but not listening".into()
            }
            Self::ServerStoppedBetweenChecks => {
                "the local server died mid-connect; restart it and retry".into()
            }
            Self::ConfigMissing { .. } => "run `smc setup <arn>` to create the host entry".into(),
            Self::ConfigMalformed { .. } => "run `smc fix` to repair the SSH config".into(),
            Self::ConfigDuplicateAlias { alias } => format!(
                "remove the extra 'Host {alias}' block from the SSH config, then re-run the fix"
            ),
            Self::ConversionFailed { .. } => {
                "check the resource ARN; it must be a SageMaker space or app ARN".into()
            }
            Self::NoCapabilityResolved => {
                "connect manually: open a remote window for the configured host alias".into()
            }
            Self::ScriptNotFound { .. } => {
                "open the toolkit once so it writes its connection script, then retry".into()
            }
            Self::RepairWriteFailed { path, .. } => format!(
                "check permissions on {} and re-run the fix",
                path.display()
            ),
            Self::StateStore { path, .. } => {
                format!("delete {} and retry; it will be recreated", path.display())
            }
        }
    }
}

pub type Result<T, E = SmcError> = std::result::Result<T, E>;
