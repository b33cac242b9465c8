//! Common types shared across the engine components.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which remote-development extension flavor is present in the host editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionVariant {
    /// The primary (proprietary) remote extension.
    Primary,
    /// The open-remote alternate used by OSS builds.
    Alternate,
    /// Neither flavor is installed.
    None,
}

/// Host editor environment flavor. Decides which command namespace to probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostVariant {
    Primary,
    Alternate,
}

/// Snapshot of independent prerequisite facts.
///
/// Computed fresh on every check; never cached across calls, since any of
/// these can change between invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrerequisiteSet {
    /// The cloud CLI responds to a version probe.
    pub tool_installed: bool,
    /// The session tunneling plugin responds to a version probe.
    pub bridge_plugin_installed: bool,
    /// Which remote extension flavor the editor reports.
    pub remote_extension: ExtensionVariant,
    /// The SSH config contains the expected host block.
    pub ssh_config_has_host: bool,
    /// The toolkit has written its connection script.
    pub toolkit_installed: bool,
}

impl PrerequisiteSet {
    /// Derived, never stored: true iff every required fact holds.
    pub fn all_passed(&self) -> bool {
        self.tool_installed
            && self.bridge_plugin_installed
            && self.remote_extension != ExtensionVariant::None
            && self.ssh_config_has_host
            && self.toolkit_installed
    }

    /// Names of the facts that are currently false, for remediation text.
    pub fn missing(&self) -> Vec<String> {
        let mut out = Vec::new();
        if !self.tool_installed {
            out.push("cloud CLI".to_string());
        }
        if !self.bridge_plugin_installed {
            out.push("session tunneling plugin".to_string());
        }
        if self.remote_extension == ExtensionVariant::None {
            out.push("remote development extension".to_string());
        }
        if !self.ssh_config_has_host {
            out.push("SSH host entry".to_string());
        }
        if !self.toolkit_installed {
            out.push("toolkit connection script".to_string());
        }
        out
    }
}

/// Read-only view of the bridging server's liveness.
///
/// Re-derived on each call. `running()` requires both sub-checks; the
/// presence of the on-disk record alone must never imply liveness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerHealth {
    pub process_alive: bool,
    pub port_reachable: bool,
    pub pid: Option<u32>,
    pub port: Option<u16>,
    /// Set when the record file was absent or unparsable.
    pub record_error: Option<String>,
    /// First failed liveness step, when the record itself was readable.
    pub error: Option<String>,
}

impl ServerHealth {
    /// Both the process and the port answered.
    pub fn running(&self) -> bool {
        self.process_alive && self.port_reachable
    }

    /// Port-probe result on its own, so callers can tell "dead process"
    /// from "alive but unreachable".
    pub fn accessible(&self) -> bool {
        self.port_reachable
    }

    pub fn record_failure(error: impl Into<String>) -> Self {
        Self {
            process_alive: false,
            port_reachable: false,
            pid: None,
            port: None,
            record_error: Some(error.into()),
            error: None,
        }
    }
}

/// Kinds of idempotent SSH-config repairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixKind {
    /// Proxy invocation must use the dynamic `%h` token, not a literal host.
    HostToken,
    /// Proxy invocation must bind the server-record path env variable.
    EnvBinding,
    /// Block field lines must share the first field line's indentation.
    Indentation,
    /// Encoded app hostname tokens must be rewritten to space tokens.
    ArnToSpace,
}

impl std::fmt::Display for FixKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::HostToken => "host-token",
            Self::EnvBinding => "env-binding",
            Self::Indentation => "indentation",
            Self::ArnToSpace => "arn-to-space",
        };
        write!(f, "{s}")
    }
}

/// Outcome of one fix application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixRecord {
    pub fix_kind: FixKind,
    /// True when the fix predicate was already satisfied and no write occurred.
    pub already_applied: bool,
    /// Timestamped snapshot of the unmodified file, present iff a write occurred.
    pub backup_path: Option<PathBuf>,
}

/// Validation issues the SSH config manager can report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ConfigIssue {
    /// Proxy invocation carries a fixed literal host instead of `%h`.
    WrongHostToken { found: String },
    /// Proxy invocation lacks the server-record path env binding.
    MissingEnvBinding,
    /// A field line's indentation differs from the block's first field line.
    BadIndentation { line: String },
    /// A second block reuses this alias; the first block stays authoritative.
    DuplicateAlias { alias: String },
    /// A required field is absent from the block.
    MissingField { field: String },
    /// The encoded hostname still refers to an app, not a space.
    AppHostname { hostname: String },
}
