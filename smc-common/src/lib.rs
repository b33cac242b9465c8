//! Connection readiness and repair engine for remote SageMaker spaces.
//!
//! A space is reachable only through a locally-running bridging server plus
//! an SSH tunnel. This crate decides whether that bridge is genuinely alive
//! (not merely recorded on disk), repairs the SSH host configuration
//! idempotently, converts between resource ARNs and the encoded hostnames
//! the bridge expects, and sequences the verify-before-act workflows that
//! make the whole thing safe against the server dying mid-flow.

pub mod arn;
pub mod capability;
pub mod config;
pub mod errors;
pub mod known_hosts;
pub mod orchestrator;
pub mod prereq;
pub mod probes;
pub mod server;
pub mod ssh_config;
pub mod state;
pub mod types;

pub use arn::{ResourceIdentifier, ResourceType, encode, normalize_to_space};
pub use capability::resolve_connect_verb;
pub use config::Paths;
pub use errors::{Result, SmcError};
pub use orchestrator::{ConnectOutcome, ConnectionOrchestrator, Diagnosis, FixReport};
pub use prereq::PrerequisiteVerifier;
pub use probes::{
    CapabilityRegistry, CommandRunner, PortProbe, ProcessProbe, SystemCommandRunner,
    SystemProcessProbe, TcpPortProbe,
};
pub use server::{ServerHealthMonitor, ServerRecord};
pub use ssh_config::{SshConfigManager, SshHostEntry};
pub use state::{JsonStateStore, MemoryStateStore, StateStore};
pub use types::{
    ConfigIssue, ExtensionVariant, FixKind, FixRecord, HostVariant, PrerequisiteSet, ServerHealth,
};
