//! Connection workflows: ordered verification-then-action sequences.
//!
//! The engine's core correctness property lives here: the health check that
//! gates an action and the one performed immediately before delegating are
//! independent calls. The bridging server is observed to die between the two
//! points in practice, and a cached result would hide that as a generic
//! failure instead of `ServerStoppedBetweenChecks`.

use crate::arn::{self, ResourceIdentifier};
use crate::capability;
use crate::errors::SmcError;
use crate::known_hosts;
use crate::prereq::PrerequisiteVerifier;
use crate::probes::{CapabilityRegistry, CommandRunner, PortProbe, ProcessProbe};
use crate::server::ServerHealthMonitor;
use crate::ssh_config::SshConfigManager;
use crate::state::{MIGRATION_NOTICE_SHOWN, StateStore};
use crate::types::{ConfigIssue, FixKind, FixRecord, HostVariant, PrerequisiteSet, ServerHealth};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Verb that nudges the toolkit to start its local server, when registered.
const START_SERVER_VERB: &str = "sagemaker.startLocalServer";

/// Fixed settle delay after nudging the server; one bounded sleep, short
/// enough not to block interactive use.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Order in which `fix_all` applies repairs. ARN conversion first so the
/// later token checks see space-typed hostnames.
const FIX_ORDER: [FixKind; 4] = [
    FixKind::ArnToSpace,
    FixKind::HostToken,
    FixKind::EnvBinding,
    FixKind::Indentation,
];

/// States of a single connection attempt, for traceability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectState {
    Init,
    PrereqChecked,
    ServerChecked,
    ScriptChecked,
    FinalVerified,
    Delegated,
}

/// Terminal outcome of a connect or quick-start workflow.
#[derive(Debug)]
pub enum ConnectOutcome {
    /// Delegated to the editor's connect capability.
    Delegated { verb: &'static str, alias: String },
    /// No verb resolvable; the caller gets manual instructions instead of a
    /// silent failure.
    ManualFallback { alias: String, steps: Vec<String> },
    /// The workflow stopped; the error carries a specific next action.
    Aborted(SmcError),
}

/// Read-only snapshot assembled by the diagnose workflow.
#[derive(Debug, Serialize)]
pub struct Diagnosis {
    pub prerequisites: PrerequisiteSet,
    pub server: ServerHealth,
    pub config_issues: Vec<ConfigIssue>,
    /// Set when the host block (or the whole config) is missing.
    pub config_error: Option<String>,
    pub suggestions: Vec<String>,
}

/// Result of the fix-all workflow.
#[derive(Debug, Serialize)]
pub struct FixReport {
    /// A new host block was created because none existed.
    pub created_host: bool,
    pub records: Vec<FixRecord>,
}

/// Composes the verifier, monitor, config manager, codec, and capability
/// resolver into the ordered workflows.
pub struct ConnectionOrchestrator<R, P, Q, C, S> {
    verifier: PrerequisiteVerifier<R>,
    monitor: ServerHealthMonitor<P, Q>,
    ssh: SshConfigManager,
    registry: C,
    state: S,
    host_alias: String,
    host_variant: HostVariant,
    known_hosts: PathBuf,
    connect_script: PathBuf,
    settle_delay: Duration,
}

impl<R, P, Q, C, S> ConnectionOrchestrator<R, P, Q, C, S>
where
    R: CommandRunner,
    P: ProcessProbe,
    Q: PortProbe,
    C: CapabilityRegistry,
    S: StateStore,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        verifier: PrerequisiteVerifier<R>,
        monitor: ServerHealthMonitor<P, Q>,
        ssh: SshConfigManager,
        registry: C,
        state: S,
        host_alias: impl Into<String>,
        host_variant: HostVariant,
        known_hosts: PathBuf,
        connect_script: PathBuf,
    ) -> Self {
        Self {
            verifier,
            monitor,
            ssh,
            registry,
            state,
            host_alias: host_alias.into(),
            host_variant,
            known_hosts,
            connect_script,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    fn transition(&self, state: ConnectState) {
        debug!(?state, alias = %self.host_alias, "connection attempt state");
    }

    /// One-time notice about the host-entry migration, gated by a persisted
    /// fact rather than any in-process flag.
    fn maybe_show_migration_notice(&mut self) {
        if !self.state.get_bool(MIGRATION_NOTICE_SHOWN) {
            info!(
                "host entries now use space-typed hostnames; run `smc fix` if an old app-typed entry remains"
            );
            if let Err(e) = self.state.set_bool(MIGRATION_NOTICE_SHOWN, true) {
                warn!(error = %e, "could not persist migration notice flag");
            }
        }
    }

    /// Map a non-running health snapshot to its distinct failure mode.
    fn liveness_error(health: &ServerHealth) -> SmcError {
        if health.process_alive && !health.port_reachable {
            SmcError::ServerUnreachable {
                port: health.port.unwrap_or(0),
            }
        } else {
            SmcError::ServerNotRunning
        }
    }

    /// Shared tail of connect and quick-start: script check, final
    /// independent verification, verb resolution, delegation.
    async fn verify_and_delegate(&mut self) -> ConnectOutcome {
        if !self.connect_script.exists() {
            return ConnectOutcome::Aborted(SmcError::ScriptNotFound {
                path: self.connect_script.clone(),
            });
        }
        self.transition(ConnectState::ScriptChecked);

        // Independent re-check immediately before acting. Never reuse the
        // earlier result: the server can die between the two points.
        let final_health = self.monitor.check_server_status().await;
        if !final_health.running() {
            return ConnectOutcome::Aborted(SmcError::ServerStoppedBetweenChecks);
        }
        self.transition(ConnectState::FinalVerified);

        let registered = self.registry.registered_commands();
        let Some(verb) = capability::resolve_connect_verb(self.host_variant, &registered) else {
            return self.manual_fallback();
        };
        match self.registry.invoke(verb, Some(self.host_alias.as_str())).await {
            Ok(()) => {
                self.transition(ConnectState::Delegated);
                info!(verb, alias = %self.host_alias, "delegated to connect capability");
                ConnectOutcome::Delegated {
                    verb,
                    alias: self.host_alias.clone(),
                }
            }
            Err(e) => {
                warn!(verb, error = %e, "connect capability invocation failed");
                self.manual_fallback()
            }
        }
    }

    fn manual_fallback(&self) -> ConnectOutcome {
        warn!(alias = %self.host_alias, "{}", SmcError::NoCapabilityResolved);
        ConnectOutcome::ManualFallback {
            alias: self.host_alias.clone(),
            steps: vec![
                "Install or enable a remote SSH extension in your editor".to_string(),
                format!(
                    "Open a remote window and pick the host '{}'",
                    self.host_alias
                ),
                "If a host key mismatch is reported, run `smc quick` to purge stale keys"
                    .to_string(),
            ],
        }
    }

    /// Full connect workflow: prerequisites → server health → script →
    /// final verification → delegation.
    pub async fn connect(&mut self) -> ConnectOutcome {
        self.transition(ConnectState::Init);
        self.maybe_show_migration_notice();

        let prereqs = self.verifier.check_all().await;
        if !prereqs.all_passed() {
            return ConnectOutcome::Aborted(SmcError::PrerequisiteMissing {
                missing: prereqs.missing(),
            });
        }
        self.transition(ConnectState::PrereqChecked);

        let health = self.monitor.check_server_status().await;
        if !health.running() {
            return ConnectOutcome::Aborted(Self::liveness_error(&health));
        }
        self.transition(ConnectState::ServerChecked);

        self.verify_and_delegate().await
    }

    /// Quick-start workflow: repair first (ARN-to-space fix, stale host-key
    /// purge), nudge the server if needed, then the same verify-before-act
    /// tail as connect.
    pub async fn quick_start(&mut self) -> ConnectOutcome {
        self.transition(ConnectState::Init);
        self.maybe_show_migration_notice();

        // Idempotent re-application; already-satisfied is the common case.
        match self.ssh.apply_fix(&self.host_alias, FixKind::ArnToSpace) {
            Ok(record) if !record.already_applied => {
                info!(alias = %self.host_alias, "rewrote app-typed hostname to space");
            }
            Ok(_) => {}
            Err(e) => return ConnectOutcome::Aborted(e),
        }

        // Best-effort purge keyed on this session's encoded hostname. Never
        // aborts the workflow.
        let prefix = self
            .ssh
            .host_entry(&self.host_alias)
            .ok()
            .flatten()
            .and_then(|entry| entry.hostname)
            .unwrap_or_else(|| arn::HOSTNAME_PREFIX.to_string());
        known_hosts::purge_matching(&self.known_hosts, &prefix);

        let mut health = self.monitor.check_server_status().await;
        if !health.running() {
            health = self.nudge_and_recheck().await;
        }
        if !health.running() {
            return ConnectOutcome::Aborted(Self::liveness_error(&health));
        }
        self.transition(ConnectState::ServerChecked);

        self.verify_and_delegate().await
    }

    /// Ask the toolkit to start its server, settle briefly, re-check.
    async fn nudge_and_recheck(&mut self) -> ServerHealth {
        let registered = self.registry.registered_commands();
        if registered.iter().any(|c| c == START_SERVER_VERB) {
            if let Err(e) = self.registry.invoke(START_SERVER_VERB, None).await {
                warn!(error = %e, "server start nudge failed");
            }
            tokio::time::sleep(self.settle_delay).await;
        }
        self.monitor.check_server_status().await
    }

    /// Gather everything, change nothing.
    pub async fn diagnose(&self) -> Diagnosis {
        let prerequisites = self.verifier.check_all().await;
        let server = self.monitor.check_server_status().await;
        let (config_issues, config_error) = match self.ssh.validate_host(&self.host_alias) {
            Ok(issues) => (issues, None),
            Err(e) => (Vec::new(), Some(e.to_string())),
        };

        let mut suggestions = Vec::new();
        if !prerequisites.all_passed() {
            suggestions.push(
                SmcError::PrerequisiteMissing {
                    missing: prerequisites.missing(),
                }
                .remediation(),
            );
        }
        if !server.running() {
            suggestions.push(Self::liveness_error(&server).remediation());
        }
        if config_error.is_some() {
            suggestions.push("run `smc setup <arn>` to create the host entry".to_string());
        } else if !config_issues.is_empty() {
            suggestions.push("run `smc fix` to repair the SSH config".to_string());
        }
        let registered = self.registry.registered_commands();
        if capability::resolve_connect_verb(self.host_variant, &registered).is_none() {
            suggestions.push(SmcError::NoCapabilityResolved.remediation());
        }

        Diagnosis {
            prerequisites,
            server,
            config_issues,
            config_error,
            suggestions,
        }
    }

    /// Apply every applicable fix idempotently. When the host block is
    /// missing and a resource identifier is supplied, create it first.
    pub async fn fix_all(
        &mut self,
        resource: Option<&ResourceIdentifier>,
    ) -> Result<FixReport, SmcError> {
        let mut created_host = false;
        if !self.ssh.has_host(&self.host_alias) {
            match resource {
                Some(resource) => {
                    created_host = self.ssh.setup_host(&self.host_alias, resource)?;
                }
                None => {
                    return Err(SmcError::ConfigMalformed {
                        detail: format!(
                            "no 'Host {}' block found and no ARN supplied to create one",
                            self.host_alias
                        ),
                    });
                }
            }
        }

        // Two blocks under one alias make "the block we own" ambiguous;
        // automated repair refuses rather than edit only the first.
        if let Some(entry) = self.ssh.host_entry(&self.host_alias)? {
            if entry.duplicate_alias {
                return Err(SmcError::ConfigDuplicateAlias {
                    alias: self.host_alias.clone(),
                });
            }
        }

        let mut records = Vec::with_capacity(FIX_ORDER.len());
        for kind in FIX_ORDER {
            records.push(self.ssh.apply_fix(&self.host_alias, kind)?);
        }
        Ok(FixReport {
            created_host,
            records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probes::{CommandRunner, PortProbe, ProcessProbe};
    use crate::state::MemoryStateStore;
    use std::path::Path;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct YesRunner;
    impl CommandRunner for YesRunner {
        async fn probe(&self, _program: &str, _args: &[&str]) -> bool {
            true
        }
        async fn probe_output(&self, _program: &str, _args: &[&str]) -> Option<String> {
            Some("ms-vscode-remote.remote-ssh\n".to_string())
        }
    }

    /// Process probe that reports alive for the first `alive_for` calls.
    struct FlakyProcess {
        calls: AtomicUsize,
        alive_for: usize,
    }
    impl ProcessProbe for FlakyProcess {
        async fn pid_alive(&self, _pid: u32) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst) < self.alive_for
        }
    }

    struct FakePort(bool);
    impl PortProbe for FakePort {
        async fn reachable(&self, _port: u16, _timeout: Duration) -> bool {
            self.0
        }
    }

    #[derive(Default)]
    struct RecordingRegistry {
        commands: Vec<String>,
        invoked: Mutex<Vec<(String, Option<String>)>>,
    }
    impl RecordingRegistry {
        fn with_commands(commands: &[&str]) -> Self {
            Self {
                commands: commands.iter().map(|s| s.to_string()).collect(),
                invoked: Mutex::new(Vec::new()),
            }
        }
    }
    impl CapabilityRegistry for RecordingRegistry {
        fn registered_commands(&self) -> Vec<String> {
            self.commands.clone()
        }
        async fn invoke(&self, verb: &str, hostname: Option<&str>) -> anyhow::Result<()> {
            self.invoked
                .lock()
                .unwrap()
                .push((verb.to_string(), hostname.map(str::to_string)));
            Ok(())
        }
    }

    struct Fixture {
        dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(
                dir.path().join("config"),
                "Host sagemaker\n    HostName sm_lc_arn_._aws_._sagemaker_._us-east-1._123_._space__d__s\n    User sagemaker-user\n    ProxyCommand bash -c \"SAGEMAKER_LOCAL_SERVER_FILE_PATH=/x '/c.sh' '%h'\"\n",
            )
            .unwrap();
            std::fs::write(
                dir.path().join("local-server-info.json"),
                r#"{"pid": 42, "port": 8080}"#,
            )
            .unwrap();
            std::fs::write(dir.path().join("sagemaker_connect.sh"), "#!/bin/bash\n").unwrap();
            Self { dir }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        fn ssh(&self) -> SshConfigManager {
            SshConfigManager::new(
                self.path("config"),
                self.path("local-server-info.json"),
                self.path("sagemaker_connect.sh"),
            )
        }

        fn orchestrator(
            &self,
            process: FlakyProcess,
            port_up: bool,
            registry: RecordingRegistry,
        ) -> ConnectionOrchestrator<YesRunner, FlakyProcess, FakePort, RecordingRegistry, MemoryStateStore>
        {
            let verifier = PrerequisiteVerifier::new(
                YesRunner,
                self.ssh(),
                self.path("sagemaker_connect.sh"),
                "code",
                "sagemaker",
            );
            let monitor = ServerHealthMonitor::new(
                self.path("local-server-info.json"),
                process,
                FakePort(port_up),
            );
            ConnectionOrchestrator::new(
                verifier,
                monitor,
                self.ssh(),
                registry,
                MemoryStateStore::default(),
                "sagemaker",
                HostVariant::Primary,
                self.path("known_hosts"),
                self.path("sagemaker_connect.sh"),
            )
            .with_settle_delay(Duration::ZERO)
        }
    }

    fn alive(n: usize) -> FlakyProcess {
        FlakyProcess {
            calls: AtomicUsize::new(0),
            alive_for: n,
        }
    }

    #[tokio::test]
    async fn connect_delegates_when_everything_is_healthy() {
        let fx = Fixture::new();
        let registry =
            RecordingRegistry::with_commands(&["opensshremotes.openEmptyWindowInCurrentWindow"]);
        let mut orch = fx.orchestrator(alive(usize::MAX), true, registry);
        let outcome = orch.connect().await;
        match outcome {
            ConnectOutcome::Delegated { verb, alias } => {
                assert_eq!(verb, "opensshremotes.openEmptyWindowInCurrentWindow");
                assert_eq!(alias, "sagemaker");
            }
            other => panic!("expected delegation, got {other:?}"),
        }
        let invoked = orch.registry.invoked.lock().unwrap();
        assert_eq!(invoked.len(), 1);
        assert_eq!(invoked[0].1.as_deref(), Some("sagemaker"));
    }

    #[tokio::test]
    async fn server_death_between_checks_is_distinct_and_blocks_delegation() {
        let fx = Fixture::new();
        let registry = RecordingRegistry::with_commands(&["opensshremotes.openEmptyWindow"]);
        // Alive for exactly the first health check, dead for the final one.
        let mut orch = fx.orchestrator(alive(1), true, registry);
        let outcome = orch.connect().await;
        assert!(matches!(
            outcome,
            ConnectOutcome::Aborted(SmcError::ServerStoppedBetweenChecks)
        ));
        assert!(
            orch.registry.invoked.lock().unwrap().is_empty(),
            "delegation must never occur after a failed final check"
        );
    }

    #[tokio::test]
    async fn never_started_is_not_stopped_between_checks() {
        let fx = Fixture::new();
        let registry = RecordingRegistry::with_commands(&["opensshremotes.openEmptyWindow"]);
        let mut orch = fx.orchestrator(alive(0), true, registry);
        let outcome = orch.connect().await;
        assert!(matches!(
            outcome,
            ConnectOutcome::Aborted(SmcError::ServerNotRunning)
        ));
    }

    #[tokio::test]
    async fn alive_but_unreachable_is_distinct() {
        let fx = Fixture::new();
        let registry = RecordingRegistry::with_commands(&["opensshremotes.openEmptyWindow"]);
        let mut orch = fx.orchestrator(alive(usize::MAX), false, registry);
        let outcome = orch.connect().await;
        assert!(matches!(
            outcome,
            ConnectOutcome::Aborted(SmcError::ServerUnreachable { port: 8080 })
        ));
    }

    #[tokio::test]
    async fn no_verb_yields_manual_fallback() {
        let fx = Fixture::new();
        let registry = RecordingRegistry::with_commands(&[]);
        let mut orch = fx.orchestrator(alive(usize::MAX), true, registry);
        let outcome = orch.connect().await;
        match outcome {
            ConnectOutcome::ManualFallback { alias, steps } => {
                assert_eq!(alias, "sagemaker");
                assert!(!steps.is_empty());
            }
            other => panic!("expected manual fallback, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn quick_start_repairs_config_and_purges_keys() {
        let fx = Fixture::new();
        // App-typed hostname plus a stale key for its space form.
        std::fs::write(
            fx.path("config"),
            "Host sagemaker\n    HostName sm_lc_arn_._aws_._sagemaker_._us-east-1._123_._app__d__s__JupyterLab__default\n    User sagemaker-user\n    ProxyCommand bash -c \"SAGEMAKER_LOCAL_SERVER_FILE_PATH=/x '/c.sh' '%h'\"\n",
        )
        .unwrap();
        std::fs::write(
            fx.path("known_hosts"),
            "sm_lc_arn_._aws_._sagemaker_._us-east-1._123_._space__d__s ssh-ed25519 AAAA\nexample.com ssh-rsa BBBB\n",
        )
        .unwrap();

        let registry = RecordingRegistry::with_commands(&["opensshremotes.openEmptyWindow"]);
        let mut orch = fx.orchestrator(alive(usize::MAX), true, registry);
        let outcome = orch.quick_start().await;
        assert!(matches!(outcome, ConnectOutcome::Delegated { .. }));

        let config = std::fs::read_to_string(fx.path("config")).unwrap();
        assert!(config.contains("_._space__d__s"));
        assert!(!config.contains("_._app__"));

        let keys = std::fs::read_to_string(fx.path("known_hosts")).unwrap();
        assert!(!keys.contains("sm_lc_"));
        assert!(keys.contains("example.com"));
    }

    #[tokio::test]
    async fn quick_start_nudges_server_when_dead() {
        let fx = Fixture::new();
        let registry = RecordingRegistry::with_commands(&[
            "sagemaker.startLocalServer",
            "opensshremotes.openEmptyWindow",
        ]);
        // Never alive: the nudge fires but cannot help, so the workflow
        // still aborts after the settle re-check.
        let mut orch = fx.orchestrator(alive(0), true, registry);
        let outcome = orch.quick_start().await;
        assert!(matches!(
            outcome,
            ConnectOutcome::Aborted(SmcError::ServerNotRunning)
        ));
        let invoked = orch.registry.invoked.lock().unwrap();
        assert_eq!(invoked.len(), 1);
        assert_eq!(invoked[0].0, START_SERVER_VERB);
    }

    #[tokio::test]
    async fn diagnose_reports_without_mutating() {
        let fx = Fixture::new();
        let before = std::fs::read_to_string(fx.path("config")).unwrap();
        let registry = RecordingRegistry::with_commands(&["opensshremotes.openEmptyWindow"]);
        let orch = fx.orchestrator(alive(usize::MAX), true, registry);
        let diagnosis = orch.diagnose().await;
        assert!(diagnosis.prerequisites.all_passed());
        assert!(diagnosis.server.running());
        assert!(diagnosis.config_issues.is_empty());
        assert!(diagnosis.suggestions.is_empty());
        assert_eq!(std::fs::read_to_string(fx.path("config")).unwrap(), before);
    }

    #[tokio::test]
    async fn diagnose_flags_missing_connect_capability() {
        let fx = Fixture::new();
        let registry = RecordingRegistry::with_commands(&[]);
        let orch = fx.orchestrator(alive(usize::MAX), true, registry);
        let diagnosis = orch.diagnose().await;
        assert_eq!(
            diagnosis.suggestions,
            vec![SmcError::NoCapabilityResolved.remediation()]
        );
    }

    #[tokio::test]
    async fn fix_all_is_idempotent_across_runs() {
        let fx = Fixture::new();
        std::fs::write(
            fx.path("config"),
            "Host sagemaker\n    HostName sm_lc_arn_._aws_._sagemaker_._us-east-1._123_._app__d__s__J__d\n  User sagemaker-user\n    ProxyCommand bash -c \"'/c.sh' 'sm_lc_arn_._aws_._sagemaker_._us-east-1._123_._app__d__s__J__d'\"\n",
        )
        .unwrap();
        let registry = RecordingRegistry::with_commands(&[]);
        let mut orch = fx.orchestrator(alive(usize::MAX), true, registry);

        let first = orch.fix_all(None).await.unwrap();
        assert!(!first.created_host);
        assert!(first.records.iter().any(|r| !r.already_applied));

        let second = orch.fix_all(None).await.unwrap();
        assert!(
            second.records.iter().all(|r| r.already_applied),
            "second run must be a complete no-op: {:?}",
            second.records
        );
    }

    #[tokio::test]
    async fn fix_all_refuses_duplicate_alias() {
        let fx = Fixture::new();
        std::fs::write(
            fx.path("config"),
            "Host sagemaker\n    HostName first\n\nHost sagemaker\n    HostName second\n",
        )
        .unwrap();
        let registry = RecordingRegistry::with_commands(&[]);
        let mut orch = fx.orchestrator(alive(usize::MAX), true, registry);
        let err = orch.fix_all(None).await.unwrap_err();
        assert!(matches!(err, SmcError::ConfigDuplicateAlias { .. }));
    }

    #[tokio::test]
    async fn fix_all_creates_host_from_resource() {
        let fx = Fixture::new();
        std::fs::remove_file(fx.path("config")).unwrap();
        let resource = ResourceIdentifier::parse(
            "arn:aws:sagemaker:us-east-1:123456789012:space/d-abc/my-space",
        )
        .unwrap();
        let registry = RecordingRegistry::with_commands(&[]);
        let mut orch = fx.orchestrator(alive(usize::MAX), true, registry);

        let report = orch.fix_all(Some(&resource)).await.unwrap();
        assert!(report.created_host);
        assert!(report.records.iter().all(|r| r.already_applied));
        assert!(Path::new(&fx.path("config")).exists());
    }

    #[tokio::test]
    async fn migration_notice_is_persisted_once() {
        let fx = Fixture::new();
        let registry = RecordingRegistry::with_commands(&[]);
        let mut orch = fx.orchestrator(alive(usize::MAX), true, registry);
        assert!(!orch.state.get_bool(MIGRATION_NOTICE_SHOWN));
        let _ = orch.connect().await;
        assert!(orch.state.get_bool(MIGRATION_NOTICE_SHOWN));
    }
}
