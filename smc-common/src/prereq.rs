//! Independent prerequisite checks.
//!
//! Each fact is checked on its own and a failure never hides the others;
//! callers always get the full partial snapshot. A tool that is absent or a
//! probe that refuses to spawn is an expected `false`, not an error.

use crate::probes::CommandRunner;
use crate::ssh_config::SshConfigManager;
use crate::types::{ExtensionVariant, PrerequisiteSet};
use std::path::PathBuf;
use tracing::debug;

/// Primary remote-development extension id.
pub const PRIMARY_REMOTE_EXTENSION: &str = "ms-vscode-remote.remote-ssh";
/// Alternate (open-remote) extension id used by OSS editor builds.
pub const ALTERNATE_REMOTE_EXTENSION: &str = "jeanp413.open-remote-ssh";

/// Read-only verifier over injected probe collaborators.
pub struct PrerequisiteVerifier<R> {
    runner: R,
    ssh: SshConfigManager,
    connect_script: PathBuf,
    editor_program: String,
    host_alias: String,
}

impl<R: CommandRunner> PrerequisiteVerifier<R> {
    pub fn new(
        runner: R,
        ssh: SshConfigManager,
        connect_script: PathBuf,
        editor_program: impl Into<String>,
        host_alias: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            ssh,
            connect_script,
            editor_program: editor_program.into(),
            host_alias: host_alias.into(),
        }
    }

    /// Compute a fresh snapshot. Never cached: any of these facts can
    /// change between invocations.
    pub async fn check_all(&self) -> PrerequisiteSet {
        let tool_installed = self.runner.probe("aws", &["--version"]).await;
        let bridge_plugin_installed = self
            .runner
            .probe("session-manager-plugin", &["--version"])
            .await;
        let remote_extension = self.remote_extension_variant().await;
        let ssh_config_has_host = self.ssh.has_host(&self.host_alias);
        let toolkit_installed = self.connect_script.exists();

        let set = PrerequisiteSet {
            tool_installed,
            bridge_plugin_installed,
            remote_extension,
            ssh_config_has_host,
            toolkit_installed,
        };
        debug!(?set, "prerequisite snapshot");
        set
    }

    async fn remote_extension_variant(&self) -> ExtensionVariant {
        let Some(listing) = self
            .runner
            .probe_output(&self.editor_program, &["--list-extensions"])
            .await
        else {
            return ExtensionVariant::None;
        };
        let installed: Vec<&str> = listing.lines().map(str::trim).collect();
        if installed
            .iter()
            .any(|id| id.eq_ignore_ascii_case(PRIMARY_REMOTE_EXTENSION))
        {
            ExtensionVariant::Primary
        } else if installed
            .iter()
            .any(|id| id.eq_ignore_ascii_case(ALTERNATE_REMOTE_EXTENSION))
        {
            ExtensionVariant::Alternate
        } else {
            ExtensionVariant::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Maps program name to (probe result, probe_output result).
    #[derive(Default)]
    struct FakeRunner {
        programs: HashMap<String, (bool, Option<String>)>,
    }

    impl FakeRunner {
        fn with(mut self, program: &str, ok: bool, output: Option<&str>) -> Self {
            self.programs
                .insert(program.to_string(), (ok, output.map(str::to_string)));
            self
        }
    }

    impl CommandRunner for FakeRunner {
        async fn probe(&self, program: &str, _args: &[&str]) -> bool {
            self.programs.get(program).map(|(ok, _)| *ok).unwrap_or(false)
        }

        async fn probe_output(&self, program: &str, _args: &[&str]) -> Option<String> {
            self.programs.get(program).and_then(|(_, out)| out.clone())
        }
    }

    fn verifier_in(dir: &tempfile::TempDir, runner: FakeRunner) -> PrerequisiteVerifier<FakeRunner> {
        let config = dir.path().join("config");
        std::fs::write(
            &config,
            "Host sagemaker\n    HostName sm_lc_x\n    User u\n    ProxyCommand bash -c \"SAGEMAKER_LOCAL_SERVER_FILE_PATH=/x '/c.sh' '%h'\"\n",
        )
        .unwrap();
        let script = dir.path().join("sagemaker_connect.sh");
        std::fs::write(&script, "#!/bin/bash\n").unwrap();
        PrerequisiteVerifier::new(
            runner,
            SshConfigManager::new(config, dir.path().join("info.json"), script.clone()),
            script,
            "code",
            "sagemaker",
        )
    }

    #[tokio::test]
    async fn all_facts_pass_with_full_environment() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::default()
            .with("aws", true, None)
            .with("session-manager-plugin", true, None)
            .with("code", true, Some("ms-vscode-remote.remote-ssh\nsome.other\n"));
        let set = verifier_in(&dir, runner).check_all().await;
        assert!(set.all_passed());
        assert_eq!(set.remote_extension, ExtensionVariant::Primary);
    }

    #[tokio::test]
    async fn one_failure_does_not_hide_the_others() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::default()
            .with("session-manager-plugin", true, None)
            .with("code", true, Some("jeanp413.open-remote-ssh\n"));
        let set = verifier_in(&dir, runner).check_all().await;
        assert!(!set.tool_installed);
        assert!(set.bridge_plugin_installed);
        assert_eq!(set.remote_extension, ExtensionVariant::Alternate);
        assert!(set.ssh_config_has_host);
        assert!(set.toolkit_installed);
        assert!(!set.all_passed());
        assert_eq!(set.missing(), vec!["cloud CLI".to_string()]);
    }

    #[tokio::test]
    async fn missing_editor_reports_no_extension() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::default()
            .with("aws", true, None)
            .with("session-manager-plugin", true, None);
        let set = verifier_in(&dir, runner).check_all().await;
        assert_eq!(set.remote_extension, ExtensionVariant::None);
        assert!(!set.all_passed());
    }
}
