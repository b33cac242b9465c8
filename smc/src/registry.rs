//! Capability registry adapter for a standalone CLI process.
//!
//! Inside the editor the registry is the live command table; out here the
//! equivalent is the editor's own CLI. Verb availability is detected once at
//! startup, and every resolved connect verb maps onto the editor's
//! `--remote ssh-remote+<host>` launch form.

use anyhow::{Context, Result};
use smc_common::capability::preference_list;
use smc_common::probes::CapabilityRegistry;
use smc_common::types::HostVariant;
use tracing::debug;

pub struct EditorRegistry {
    program: String,
    commands: Vec<String>,
}

impl EditorRegistry {
    /// Probe the editor binary once; an absent editor registers nothing,
    /// which downstream resolves to the manual fallback.
    pub async fn detect(program: &str, variant: HostVariant) -> Self {
        let available = tokio::process::Command::new(program)
            .arg("--version")
            .output()
            .await
            .map(|out| out.status.success())
            .unwrap_or(false);
        let commands = if available {
            preference_list(variant)
                .iter()
                .map(|v| v.to_string())
                .collect()
        } else {
            debug!(program, "editor binary not found; no verbs registered");
            Vec::new()
        };
        Self {
            program: program.to_string(),
            commands,
        }
    }
}

impl CapabilityRegistry for EditorRegistry {
    fn registered_commands(&self) -> Vec<String> {
        self.commands.clone()
    }

    async fn invoke(&self, verb: &str, hostname: Option<&str>) -> Result<()> {
        let host = hostname.context("connect verb requires a hostname argument")?;
        debug!(verb, host, "invoking editor remote window");
        let status = tokio::process::Command::new(&self.program)
            .arg("--remote")
            .arg(format!("ssh-remote+{host}"))
            .status()
            .await
            .with_context(|| format!("failed to launch {}", self.program))?;
        anyhow::ensure!(status.success(), "{} exited with {status}", self.program);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_editor_registers_no_verbs() {
        let registry = EditorRegistry::detect("smc-no-such-editor", HostVariant::Primary).await;
        assert!(registry.registered_commands().is_empty());
    }
}
