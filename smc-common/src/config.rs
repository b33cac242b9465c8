//! File-path configuration with typed environment overrides.
//!
//! Environment variables are used only to compute paths, never otherwise
//! interpreted. Every path has a convention-derived default and an
//! `SMC_`-prefixed override.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

const ENV_PREFIX: &str = "SMC_";

/// Resolved locations of every file the engine touches.
#[derive(Debug, Clone)]
pub struct Paths {
    /// SSH client config, read-write (only blocks we own).
    pub ssh_config: PathBuf,
    /// SSH known-hosts file, purged of stale entries best-effort.
    pub known_hosts: PathBuf,
    /// Server record file `{pid, port}`, owned by the toolkit, read-only.
    pub server_info: PathBuf,
    /// The toolkit's connection script referenced by the proxy invocation.
    pub connect_script: PathBuf,
    /// Persisted key-value facts (e.g. the migration notice flag).
    pub state_file: PathBuf,
}

fn env_path(name: &str) -> Option<PathBuf> {
    env::var_os(format!("{ENV_PREFIX}{name}")).map(PathBuf::from)
}

impl Paths {
    /// Compute paths from the user profile and application-data roots,
    /// honoring `SMC_*` overrides.
    pub fn resolve() -> Result<Self> {
        let home = dirs::home_dir().context("could not determine home directory")?;
        let data_root = dirs::data_dir().unwrap_or_else(|| env::temp_dir());
        let toolkit_dir = data_root.join("sagemaker-toolkit");

        Ok(Self {
            ssh_config: env_path("SSH_CONFIG").unwrap_or_else(|| home.join(".ssh").join("config")),
            known_hosts: env_path("KNOWN_HOSTS")
                .unwrap_or_else(|| home.join(".ssh").join("known_hosts")),
            server_info: env_path("SERVER_INFO")
                .unwrap_or_else(|| toolkit_dir.join("local-server-info.json")),
            connect_script: env_path("CONNECT_SCRIPT")
                .unwrap_or_else(|| toolkit_dir.join("sagemaker_connect.sh")),
            state_file: env_path("STATE_FILE")
                .unwrap_or_else(|| data_root.join("smc").join("state.json")),
        })
    }
}
