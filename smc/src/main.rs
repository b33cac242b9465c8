//! SageMaker Space Connection Helper CLI.
//!
//! Wires the engine's components together and presents their structured
//! outcomes. All policy lives in `smc-common`.

#![forbid(unsafe_code)]

mod commands;
mod registry;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use smc_common::config::Paths;
use smc_common::orchestrator::ConnectionOrchestrator;
use smc_common::prereq::PrerequisiteVerifier;
use smc_common::probes::{SystemCommandRunner, SystemProcessProbe, TcpPortProbe};
use smc_common::server::ServerHealthMonitor;
use smc_common::ssh_config::SshConfigManager;
use smc_common::state::JsonStateStore;
use smc_common::types::HostVariant;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use registry::EditorRegistry;

#[derive(Parser)]
#[command(name = "smc")]
#[command(author, version, about = "Connect to a SageMaker space over the local bridge")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// SSH host alias owned by this tool
    #[arg(long, global = true, default_value = "sagemaker")]
    alias: String,

    /// Editor binary used to open the remote window
    #[arg(long, global = true, default_value = "code")]
    editor: String,

    /// Host editor flavor, which decides the command namespace
    #[arg(long, global = true, value_enum, default_value_t = VariantArg::Primary)]
    variant: VariantArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VariantArg {
    Primary,
    Alternate,
}

impl From<VariantArg> for HostVariant {
    fn from(value: VariantArg) -> Self {
        match value {
            VariantArg::Primary => HostVariant::Primary,
            VariantArg::Alternate => HostVariant::Alternate,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Verify readiness and open the remote window
    Connect,
    /// Repair config, nudge the server if needed, then connect
    Quick,
    /// Report every readiness fact without changing anything
    Diagnose {
        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Apply every applicable SSH config fix idempotently
    Fix {
        /// Space or app ARN, used to create the host block when missing
        #[arg(long)]
        arn: Option<String>,
    },
    /// One-shot local server health report
    Status {
        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create the SSH host block for a space
    Setup {
        /// Space or app ARN of the target
        arn: String,
    },
}

type Orchestrator = ConnectionOrchestrator<
    SystemCommandRunner,
    SystemProcessProbe,
    TcpPortProbe,
    EditorRegistry,
    JsonStateStore,
>;

fn ssh_manager(paths: &Paths) -> SshConfigManager {
    SshConfigManager::new(
        paths.ssh_config.clone(),
        paths.server_info.clone(),
        paths.connect_script.clone(),
    )
}

fn monitor(paths: &Paths) -> ServerHealthMonitor<SystemProcessProbe, TcpPortProbe> {
    ServerHealthMonitor::new(paths.server_info.clone(), SystemProcessProbe, TcpPortProbe)
}

async fn orchestrator(cli: &Cli, paths: &Paths) -> Orchestrator {
    let verifier = PrerequisiteVerifier::new(
        SystemCommandRunner,
        ssh_manager(paths),
        paths.connect_script.clone(),
        cli.editor.clone(),
        cli.alias.clone(),
    );
    ConnectionOrchestrator::new(
        verifier,
        monitor(paths),
        ssh_manager(paths),
        EditorRegistry::detect(&cli.editor, cli.variant.into()).await,
        JsonStateStore::open(&paths.state_file),
        cli.alias.clone(),
        cli.variant.into(),
        paths.known_hosts.clone(),
        paths.connect_script.clone(),
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let paths = Paths::resolve()?;

    match &cli.command {
        Commands::Connect => {
            let mut orch = orchestrator(&cli, &paths).await;
            commands::report_outcome(orch.connect().await)
        }
        Commands::Quick => {
            let mut orch = orchestrator(&cli, &paths).await;
            commands::report_outcome(orch.quick_start().await)
        }
        Commands::Diagnose { json } => {
            let orch = orchestrator(&cli, &paths).await;
            commands::report_diagnosis(&orch.diagnose().await, *json)
        }
        Commands::Fix { arn } => {
            let resource = arn.as_deref().map(commands::parse_resource).transpose()?;
            let mut orch = orchestrator(&cli, &paths).await;
            let report = orch.fix_all(resource.as_ref()).await?;
            commands::report_fixes(report.created_host, &report.records);
            Ok(())
        }
        Commands::Status { json } => {
            let health = monitor(&paths).check_server_status().await;
            commands::report_server_health(&health, *json)
        }
        Commands::Setup { arn } => {
            let resource = commands::parse_resource(arn)?;
            let created = ssh_manager(&paths).setup_host(&cli.alias, &resource)?;
            if created {
                println!("Created host block '{}'", cli.alias);
            } else {
                println!("Host block '{}' already exists; nothing to do", cli.alias);
            }
            Ok(())
        }
    }
}
