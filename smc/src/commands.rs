//! Subcommand implementations: thin presentation over the engine's
//! structured outcomes.

use anyhow::{Result, bail};
use smc_common::orchestrator::{ConnectOutcome, Diagnosis};
use smc_common::types::FixRecord;
use smc_common::{ResourceIdentifier, ServerHealth, SmcError};

/// Render a terminal outcome. Delegation and manual fallback are success
/// exits; an abort surfaces the remediation and fails the process.
pub fn report_outcome(outcome: ConnectOutcome) -> Result<()> {
    match outcome {
        ConnectOutcome::Delegated { verb, alias } => {
            println!("Opening remote window for '{alias}' via {verb}");
            Ok(())
        }
        ConnectOutcome::ManualFallback { alias, steps } => {
            println!("No connect capability is available; connect manually:");
            for (i, step) in steps.iter().enumerate() {
                println!("  {}. {step}", i + 1);
            }
            println!("(host alias: {alias})");
            Ok(())
        }
        ConnectOutcome::Aborted(error) => abort(error),
    }
}

fn abort(error: SmcError) -> Result<()> {
    eprintln!("error: {error}");
    eprintln!("next:  {}", error.remediation());
    bail!("{error}")
}

pub fn report_server_health(health: &ServerHealth, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(health)?);
        return Ok(());
    }
    if health.running() {
        println!(
            "Server running (pid {}, port {})",
            health.pid.unwrap_or(0),
            health.port.unwrap_or(0)
        );
    } else if let Some(record_error) = &health.record_error {
        println!("Server not running: {record_error}");
    } else {
        println!(
            "Server not running: {}",
            health.error.as_deref().unwrap_or("unknown")
        );
        if health.accessible() {
            println!("Note: port {} still answers; a stale process may own it", health.port.unwrap_or(0));
        }
    }
    Ok(())
}

pub fn report_diagnosis(diagnosis: &Diagnosis, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(diagnosis)?);
        return Ok(());
    }

    let p = &diagnosis.prerequisites;
    println!("Prerequisites:");
    println!("  cloud CLI installed        {}", mark(p.tool_installed));
    println!("  tunneling plugin installed {}", mark(p.bridge_plugin_installed));
    println!(
        "  remote extension           {}",
        match p.remote_extension {
            smc_common::ExtensionVariant::Primary => "ok (primary)",
            smc_common::ExtensionVariant::Alternate => "ok (alternate)",
            smc_common::ExtensionVariant::None => "MISSING",
        }
    );
    println!("  SSH host entry             {}", mark(p.ssh_config_has_host));
    println!("  toolkit connect script     {}", mark(p.toolkit_installed));

    println!("Server:");
    println!("  process alive              {}", mark(diagnosis.server.process_alive));
    println!("  port reachable             {}", mark(diagnosis.server.port_reachable));
    if let Some(record_error) = &diagnosis.server.record_error {
        println!("  record                     {record_error}");
    }

    if let Some(config_error) = &diagnosis.config_error {
        println!("Config: {config_error}");
    } else if diagnosis.config_issues.is_empty() {
        println!("Config: ok");
    } else {
        println!("Config issues:");
        for issue in &diagnosis.config_issues {
            println!("  - {issue:?}");
        }
    }

    if !diagnosis.suggestions.is_empty() {
        println!("Suggested next actions:");
        for suggestion in &diagnosis.suggestions {
            println!("  - {suggestion}");
        }
    }
    Ok(())
}

pub fn report_fixes(created_host: bool, records: &[FixRecord]) {
    if created_host {
        println!("Created missing SSH host block");
    }
    for record in records {
        if record.already_applied {
            println!("  {}: already satisfied", record.fix_kind);
        } else {
            println!(
                "  {}: applied (backup: {})",
                record.fix_kind,
                record
                    .backup_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default()
            );
        }
    }
}

pub fn parse_resource(arn: &str) -> Result<ResourceIdentifier> {
    let id = ResourceIdentifier::parse(arn)?;
    Ok(smc_common::normalize_to_space(&id))
}

fn mark(ok: bool) -> &'static str {
    if ok { "ok" } else { "MISSING" }
}
