//! SSH config host-block parsing, validation, and idempotent repair.
//!
//! This engine owns only the blocks it creates; everything outside the
//! target block is preserved byte-for-byte. Repairs snapshot the original
//! file to a timestamped backup and land via atomic write-replace, never a
//! partial in-place write.

use crate::arn::{self, ResourceIdentifier};
use crate::errors::{Result, SmcError};
use crate::types::{ConfigIssue, FixKind, FixRecord};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Environment variable the proxy invocation must bind to the server-record
/// path, so the connection script finds the live record.
pub const SERVER_RECORD_ENV: &str = "SAGEMAKER_LOCAL_SERVER_FILE_PATH";

/// Dynamic per-session host token the SSH client substitutes at connect time.
pub const HOST_TOKEN: &str = "%h";

/// Default remote user for generated blocks.
pub const DEFAULT_USER: &str = "sagemaker-user";

static ENCODED_HOST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"sm_lc_[\w.-]+").expect("static regex"));

/// One parsed host block. Missing fields are reported, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshHostEntry {
    pub host_alias: String,
    pub hostname: Option<String>,
    pub user: Option<String>,
    pub proxy_invocation: Option<String>,
    /// Raw lines of the block, `Host` line included, exactly as read.
    pub raw_lines: Vec<String>,
    /// A later block reuses this alias; this (first) block stays authoritative.
    pub duplicate_alias: bool,
    /// Line index of the block's `Host` line within the config text.
    start_line: usize,
}

impl SshHostEntry {
    /// Required fields absent from the block.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.hostname.is_none() {
            out.push("hostname");
        }
        if self.user.is_none() {
            out.push("user");
        }
        if self.proxy_invocation.is_none() {
            out.push("proxy invocation");
        }
        out
    }
}

/// Split a config line into keyword and value. Keyword ends at the first
/// whitespace or `=`; a later `=` inside the value (common in proxy
/// invocations) is not a separator.
fn line_keyword(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let Some(idx) = trimmed.find(|c: char| c == '=' || c.is_whitespace()) else {
        return Some((trimmed, ""));
    };
    let (key, rest) = trimmed.split_at(idx);
    let rest = rest.trim_start();
    let value = rest.strip_prefix('=').map(str::trim_start).unwrap_or(rest);
    Some((key, value.trim_end()))
}

/// Line terminator already used by the file; every write sticks to it so
/// unrelated lines stay byte-identical on CRLF configs.
fn line_terminator(text: &str) -> &'static str {
    if text.contains("\r\n") { "\r\n" } else { "\n" }
}

fn is_host_line(line: &str) -> bool {
    matches!(line_keyword(line), Some((key, _)) if key.eq_ignore_ascii_case("host"))
}

/// `Host` keyword match is case-insensitive; alias comparison is
/// case-sensitive. That asymmetry matches observed tool convention.
fn host_line_matches(line: &str, alias: &str) -> bool {
    match line_keyword(line) {
        Some((key, value)) if key.eq_ignore_ascii_case("host") => {
            value.split_whitespace().any(|token| token == alias)
        }
        _ => false,
    }
}

/// Extract the contiguous block starting at `Host {alias}` up to the next
/// `Host` line or end of file. The first matching block is authoritative;
/// later blocks with the same alias are flagged, never merged.
pub fn parse_host_block(text: &str, alias: &str) -> Option<SshHostEntry> {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.iter().position(|l| host_line_matches(l, alias))?;
    let end = lines[start + 1..]
        .iter()
        .position(|l| is_host_line(l))
        .map(|off| start + 1 + off)
        .unwrap_or(lines.len());
    let duplicate_alias = lines[end..].iter().any(|l| host_line_matches(l, alias));

    let mut entry = SshHostEntry {
        host_alias: alias.to_string(),
        hostname: None,
        user: None,
        proxy_invocation: None,
        raw_lines: lines[start..end].iter().map(|l| l.to_string()).collect(),
        duplicate_alias,
        start_line: start,
    };
    for line in &lines[start + 1..end] {
        let Some((key, value)) = line_keyword(line) else {
            continue;
        };
        match key.to_ascii_lowercase().as_str() {
            "hostname" => entry.hostname = Some(value.to_string()),
            "user" => entry.user = Some(value.to_string()),
            "proxycommand" => entry.proxy_invocation = Some(value.to_string()),
            _ => {}
        }
    }
    Some(entry)
}

fn indent_of(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

/// Indentation of the block's own first field line, the reference every
/// other field line is held to.
fn reference_indent(entry: &SshHostEntry) -> Option<String> {
    entry
        .raw_lines
        .iter()
        .skip(1)
        .find(|l| !l.trim().is_empty() && !l.trim_start().starts_with('#'))
        .map(|l| indent_of(l).to_string())
}

/// Flag known defect patterns in a parsed block.
pub fn validate(entry: &SshHostEntry) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();

    if entry.duplicate_alias {
        issues.push(ConfigIssue::DuplicateAlias {
            alias: entry.host_alias.clone(),
        });
    }
    for field in entry.missing_fields() {
        issues.push(ConfigIssue::MissingField {
            field: field.to_string(),
        });
    }
    if let Some(proxy) = &entry.proxy_invocation {
        if !proxy.contains(SERVER_RECORD_ENV) {
            issues.push(ConfigIssue::MissingEnvBinding);
        }
        if !proxy.contains(HOST_TOKEN) {
            let found = ENCODED_HOST_RE
                .find(proxy)
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| "no host argument".to_string());
            issues.push(ConfigIssue::WrongHostToken { found });
        }
        // A stale app token can survive in the proxy line alone, e.g. after
        // the HostName was edited by hand.
        if let Some(m) = ENCODED_HOST_RE
            .find_iter(proxy)
            .find(|m| arn::is_app_token(m.as_str()))
        {
            issues.push(ConfigIssue::AppHostname {
                hostname: m.as_str().to_string(),
            });
        }
    }
    if let Some(hostname) = &entry.hostname {
        if arn::is_app_token(hostname) {
            issues.push(ConfigIssue::AppHostname {
                hostname: hostname.clone(),
            });
        }
    }
    if let Some(indent) = reference_indent(entry) {
        for line in entry.raw_lines.iter().skip(1) {
            if line.trim().is_empty() || line.trim_start().starts_with('#') {
                continue;
            }
            if indent_of(line) != indent {
                issues.push(ConfigIssue::BadIndentation { line: line.clone() });
            }
        }
    }
    issues
}

/// Everything a textual fix needs besides the config text itself.
#[derive(Debug, Clone)]
pub struct FixContext {
    pub server_record_path: PathBuf,
}

/// Satisfaction predicate shared by `validate` and `apply_fix`; a fix whose
/// predicate already holds is skipped without a write.
fn fix_needed(entry: &SshHostEntry, kind: FixKind) -> bool {
    let issues = validate(entry);
    match kind {
        FixKind::EnvBinding => issues.contains(&ConfigIssue::MissingEnvBinding),
        FixKind::HostToken => issues
            .iter()
            .any(|i| matches!(i, ConfigIssue::WrongHostToken { .. })),
        FixKind::Indentation => issues
            .iter()
            .any(|i| matches!(i, ConfigIssue::BadIndentation { .. })),
        FixKind::ArnToSpace => issues
            .iter()
            .any(|i| matches!(i, ConfigIssue::AppHostname { .. })),
    }
}

fn fix_proxy_line(line: &str, kind: FixKind, ctx: &FixContext) -> String {
    match kind {
        FixKind::EnvBinding => {
            let binding = format!(
                "{}={} ",
                SERVER_RECORD_ENV,
                shell_escape::escape(ctx.server_record_path.to_string_lossy())
            );
            if let Some(pos) = line.find("bash -c \"") {
                let insert_at = pos + "bash -c \"".len();
                format!("{}{}{}", &line[..insert_at], binding, &line[insert_at..])
            } else {
                // No wrapping shell: bind directly in front of the command.
                match line_keyword(line) {
                    Some((_, value)) if !value.is_empty() => {
                        let value_at = line.rfind(value).unwrap_or(line.len());
                        format!("{}{}{}", &line[..value_at], binding, &line[value_at..])
                    }
                    _ => line.to_string(),
                }
            }
        }
        FixKind::HostToken => {
            if let Some(m) = ENCODED_HOST_RE.find(line) {
                format!("{}{}{}", &line[..m.start()], HOST_TOKEN, &line[m.end()..])
            } else if let Some(stripped) = line.strip_suffix('"') {
                format!("{stripped} '{HOST_TOKEN}'\"")
            } else {
                format!("{line} '{HOST_TOKEN}'")
            }
        }
        FixKind::ArnToSpace => ENCODED_HOST_RE
            .replace_all(line, |caps: &regex::Captures<'_>| {
                arn::space_token_from(&caps[0])
            })
            .into_owned(),
        FixKind::Indentation => line.to_string(),
    }
}

/// Apply one fix kind to the alias's block, returning the new text and
/// whether anything changed. Pure over its inputs.
pub fn apply_fix_text(
    text: &str,
    alias: &str,
    kind: FixKind,
    ctx: &FixContext,
) -> Result<(String, bool)> {
    let entry = parse_host_block(text, alias).ok_or_else(|| SmcError::ConfigMalformed {
        detail: format!("no 'Host {alias}' block found"),
    })?;
    if !fix_needed(&entry, kind) {
        return Ok((text.to_string(), false));
    }

    let eol = line_terminator(text);
    let had_trailing_newline = text.ends_with('\n');
    let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
    let start = entry.start_line;
    let end = start + entry.raw_lines.len();
    let indent = reference_indent(&entry);

    for line in lines[start + 1..end].iter_mut() {
        let is_proxy = matches!(
            line_keyword(line),
            Some((key, _)) if key.eq_ignore_ascii_case("proxycommand")
        );
        let is_hostname = matches!(
            line_keyword(line),
            Some((key, _)) if key.eq_ignore_ascii_case("hostname")
        );
        match kind {
            FixKind::EnvBinding | FixKind::HostToken if is_proxy => {
                *line = fix_proxy_line(line, kind, ctx);
            }
            FixKind::ArnToSpace if is_proxy || is_hostname => {
                *line = fix_proxy_line(line, kind, ctx);
            }
            FixKind::Indentation => {
                if let Some(indent) = &indent {
                    if !line.trim().is_empty() && !line.trim_start().starts_with('#') {
                        *line = format!("{indent}{}", line.trim_start());
                    }
                }
            }
            _ => {}
        }
    }

    let mut new_text = lines.join(eol);
    if had_trailing_newline {
        new_text.push_str(eol);
    }
    let changed = new_text != text;
    Ok((new_text, changed))
}

/// Append a well-formed block for the alias if none exists. No-op (returns
/// unchanged text) when the block is already present.
pub fn setup_host_text(
    text: &str,
    alias: &str,
    resource: &ResourceIdentifier,
    server_record_path: &Path,
    connect_script: &Path,
) -> Result<(String, bool)> {
    if parse_host_block(text, alias).is_some() {
        return Ok((text.to_string(), false));
    }
    let hostname = arn::encode(resource)?;
    let record = shell_escape::escape(server_record_path.to_string_lossy());
    let script = shell_escape::escape(connect_script.to_string_lossy());
    let eol = line_terminator(text);
    let block = format!(
        "Host {alias}{eol}    HostName {hostname}{eol}    User {DEFAULT_USER}{eol}    ProxyCommand bash -c \"{SERVER_RECORD_ENV}={record} {script} '{HOST_TOKEN}'\"{eol}"
    );
    let blank = format!("{eol}{eol}");
    let mut new_text = text.to_string();
    if !new_text.is_empty() && !new_text.ends_with('\n') {
        new_text.push_str(eol);
    }
    if !new_text.is_empty() && !new_text.ends_with(blank.as_str()) {
        new_text.push_str(eol);
    }
    new_text.push_str(&block);
    Ok((new_text, true))
}

/// File-backed manager wrapping the pure text operations with the backup
/// and atomic-replace policy.
#[derive(Debug, Clone)]
pub struct SshConfigManager {
    config_path: PathBuf,
    ctx: FixContext,
    connect_script: PathBuf,
}

impl SshConfigManager {
    pub fn new(config_path: PathBuf, server_record_path: PathBuf, connect_script: PathBuf) -> Self {
        Self {
            config_path,
            ctx: FixContext { server_record_path },
            connect_script,
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    fn read_config(&self) -> Result<String> {
        std::fs::read_to_string(&self.config_path).map_err(|_| SmcError::ConfigMissing {
            path: self.config_path.clone(),
        })
    }

    /// Parse the alias's block from the on-disk config.
    pub fn host_entry(&self, alias: &str) -> Result<Option<SshHostEntry>> {
        Ok(parse_host_block(&self.read_config()?, alias))
    }

    /// Structural presence check used by the prerequisite verifier; an
    /// absent file is `false`, never an error.
    pub fn has_host(&self, alias: &str) -> bool {
        match std::fs::read_to_string(&self.config_path) {
            Ok(text) => parse_host_block(&text, alias).is_some(),
            Err(_) => false,
        }
    }

    /// Timestamped snapshot path next to the config file.
    fn backup_path(&self) -> PathBuf {
        let stamp = chrono::Local::now().format("%Y%m%d%H%M%S%3f");
        let name = self
            .config_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "config".to_string());
        self.config_path.with_file_name(format!("{name}.{stamp}.bak"))
    }

    /// Write the new text via temp-file-and-rename after snapshotting the
    /// original. Returns the backup path.
    fn replace_config(&self, original: &str, new_text: &str) -> Result<PathBuf> {
        let backup = self.backup_path();
        std::fs::write(&backup, original).map_err(|source| SmcError::RepairWriteFailed {
            path: backup.clone(),
            source,
        })?;
        let tmp = self
            .config_path
            .with_file_name(format!(".smc-config-{}.tmp", std::process::id()));
        std::fs::write(&tmp, new_text).map_err(|source| SmcError::RepairWriteFailed {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &self.config_path).map_err(|source| {
            SmcError::RepairWriteFailed {
                path: self.config_path.clone(),
                source,
            }
        })?;
        Ok(backup)
    }

    /// Apply one fix kind idempotently. A fix whose predicate already holds
    /// reports `already_applied` and performs no write.
    pub fn apply_fix(&self, alias: &str, kind: FixKind) -> Result<FixRecord> {
        let original = self.read_config()?;
        let (new_text, changed) = apply_fix_text(&original, alias, kind, &self.ctx)?;
        if !changed {
            return Ok(FixRecord {
                fix_kind: kind,
                already_applied: true,
                backup_path: None,
            });
        }
        let backup = self.replace_config(&original, &new_text)?;
        tracing::info!(%kind, backup = %backup.display(), "applied SSH config fix");
        Ok(FixRecord {
            fix_kind: kind,
            already_applied: false,
            backup_path: Some(backup),
        })
    }

    /// Create the alias's block if absent. Missing config file counts as
    /// empty and is created.
    pub fn setup_host(&self, alias: &str, resource: &ResourceIdentifier) -> Result<bool> {
        let original = std::fs::read_to_string(&self.config_path).unwrap_or_default();
        let (new_text, changed) = setup_host_text(
            &original,
            alias,
            resource,
            &self.ctx.server_record_path,
            &self.connect_script,
        )?;
        if !changed {
            return Ok(false);
        }
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SmcError::RepairWriteFailed {
                path: self.config_path.clone(),
                source,
            })?;
        }
        if original.is_empty() && !self.config_path.exists() {
            std::fs::write(&self.config_path, &new_text).map_err(|source| {
                SmcError::RepairWriteFailed {
                    path: self.config_path.clone(),
                    source,
                }
            })?;
        } else {
            self.replace_config(&original, &new_text)?;
        }
        tracing::info!(alias, "created SSH host block");
        Ok(true)
    }

    /// Validation issues for the alias's block, `ConfigMalformed` when the
    /// block is missing entirely.
    pub fn validate_host(&self, alias: &str) -> Result<Vec<ConfigIssue>> {
        match self.host_entry(alias)? {
            Some(entry) => Ok(validate(&entry)),
            None => Err(SmcError::ConfigMalformed {
                detail: format!("no 'Host {alias}' block found"),
            }),
        }
    }
}
