//! Best-effort purge of stale host-key entries.
//!
//! Encoded hostnames are rotated whenever the space is recreated, so old
//! key lines accumulate and trigger mismatch prompts. The purge is never
//! allowed to abort a workflow: any failure is logged and swallowed.

use std::path::Path;
use tracing::{debug, warn};

/// True when a known-hosts line records a key for a host matching the
/// prefix, either bare or in `[host]:port` form.
fn line_matches_prefix(line: &str, prefix: &str) -> bool {
    let Some(hosts_field) = line.split_whitespace().next() else {
        return false;
    };
    hosts_field.split(',').any(|host| {
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.split_once("]:"))
            .map(|(h, _)| h)
            .unwrap_or(host);
        host.starts_with(prefix)
    })
}

/// Remove key lines whose host starts with `prefix`. Returns the number of
/// lines dropped; all failure modes return 0 after a warning.
pub fn purge_matching(known_hosts: &Path, prefix: &str) -> usize {
    let text = match std::fs::read_to_string(known_hosts) {
        Ok(text) => text,
        Err(e) => {
            debug!(path = %known_hosts.display(), error = %e, "no known_hosts to purge");
            return 0;
        }
    };
    let kept: Vec<&str> = text
        .lines()
        .filter(|line| !line_matches_prefix(line, prefix))
        .collect();
    let dropped = text.lines().count() - kept.len();
    if dropped == 0 {
        return 0;
    }

    let eol = if text.contains("\r\n") { "\r\n" } else { "\n" };
    let mut new_text = kept.join(eol);
    if text.ends_with('\n') && !new_text.is_empty() {
        new_text.push_str(eol);
    }
    let tmp = known_hosts.with_file_name(format!(".smc-known-hosts-{}.tmp", std::process::id()));
    let result = std::fs::write(&tmp, &new_text).and_then(|_| std::fs::rename(&tmp, known_hosts));
    match result {
        Ok(()) => {
            debug!(dropped, prefix, "purged stale host keys");
            dropped
        }
        Err(e) => {
            warn!(path = %known_hosts.display(), error = %e, "host key purge failed; continuing");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purges_only_matching_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("known_hosts");
        std::fs::write(
            &path,
            "example.com ssh-ed25519 AAAA1\nsm_lc_arn_._aws_._old ssh-ed25519 AAAA2\n[sm_lc_arn_._aws_._older]:2222 ssh-rsa AAAA3\nother.host ssh-rsa AAAA4\n",
        )
        .unwrap();

        let dropped = purge_matching(&path, "sm_lc_");
        assert_eq!(dropped, 2);

        let remaining = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            remaining,
            "example.com ssh-ed25519 AAAA1\nother.host ssh-rsa AAAA4\n"
        );
    }

    #[test]
    fn crlf_file_keeps_line_endings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("known_hosts");
        std::fs::write(
            &path,
            "example.com ssh-ed25519 AAAA1\r\nsm_lc_arn_._aws_._old ssh-ed25519 AAAA2\r\nother.host ssh-rsa AAAA3\r\n",
        )
        .unwrap();

        assert_eq!(purge_matching(&path, "sm_lc_"), 1);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "example.com ssh-ed25519 AAAA1\r\nother.host ssh-rsa AAAA3\r\n"
        );
    }

    #[test]
    fn missing_file_is_non_fatal() {
        assert_eq!(
            purge_matching(Path::new("/no/such/known_hosts"), "sm_lc_"),
            0
        );
    }

    #[test]
    fn no_matches_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("known_hosts");
        let original = "example.com ssh-ed25519 AAAA1\n";
        std::fs::write(&path, original).unwrap();
        assert_eq!(purge_matching(&path, "sm_lc_"), 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }
}
