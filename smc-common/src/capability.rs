//! Connect-verb resolution across the two supported host environments.
//!
//! The primary and alternate editors expose overlapping but non-identical
//! command namespaces, and invoking an unregistered verb is a silent no-op.
//! Resolution is a pure preference-table lookup: variant-specific verbs
//! first, generic fallbacks last, first registered verb wins. Discovery is
//! never interleaved with invocation attempts.

use crate::types::HostVariant;

/// Ordered preference list for the primary editor.
const PRIMARY_VERBS: &[&str] = &[
    "opensshremotes.openEmptyWindowInCurrentWindow",
    "opensshremotes.openEmptyWindow",
    "workbench.action.remote.openEmptyWindow",
];

/// Ordered preference list for the alternate (server-hosted) editor.
const ALTERNATE_VERBS: &[&str] = &[
    "opensshremotesreh.openEmptyWindowInCurrentWindow",
    "opensshremotesreh.openEmptyWindow",
    "workbench.action.remote.openEmptyWindow",
];

/// Preference table for a host variant.
pub fn preference_list(variant: HostVariant) -> &'static [&'static str] {
    match variant {
        HostVariant::Primary => PRIMARY_VERBS,
        HostVariant::Alternate => ALTERNATE_VERBS,
    }
}

/// Pick the best registered connect verb, or `None` when nothing usable is
/// registered and the caller must fall back to manual instructions.
pub fn resolve_connect_verb<S: AsRef<str>>(
    variant: HostVariant,
    registered: &[S],
) -> Option<&'static str> {
    preference_list(variant)
        .iter()
        .find(|verb| registered.iter().any(|r| r.as_ref() == **verb))
        .copied()
}
