//! Process environment source.

use serde_json::{Map, Value};

/// Shell and operating-system variables that never carry application
/// configuration.
pub const EXCLUDED_ENV_VARS: &[&str] = &[
    "TERM_PROGRAM",
    "SHELL",
    "TERM",
    "TMPDIR",
    "TERM_PROGRAM_VERSION",
    "TERM_SESSION_ID",
    "USER",
    "SSH_AUTH_SOCK",
    "PATH",
    "PWD",
    "XPC_FLAGS",
    "SHLVL",
    "HOME",
    "DISPLAY",
    "LANG",
    "OLDPWD",
];

/// Whether `name` is on the system-variable denylist.
pub fn is_excluded(name: &str) -> bool {
    EXCLUDED_ENV_VARS.contains(&name)
}

/// Collect variables into a flat string mapping, dropping denylisted names.
pub fn collect_vars<I, K, V>(vars: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    vars.into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .filter(|(k, _)| !is_excluded(k))
        .map(|(k, v)| (k, Value::String(v)))
        .collect()
}

/// Snapshot the current process environment.
///
/// Variables whose name or value is not valid UTF-8 are skipped.
pub fn process_vars() -> Vec<(String, String)> {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}
