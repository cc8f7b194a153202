//! dotnet user-secrets source and secrets identifier discovery.
//!
//! The secrets tool is run as `<program> user-secrets list --id <id> --json`.
//! Its output is wrapped in `//BEGIN` and `//END` markers which are stripped
//! before the remainder is parsed as a JSON object of flat keys.

use crate::error::{ConfigError, Result};
use serde_json::{Map, Value};
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// Marker file holding the secrets identifier.
pub const USER_SECRETS_FILE: &str = ".usersecrets";

/// Directory entry that marks a repository root and stops discovery.
pub const REPOSITORY_MARKER: &str = ".git";

/// Number of ancestor directories searched above the starting directory.
pub const MAX_ANCESTOR_DEPTH: usize = 2;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Settings for the subprocess-backed secrets store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretsOptions {
    /// Executable providing the `user-secrets` command.
    pub program: String,
    /// Maximum time the listing may take before the process is killed.
    pub timeout: Duration,
}

impl Default for SecretsOptions {
    fn default() -> Self {
        Self {
            program: "dotnet".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// A store able to list the secrets of one collection.
pub trait SecretsProvider {
    /// Return the raw listing for the collection named `id`.
    fn list(&self, id: &str) -> Result<String>;
}

/// Secrets store backed by the `dotnet user-secrets` command.
#[derive(Debug, Clone, Default)]
pub struct DotnetUserSecrets {
    options: SecretsOptions,
}

impl DotnetUserSecrets {
    pub fn new(options: SecretsOptions) -> Self {
        Self { options }
    }

    fn timeout_error(&self) -> ConfigError {
        ConfigError::SubprocessTimeout {
            program: self.options.program.clone(),
            timeout: self.options.timeout,
        }
    }

    /// Wait for a pipe reader to hand over its bytes, up to `deadline`.
    fn collect(&self, output: &Receiver<Vec<u8>>, deadline: Option<Instant>) -> Result<Vec<u8>> {
        let received = match deadline {
            Some(deadline) => output.recv_timeout(deadline.saturating_duration_since(Instant::now())),
            None => output.recv().map_err(RecvTimeoutError::from),
        };
        match received {
            Ok(bytes) => Ok(bytes),
            Err(RecvTimeoutError::Timeout) => Err(self.timeout_error()),
            Err(RecvTimeoutError::Disconnected) => Ok(Vec::new()),
        }
    }
}

impl SecretsProvider for DotnetUserSecrets {
    fn list(&self, id: &str) -> Result<String> {
        let program = &self.options.program;
        debug!(program = %program, id = %id, "listing user secrets");

        let mut child = Command::new(program)
            .args(["user-secrets", "list", "--id", id, "--json"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ConfigError::SubprocessSpawn {
                program: program.clone(),
                source,
            })?;

        // Drain both pipes on their own threads so a chatty child cannot
        // block on a full pipe while we poll for its exit.
        let stdout = spawn_drain(child.stdout.take());
        let stderr = spawn_drain(child.stderr.take());

        // A timeout too large to represent means no deadline.
        let deadline = Instant::now().checked_add(self.options.timeout);
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if deadline.is_some_and(|deadline| Instant::now() >= deadline) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(self.timeout_error());
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(source) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ConfigError::SubprocessWait {
                        program: program.clone(),
                        source,
                    });
                }
            }
        };

        // Background processes started by the tool may still hold the pipes
        // open after it exits; the deadline covers collecting output too.
        let stdout = self.collect(&stdout, deadline)?;
        let stderr = self.collect(&stderr, deadline)?;

        if !status.success() {
            return Err(ConfigError::SubprocessFailed {
                program: program.clone(),
                status,
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

fn spawn_drain<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        let _ = tx.send(buf);
    });
    rx
}

/// Strip the listing markers and newlines, then parse the JSON object.
pub fn parse_secrets_output(raw: &str) -> Result<Map<String, Value>> {
    let cleaned = raw
        .replace("//BEGIN", "")
        .replace("//END", "")
        .replace('\n', "");

    let value: Value =
        serde_json::from_str(&cleaned).map_err(|source| ConfigError::MalformedOutput { source })?;

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ConfigError::NotAnObject {
            origin: "user-secrets listing".to_string(),
        }),
    }
}

/// Look for a `.usersecrets` file in `start` and up to
/// [`MAX_ANCESTOR_DEPTH`] ancestors.
///
/// Discovery stops at the first directory containing a `.git` entry (unless
/// that directory also holds `.usersecrets`) and at the filesystem root. An
/// empty identifier file counts as not found.
pub fn find_user_secrets_id(start: &Path) -> Result<Option<String>> {
    let mut current = Some(start);
    let mut remaining = MAX_ANCESTOR_DEPTH;

    while let Some(dir) = current {
        let candidate = dir.join(USER_SECRETS_FILE);
        if candidate.exists() {
            let content =
                std::fs::read_to_string(&candidate).map_err(|source| ConfigError::IdentifierLookup {
                    path: candidate.clone(),
                    source,
                })?;
            let id = content.trim();
            debug!(path = %candidate.display(), "found secrets identifier file");
            return Ok((!id.is_empty()).then(|| id.to_string()));
        }

        if dir.join(REPOSITORY_MARKER).exists() {
            return Ok(None);
        }

        if remaining == 0 {
            break;
        }
        remaining -= 1;
        current = dir.parent();
    }

    Ok(None)
}
