//! Error types for configuration sources and merging.

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

/// Errors raised while loading or merging configuration.
///
/// Missing optional files and an unresolvable secrets identifier are not
/// errors; they are logged and skipped by the builder.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {origin}: {source}")]
    InvalidDocument {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid YAML in {origin}: {source}")]
    InvalidYaml {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{origin} must contain a mapping at the top level")]
    NotAnObject { origin: String },

    /// A flattened key needs to descend through a segment that already
    /// holds a scalar value.
    #[error("key '{key}' descends through '{segment}', which already holds a value")]
    StructuralConflict { key: String, segment: String },

    #[error("failed to start '{program}': {source}")]
    SubprocessSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process started but waiting on it failed.
    #[error("failed to wait for '{program}': {source}")]
    SubprocessWait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {status}: {stderr}")]
    SubprocessFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("'{program}' did not finish within {timeout:?}")]
    SubprocessTimeout { program: String, timeout: Duration },

    #[error("secrets store returned malformed output: {source}")]
    MalformedOutput {
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read secrets identifier from {}: {source}", .path.display())]
    IdentifierLookup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Short machine-friendly name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigError::Io { .. } => "io",
            ConfigError::InvalidDocument { .. } => "invalid_document",
            ConfigError::InvalidYaml { .. } => "invalid_yaml",
            ConfigError::NotAnObject { .. } => "not_an_object",
            ConfigError::StructuralConflict { .. } => "structural_conflict",
            ConfigError::SubprocessSpawn { .. } => "subprocess_spawn",
            ConfigError::SubprocessWait { .. } => "subprocess_wait",
            ConfigError::SubprocessFailed { .. } => "subprocess_failed",
            ConfigError::SubprocessTimeout { .. } => "subprocess_timeout",
            ConfigError::MalformedOutput { .. } => "malformed_output",
            ConfigError::IdentifierLookup { .. } => "identifier_lookup",
        }
    }
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_structural_conflict() {
        let err = ConfigError::StructuralConflict {
            key: "a:b:c".to_string(),
            segment: "b".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "key 'a:b:c' descends through 'b', which already holds a value"
        );
        assert_eq!(err.kind(), "structural_conflict");
    }

    #[test]
    fn test_display_timeout() {
        let err = ConfigError::SubprocessTimeout {
            program: "dotnet".to_string(),
            timeout: Duration::from_secs(5),
        };
        assert_eq!(err.to_string(), "'dotnet' did not finish within 5s");
    }

    #[test]
    fn test_wait_failure_is_not_a_spawn_failure() {
        let err = ConfigError::SubprocessWait {
            program: "dotnet".to_string(),
            source: std::io::Error::other("interrupted"),
        };
        assert_eq!(err.to_string(), "failed to wait for 'dotnet': interrupted");
        assert_eq!(err.kind(), "subprocess_wait");
    }
}
