//! Structured document sources (JSON and YAML files).

use crate::error::{ConfigError, Result};
use serde_json::{Map, Value};
use std::path::Path;

/// Default file name for the application settings document.
pub const DEFAULT_SETTINGS_FILE: &str = "appsettings.json";

/// Document format of a structured file source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Yaml,
}

impl FileFormat {
    /// Guess the format from a file extension, defaulting to JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            _ => FileFormat::Json,
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileFormat::Json => write!(f, "json"),
            FileFormat::Yaml => write!(f, "yaml"),
        }
    }
}

/// Read a structured document from disk.
///
/// Returns `Ok(None)` when the file does not exist and `optional` is set.
pub fn read_document(
    path: &Path,
    format: FileFormat,
    optional: bool,
) -> Result<Option<Map<String, Value>>> {
    if optional && !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_document(&content, format, &path.display().to_string()).map(Some)
}

/// Parse document text into a top-level mapping.
pub fn parse_document(content: &str, format: FileFormat, origin: &str) -> Result<Map<String, Value>> {
    let value: Value = match format {
        FileFormat::Json => {
            serde_json::from_str(content).map_err(|source| ConfigError::InvalidDocument {
                origin: origin.to_string(),
                source,
            })?
        }
        FileFormat::Yaml => {
            serde_yaml::from_str(content).map_err(|source| ConfigError::InvalidYaml {
                origin: origin.to_string(),
                source,
            })?
        }
    };

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ConfigError::NotAnObject {
            origin: origin.to_string(),
        }),
    }
}
