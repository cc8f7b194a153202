//! Layered configuration builder.
//!
//! Sources are added in caller-chosen order. Each one is normalized into a
//! nested tree and selectively merged into the accumulated tree, so later
//! sources win at every leaf they share with earlier ones.

use super::env;
use super::files::{self, DEFAULT_SETTINGS_FILE, FileFormat};
use super::merge::selective_merge;
use super::normalize::{KeyCase, NormalizeOptions, normalize};
use super::secrets::{self, DotnetUserSecrets, SecretsOptions, SecretsProvider};
use crate::error::{ConfigError, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Kind of source a configuration fragment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    File,
    Memory,
    Environment,
    UserSecrets,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::File => write!(f, "file"),
            SourceKind::Memory => write!(f, "memory"),
            SourceKind::Environment => write!(f, "environment"),
            SourceKind::UserSecrets => write!(f, "user-secrets"),
        }
    }
}

/// Builder-wide settings.
#[derive(Debug, Clone, Default)]
pub struct BuilderOptions {
    /// Casing applied to keys from environment and secrets sources.
    pub key_case: KeyCase,
    /// Settings for the default secrets store.
    pub secrets: SecretsOptions,
}

/// Accumulates configuration from successive sources.
///
/// The tree stays unset until the first source is merged; [`build`] returns
/// `None` in that state, which is distinct from an empty mapping.
///
/// [`build`]: ConfigurationBuilder::build
#[derive(Debug, Clone, Default)]
pub struct ConfigurationBuilder {
    options: BuilderOptions,
    root: Option<Value>,
}

impl ConfigurationBuilder {
    /// Create a builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder with explicit options.
    pub fn with_options(options: BuilderOptions) -> Self {
        Self {
            options,
            root: None,
        }
    }

    /// Add `appsettings.json` from the current directory if it exists.
    pub fn add_default_json_file(&mut self) -> Result<&mut Self> {
        self.add_json_file(DEFAULT_SETTINGS_FILE, true)
    }

    /// Add a JSON document. A missing file is skipped when `optional` is set.
    pub fn add_json_file(&mut self, path: impl AsRef<Path>, optional: bool) -> Result<&mut Self> {
        self.add_file(path.as_ref(), FileFormat::Json, optional)
    }

    /// Add a YAML document. A missing file is skipped when `optional` is set.
    pub fn add_yaml_file(&mut self, path: impl AsRef<Path>, optional: bool) -> Result<&mut Self> {
        self.add_file(path.as_ref(), FileFormat::Yaml, optional)
    }

    /// Add a structured document of the given format.
    pub fn add_file(&mut self, path: &Path, format: FileFormat, optional: bool) -> Result<&mut Self> {
        let Some(document) = files::read_document(path, format, optional)? else {
            info!(path = %path.display(), "optional {} file not found, skipping", format);
            return Ok(self);
        };
        let tree = normalize(document, NormalizeOptions::structured())?;
        self.merge(SourceKind::File, &path.display().to_string(), tree);
        Ok(self)
    }

    /// Add an already-parsed structured mapping.
    ///
    /// Values are taken as typed; flattened keys are still expanded.
    pub fn add_map(&mut self, origin: &str, map: Map<String, Value>) -> Result<&mut Self> {
        let tree = normalize(map, NormalizeOptions::structured())?;
        self.merge(SourceKind::Memory, origin, tree);
        Ok(self)
    }

    /// Add the current process environment, minus system variables.
    pub fn add_environment_variables(&mut self) -> Result<&mut Self> {
        self.add_environment_from(env::process_vars())
    }

    /// Add an explicit set of environment-style variables.
    pub fn add_environment_from<I, K, V>(&mut self, vars: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let flat = env::collect_vars(vars);
        let tree = normalize(flat, NormalizeOptions::text(self.options.key_case))?;
        self.merge(SourceKind::Environment, "environment", tree);
        Ok(self)
    }

    /// Add secrets from `dotnet user-secrets`.
    ///
    /// Without an explicit `id`, the identifier is discovered from a
    /// `.usersecrets` file in the current directory or its ancestors. An
    /// unresolved identifier is logged and skipped.
    pub fn add_user_secrets(&mut self, id: Option<&str>) -> Result<&mut Self> {
        let provider = DotnetUserSecrets::new(self.options.secrets.clone());
        self.add_user_secrets_with(&provider, id)
    }

    /// Add secrets listed by `provider`.
    pub fn add_user_secrets_with(
        &mut self,
        provider: &dyn SecretsProvider,
        id: Option<&str>,
    ) -> Result<&mut Self> {
        match id {
            Some(id) => self.apply_user_secrets(provider, Some(id.to_string())),
            None => {
                let cwd = std::env::current_dir().map_err(|source| {
                    ConfigError::IdentifierLookup {
                        path: PathBuf::from("."),
                        source,
                    }
                })?;
                self.add_user_secrets_from(provider, &cwd)
            }
        }
    }

    /// Add secrets listed by `provider`, discovering the identifier from
    /// `start_dir` and its ancestors.
    pub fn add_user_secrets_from(
        &mut self,
        provider: &dyn SecretsProvider,
        start_dir: &Path,
    ) -> Result<&mut Self> {
        let id = secrets::find_user_secrets_id(start_dir)?;
        self.apply_user_secrets(provider, id)
    }

    fn apply_user_secrets(
        &mut self,
        provider: &dyn SecretsProvider,
        id: Option<String>,
    ) -> Result<&mut Self> {
        let Some(id) = id.filter(|id| !id.is_empty()) else {
            warn!("File `{}` with id not found", secrets::USER_SECRETS_FILE);
            return Ok(self);
        };

        let raw = provider.list(&id)?;
        let flat = secrets::parse_secrets_output(&raw)?;
        let tree = normalize(flat, NormalizeOptions::text(self.options.key_case))?;
        self.merge(SourceKind::UserSecrets, &id, tree);
        Ok(self)
    }

    /// The accumulated tree, or `None` if no source has been added yet.
    ///
    /// This is the live state; later `add_*` calls keep accumulating.
    pub fn build(&self) -> Option<&Value> {
        self.root.as_ref()
    }

    /// Consume the builder and return the accumulated tree.
    pub fn into_value(self) -> Option<Value> {
        self.root
    }

    fn merge(&mut self, kind: SourceKind, origin: &str, tree: Map<String, Value>) {
        debug!(source = %kind, origin = %origin, keys = tree.len(), "merging configuration source");
        let delta = Value::Object(tree);
        self.root = Some(match self.root.take() {
            Some(base) => selective_merge(base, delta),
            None => delta,
        });
    }
}
