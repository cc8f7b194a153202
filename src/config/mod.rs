//! Layered configuration building.
//!
//! Fragments from several sources are merged into one tree, later sources
//! overriding earlier ones leaf by leaf:
//! 1. **Files** - JSON (`appsettings.json` by default) or YAML documents
//! 2. **Environment** - process variables, minus a fixed system denylist
//! 3. **User secrets** - `dotnet user-secrets list --json` output
//!
//! ## Flattened keys
//! Keys may encode a path with `:`, `$$` or `__` (first match wins per key),
//! e.g. `Logging__LogLevel=Debug` becomes `{"Logging": {"LogLevel": "Debug"}}`.
//! Values of flattened keys from textual sources are narrowed to integers or
//! decimals when they look like one.

pub mod builder;
pub mod env;
pub mod files;
pub mod merge;
pub mod normalize;
pub mod secrets;

pub use builder::{BuilderOptions, ConfigurationBuilder, SourceKind};
pub use files::{DEFAULT_SETTINGS_FILE, FileFormat};
pub use merge::{merge_maps, selective_merge};
pub use normalize::{DELIMITERS, KeyCase, NormalizeOptions, coerce_scalar, detect_delimiter, normalize};
pub use secrets::{DotnetUserSecrets, SecretsOptions, SecretsProvider, find_user_secrets_id};
