//! Configuration Builder Library
//!
//! Builds one hierarchical configuration tree from JSON/YAML files, the
//! process environment and dotnet user-secrets, in the spirit of
//! `Microsoft.Extensions.Configuration`.

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;

pub use config::ConfigurationBuilder;
pub use error::{ConfigError, Result};
