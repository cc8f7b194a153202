//! Build subcommand for configuration-builder CLI
//!
//! Applies sources in the order they are given on the command line and
//! prints the merged tree.

use crate::config::{
    BuilderOptions, ConfigurationBuilder, DEFAULT_SETTINGS_FILE, FileFormat, KeyCase,
    SecretsOptions,
};
use crate::format::{OutputFormat, render};
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Arguments for the build subcommand
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Source to merge, repeatable; later sources win
    ///
    /// Accepted forms: json:PATH, yaml:PATH, file:PATH (format from the
    /// extension), each with a `?` suffix for optional files (json?:PATH),
    /// env, secrets, secrets:ID.
    /// Defaults to `json?:appsettings.json` followed by `env`.
    #[arg(short, long = "source", value_name = "SOURCE")]
    pub sources: Vec<SourceSpec>,

    /// Output format: json (default) or yaml
    #[arg(short, long, default_value = "json", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Lowercase keys read from the environment and user-secrets
    #[arg(long)]
    pub lowercase_keys: bool,

    /// Executable providing `user-secrets`
    #[arg(long, default_value = "dotnet", value_name = "PROGRAM")]
    pub secrets_program: String,

    /// Seconds to wait for the secrets listing before giving up
    #[arg(long, default_value_t = 30, value_name = "SECONDS")]
    pub secrets_timeout: u64,
}

impl BuildArgs {
    /// Sources to apply, falling back to the default file and environment.
    pub fn effective_sources(&self) -> Vec<SourceSpec> {
        if self.sources.is_empty() {
            vec![
                SourceSpec::File {
                    path: PathBuf::from(DEFAULT_SETTINGS_FILE),
                    format: FileFormat::Json,
                    optional: true,
                },
                SourceSpec::Environment,
            ]
        } else {
            self.sources.clone()
        }
    }

    /// Builder options derived from the flags.
    pub fn builder_options(&self) -> BuilderOptions {
        BuilderOptions {
            key_case: if self.lowercase_keys {
                KeyCase::Lower
            } else {
                KeyCase::Preserve
            },
            secrets: SecretsOptions {
                program: self.secrets_program.clone(),
                timeout: Duration::from_secs(self.secrets_timeout),
            },
        }
    }
}

/// One configuration source named on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    File {
        path: PathBuf,
        format: FileFormat,
        optional: bool,
    },
    Environment,
    UserSecrets(Option<String>),
}

impl std::str::FromStr for SourceSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "env" | "environment" => return Ok(SourceSpec::Environment),
            "secrets" => return Ok(SourceSpec::UserSecrets(None)),
            _ => {}
        }

        let Some((kind, rest)) = s.split_once(':') else {
            return Err(invalid_source(s));
        };
        match kind {
            "secrets" if !rest.is_empty() => Ok(SourceSpec::UserSecrets(Some(rest.to_string()))),
            "file" | "file?" | "json" | "json?" | "yaml" | "yaml?" if !rest.is_empty() => {
                let path = PathBuf::from(rest);
                let format = match kind.trim_end_matches('?') {
                    "json" => FileFormat::Json,
                    "yaml" => FileFormat::Yaml,
                    _ => FileFormat::from_path(&path),
                };
                Ok(SourceSpec::File {
                    path,
                    format,
                    optional: kind.ends_with('?'),
                })
            }
            _ => Err(invalid_source(s)),
        }
    }
}

fn invalid_source(s: &str) -> String {
    format!(
        "Invalid source '{}'. Valid options: json:PATH, yaml:PATH, file:PATH (append ? for optional), env, secrets, secrets:ID",
        s
    )
}

/// Apply every source in order to a fresh builder.
pub fn build_configuration(args: &BuildArgs) -> Result<ConfigurationBuilder> {
    let mut builder = ConfigurationBuilder::with_options(args.builder_options());

    for source in args.effective_sources() {
        debug!(?source, "applying source");
        match &source {
            SourceSpec::File {
                path,
                format,
                optional,
            } => {
                builder
                    .add_file(path, *format, *optional)
                    .with_context(|| format!("Failed to load {}", path.display()))?;
            }
            SourceSpec::Environment => {
                builder
                    .add_environment_variables()
                    .context("Failed to load environment variables")?;
            }
            SourceSpec::UserSecrets(id) => {
                builder
                    .add_user_secrets(id.as_deref())
                    .context("Failed to load user secrets")?;
            }
        }
    }

    Ok(builder)
}

/// Execute the build subcommand.
pub fn run(args: BuildArgs) -> Result<()> {
    let builder = build_configuration(&args)?;
    println!("{}", render(builder.build(), args.format)?);
    Ok(())
}
