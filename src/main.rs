//! configuration-builder
//!
//! Command-line front end that merges configuration sources in order and
//! prints the resulting tree.

use anyhow::Result;
use clap::Parser;
use configuration_builder::cli::{Cli, Command, build};
use configuration_builder::logging::{self, LogTarget};

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    match cli.command {
        Command::Build(args) => build::run(args),
    }
}
