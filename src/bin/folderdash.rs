//! Folderdash CLI binary.
//!
//! Command-line interface for synchronized folder dashboards.

use anyhow::Context;
use clap::Parser;
use folderdash::cli::{Cli, CliContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let context = CliContext::new(&cli).context("failed to initialize vault")?;

    let output = context.execute(&cli.command).await?;
    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}
