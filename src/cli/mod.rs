//! CLI interface for relnotes

use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod generate;

/// relnotes: release notes generation from repository activity
#[derive(Parser)]
#[command(name = "relnotes")]
#[command(about = "Generates structured release notes from repository activity", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The main command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Main command categories
#[derive(Subcommand)]
pub enum Commands {
    /// Generates the release notes document for a tag
    Generate(generate::GenerateCommand),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Generate(generate_cmd) => generate_cmd.execute().await,
        }
    }
}
