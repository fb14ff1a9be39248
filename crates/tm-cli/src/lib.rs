//! Testrunner CLI library

pub mod commands;
pub mod error;

pub use error::{Error, Result};

use clap::{Parser, Subcommand};

/// Testrunner - launch testruns and wait for their results
#[derive(Parser, Debug)]
#[command(name = "testrunner")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the testrun chart for a shoot and execute its testruns
    RunTemplate(commands::run_template::RunTemplateArgs),
    /// Execute the testruns of a manifest file
    RunTestrun(commands::run_testrun::RunTestrunArgs),
}

impl Cli {
    /// Run the CLI command
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::RunTemplate(args) => commands::run_template::run(args).await,
            Commands::RunTestrun(args) => commands::run_testrun::run(args).await,
        }
    }
}
