//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{HistoryCommand, ListCommand, ResolveCommand, RunCommand, ValidateCommand};

/// Release pipeline orchestrator
#[derive(Debug, Parser, Clone)]
#[command(name = "shipway")]
#[command(author = "Shipway Contributors")]
#[command(version = "0.1.0")]
#[command(about = "A release pipeline orchestrator", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run a pipeline for a trigger
    Run(RunCommand),

    /// Validate a pipeline definition
    Validate(ValidateCommand),

    /// Resolve the documentation version for a reference
    Resolve(ResolveCommand),

    /// List pipelines with run history
    List(ListCommand),

    /// Show run history
    History(HistoryCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}

use std::ffi::OsString;
