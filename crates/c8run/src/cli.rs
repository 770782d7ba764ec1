use c8run_core::Settings;
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "c8run",
    version,
    about = "Start, stop and package a local Camunda 8 platform"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration passed to Camunda, relative to the working directory
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Return once everything is started instead of waiting for Ctrl+C
    #[arg(long, global = true)]
    pub detached: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Start Elasticsearch, Connectors and Camunda
    Start,
    /// Stop every service started from this directory
    Stop,
    /// Download the distributions and build the bundle archive
    Package,
}

impl Cli {
    pub fn settings(&self) -> Settings {
        Settings {
            config: self.config.clone(),
            detached: self.detached,
        }
    }
}

/// Exit status for a failed parse: help and version output are not failures
pub fn exit_code_for(error: &clap::Error) -> i32 {
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}
