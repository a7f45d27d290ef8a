//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::config::Config;

/// Interactive session arguments.
#[derive(Debug, Default, Args)]
pub struct RunCommand {
    /// Person record file, overriding `storage.people_path`
    #[arg(long, value_name = "FILE")]
    pub people: Option<PathBuf>,

    /// Credential file, overriding `storage.users_path`
    #[arg(long, value_name = "FILE")]
    pub users: Option<PathBuf>,

    /// Log file, overriding `logging.log_path`
    #[arg(long, value_name = "FILE")]
    pub log: Option<PathBuf>,
}

impl RunCommand {
    /// Apply the path overrides given on the command line.
    pub fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.people {
            config.storage.people_path.clone_from(path);
        }
        if let Some(path) = &self.users {
            config.storage.users_path.clone_from(path);
        }
        if let Some(path) = &self.log {
            config.logging.log_path.clone_from(path);
        }
    }
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
