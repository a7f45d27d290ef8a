//! `recordkeeper` - console record manager
//!
//! This binary wires configuration, logging and the interactive session
//! together.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;

use recordkeeper::cli::{Cli, Command, ConfigCommand, RunCommand};
use recordkeeper::logging::{write_fallback_line, Verbosity};
use recordkeeper::prompt::ConsolePrompt;
use recordkeeper::{fatal, init_logging, App, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbosity = cli.verbosity();

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    match cli.into_command() {
        Command::Run(run) => run_session(config, &run, verbosity),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

fn run_session(mut config: Config, run: &RunCommand, verbosity: Verbosity) -> Result<()> {
    run.apply(&mut config);
    config.validate().context("invalid configuration")?;

    let sink = match init_logging(&config.logging, verbosity) {
        Ok(sink) => sink,
        Err(e) => {
            eprintln!("Critical error initializing log file: {e}. Program cannot continue safely.");
            write_fallback_line(
                &config.logging.log_path,
                &format!("Failed to initialize logging: {e}"),
            );
            return Err(e).context("failed to initialize logging");
        }
    };

    let app = App::new(config);
    if let Err(e) = app.run(&mut ConsolePrompt::new()) {
        println!("An unexpected error occurred: {e}");
        fatal!(error = ?e, "Unhandled error in main application flow: {e}");
    }

    drop(sink);
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!(
                    "  People file:        {}",
                    config.storage.people_path.display()
                );
                println!(
                    "  Users file:         {}",
                    config.storage.users_path.display()
                );
                println!();
                println!("[Auth]");
                println!(
                    "  Max login attempts: {}",
                    config.auth.max_login_attempts
                );
                println!("  Hash passwords:     {}", config.auth.hash_passwords);
                println!();
                println!("[Logging]");
                println!("  Log file:           {}", config.logging.log_path.display());
                println!("  Level:              {}", config.logging.level);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
