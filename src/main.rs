use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod config;
mod cursor;
mod daemon;
mod detect;
mod error;
mod platform;
mod session;
#[cfg(test)]
mod test_utils;
mod ws;

use crate::detect::detector::{LanguageCode, ShellDetector, classify};
use crate::platform::command::PlatformKind;
use crate::ws::client::send_command;
use crate::ws::control_server::{ControlCommand, ControlResponse};

#[derive(Parser)]
#[command(name = "lang-cursor")]
#[command(about = "Colours the editor cursor by the active keyboard language", long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/lang-cursor/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Editor settings.json to write the cursor colour into
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    /// Control channel address, e.g. 127.0.0.1:8766
    #[arg(short, long, global = true)]
    listen: Option<String>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the daemon that owns the poll loop
    Daemon {
        /// Begin polling immediately
        #[arg(long)]
        start: bool,
    },
    /// Ask the running daemon to start polling
    Start,
    /// Ask the running daemon to stop polling and restore the cursor colour
    Stop,
    /// Show whether the daemon is polling and the last detected language
    Status,
    /// Detect the keyboard language once and print it
    Detect,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

fn print_response(response: &ControlResponse) {
    let state = if response.running { "running" } else { "stopped" };
    match (&response.message, &response.language) {
        (Some(message), Some(lang)) => println!("{} ({}, Keyboard Lang: {})", message, state, lang),
        (Some(message), None) => println!("{} ({})", message, state),
        (None, _) => println!("{}", state),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = config::load_config(cli.config.as_deref())?;
    if let Some(settings) = cli.settings {
        config.settings_path = Some(settings);
    }
    if let Some(listen) = cli.listen {
        config.listen_addr = listen;
    }
    config.validate()?;

    let command = match cli.command {
        Commands::Daemon { start } => {
            daemon::run_daemon(config, start).await?;
            return Ok(());
        }
        Commands::Detect => {
            let detector = ShellDetector::new(PlatformKind::current(), config.command_timeout());
            match detector.query().await {
                Ok(stdout) => {
                    tracing::debug!(output = %stdout.trim(), "detection command output");
                    println!("Keyboard Lang: {}", classify(&stdout).code());
                }
                Err(e) => {
                    tracing::warn!(error = %e, "detection failed, assuming default language");
                    println!("Keyboard Lang: {}", LanguageCode::Other.code());
                }
            }
            return Ok(());
        }
        Commands::Start => ControlCommand::Start,
        Commands::Stop => ControlCommand::Stop,
        Commands::Status => ControlCommand::Status,
    };

    let response = send_command(config.listen_addr()?, command).await?;
    print_response(&response);
    if !response.success {
        std::process::exit(1);
    }
    Ok(())
}
