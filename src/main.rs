//! kyukei - a break-reminder timer CLI
//!
//! This tool alternates work and break intervals and reminds you to
//! actually take the break:
//! - 25 minutes of focused work
//! - 5 minutes of break
//! - a 15 minute long break every 4 loops

use anyhow::Result;
use clap::{CommandFactory, Parser};

pub mod alert;
pub mod cli;
pub mod daemon;
pub mod store;
pub mod types;

use cli::{Cli, Commands, Display, IpcClient};

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize logging
    init_tracing();

    // Parse command line arguments
    let cli = Cli::parse();

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&e.to_string());
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    // Set verbose logging if requested
    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    match cli.command {
        Some(Commands::Start) => {
            let client = IpcClient::new()?;
            let response = client.start().await?;
            Display::show_action_success(&response);
        }
        Some(Commands::Pause) => {
            let client = IpcClient::new()?;
            let response = client.pause().await?;
            Display::show_pause_success(&response);
        }
        Some(Commands::Reset) => {
            let client = IpcClient::new()?;
            let response = client.reset().await?;
            Display::show_action_success(&response);
        }
        Some(Commands::Status) => {
            let client = IpcClient::new()?;
            let response = client.status().await?;
            Display::show_status(&response);
        }
        Some(Commands::Break(args)) => {
            let client = IpcClient::new()?;
            let response = client.commit_break(&args).await?;
            Display::show_action_success(&response);
        }
        Some(Commands::Work) => {
            let client = IpcClient::new()?;
            let response = client.commit_work().await?;
            Display::show_action_success(&response);
        }
        Some(Commands::Snooze(args)) => {
            let client = IpcClient::new()?;
            let response = client.snooze(&args).await?;
            Display::show_action_success(&response);
        }
        Some(Commands::Config(args)) => {
            let client = IpcClient::new()?;
            let response = if args.reset {
                client.reset_config().await?
            } else if args.has_updates() {
                client.set_config(&args).await?
            } else {
                client.get_config().await?
            };
            Display::show_config(&response);
        }
        Some(Commands::ResetSession) => {
            let client = IpcClient::new()?;
            let response = client.reset_session().await?;
            Display::show_action_success(&response);
        }
        Some(Commands::Daemon) => {
            daemon::run().await?;
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            // No command provided, show help
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
