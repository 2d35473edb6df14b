//! # keygate CLI entry point
//!
//! Parses command-line arguments, builds the API client, and dispatches to
//! the key subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use keygate_cli::keys::{
    run_checkkey, run_genkey, run_listkeys, run_resetkey, CheckkeyArgs, GenkeyArgs, ListkeysArgs,
    ResetkeyArgs,
};
use keygate_cli::{KeygateClient, DEFAULT_API_URL};

/// Keygate operator CLI.
///
/// Issues, inspects, resets and exports license keys through the Keygate
/// management API.
#[derive(Parser, Debug)]
#[command(name = "keygate", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Base URL of the Keygate API.
    #[arg(long, env = "KEYGATE_API_URL", default_value = DEFAULT_API_URL, global = true)]
    api_url: String,

    /// Bearer token for the management API.
    #[arg(long, env = "KEYGATE_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Issue new license keys.
    Genkey(GenkeyArgs),

    /// Show a key's duration, status, expiry, HWID and note.
    Checkkey(CheckkeyArgs),

    /// Clear a key's HWID and expiry so it can be activated again.
    Resetkey(ResetkeyArgs),

    /// Export keys as a text table.
    Listkeys(ListkeysArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(api_url = %cli.api_url, "keygate CLI starting");

    let client = match KeygateClient::new(&cli.api_url, cli.token.as_deref()) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::from(2);
        }
    };

    let mut stdout = std::io::stdout().lock();
    let result = match &cli.command {
        Commands::Genkey(args) => run_genkey(args, &client, &mut stdout).await,
        Commands::Checkkey(args) => run_checkkey(args, &client, &mut stdout).await,
        Commands::Resetkey(args) => run_resetkey(args, &client, &mut stdout).await,
        Commands::Listkeys(args) => run_listkeys(args, &client, &mut stdout).await,
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
