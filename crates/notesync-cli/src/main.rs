//! notesync CLI - local-first notes from the command line
//!
//! Every note command restores the profile session, bootstraps the note list
//! from Firebase (or the local snapshot when offline), applies the change and
//! waits for its remote mirror before exiting.

mod auth;
mod cli;
mod commands;
mod config_profiles;
mod error;

#[cfg(test)]
mod tests;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::auth_cmd::run_auth;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::delete::run_delete;
use crate::commands::edit::run_edit;
use crate::commands::list::run_list;
use crate::commands::sync::run_sync;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("notesync_cli=info,notesync_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let profile = cli.profile.as_deref();
    let data_dir = cli.data_dir.as_deref();

    match cli.command {
        Some(Commands::Add { text }) => run_add(text.as_deref(), profile, data_dir).await?,
        Some(Commands::List { json }) => run_list(json, profile, data_dir).await?,
        Some(Commands::Edit { id, text }) => run_edit(&id, &text, profile, data_dir).await?,
        Some(Commands::Delete { id }) => run_delete(&id, profile, data_dir).await?,
        Some(Commands::Sync) => run_sync(profile, data_dir).await?,
        Some(Commands::Completions { shell, output }) => {
            run_completions(shell, output.as_deref())?;
        }
        Some(Commands::Config { command }) => run_config(command, profile)?,
        Some(Commands::Auth { command }) => run_auth(command, profile).await?,
        None => {
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
