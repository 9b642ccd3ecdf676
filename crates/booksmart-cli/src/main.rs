//! booksmart CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use booksmart_cli::cli::{Cli, Command, ConfigAction};
use booksmart_cli::commands;
use booksmart_cli::error::{CliError, CliResult};
use booksmart_core::init_tracing;
use booksmart_engine::EngineConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.tracing_config()) {
        eprintln!("warning: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config_path = cli.config.clone().unwrap_or_else(EngineConfig::default_path);
    let mut config = if cli.config.is_some() {
        EngineConfig::load_from(&config_path)?
    } else {
        EngineConfig::load()?
    };
    if let Some(ref base_url) = cli.base_url {
        config = config.with_base_url(base_url);
    }

    match cli.command {
        Some(Command::Config { action }) => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Path => commands::config::path(&config_path),
        },
        Some(Command::Resolve { ref emails }) => {
            let store = commands::open_store(cli.snapshot.as_deref(), &config)?;
            commands::resolve::run(store, emails).await
        }
        None => {
            let user = cli
                .user
                .as_deref()
                .ok_or_else(|| CliError::config("--user is required"))?;
            let store = commands::open_store(cli.snapshot.as_deref(), &config)?;
            commands::calendar::show(store, &config, user, cli.horizon, cli.json).await
        }
    }
}
