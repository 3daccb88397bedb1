//! newtab CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::Level;

use newtab_core::{TracingConfig, TracingOutputFormat, init_tracing};

use newtab_client::cli::{Cli, Command, ConfigAction, OutputArgs, RadioAction};
use newtab_client::commands;
use newtab_client::config::ClientConfig;
use newtab_client::error::ClientResult;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = if cli.debug {
        TracingConfig::cli_debug()
    } else if matches!(cli.command, Some(Command::Watch(_))) {
        TracingConfig::watch().with_level(Level::WARN)
    } else {
        TracingConfig::default()
            .with_level(Level::WARN)
            .with_format(TracingOutputFormat::Compact)
    };
    if let Err(e) = init_tracing(tracing_config) {
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

async fn run(cli: Cli) -> ClientResult<()> {
    let config_path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    // Printing the path must work even when the file does not parse.
    if let Some(Command::Config {
        action: ConfigAction::Path,
    }) = cli.command
    {
        return commands::config::path(&config_path);
    }

    let config = if cli.config.is_some() {
        ClientConfig::load_from(&config_path)?
    } else {
        ClientConfig::load()?
    };

    match cli.command {
        Some(Command::Agenda(args)) => commands::agenda::run(&config, args).await,
        None => commands::agenda::run(&config, OutputArgs::default()).await,
        Some(Command::Watch(args)) => commands::watch::run(&config, args).await,
        Some(Command::Config { action }) => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&config_path),
        },
        Some(Command::Radio { action }) => match action {
            RadioAction::List => commands::radio::list(&config),
            RadioAction::Pick { number, shuffle } => {
                commands::radio::pick(&config, number, shuffle)
            }
        },
    }
}
