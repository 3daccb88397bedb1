//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use newtab_core::OutputFormat;

/// newtab - today's agenda from all your calendars
#[derive(Debug, Parser)]
#[command(name = "newtab")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, global = true, env = "NEWTAB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Output flags shared by the agenda commands.
#[derive(Debug, Clone, Copy, Default, Args)]
pub struct OutputArgs {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    /// Include per-source status
    #[arg(long)]
    pub sources: bool,
}

impl OutputArgs {
    /// Returns the output format based on CLI flags.
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show today's agenda once (default)
    Agenda(OutputArgs),

    /// Keep the agenda on screen, refreshing on the configured interval
    ///
    /// Press Enter to refresh immediately, Ctrl-C to quit.
    Watch(OutputArgs),

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Radio station commands
    Radio {
        #[command(subcommand)]
        action: RadioAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}

/// Radio actions.
#[derive(Debug, Subcommand)]
pub enum RadioAction {
    /// List configured stations
    List,

    /// Pick a station and print its stream URL
    Pick {
        /// Station number as shown by `radio list`
        #[arg(conflicts_with = "shuffle", value_parser = clap::value_parser!(u16).range(1..))]
        number: Option<u16>,

        /// Pick a random station
        #[arg(long)]
        shuffle: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand() {
        let cli = Cli::parse_from(["newtab"]);
        assert!(cli.command.is_none());
        assert!(!cli.debug);
    }

    #[test]
    fn agenda_json() {
        let cli = Cli::parse_from(["newtab", "agenda", "--json"]);
        match cli.command {
            Some(Command::Agenda(args)) => {
                assert_eq!(args.output_format(), OutputFormat::Json);
                assert!(!args.sources);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["newtab", "watch", "-v", "--config", "/tmp/newtab.toml"]);
        assert!(cli.debug);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/newtab.toml")));
        assert!(matches!(cli.command, Some(Command::Watch(_))));
    }

    #[test]
    fn radio_pick() {
        let cli = Cli::parse_from(["newtab", "radio", "pick", "2"]);
        assert!(matches!(
            cli.command,
            Some(Command::Radio {
                action: RadioAction::Pick {
                    number: Some(2),
                    shuffle: false
                }
            })
        ));

        assert!(Cli::try_parse_from(["newtab", "radio", "pick", "2", "--shuffle"]).is_err());
        assert!(Cli::try_parse_from(["newtab", "radio", "pick", "0"]).is_err());
    }
}
