//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;

use booksmart_core::{Horizon, TracingConfig, TracingOutputFormat, parse_date};

/// booksmart - meetings, tasks and recurring meetings in one calendar
#[derive(Debug, Parser)]
#[command(name = "booksmart")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "BOOKSMART_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Log output format on stderr
    #[arg(long, value_enum, env = "BOOKSMART_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    /// Email of the user whose calendar to build
    #[arg(long, short, env = "BOOKSMART_USER")]
    pub user: Option<String>,

    /// Last day to expand recurring meetings to (YYYY-MM-DD)
    #[arg(long, value_parser = parse_horizon)]
    pub horizon: Option<Horizon>,

    // --- Store selection ---
    /// Base URL of the booking API (overrides store.base_url)
    #[arg(long, env = "BOOKSMART_BASE_URL", group = "store")]
    pub base_url: Option<String>,

    /// Read records from a JSON snapshot file instead of the API
    #[arg(long, group = "store")]
    pub snapshot: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Builds the tracing setup selected by `--debug` and `--log-format`.
    pub fn tracing_config(&self) -> TracingConfig {
        match self.log_format {
            Some(LogFormat::Json) if self.debug => TracingConfig::structured().with_level(Level::DEBUG),
            Some(LogFormat::Json) => TracingConfig::structured(),
            other => {
                let config = if self.debug {
                    TracingConfig::cli_debug()
                } else {
                    TracingConfig::cli()
                };
                match other {
                    Some(format) => config.with_format(format.into()),
                    None => config,
                }
            }
        }
    }
}

/// Log output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Multi-line, human-readable
    Pretty,
    /// One line per event
    Compact,
    /// JSON lines with timestamps and spans
    Json,
}

impl From<LogFormat> for TracingOutputFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
            LogFormat::Json => Self::Json,
        }
    }
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Resolve participant emails to store ids
    Resolve {
        /// Emails to resolve
        #[arg(required = true)]
        emails: Vec<String>,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Dump,
    /// Print the configuration file path
    Path,
}

fn parse_horizon(input: &str) -> Result<Horizon, String> {
    parse_date(input)
        .map(Horizon::new)
        .ok_or_else(|| format!("expected YYYY-MM-DD, got {:?}", input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn parses_calendar_flags() {
        let cli = Cli::try_parse_from([
            "booksmart",
            "--user",
            "alice@example.com",
            "--horizon",
            "2024-04-30",
            "--snapshot",
            "store.json",
            "--json",
        ])
        .unwrap();

        assert_eq!(cli.user.as_deref(), Some("alice@example.com"));
        assert_eq!(
            cli.horizon,
            Some(Horizon::new(NaiveDate::from_ymd_opt(2024, 4, 30).unwrap()))
        );
        assert_eq!(cli.snapshot, Some(PathBuf::from("store.json")));
        assert!(cli.json);
        assert!(cli.command.is_none());
    }

    #[test]
    fn log_format_selects_tracing_output() {
        let cli = Cli::try_parse_from(["booksmart"]).unwrap();
        let config = cli.tracing_config();
        assert_eq!(config.output_format, TracingOutputFormat::Compact);
        assert_eq!(config.default_level, Level::WARN);

        let cli = Cli::try_parse_from(["booksmart", "--log-format", "pretty", "-v"]).unwrap();
        let config = cli.tracing_config();
        assert_eq!(config.output_format, TracingOutputFormat::Pretty);
        assert_eq!(config.default_level, Level::DEBUG);

        let cli = Cli::try_parse_from(["booksmart", "--log-format", "json"]).unwrap();
        let config = cli.tracing_config();
        assert_eq!(config.output_format, TracingOutputFormat::Json);
        assert!(config.include_timestamp);
        assert_eq!(config.default_level, Level::INFO);

        assert!(Cli::try_parse_from(["booksmart", "--log-format", "xml"]).is_err());
    }

    #[test]
    fn rejects_bad_horizon() {
        let err = Cli::try_parse_from(["booksmart", "--horizon", "next month"]).unwrap_err();
        assert!(err.to_string().contains("YYYY-MM-DD"));
    }

    #[test]
    fn base_url_and_snapshot_conflict() {
        let result = Cli::try_parse_from([
            "booksmart",
            "--base-url",
            "http://localhost:8000",
            "--snapshot",
            "store.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn resolve_requires_emails() {
        assert!(Cli::try_parse_from(["booksmart", "resolve"]).is_err());

        let cli = Cli::try_parse_from(["booksmart", "resolve", "a@example.com"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Resolve { ref emails }) if emails.len() == 1));
    }

    #[test]
    fn config_subcommands() {
        let cli = Cli::try_parse_from(["booksmart", "config", "path"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Config {
                action: ConfigAction::Path
            })
        ));
    }
}
