//! Lineport - InfluxDB line protocol listener
//!
//! # Usage
//!
//! ```bash
//! # Run the listener (default)
//! lineport
//! lineport --config lineport.toml
//!
//! # Validate a config file and print the effective settings
//! lineport check --config lineport.toml
//! ```

mod cmd;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use lineport_config::{Config, LogConfig, LogFormat, LogOutput};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Lineport - InfluxDB line protocol listener
#[derive(Parser, Debug)]
#[command(name = "lineport")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the listener
    Serve,

    /// Validate a configuration file
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // Check prints to stdout, no logging
        Some(Command::Check) => cmd::check::run(cli.config.as_deref()),
        // No subcommand = serve
        Some(Command::Serve) | None => {
            init_logging(cli.log_level.as_deref(), cli.config.as_deref())?;
            cmd::serve::run(cli.config.as_deref()).await
        }
    }
}

/// Log settings from the config file, if one is given and loads
fn load_log_config(config_path: Option<&Path>) -> LogConfig {
    if let Some(path) = config_path
        && path.exists()
        && let Ok(config) = Config::from_file(path)
    {
        return config.log;
    }
    LogConfig::default()
}

/// Resolve log level: CLI flag > config file > default "info"
fn resolve_log_level(cli_level: Option<&str>, log: &LogConfig) -> String {
    match cli_level {
        Some(level) => level.to_string(),
        None => log.level.as_str().to_string(),
    }
}

/// Initialize the tracing subscriber for logging
fn init_logging(cli_level: Option<&str>, config_path: Option<&Path>) -> Result<()> {
    let log = load_log_config(config_path);
    let level = resolve_log_level(cli_level, &log);

    let filter = EnvFilter::try_new(&level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let registry = tracing_subscriber::registry().with(filter);

    match (log.format, log.output) {
        (LogFormat::Console, LogOutput::Stderr) => registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init(),
        (LogFormat::Console, LogOutput::Stdout) => registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stdout))
            .init(),
        (LogFormat::Json, LogOutput::Stderr) => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        (LogFormat::Json, LogOutput::Stdout) => registry
            .with(fmt::layer().json().with_writer(std::io::stdout))
            .init(),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineport_config::LogLevel;
    use std::io::Write;

    #[test]
    fn test_cli_level_wins() {
        let log = LogConfig {
            level: LogLevel::Warn,
            ..Default::default()
        };
        assert_eq!(resolve_log_level(Some("trace"), &log), "trace");
        assert_eq!(resolve_log_level(None, &log), "warn");
    }

    #[test]
    fn test_log_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[log]\nlevel = \"debug\"\nformat = \"json\"").unwrap();

        let log = load_log_config(Some(file.path()));
        assert_eq!(log.level, LogLevel::Debug);
        assert_eq!(log.format, LogFormat::Json);
    }

    #[test]
    fn test_log_config_missing_or_invalid_file() {
        assert_eq!(load_log_config(None).level, LogLevel::Info);
        assert_eq!(
            load_log_config(Some(Path::new("/no/such/lineport.toml"))).level,
            LogLevel::Info
        );

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not toml {{").unwrap();
        assert_eq!(load_log_config(Some(file.path())).level, LogLevel::Info);
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["lineport", "-c", "a.toml", "check"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Check)));
        assert_eq!(cli.config, Some(PathBuf::from("a.toml")));

        let cli = Cli::try_parse_from(["lineport", "serve", "--config", "b.toml"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Serve)));
        assert_eq!(cli.config, Some(PathBuf::from("b.toml")));

        let cli = Cli::try_parse_from(["lineport", "--log-level", "debug"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }
}
