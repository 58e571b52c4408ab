//! CLI argument parsing for relabeler
//!
//! This module provides the command-line interface using clap derive macros.
//!
//! # Options
//!
//! - `--config` / `-c`: Relabel configuration file (default: relabel.yaml, env: RELABEL_CONFIG)
//! - `--input` / `-i`: JSON file holding an array of label sets (default: stdin)
//! - `--validate`: Validate configuration and exit
//! - `--output-format`: Output format (text/json/yaml)
//! - `--log-level` / `-l`: Log level (trace/debug/info/warn/error, env: RELABEL_LOG_LEVEL)

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// relabeler - apply relabel rules to label sets
///
/// Reads a JSON array of label sets, applies the configured relabel rules to
/// each one, and prints the results in input order. Dropped label sets are
/// printed as `null` (json/yaml) or `<dropped>` (text).
#[derive(Parser, Debug)]
#[command(name = "relabeler")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to relabel configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "relabel.yaml",
        env = "RELABEL_CONFIG"
    )]
    pub config: PathBuf,

    /// JSON file with an array of label sets (reads stdin when omitted)
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Validate configuration and exit
    #[arg(long)]
    pub validate: bool,

    /// Log level
    #[arg(
        short,
        long,
        value_enum,
        default_value = "warn",
        env = "RELABEL_LOG_LEVEL"
    )]
    pub log_level: LogLevel,

    /// Output format for relabeled label sets
    #[arg(long, value_enum, default_value = "text")]
    pub output_format: OutputFormat,
}

/// Log level options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Trace level - most verbose
    Trace,
    /// Debug level
    Debug,
    /// Info level
    Info,
    /// Warn level - default
    Warn,
    /// Error level - least verbose
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One Prometheus-style label set per line
    Text,
    /// JSON array
    Json,
    /// YAML sequence
    Yaml,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(tracing::Level::from(LogLevel::Trace), tracing::Level::TRACE);
        assert_eq!(tracing::Level::from(LogLevel::Warn), tracing::Level::WARN);
        assert_eq!(tracing::Level::from(LogLevel::Error), tracing::Level::ERROR);
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["relabeler"]);
        assert_eq!(cli.config, PathBuf::from("relabel.yaml"));
        assert_eq!(cli.input, None);
        assert!(!cli.validate);
        assert_eq!(cli.log_level, LogLevel::Warn);
        assert_eq!(cli.output_format, OutputFormat::Text);
    }

    #[test]
    fn test_cli_with_options() {
        let cli = Cli::parse_from([
            "relabeler",
            "-c",
            "custom.yaml",
            "-i",
            "targets.json",
            "--log-level",
            "debug",
            "--output-format",
            "json",
        ]);
        assert_eq!(cli.config, PathBuf::from("custom.yaml"));
        assert_eq!(cli.input, Some(PathBuf::from("targets.json")));
        assert_eq!(cli.log_level, LogLevel::Debug);
        assert_eq!(cli.output_format, OutputFormat::Json);
    }

    #[test]
    fn test_cli_validate() {
        let cli = Cli::parse_from(["relabeler", "--validate"]);
        assert!(cli.validate);
    }
}
