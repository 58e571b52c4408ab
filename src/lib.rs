//! relabeler library
//!
//! This crate provides a rule-driven relabeling engine for metric and target
//! label sets, along with the configuration layer that loads relabel rules
//! from YAML.

pub mod cli;
pub mod config;
pub mod error;
pub mod relabel;

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging subsystem
///
/// Logs go to stderr so that relabeled output on stdout stays parseable.
///
/// # Arguments
/// * `level` - Default maximum level, used when `RUST_LOG` is not set
///
/// # Errors
/// Returns an error if the logging system fails to initialize
pub fn init_logging(level: Level) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::from_level(level).into()));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
