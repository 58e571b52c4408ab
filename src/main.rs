//! relabeler - apply relabel rules to label sets
//!
//! This binary loads relabel rules from a YAML file and applies them to label
//! sets read as JSON from a file or stdin.

use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use relabeler::cli::{Cli, OutputFormat};
use relabeler::config::Config;
use relabeler::error::{AppError, AppResult};
use relabeler::relabel::{LabelSet, Relabeler};

fn main() -> Result<()> {
    let cli = Cli::parse();

    relabeler::init_logging(cli.log_level.into())?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting relabeler");

    let engine = load_engine(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    if cli.validate {
        println!(
            "Configuration is valid ({} rules)",
            engine.rules().len()
        );
        return Ok(());
    }

    let sets = read_label_sets(cli.input.as_deref())?;
    let results = relabel_sets(&engine, &sets)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_results(&mut out, &results, cli.output_format)?;
    out.flush()?;

    Ok(())
}

fn load_engine(path: &Path) -> AppResult<Relabeler> {
    let config = Config::load(path)?;
    Ok(config.relabeler()?)
}

fn relabel_sets(engine: &Relabeler, sets: &[LabelSet]) -> AppResult<Vec<Option<LabelSet>>> {
    Ok(engine.relabel_all(sets)?)
}

/// Read a JSON array of label sets from `path`, or stdin when `None`
fn read_label_sets(path: Option<&Path>) -> AppResult<Vec<LabelSet>> {
    let contents = match path {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let sets: Vec<LabelSet> = serde_json::from_str(&contents)?;

    for (index, labels) in sets.iter().enumerate() {
        if let Some((name, reason)) = labels.invalid_label_name() {
            return Err(AppError::Input(format!(
                "label set {}: invalid label name '{}': {}",
                index, name, reason
            )));
        }
    }

    Ok(sets)
}

fn write_results<W: Write>(
    out: &mut W,
    results: &[Option<LabelSet>],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for result in results {
                match result {
                    Some(labels) => writeln!(out, "{}", labels)?,
                    None => writeln!(out, "<dropped>")?,
                }
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, results)?;
            writeln!(out)?;
        }
        OutputFormat::Yaml => {
            serde_yaml::to_writer(&mut *out, results)?;
        }
    }
    Ok(())
}
