#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that walks a headless liminal session.

mod config;
mod session;
mod walk;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::LiminalConfig;

const BYTES_PER_MEGABYTE: u64 = 1024 * 1024;

/// Walks through procedurally generated rooms and reports cache statistics.
#[derive(Debug, Parser)]
#[command(name = "liminal", version, about)]
struct Args {
    /// TOML file overriding the default tuning.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Session seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Number of transitions to play.
    #[arg(long)]
    steps: Option<u32>,
    /// Realized-room memory budget in mebibytes.
    #[arg(long, value_name = "MB")]
    budget_mb: Option<u64>,
    /// Simulated frame length in milliseconds.
    #[arg(long, value_name = "MS")]
    frame_ms: Option<u64>,
    /// Log every pool and transition decision.
    #[arg(short, long)]
    verbose: bool,
    /// Print the summary as JSON.
    #[arg(long)]
    json: bool,
}

impl Args {
    fn resolve_config(&self) -> Result<LiminalConfig> {
        let mut config = match &self.config {
            Some(path) => LiminalConfig::load(path)?,
            None => LiminalConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(steps) = self.steps {
            config.walk.steps = steps;
        }
        if let Some(budget) = self.budget_mb {
            config.pool.memory_budget_bytes = budget.saturating_mul(BYTES_PER_MEGABYTE);
        }
        if let Some(frame_ms) = self.frame_ms {
            config.walk.frame_ms = frame_ms;
        }
        Ok(config)
    }
}

/// Entry point for the liminal command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = args.resolve_config()?;
    let summary = walk::run(&config);
    if args.json {
        let json = serde_json::to_string_pretty(&summary).context("failed to encode summary")?;
        println!("{json}");
    } else {
        println!("{summary}");
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_file_values() {
        let args = Args::parse_from([
            "liminal",
            "--seed",
            "12",
            "--steps",
            "3",
            "--budget-mb",
            "64",
            "--frame-ms",
            "8",
        ]);
        let config = args.resolve_config().expect("config");
        assert_eq!(config.seed, 12);
        assert_eq!(config.walk.steps, 3);
        assert_eq!(config.pool.memory_budget_bytes, 64 * BYTES_PER_MEGABYTE);
        assert_eq!(config.walk.frame_ms, 8);
    }

    #[test]
    fn missing_config_file_is_reported() {
        let args = Args::parse_from(["liminal", "--config", "/nonexistent/liminal.toml"]);
        let error = args.resolve_config().expect_err("missing file");
        assert!(format!("{error:#}").contains("failed to read config file"));
    }
}
