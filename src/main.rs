/*******************************************************************************
 * Copyright (c) 2024 Cénotélie Opérations SAS (cenotelie.fr)
 ******************************************************************************/

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use sortingroom::config::{Config, ConsumerSpec};
use sortingroom::journal::StdoutJournal;
use sortingroom::source;
use sortingroom::system::System;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command line options.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path of the integer source, one integer per line.
    #[clap(short, long)]
    input: Option<PathBuf>,

    /// Number of slots in the buffer (default 10).
    #[clap(short = 'c', long)]
    capacity: Option<usize>,

    /// Pause of the producer after each deposit, in milliseconds (default 100).
    #[clap(long)]
    producer_delay_ms: Option<u64>,

    /// Pause of a consumer after each accepted item, in milliseconds (default 300).
    #[clap(long)]
    consumer_delay_ms: Option<u64>,

    /// A consumer as LABEL=PREDICATE, with PREDICATE one of even, odd, prime, any.
    /// Repeat for each consumer (default Even=even Odd=odd Prime=prime).
    #[clap(long = "consumer", value_name = "LABEL=PREDICATE")]
    consumers: Vec<ConsumerSpec>,

    /// Configuration file in TOML, options given on the command line take precedence.
    #[clap(long)]
    config: Option<PathBuf>,

    /// Create the input with the integers 1 to N (default 50) when it does not exist.
    #[clap(long, value_name = "N", num_args = 0..=1, default_missing_value = "50")]
    create_missing: Option<i64>,
}

impl Args {
    /// Builds the configuration from the file, if any, overridden by the options
    fn into_config(self) -> Result<(Config, Option<i64>)> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(input) = self.input {
            config.input_path = input;
        }
        if let Some(capacity) = self.capacity {
            config.buffer_capacity = capacity;
        }
        if let Some(delay) = self.producer_delay_ms {
            config.producer_delay_ms = delay;
        }
        if let Some(delay) = self.consumer_delay_ms {
            config.consumer_delay_ms = delay;
        }
        if !self.consumers.is_empty() {
            config.consumers = self.consumers;
        }
        Ok((config, self.create_missing))
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let (config, create_missing) = Args::parse().into_config()?;
    if let Some(count) = create_missing {
        if !config.input_path.exists() {
            source::write_sequence(&config.input_path, 1..=count)
                .with_context(|| format!("cannot create input {}", config.input_path.display()))?;
            info!(path = %config.input_path.display(), count, "created input");
        }
    }

    let system = System::new(config)?;

    // Ctrl+C stops everyone cooperatively
    let interrupter = system.interrupter();
    ctrlc::set_handler(move || interrupter.interrupt()).context("cannot set the Ctrl-C handler")?;

    let summary = system.run_file(&StdoutJournal)?;
    info!(
        deposited = summary.producer.deposited,
        accepted = summary.total_accepted(),
        "all participants terminated"
    );
    println!("Run finished.");
    Ok(())
}
