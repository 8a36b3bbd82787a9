/*******************************************************************************
 * Copyright (c) 2024 Cénotélie Opérations SAS (cenotelie.fr)
 ******************************************************************************/

//! Configuration of a run

use core::str::FromStr;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::errors::ConfigError;
use crate::predicate::PredicateKind;

/// Default number of slots in the buffer
pub const DEFAULT_CAPACITY: usize = 10;
/// Default pause of the producer after each deposit, in milliseconds
pub const DEFAULT_PRODUCER_DELAY_MS: u64 = 100;
/// Default pause of a consumer after each accepted item, in milliseconds
pub const DEFAULT_CONSUMER_DELAY_MS: u64 = 300;
/// Default path of the input
pub const DEFAULT_INPUT_PATH: &str = "numbers.txt";

/// A consumer to start
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsumerSpec {
    /// The label used in reports
    pub label: String,
    /// The acceptance criterion
    pub predicate: PredicateKind,
}

impl ConsumerSpec {
    /// Creates the specification of a consumer
    #[must_use]
    pub fn new(label: impl Into<String>, predicate: PredicateKind) -> Self {
        Self {
            label: label.into(),
            predicate,
        }
    }
}

/// Parses `label=predicate`, or a bare predicate name used as its own label
impl FromStr for ConsumerSpec {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (label, predicate) = match s.split_once('=') {
            Some((label, predicate)) => (label.trim(), predicate.parse()?),
            None => (s.trim(), s.parse()?),
        };
        if label.is_empty() {
            return Err(ConfigError::MalformedConsumer(s.to_string()));
        }
        Ok(Self::new(label, predicate))
    }
}

/// The configuration of a run
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Number of slots in the buffer
    pub buffer_capacity: usize,
    /// Path of the integer source
    pub input_path: PathBuf,
    /// Pause of the producer after each deposit, in milliseconds
    pub producer_delay_ms: u64,
    /// Pause of a consumer after each accepted item, in milliseconds
    pub consumer_delay_ms: u64,
    /// The consumers, in order
    pub consumers: Vec<ConsumerSpec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_CAPACITY,
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            producer_delay_ms: DEFAULT_PRODUCER_DELAY_MS,
            consumer_delay_ms: DEFAULT_CONSUMER_DELAY_MS,
            consumers: vec![
                ConsumerSpec::new("Even", PredicateKind::Even),
                ConsumerSpec::new("Odd", PredicateKind::Odd),
                ConsumerSpec::new("Prime", PredicateKind::Prime),
            ],
        }
    }
}

impl Config {
    /// Parses a configuration in TOML, missing keys take their default value
    ///
    /// # Errors
    ///
    /// Returns the TOML error when the content is not a valid configuration
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Loads a configuration file in TOML
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or is not a valid configuration
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Checks that the configuration can be run
    ///
    /// # Errors
    ///
    /// Returns the first problem found
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.consumers.is_empty() {
            return Err(ConfigError::NoConsumers);
        }
        let mut labels = HashSet::new();
        for consumer in &self.consumers {
            if !labels.insert(consumer.label.as_str()) {
                return Err(ConfigError::DuplicateLabel(consumer.label.clone()));
            }
        }
        Ok(())
    }

    /// Gets the pause of the producer after each deposit
    #[must_use]
    pub fn producer_delay(&self) -> Duration {
        Duration::from_millis(self.producer_delay_ms)
    }

    /// Gets the pause of a consumer after each accepted item
    #[must_use]
    pub fn consumer_delay(&self) -> Duration {
        Duration::from_millis(self.consumer_delay_ms)
    }

    /// Gets whether the consumers together accept every integer, so that the run is guaranteed to end
    #[must_use]
    pub fn covers_all(&self) -> bool {
        PredicateKind::covers_all(self.consumers.iter().map(|consumer| consumer.predicate))
    }
}
