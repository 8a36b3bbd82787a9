/*******************************************************************************
 * Copyright (c) 2024 Cénotélie Opérations SAS (cenotelie.fr)
 ******************************************************************************/

//! Definition of errors for this crate

use core::fmt::{Debug, Display};
use std::io;
use std::path::PathBuf;

/// Error when trying to deposit an item without blocking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrySendError<T> {
    /// The item could not be deposited because the buffer is full.
    Full(T),
    /// The item could not be deposited because the buffer was interrupted.
    Interrupted(T),
}

impl<T> Display for TrySendError<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Full(_) => write!(f, "failed to deposit: the buffer is full"),
            Self::Interrupted(_) => write!(f, "failed to deposit: the buffer was interrupted"),
        }
    }
}

impl<T: Debug> core::error::Error for TrySendError<T> {}

impl<T> TrySendError<T> {
    /// Gets back the wrapped item
    #[must_use]
    pub fn into_inner(self) -> T {
        match self {
            Self::Full(item) | Self::Interrupted(item) => item,
        }
    }

    /// Tests whether the cause of the error is the buffer being full
    #[must_use]
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full(_))
    }

    /// Tests whether the cause of the error is the buffer being interrupted
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted(_))
    }
}

/// The item could not be deposited because the buffer was interrupted
///
/// The error contains the item so it can be recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendError<T>(pub T);

impl<T> SendError<T> {
    /// Gets back the wrapped item
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Display for SendError<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "failed to deposit: the buffer was interrupted")
    }
}

impl<T: Debug> core::error::Error for SendError<T> {}

/// Error when trying to withdraw an item without blocking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryRecvError {
    /// No item is available right now, but more may come
    Empty,
    /// The buffer is empty and terminal, no item will ever come (END)
    Terminated,
    /// The buffer was interrupted
    Interrupted,
}

impl Display for TryRecvError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Empty => write!(f, "failed to withdraw: the buffer is empty"),
            Self::Terminated => write!(f, "failed to withdraw: the buffer is empty and terminal"),
            Self::Interrupted => write!(f, "failed to withdraw: the buffer was interrupted"),
        }
    }
}

impl core::error::Error for TryRecvError {}

impl TryRecvError {
    /// Tests whether the cause of the error is the buffer being empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Tests whether this is the end-of-stream condition
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated)
    }
}

/// Outcome of a blocking withdraw that did not yield an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvError {
    /// The buffer is empty and terminal, no item will ever come (END)
    Terminated,
    /// The buffer was interrupted
    Interrupted,
}

impl Display for RecvError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Terminated => write!(f, "failed to withdraw: the buffer is empty and terminal"),
            Self::Interrupted => write!(f, "failed to withdraw: the buffer was interrupted"),
        }
    }
}

impl core::error::Error for RecvError {}

impl RecvError {
    /// Tests whether this is the end-of-stream condition
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated)
    }

    /// Tests whether the cause of the error is the buffer being interrupted
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted)
    }
}

/// The buffer was interrupted while pausing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

impl Display for Interrupted {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "interrupted")
    }
}

impl core::error::Error for Interrupted {}

/// Error related to the input source of the producer
#[derive(Debug)]
pub enum InputError {
    /// The input source could not be opened
    Open {
        /// The path to the source
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },
    /// Reading from the source failed mid-stream
    Read {
        /// The 1-based number of the line that could not be read
        line: usize,
        /// The underlying error
        source: io::Error,
    },
    /// A line could not be parsed as an integer
    Parse {
        /// The 1-based number of the offending line
        line: usize,
        /// The trimmed content of the line
        content: String,
    },
}

impl Display for InputError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Open { path, source } => write!(f, "cannot open input {}: {source}", path.display()),
            Self::Read { line, source } => write!(f, "failed to read input at line {line}: {source}"),
            Self::Parse { line, content } => write!(f, "line {line} is not an integer: {content:?}"),
        }
    }
}

impl core::error::Error for InputError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Open { source, .. } | Self::Read { source, .. } => Some(source),
            Self::Parse { .. } => None,
        }
    }
}

impl InputError {
    /// Tests whether the error only concerns a single line, so that the input can still be processed
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

/// Error in the configuration of a run
#[derive(Debug)]
pub enum ConfigError {
    /// The buffer capacity must be at least 1
    ZeroCapacity,
    /// At least one consumer is required
    NoConsumers,
    /// The predicate name is not known
    UnknownPredicate(String),
    /// A consumer entry is not of the form `label=predicate`
    MalformedConsumer(String),
    /// Two consumers share the same label
    DuplicateLabel(String),
    /// The configuration file could not be read
    Io {
        /// The path to the file
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },
    /// The configuration file is not valid TOML for a configuration
    Toml {
        /// The path to the file
        path: PathBuf,
        /// The underlying error
        source: toml::de::Error,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ZeroCapacity => write!(f, "the buffer capacity must be at least 1"),
            Self::NoConsumers => write!(f, "at least one consumer is required"),
            Self::UnknownPredicate(name) => {
                write!(f, "unknown predicate {name:?}, expected one of: even, odd, prime, any")
            }
            Self::MalformedConsumer(entry) => write!(f, "malformed consumer {entry:?}, expected label=predicate"),
            Self::DuplicateLabel(label) => write!(f, "consumer label {label:?} is used more than once"),
            Self::Io { path, source } => write!(f, "cannot read configuration {}: {source}", path.display()),
            Self::Toml { path, source } => write!(f, "invalid configuration {}: {source}", path.display()),
        }
    }
}

impl core::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Toml { source, .. } => Some(source),
            _ => None,
        }
    }
}
