/*******************************************************************************
 * Copyright (c) 2024 Cénotélie Opérations SAS (cenotelie.fr)
 ******************************************************************************/

//! The producer feeding the buffer

use std::path::Path;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::buffer::BoundedBuffer;
use crate::errors::InputError;
use crate::journal::{Event, Journal};
use crate::source;

/// How the producer stopped
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProducerEnd {
    /// The whole source was deposited
    #[default]
    Exhausted,
    /// The buffer was interrupted
    Interrupted,
    /// Reading the source failed
    Failed {
        /// The line at which reading failed
        line: usize,
    },
}

/// Summary of the producer's run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProducerReport {
    /// Number of items deposited
    pub deposited: u64,
    /// Number of malformed lines that were skipped
    pub skipped: u64,
    /// How the producer stopped
    pub end: ProducerEnd,
}

/// Marks the buffer terminal when dropped, whichever way the producer exits
struct TerminalGuard<'a> {
    buffer: &'a BoundedBuffer<i64>,
    journal: &'a dyn Journal,
}

impl Drop for TerminalGuard<'_> {
    fn drop(&mut self) {
        // recorded first, so that it precedes any final report in the journal
        self.journal.record(Event::ProducerFinished);
        self.buffer.mark_terminal();
        info!("producer marked the buffer terminal");
    }
}

/// The single producer of a buffer
pub struct Producer<'a> {
    /// The buffer to feed
    buffer: &'a BoundedBuffer<i64>,
    /// Where to record events
    journal: &'a dyn Journal,
    /// Pause after each deposit
    delay: Duration,
}

impl<'a> Producer<'a> {
    /// Creates the producer for a buffer
    #[must_use]
    pub fn new(buffer: &'a BoundedBuffer<i64>, journal: &'a dyn Journal) -> Self {
        Self {
            buffer,
            journal,
            delay: Duration::ZERO,
        }
    }

    /// Sets the pause after each deposit
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Deposits all the integers of a source, then marks the buffer terminal.
    /// Malformed lines are logged and skipped.
    /// A read failure is logged and stops production.
    pub fn run<I>(self, source: I) -> ProducerReport
    where
        I: IntoIterator<Item = Result<i64, InputError>>,
    {
        let _guard = TerminalGuard {
            buffer: self.buffer,
            journal: self.journal,
        };
        self.feed(source)
    }

    /// Deposits a sequence of integers, then marks the buffer terminal
    pub fn run_items<I: IntoIterator<Item = i64>>(self, items: I) -> ProducerReport {
        self.run(items.into_iter().map(Ok))
    }

    /// Deposits the integers of a file, then marks the buffer terminal
    ///
    /// # Errors
    ///
    /// Returns `InputError::Open` when the file cannot be opened, the buffer is marked terminal first
    pub fn run_file(self, path: &Path) -> Result<ProducerReport, InputError> {
        let _guard = TerminalGuard {
            buffer: self.buffer,
            journal: self.journal,
        };
        let integers = source::open(path).inspect_err(|error| error!(%error, "cannot open input"))?;
        Ok(self.feed(integers))
    }

    fn feed<I>(&self, source: I) -> ProducerReport
    where
        I: IntoIterator<Item = Result<i64, InputError>>,
    {
        let mut report = ProducerReport::default();
        for next in source {
            let item = match next {
                Ok(item) => item,
                Err(error) if error.is_recoverable() => {
                    warn!(%error, "skipping malformed line");
                    report.skipped += 1;
                    continue;
                }
                Err(error) => {
                    error!(%error, deposited = report.deposited, "input failed, stopping production");
                    let line = match error {
                        InputError::Read { line, .. } | InputError::Parse { line, .. } => line,
                        InputError::Open { .. } => 0,
                    };
                    report.end = ProducerEnd::Failed { line };
                    return report;
                }
            };
            if self.buffer.deposit(item).is_err() {
                info!(deposited = report.deposited, "producer interrupted");
                report.end = ProducerEnd::Interrupted;
                return report;
            }
            report.deposited += 1;
            self.journal.record(Event::Deposited(item));
            if self.buffer.pause(self.delay).is_err() {
                info!(deposited = report.deposited, "producer interrupted");
                report.end = ProducerEnd::Interrupted;
                return report;
            }
        }
        info!(deposited = report.deposited, skipped = report.skipped, "input exhausted");
        report
    }
}
