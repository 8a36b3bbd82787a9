/*******************************************************************************
 * Copyright (c) 2024 Cénotélie Opérations SAS (cenotelie.fr)
 ******************************************************************************/

//! The filtering consumers

use std::time::Duration;

use crossbeam_utils::Backoff;
use tracing::{debug, info};

use crate::buffer::BoundedBuffer;
use crate::errors::RecvError;
use crate::journal::{Event, Journal};
use crate::predicate::Predicate;

/// The private running total of a consumer
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tally {
    /// The sum of accepted items, wide enough to never overflow
    pub sum: i128,
    /// The number of accepted items
    pub count: u64,
}

impl Tally {
    /// Adds an accepted item
    pub fn add(&mut self, item: i64) {
        self.sum += i128::from(item);
        self.count += 1;
    }
}

/// Summary of a consumer's run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerReport {
    /// The consumer's label
    pub label: String,
    /// The final tally
    pub tally: Tally,
    /// The number of items handed back to the buffer
    pub redeposits: u64,
    /// Whether the consumer stopped because of an interruption
    pub interrupted: bool,
}

/// A consumer that keeps the items its predicate accepts and hands back the others
pub struct Consumer<'a, P> {
    /// The consumer's label
    label: String,
    /// The acceptance criterion
    predicate: P,
    /// The shared buffer
    buffer: &'a BoundedBuffer<i64>,
    /// Where to record events
    journal: &'a dyn Journal,
    /// Pause after each accepted item
    delay: Duration,
}

impl<'a, P: Predicate> Consumer<'a, P> {
    /// Creates a new consumer
    #[must_use]
    pub fn new(label: impl Into<String>, predicate: P, buffer: &'a BoundedBuffer<i64>, journal: &'a dyn Journal) -> Self {
        Self {
            label: label.into(),
            predicate,
            buffer,
            journal,
            delay: Duration::ZERO,
        }
    }

    /// Sets the pause after each accepted item
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Gets the consumer's label
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Consumes until the end of the stream or an interruption, then emits the final report.
    ///
    /// The consumer never returns while an item it would accept may still come back to the buffer.
    /// When an item matches no predicate of any consumer, it circulates forever and this does not return.
    pub fn run(self) -> ConsumerReport {
        let mut tally = Tally::default();
        let mut redeposits = 0;
        let mut interrupted = false;
        // back off while only picking up items for others
        let backoff = Backoff::new();
        loop {
            let claim = match self.buffer.withdraw() {
                Ok(claim) => claim,
                Err(RecvError::Terminated) => break,
                Err(RecvError::Interrupted) => {
                    interrupted = true;
                    break;
                }
            };
            if self.predicate.accepts(*claim) {
                let item = claim.accept();
                tally.add(item);
                backoff.reset();
                self.journal.record(Event::Accepted {
                    label: self.label.clone(),
                    item,
                    sum: tally.sum,
                });
                if self.buffer.pause(self.delay).is_err() {
                    interrupted = true;
                    break;
                }
            } else {
                debug!(label = %self.label, item = *claim, "handing item back");
                claim.redeposit();
                redeposits += 1;
                backoff.snooze();
            }
        }
        if interrupted {
            info!(label = %self.label, "consumer interrupted");
        }
        info!(label = %self.label, sum = tally.sum, count = tally.count, redeposits, "consumer terminated");
        self.journal.record(Event::ConsumerTerminated {
            label: self.label.clone(),
            sum: tally.sum,
            count: tally.count,
        });
        ConsumerReport {
            label: self.label,
            tally,
            redeposits,
            interrupted,
        }
    }
}
