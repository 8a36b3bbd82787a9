/*******************************************************************************
 * Copyright (c) 2024 Cénotélie Opérations SAS (cenotelie.fr)
 ******************************************************************************/

//! The observable protocol events and where they go

use core::fmt::Display;
use std::io::Write;

use parking_lot::Mutex;

/// An observable step of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The producer deposited a fresh item
    Deposited(i64),
    /// A consumer accepted an item
    Accepted {
        /// The consumer's label
        label: String,
        /// The accepted item
        item: i64,
        /// The consumer's sum after accepting the item
        sum: i128,
    },
    /// The producer marked the buffer terminal and exited
    ProducerFinished,
    /// A consumer exited
    ConsumerTerminated {
        /// The consumer's label
        label: String,
        /// The sum of the accepted items
        sum: i128,
        /// The number of accepted items
        count: u64,
    },
}

impl Display for Event {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Deposited(item) => write!(f, "Producer deposited {item}"),
            Self::Accepted { label, item, sum } => write!(f, "Consumer {label} accepted {item}, running sum {sum}"),
            Self::ProducerFinished => write!(f, "Producer finished."),
            Self::ConsumerTerminated { label, sum, count } => {
                write!(f, "Consumer {label} terminated. sum={sum} count={count}")
            }
        }
    }
}

/// The destination of events, shared by all participants
pub trait Journal: Send + Sync {
    /// Records an event
    fn record(&self, event: Event);
}

/// Prints each event on its own line on the standard output
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutJournal;

impl Journal for StdoutJournal {
    fn record(&self, event: Event) {
        // a single locked write per line so that lines from different threads never interleave
        let mut out = std::io::stdout().lock();
        if let Err(error) = writeln!(out, "{event}") {
            tracing::warn!(%error, "failed to write event");
        }
    }
}

/// Keeps the events in memory, in the order they were recorded
#[derive(Debug, Default)]
pub struct MemoryJournal {
    events: Mutex<Vec<Event>>,
}

impl MemoryJournal {
    /// Creates an empty journal
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a copy of the recorded events
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Gets the recorded events as printed lines
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.events.lock().iter().map(ToString::to_string).collect()
    }
}

impl Journal for MemoryJournal {
    fn record(&self, event: Event) {
        self.events.lock().push(event);
    }
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullJournal;

impl Journal for NullJournal {
    fn record(&self, _event: Event) {}
}

#[cfg(test)]
mod tests {
    use super::{Event, Journal, MemoryJournal};

    #[test]
    fn printed_lines() {
        let journal = MemoryJournal::new();
        journal.record(Event::Deposited(4));
        journal.record(Event::Accepted {
            label: String::from("Even"),
            item: 4,
            sum: 10,
        });
        journal.record(Event::ProducerFinished);
        journal.record(Event::ConsumerTerminated {
            label: String::from("Even"),
            sum: 10,
            count: 2,
        });
        assert_eq!(
            journal.lines(),
            vec![
                "Producer deposited 4",
                "Consumer Even accepted 4, running sum 10",
                "Producer finished.",
                "Consumer Even terminated. sum=10 count=2",
            ]
        );
    }
}
