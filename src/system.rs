/*******************************************************************************
 * Copyright (c) 2024 Cénotélie Opérations SAS (cenotelie.fr)
 ******************************************************************************/

//! Running a producer and its consumers, one thread each, over a shared buffer

use std::panic::resume_unwind;
use std::sync::Arc;

use crossbeam_utils::thread::ScopedJoinHandle;
use tracing::{error, info, warn};

use crate::buffer::{BoundedBuffer, BufferStats};
use crate::config::Config;
use crate::consumer::{Consumer, ConsumerReport, Tally};
use crate::errors::{ConfigError, InputError};
use crate::journal::Journal;
use crate::producer::{Producer, ProducerReport};

/// Summary of a complete run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// The producer's report
    pub producer: ProducerReport,
    /// The consumers' reports, in configuration order
    pub consumers: Vec<ConsumerReport>,
    /// The buffer's counters at the end of the run
    pub stats: BufferStats,
}

impl RunSummary {
    /// Gets the tally of a consumer
    #[must_use]
    pub fn tally(&self, label: &str) -> Option<Tally> {
        self.consumers
            .iter()
            .find(|report| report.label == label)
            .map(|report| report.tally)
    }

    /// Gets the total number of accepted items over all consumers
    #[must_use]
    pub fn total_accepted(&self) -> u64 {
        self.consumers.iter().map(|report| report.tally.count).sum()
    }

    /// Gets the total sum of accepted items over all consumers
    #[must_use]
    pub fn total_sum(&self) -> i128 {
        self.consumers.iter().map(|report| report.tally.sum).sum()
    }
}

/// A handle to interrupt a running system from another thread, for example a signal handler
#[derive(Debug, Clone)]
pub struct Interrupter {
    buffer: Arc<BoundedBuffer<i64>>,
}

impl Interrupter {
    /// Interrupts all participants: the producer stops and marks the buffer terminal,
    /// consumers stop and emit their final report
    pub fn interrupt(&self) {
        info!("interruption requested");
        self.buffer.interrupt();
    }
}

/// A configured producer and consumers, ready to run once
#[derive(Debug)]
pub struct System {
    /// The validated configuration
    config: Config,
    /// The shared buffer
    buffer: Arc<BoundedBuffer<i64>>,
}

impl System {
    /// Prepares a run
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration is invalid
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        if !config.covers_all() {
            warn!("the consumers do not accept every integer, an item none of them accepts will circulate forever");
        }
        let buffer = Arc::new(BoundedBuffer::new(config.buffer_capacity));
        Ok(Self { config, buffer })
    }

    /// Gets the configuration
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Gets the shared buffer
    #[must_use]
    pub fn buffer(&self) -> &BoundedBuffer<i64> {
        &self.buffer
    }

    /// Gets a handle to interrupt the run
    #[must_use]
    pub fn interrupter(&self) -> Interrupter {
        Interrupter {
            buffer: self.buffer.clone(),
        }
    }

    /// Runs the producer over a source and the consumers until they all terminated
    pub fn run<I>(self, source: I, journal: &dyn Journal) -> RunSummary
    where
        I: IntoIterator<Item = Result<i64, InputError>> + Send,
    {
        let (producer, consumers) = self.run_with(journal, |producer| producer.run(source));
        self.summarize(producer, consumers)
    }

    /// Runs the producer over a sequence of integers and the consumers until they all terminated
    pub fn run_items<I>(self, items: I, journal: &dyn Journal) -> RunSummary
    where
        I: IntoIterator<Item = i64> + Send,
    {
        let (producer, consumers) = self.run_with(journal, |producer| producer.run_items(items));
        self.summarize(producer, consumers)
    }

    /// Runs the producer over the configured input file and the consumers until they all terminated
    ///
    /// # Errors
    ///
    /// Returns `InputError::Open` when the input cannot be opened.
    /// The buffer is marked terminal first, so the consumers are released and joined before returning.
    pub fn run_file(self, journal: &dyn Journal) -> Result<RunSummary, InputError> {
        let path = self.config.input_path.clone();
        let (producer, consumers) = self.run_with(journal, |producer| producer.run_file(&path));
        Ok(self.summarize(producer?, consumers))
    }

    fn summarize(&self, producer: ProducerReport, consumers: Vec<ConsumerReport>) -> RunSummary {
        let stats = self.buffer.stats();
        info!(
            deposited = producer.deposited,
            accepted = stats.accepted,
            redeposits = stats.redeposits,
            high_water = stats.high_water,
            "run finished"
        );
        RunSummary {
            producer,
            consumers,
            stats,
        }
    }

    /// Spawns one thread per consumer and one for the producer, then joins them all
    fn run_with<F, R>(&self, journal: &dyn Journal, produce: F) -> (R, Vec<ConsumerReport>)
    where
        F: FnOnce(Producer<'_>) -> R + Send,
        R: Send,
    {
        let buffer: &BoundedBuffer<i64> = &self.buffer;
        let consumer_delay = self.config.consumer_delay();
        let producer = Producer::new(buffer, journal).with_delay(self.config.producer_delay());
        info!(
            capacity = self.config.buffer_capacity,
            consumers = self.config.consumers.len(),
            "starting run"
        );
        let outcome = crossbeam_utils::thread::scope(|scope| {
            let consumers = self
                .config
                .consumers
                .iter()
                .map(|spec| {
                    let consumer =
                        Consumer::new(spec.label.clone(), spec.predicate, buffer, journal).with_delay(consumer_delay);
                    scope.spawn(move |_| guarded(buffer, &spec.label, || consumer.run()))
                })
                .collect::<Vec<_>>();
            let producer = scope.spawn(move |_| guarded(buffer, "producer", || produce(producer)));
            let produced = join(producer);
            let reports = consumers.into_iter().map(join).collect::<Vec<_>>();
            (produced, reports)
        });
        outcome.unwrap_or_else(|payload| resume_unwind(payload))
    }
}

/// Interrupts the buffer when the participant holding it unwinds
struct PanicGuard<'a> {
    buffer: &'a BoundedBuffer<i64>,
    participant: &'a str,
}

impl Drop for PanicGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            error!(participant = self.participant, "participant panicked, interrupting the run");
            self.buffer.interrupt();
        }
    }
}

/// Runs a participant, interrupting everyone else if it panics
fn guarded<T>(buffer: &BoundedBuffer<i64>, participant: &str, run: impl FnOnce() -> T) -> T {
    let _guard = PanicGuard { buffer, participant };
    run()
}

/// Joins a participant, propagating its panic if any
fn join<T>(handle: ScopedJoinHandle<'_, T>) -> T {
    handle.join().unwrap_or_else(|payload| resume_unwind(payload))
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::{System, guarded};
    use crate::buffer::BoundedBuffer;
    use crate::consumer::Consumer;
    use crate::journal::{Event, MemoryJournal};
    use crate::predicate::PredicateKind::{Even, Odd};
    use crate::producer::{Producer, ProducerReport};
    use crate::tests::{RUN_TIMEOUT, config};

    /// Runs on another thread and fails when it does not finish in time
    fn within_timeout<T: Send + 'static>(run: impl FnOnce() -> T + Send + 'static) -> T {
        let (sender, receiver) = crossbeam::channel::bounded(1);
        std::thread::spawn(move || {
            let _ = sender.send(run());
        });
        receiver.recv_timeout(RUN_TIMEOUT).unwrap()
    }

    #[test]
    fn accessors() {
        let system = System::new(config(3, &[("Even", Even), ("Odd", Odd)])).unwrap();
        assert_eq!(system.config().consumers.len(), 2);
        assert_eq!(system.buffer().capacity(), 3);
        assert!(!system.buffer().is_interrupted());
        system.interrupter().interrupt();
        assert!(system.buffer().is_interrupted());
    }

    #[test]
    fn panicking_producer_releases_the_consumers() {
        let (panicked, interrupted, reports) = within_timeout(|| {
            let system = System::new(config(4, &[("Even", Even), ("Odd", Odd)])).unwrap();
            let journal = MemoryJournal::new();
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                system.run_with(&journal, |_producer| -> ProducerReport { panic!("source exploded") })
            }));
            let reports = journal
                .events()
                .iter()
                .filter(|event| matches!(event, Event::ConsumerTerminated { .. }))
                .count();
            (outcome.is_err(), system.buffer().is_interrupted(), reports)
        });
        assert!(panicked);
        assert!(interrupted);
        assert_eq!(reports, 2);
    }

    #[test]
    fn panicking_predicate_releases_the_others() {
        let (panicked, even, accepted) = within_timeout(|| {
            let buffer = BoundedBuffer::new(4);
            let journal = MemoryJournal::new();
            let (panicked, even) = crossbeam_utils::thread::scope(|scope| {
                // 3 is accepted by no one else, without the interruption it would circulate forever
                let fragile = scope.spawn(|_| {
                    guarded(&buffer, "Fragile", || {
                        let predicate = |item: i64| {
                            assert_ne!(item, 3, "cannot judge 3");
                            item == 1
                        };
                        Consumer::new("Fragile", predicate, &buffer, &journal).run()
                    })
                });
                let even = scope.spawn(|_| {
                    guarded(&buffer, "Even", || Consumer::new("Even", Even, &buffer, &journal).run())
                });
                guarded(&buffer, "producer", || Producer::new(&buffer, &journal).run_items([2, 3, 4]));
                (fragile.join().is_err(), even.join().unwrap())
            })
            .unwrap();
            (panicked, even, buffer.stats().accepted)
        });
        assert!(panicked);
        assert!(even.interrupted);
        // the item held by the panicking consumer was handed back, not counted as accepted
        assert_eq!(accepted, even.tally.count);
        assert!(matches!(even.tally.sum, 0 | 2 | 4 | 6));
    }
}
