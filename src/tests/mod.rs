/*******************************************************************************
 * Copyright (c) 2024 Cénotélie Opérations SAS (cenotelie.fr)
 ******************************************************************************/

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::{Receiver, RecvTimeoutError};

use crate::config::{Config, ConsumerSpec};
use crate::errors::InputError;
use crate::journal::{Event, MemoryJournal};
use crate::predicate::PredicateKind;
use crate::system::{Interrupter, RunSummary, System};

mod properties;

/// Upper bound for a run that is expected to terminate
pub const RUN_TIMEOUT: Duration = Duration::from_secs(30);

/// Routes the logs of the code under test to the test output
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::INFO)
        .try_init();
}

/// Builds a configuration without any pause
pub fn config(capacity: usize, consumers: &[(&str, PredicateKind)]) -> Config {
    Config {
        buffer_capacity: capacity,
        producer_delay_ms: 0,
        consumer_delay_ms: 0,
        consumers: consumers
            .iter()
            .map(|&(label, predicate)| ConsumerSpec::new(label, predicate))
            .collect(),
        ..Config::default()
    }
}

/// A run in progress on a background thread
struct Running {
    finished: Receiver<RunSummary>,
    interrupter: Interrupter,
    journal: Arc<MemoryJournal>,
    handle: JoinHandle<()>,
}

fn spawn(config: Config, source: Vec<Result<i64, InputError>>) -> Running {
    init_tracing();
    let system = System::new(config).unwrap();
    let interrupter = system.interrupter();
    let journal = Arc::new(MemoryJournal::new());
    let (sender, finished) = crossbeam::channel::bounded(1);
    let handle = std::thread::spawn({
        let journal = journal.clone();
        move || {
            let summary = system.run(source, journal.as_ref());
            let _ = sender.send(summary);
        }
    });
    Running {
        finished,
        interrupter,
        journal,
        handle,
    }
}

/// Runs to completion and gets the summary with the recorded events
pub fn run_source(config: Config, source: Vec<Result<i64, InputError>>) -> (RunSummary, Vec<Event>) {
    let running = spawn(config, source);
    match running.finished.recv_timeout(RUN_TIMEOUT) {
        Ok(summary) => {
            running.handle.join().unwrap();
            (summary, running.journal.events())
        }
        Err(_) => {
            running.interrupter.interrupt();
            running.handle.join().unwrap();
            panic!("run did not terminate within {RUN_TIMEOUT:?}");
        }
    }
}

/// Runs a sequence of integers to completion
pub fn run_items(config: Config, items: &[i64]) -> (RunSummary, Vec<Event>) {
    run_source(config, items.iter().copied().map(Ok).collect())
}

/// Checks that a run does not terminate within `wait`, then interrupts it and gets its summary
pub fn run_never_terminating(config: Config, items: &[i64], wait: Duration) -> (RunSummary, Vec<Event>) {
    let running = spawn(config, items.iter().copied().map(Ok).collect());
    match running.finished.recv_timeout(wait) {
        Ok(summary) => panic!("run terminated: {summary:?}"),
        Err(RecvTimeoutError::Disconnected) => panic!("run failed"),
        Err(RecvTimeoutError::Timeout) => {}
    }
    running.interrupter.interrupt();
    let summary = running.finished.recv_timeout(RUN_TIMEOUT).unwrap();
    running.handle.join().unwrap();
    (summary, running.journal.events())
}

/// Gets the items accepted by each consumer, as recorded in the events
pub fn accepted_by(events: &[Event], consumer: &str) -> Vec<i64> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Accepted { label, item, .. } if label == consumer => Some(*item),
            _ => None,
        })
        .collect()
}

/// Gets all the accepted items, sorted
pub fn all_accepted(events: &[Event]) -> Vec<i64> {
    let mut items = events
        .iter()
        .filter_map(|event| match event {
            Event::Accepted { item, .. } => Some(*item),
            _ => None,
        })
        .collect::<Vec<_>>();
    items.sort_unstable();
    items
}
