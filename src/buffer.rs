/*******************************************************************************
 * Copyright (c) 2024 Cénotélie Opérations SAS (cenotelie.fr)
 ******************************************************************************/

//! The shared bounded buffer.
//!
//! A circular slot array guarded by a single mutex, with two condition variables partitioning the waiters:
//! `not_full` for depositors and `not_empty` for withdrawers.
//!
//! Withdrawing an item yields a [`Claim`].
//! The slot of a claimed item stays reserved until the claim is resolved, either by accepting the item
//! or by re-depositing it at the tail.
//! Re-depositing therefore never blocks, even when the producer filled every other slot in the meantime,
//! and the end of the stream is only reported once no claimed item may come back.

use core::ops::Deref;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::errors::{Interrupted, RecvError, SendError, TryRecvError, TrySendError};

/// Cumulative counters over the lifetime of a buffer
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BufferStats {
    /// Number of fresh items deposited
    pub deposits: u64,
    /// Number of claimed items that were put back
    pub redeposits: u64,
    /// Number of items taken out of the slots (claims)
    pub withdrawals: u64,
    /// Number of claims resolved by accepting the item
    pub accepted: u64,
    /// Highest occupancy observed
    pub high_water: usize,
}

impl BufferStats {
    /// Gets the number of items present in the buffer according to the counters
    #[must_use]
    pub fn present(&self) -> u64 {
        self.deposits + self.redeposits - self.withdrawals
    }
}

/// The state protected by the buffer's mutex
#[derive(Debug)]
struct State<T> {
    /// The slots themselves
    slots: Box<[Option<T>]>,
    /// Position of the oldest item
    read: usize,
    /// Position of the next free slot
    write: usize,
    /// Number of items in the slots
    count: usize,
    /// Number of withdrawn items whose claim is not yet resolved
    claimed: usize,
    /// No more fresh items will be deposited
    terminal: bool,
    /// Everybody should stop
    interrupted: bool,
    /// The counters
    stats: BufferStats,
}

impl<T> State<T> {
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Whether a fresh item can be deposited, claimed items keep their slot reserved
    fn has_free_slot(&self) -> bool {
        self.count + self.claimed < self.capacity()
    }

    /// Whether the stream ended: no item is present and none can come back
    fn is_drained(&self) -> bool {
        self.terminal && self.count == 0 && self.claimed == 0
    }

    fn push(&mut self, item: T) {
        debug_assert!(self.count < self.capacity());
        self.slots[self.write] = Some(item);
        self.write = (self.write + 1) % self.capacity();
        self.count += 1;
        self.stats.high_water = self.stats.high_water.max(self.count);
    }

    fn pop(&mut self) -> Option<T> {
        if self.count == 0 {
            return None;
        }
        let item = self.slots[self.read].take();
        debug_assert!(item.is_some());
        self.read = (self.read + 1) % self.capacity();
        self.count -= 1;
        self.claimed += 1;
        self.stats.withdrawals += 1;
        item
    }
}

/// A fixed-capacity FIFO shared by one producer and several consumers
#[derive(Debug)]
pub struct BoundedBuffer<T> {
    /// The protected state
    state: Mutex<State<T>>,
    /// Waiters for a free slot
    not_full: Condvar,
    /// Waiters for an item or the end of the stream
    not_empty: Condvar,
    /// Participants pausing between two operations
    pausing: Condvar,
}

impl<T> BoundedBuffer<T> {
    /// Creates a new buffer with the specified number of slots
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "capacity must be at least 1");
        Self {
            state: Mutex::new(State {
                slots: (0..capacity).map(|_| None).collect(),
                read: 0,
                write: 0,
                count: 0,
                claimed: 0,
                terminal: false,
                interrupted: false,
                stats: BufferStats::default(),
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            pausing: Condvar::new(),
        }
    }

    /// Gets the capacity of the buffer
    #[must_use]
    #[inline]
    pub fn capacity(&self) -> usize {
        self.state.lock().capacity()
    }

    /// Gets the number of items in the buffer
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().count
    }

    /// Gets whether the buffer holds no item
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().count == 0
    }

    /// Gets whether all slots are occupied or reserved by a claim
    #[must_use]
    pub fn is_full(&self) -> bool {
        !self.state.lock().has_free_slot()
    }

    /// Gets the number of claims not yet resolved
    #[must_use]
    pub fn claimed(&self) -> usize {
        self.state.lock().claimed
    }

    /// Gets whether the buffer was marked terminal
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.state.lock().terminal
    }

    /// Gets whether the buffer was interrupted
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.state.lock().interrupted
    }

    /// Gets a snapshot of the counters
    #[must_use]
    pub fn stats(&self) -> BufferStats {
        self.state.lock().stats
    }

    /// Deposits a fresh item, blocking while there is no free slot
    ///
    /// Depositing is still possible after the buffer was marked terminal.
    ///
    /// # Errors
    ///
    /// Returns the item back when the buffer was interrupted
    pub fn deposit(&self, item: T) -> Result<(), SendError<T>> {
        let mut state = self.state.lock();
        while !state.interrupted && !state.has_free_slot() {
            self.not_full.wait(&mut state);
        }
        if state.interrupted {
            return Err(SendError(item));
        }
        state.push(item);
        state.stats.deposits += 1;
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Attempts to deposit a fresh item without blocking
    ///
    /// # Errors
    ///
    /// Returns the item back when the buffer is full or interrupted
    pub fn try_deposit(&self, item: T) -> Result<(), TrySendError<T>> {
        let mut state = self.state.lock();
        if state.interrupted {
            return Err(TrySendError::Interrupted(item));
        }
        if !state.has_free_slot() {
            return Err(TrySendError::Full(item));
        }
        state.push(item);
        state.stats.deposits += 1;
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Withdraws the oldest item, blocking while the buffer is empty and the stream did not end
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Terminated` (END) when the buffer is terminal and drained,
    /// `RecvError::Interrupted` when the buffer was interrupted.
    pub fn withdraw(&self) -> Result<Claim<'_, T>, RecvError> {
        let mut state = self.state.lock();
        loop {
            if state.interrupted {
                return Err(RecvError::Interrupted);
            }
            if let Some(item) = state.pop() {
                return Ok(Claim::new(self, item));
            }
            if state.is_drained() {
                return Err(RecvError::Terminated);
            }
            self.not_empty.wait(&mut state);
        }
    }

    /// Attempts to withdraw the oldest item without blocking
    ///
    /// # Errors
    ///
    /// Returns `TryRecvError::Empty` when no item is available right now
    pub fn try_withdraw(&self) -> Result<Claim<'_, T>, TryRecvError> {
        let mut state = self.state.lock();
        if state.interrupted {
            return Err(TryRecvError::Interrupted);
        }
        if let Some(item) = state.pop() {
            return Ok(Claim::new(self, item));
        }
        if state.is_drained() {
            return Err(TryRecvError::Terminated);
        }
        Err(TryRecvError::Empty)
    }

    /// Withdraws the oldest item, blocking at most for `timeout`
    ///
    /// # Errors
    ///
    /// Returns `TryRecvError::Empty` when the timeout expired
    pub fn withdraw_timeout(&self, timeout: Duration) -> Result<Claim<'_, T>, TryRecvError> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            if state.interrupted {
                return Err(TryRecvError::Interrupted);
            }
            if let Some(item) = state.pop() {
                return Ok(Claim::new(self, item));
            }
            if state.is_drained() {
                return Err(TryRecvError::Terminated);
            }
            if self.not_empty.wait_until(&mut state, deadline).timed_out() {
                // last chance, the state may have changed right at the deadline
                if let Some(item) = state.pop() {
                    return Ok(Claim::new(self, item));
                }
                return Err(if state.is_drained() {
                    TryRecvError::Terminated
                } else {
                    TryRecvError::Empty
                });
            }
        }
    }

    /// Marks the buffer as terminal: no fresh item will be deposited anymore.
    /// Wakes all withdrawers so that they can observe the end of the stream.
    /// This is idempotent.
    pub fn mark_terminal(&self) {
        let mut state = self.state.lock();
        state.terminal = true;
        drop(state);
        self.not_empty.notify_all();
    }

    /// Interrupts all participants: pending and future operations fail with an interruption.
    /// This is idempotent.
    pub fn interrupt(&self) {
        let mut state = self.state.lock();
        state.interrupted = true;
        drop(state);
        self.not_full.notify_all();
        self.not_empty.notify_all();
        self.pausing.notify_all();
    }

    /// Pauses the calling thread for `duration`, returning early when the buffer is interrupted
    ///
    /// # Errors
    ///
    /// Returns `Interrupted` when the buffer was interrupted before or during the pause
    pub fn pause(&self, duration: Duration) -> Result<(), Interrupted> {
        let deadline = Instant::now() + duration;
        let mut state = self.state.lock();
        while !state.interrupted {
            if Instant::now() >= deadline {
                return Ok(());
            }
            self.pausing.wait_until(&mut state, deadline);
        }
        Err(Interrupted)
    }

    /// Puts a claimed item back at the tail, in the slot reserved by its claim
    fn put_back(&self, item: T) {
        let mut state = self.state.lock();
        debug_assert!(state.claimed > 0);
        state.claimed -= 1;
        state.push(item);
        state.stats.redeposits += 1;
        drop(state);
        self.not_empty.notify_one();
    }

    /// Frees the slot reserved by an accepted claim
    fn release(&self) {
        let mut state = self.state.lock();
        debug_assert!(state.claimed > 0);
        state.claimed -= 1;
        state.stats.accepted += 1;
        let drained = state.is_drained();
        drop(state);
        self.not_full.notify_one();
        if drained {
            // withdrawers waiting on a possible re-deposit must now see the end of the stream
            self.not_empty.notify_all();
        }
    }
}

/// An item withdrawn from the buffer, whose slot stays reserved until the claim is resolved.
///
/// Dropping the claim accepts the item, unless the holder is panicking: the item is then re-deposited.
#[derive(Debug)]
#[must_use = "the claim should be accepted or re-deposited"]
pub struct Claim<'a, T> {
    /// The parent buffer
    buffer: &'a BoundedBuffer<T>,
    /// The item, only `None` once resolved
    item: Option<T>,
}

impl<'a, T> Claim<'a, T> {
    fn new(buffer: &'a BoundedBuffer<T>, item: T) -> Self {
        Self { buffer, item: Some(item) }
    }

    /// Accepts the item, freeing its slot
    pub fn accept(mut self) -> T {
        let Some(item) = self.item.take() else {
            unreachable!("claim resolved twice")
        };
        self.buffer.release();
        item
    }

    /// Re-deposits the item at the tail of the buffer so that another consumer may claim it.
    /// This never blocks and succeeds even after the buffer was marked terminal.
    pub fn redeposit(mut self) {
        let Some(item) = self.item.take() else {
            unreachable!("claim resolved twice")
        };
        self.buffer.put_back(item);
    }
}

impl<T> Deref for Claim<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        match &self.item {
            Some(item) => item,
            None => unreachable!("claim already resolved"),
        }
    }
}

impl<T> Drop for Claim<'_, T> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            if std::thread::panicking() {
                // the holder died before deciding, the item goes back for someone else
                self.buffer.put_back(item);
            } else {
                self.buffer.release();
            }
        }
    }
}
