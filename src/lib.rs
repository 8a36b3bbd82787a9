/*******************************************************************************
 * Copyright (c) 2024 Cénotélie Opérations SAS (cenotelie.fr)
 ******************************************************************************/

//! # Sortingroom
//!
//! The bounded-buffer producer/consumer problem, with a twist.
//! A single producer reads integers and deposits them into a shared bounded buffer.
//! Several consumers, each with its own acceptance predicate (even, odd, prime, ...), withdraw items.
//! A consumer keeps the items it accepts and hands the others back to the tail of the buffer,
//! so that another consumer may claim them.
//!
//! When the producer is done, it marks the buffer terminal.
//! Consumers observe the end of the stream once the buffer is terminal and drained.
//!
//! Items that no consumer accepts circulate forever and prevent termination.
//! Make sure the predicates together accept every integer, for example with a default consumer using `any`.
//!
//!
//! ## Example
//!
//! One producer and two consumers over a buffer of 4 slots.
//! ```
//! use sortingroom::buffer::BoundedBuffer;
//! use sortingroom::consumer::Consumer;
//! use sortingroom::journal::MemoryJournal;
//! use sortingroom::predicate::PredicateKind;
//! use sortingroom::producer::Producer;
//!
//! let buffer = BoundedBuffer::new(4);
//! let journal = MemoryJournal::new();
//!
//! let (even, odd) = crossbeam_utils::thread::scope(|scope| {
//!     let even = scope.spawn(|_| Consumer::new("Even", PredicateKind::Even, &buffer, &journal).run());
//!     let odd = scope.spawn(|_| Consumer::new("Odd", PredicateKind::Odd, &buffer, &journal).run());
//!     Producer::new(&buffer, &journal).run_items(1..=10);
//!     (even.join().unwrap(), odd.join().unwrap())
//! })
//! .unwrap();
//!
//! assert_eq!((even.tally.sum, even.tally.count), (30, 5));
//! assert_eq!((odd.tally.sum, odd.tally.count), (25, 5));
//! ```
//!
//!
//! ## License
//!
//! Copyright 2024 Cénotélie Opérations SAS
//!
//! Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the “Software”), to deal in the Software without restriction, including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is furnished to do so, subject to the following conditions:
//!
//! The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.
//!
//! THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
//!

#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc, clippy::module_name_repetitions)]

pub mod buffer;
pub mod config;
pub mod consumer;
pub mod errors;
pub mod journal;
pub mod predicate;
pub mod producer;
pub mod source;
pub mod system;

pub use buffer::{BoundedBuffer, Claim};
pub use config::Config;
pub use system::{RunSummary, System};

#[cfg(test)]
mod tests;
