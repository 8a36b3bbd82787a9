/*******************************************************************************
 * Copyright (c) 2024 Cénotélie Opérations SAS (cenotelie.fr)
 ******************************************************************************/

//! The integer source read by the producer: text with one integer per line

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::errors::InputError;

/// Iterator over the integers of a text source.
///
/// Blank lines are skipped.
/// A malformed line yields a recoverable `InputError::Parse` and iteration can go on.
/// A read failure yields `InputError::Read`, after which the iterator is exhausted.
#[derive(Debug)]
pub struct Integers<R> {
    /// The underlying reader
    reader: R,
    /// The number of the last line read
    line: usize,
    /// Buffer for the current line
    buffer: String,
    /// Whether the end was reached or a read failed
    done: bool,
}

impl<R: BufRead> Integers<R> {
    /// Reads integers from a reader
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buffer: String::new(),
            done: false,
        }
    }

    /// Gets the number of lines read so far
    #[must_use]
    pub fn lines_read(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> Iterator for Integers<R> {
    type Item = Result<i64, InputError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.buffer.clear();
            match self.reader.read_line(&mut self.buffer) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    self.line += 1;
                    let content = self.buffer.trim();
                    if content.is_empty() {
                        continue;
                    }
                    return Some(content.parse::<i64>().map_err(|_| InputError::Parse {
                        line: self.line,
                        content: content.to_string(),
                    }));
                }
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(source) => {
                    self.done = true;
                    return Some(Err(InputError::Read {
                        line: self.line + 1,
                        source,
                    }));
                }
            }
        }
        None
    }
}

/// Opens a file as an integer source
///
/// # Errors
///
/// Returns `InputError::Open` when the file cannot be opened
pub fn open(path: &Path) -> Result<Integers<BufReader<File>>, InputError> {
    let file = File::open(path).map_err(|source| InputError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Integers::new(BufReader::new(file)))
}

/// Writes a sequence of integers to a file, one per line
///
/// # Errors
///
/// Returns any I/O error raised while creating or writing the file
pub fn write_sequence<I: IntoIterator<Item = i64>>(path: &Path, items: I) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for item in items {
        writeln!(writer, "{item}")?;
    }
    writer.flush()
}
