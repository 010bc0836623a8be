//! Bounded line reader.
//!
//! Lines are read into a buffer owned by the reader, which lives for a single
//! load pass. A line longer than the configured maximum is split into several
//! lines instead of failing the pass.

use std::io::{self, BufRead, BufReader, Read};

/// Default maximum line length in bytes.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 8192;

/// One line as returned by [`LineReader::next_line`].
#[derive(Debug)]
pub(crate) struct Line<'a> {
    /// The raw bytes, including the terminating newline if there is one
    pub(crate) bytes: &'a [u8],
    /// False only for a trailing fragment that ended at end-of-file
    pub(crate) terminated: bool,
    /// Byte offset just past this line
    pub(crate) end: u64,
}

pub(crate) struct LineReader<R> {
    inner: BufReader<R>,
    buffer: Vec<u8>,
    max_len: usize,
    offset: u64,
}

impl<R: Read> LineReader<R> {
    /// Create a reader whose first byte sits at `offset` in the file.
    pub(crate) fn new(inner: R, offset: u64, max_len: usize) -> Self {
        let max_len = max_len.max(1);

        Self {
            inner: BufReader::new(inner),
            buffer: Vec::with_capacity(max_len.min(DEFAULT_MAX_LINE_LENGTH)),
            max_len,
            offset,
        }
    }

    /// Read the next line, or `None` at end-of-file.
    pub(crate) fn next_line(&mut self) -> io::Result<Option<Line<'_>>> {
        self.buffer.clear();

        let n = (&mut self.inner)
            .take(self.max_len as u64)
            .read_until(b'\n', &mut self.buffer)?;

        if n == 0 {
            return Ok(None);
        }

        self.offset += n as u64;

        // A chunk cut at the length limit counts as a line of its own
        let terminated = self.buffer.last() == Some(&b'\n') || n == self.max_len;

        Ok(Some(Line {
            bytes: &self.buffer,
            terminated,
            end: self.offset,
        }))
    }
}
