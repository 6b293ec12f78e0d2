//! Segmented bzip2 reader (C1).
//!
//! A dump split by `bzip2recover` decompresses as a sequence of independent
//! bzip2 streams, one per chunk file. `SegmentedReader` walks that sequence
//! and presents it as one continuous line-oriented stream, transparently
//! opening the next chunk when the current one runs dry. A logical line can
//! straddle a chunk boundary; the reader concatenates across chunks until it
//! sees the `\n` terminator or runs out of chunks entirely.

use std::io::{BufRead, BufReader};

use bzip2::read::BzDecoder;

use crate::chunkset::ChunkSet;
use crate::error::ReaderError;

/// The result of one `read_line` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A complete line, including its trailing `\n`.
    Line(Vec<u8>),
    /// No more chunks remain. Carries whatever bytes were accumulated since
    /// the last complete line, empty if the stream ended cleanly.
    Eof(Vec<u8>),
}

/// Minimal reading surface C4 and C8 both need, so both can run against
/// either a real `SegmentedReader` or an in-memory fake in tests.
pub trait LineSource {
    fn read_line(&mut self) -> Result<ReadOutcome, ReaderError>;

    /// The chunk index the *next* `read_line` call will start consuming
    /// from. Callers that need to remember "which chunk was this line's
    /// first byte in" must read this before calling `read_line`.
    fn current_index(&self) -> u64;
}

pub struct SegmentedReader {
    chunks: ChunkSet,
    index: u64,
    current: Option<BufReader<BzDecoder<std::fs::File>>>,
}

impl SegmentedReader {
    /// Opens a segmented reader positioned at `start_index`. If that chunk
    /// doesn't exist, the reader is immediately at EOF.
    pub fn open(chunks: ChunkSet, start_index: u64) -> Self {
        let mut reader = Self {
            chunks,
            index: start_index,
            current: None,
        };
        reader.open_current();
        reader
    }

    fn open_current(&mut self) {
        self.current = match self.chunks.open(self.index) {
            Ok(Some(file)) => Some(BufReader::new(BzDecoder::new(file))),
            Ok(None) | Err(_) => None,
        };
    }

    pub fn close(self) {
        // Dropping is sufficient; this exists so callers can be explicit
        // about when a reader's file handles are released.
    }
}

impl LineSource for SegmentedReader {
    fn current_index(&self) -> u64 {
        self.index
    }

    fn read_line(&mut self) -> Result<ReadOutcome, ReaderError> {
        let mut buf = Vec::new();
        loop {
            match &mut self.current {
                None => return Ok(ReadOutcome::Eof(buf)),
                Some(r) => {
                    r.read_until(b'\n', &mut buf)?;
                }
            }

            if buf.last() == Some(&b'\n') {
                return Ok(ReadOutcome::Line(buf));
            }

            // Current chunk is exhausted without a terminator: advance and
            // keep accumulating into the same buffer.
            self.index += 1;
            self.open_current();
            if self.current.is_none() {
                return Ok(ReadOutcome::Eof(buf));
            }
        }
    }
}
