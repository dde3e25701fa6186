//! Rebuild record bytes from one or more chunks, which may arrive in any order.
//!
//! # Examples
//!
//! ```
//! use rockblock::{Chunk, Reassembler};
//! let chunk_b = Chunk::with_max_length(b"\x2a\0\0\0ID\x01\0cd", 10).unwrap();
//! let chunk_a = Chunk::with_max_length(b"\x2a\0\0\0ID\0\0ab", 10).unwrap();
//! let mut reassembler = Reassembler::new(4, 10);
//! reassembler.add(&chunk_b).unwrap();
//! reassembler.add(&chunk_a).unwrap();
//! assert_eq!(b"abcd".to_vec(), reassembler.finish().unwrap());
//! ```

use std::collections::BTreeSet;
use {max_chunk_data_length, max_chunks, Chunk};

/// Merges chunks into a record buffer.
///
/// The buffer starts zeroed. Each chunk's data is copied to `sequence number * max chunk data
/// length`, overwriting whatever was there, so adding the same chunk twice is harmless.
#[derive(Debug)]
pub struct Reassembler {
    buffer: Vec<u8>,
    max_chunk_length: usize,
    send_time: Option<u32>,
    received: BTreeSet<u16>,
}

/// Errors returned while reassembling a record.
#[derive(Debug, Fail, PartialEq)]
pub enum Error {
    /// The chunk is empty or longer than the maximum chunk length.
    #[fail(
        display = "chunk {} is {} bytes, which is empty or more than {}",
        sequence_number,
        length,
        max
    )]
    OversizedOrEmptyChunk {
        /// The sequence number of the offending chunk.
        sequence_number: u16,

        /// The chunk length, header included.
        length: usize,

        /// The maximum chunk length.
        max: usize,
    },

    /// A chunk was sent at a different time than the first chunk.
    #[fail(
        display = "chunk {} was sent at {}, but the first chunk was sent at {}",
        sequence_number,
        actual,
        expected
    )]
    TimestampMismatch {
        /// The sequence number of the offending chunk.
        sequence_number: u16,

        /// The send time of the first chunk.
        expected: u32,

        /// The send time of the offending chunk.
        actual: u32,
    },

    /// The sequence number is past the last chunk a record can have.
    #[fail(
        display = "invalid sequence number {}, a record has at most {} chunks",
        _0,
        _1
    )]
    InvalidSequenceNumber(u16, usize),

    /// The chunk's data would run past the end of the record.
    #[fail(
        display = "chunk {} ends at byte {}, past the end of the {} byte record",
        sequence_number,
        end,
        record_length
    )]
    ChunkOverrun {
        /// The sequence number of the offending chunk.
        sequence_number: u16,

        /// The offset one past the chunk's last byte.
        end: usize,

        /// The record length.
        record_length: usize,
    },

    /// There is no chunk zero, which holds the record's base fields.
    #[fail(display = "no base chunk (sequence number 0) was received")]
    MissingBaseChunk,
}

impl Reassembler {
    /// Creates a reassembler for a record of `record_length` bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use rockblock::{Reassembler, MAX_CHUNK_LENGTH};
    /// let reassembler = Reassembler::new(868, MAX_CHUNK_LENGTH);
    /// assert_eq!(3, reassembler.max_chunks());
    /// ```
    pub fn new(record_length: usize, max_chunk_length: usize) -> Reassembler {
        Reassembler {
            buffer: vec![0; record_length],
            max_chunk_length: max_chunk_length,
            send_time: None,
            received: BTreeSet::new(),
        }
    }

    /// Returns the largest number of chunks a record can be split into.
    pub fn max_chunks(&self) -> usize {
        max_chunks(self.buffer.len(), self.max_chunk_length)
    }

    /// Returns the send time shared by the chunks added so far.
    pub fn send_time(&self) -> Option<u32> {
        self.send_time
    }

    /// Validates a chunk and merges its data into the record.
    ///
    /// Nothing is merged if the chunk is rejected.
    ///
    /// # Examples
    ///
    /// ```
    /// use rockblock::{Chunk, Reassembler, reassembler::Error};
    /// let mut reassembler = Reassembler::new(36, 340);
    /// reassembler.add(&Chunk::new(b"\x2a\0\0\0ID\0\0").unwrap()).unwrap();
    /// assert_eq!(
    ///     Error::TimestampMismatch { sequence_number: 0, expected: 42, actual: 43 },
    ///     reassembler.add(&Chunk::new(b"\x2b\0\0\0ID\0\0").unwrap()).unwrap_err()
    /// );
    /// ```
    pub fn add(&mut self, chunk: &Chunk) -> Result<(), Error> {
        let sequence_number = chunk.sequence_number();
        if chunk.wire_len() > self.max_chunk_length {
            return Err(Error::OversizedOrEmptyChunk {
                sequence_number: sequence_number,
                length: chunk.wire_len(),
                max: self.max_chunk_length,
            });
        }
        let send_time = self.send_time.unwrap_or_else(|| chunk.send_time());
        if send_time != chunk.send_time() {
            return Err(Error::TimestampMismatch {
                sequence_number: sequence_number,
                expected: send_time,
                actual: chunk.send_time(),
            });
        }
        let max_chunks = self.max_chunks();
        if usize::from(sequence_number) >= max_chunks {
            return Err(Error::InvalidSequenceNumber(sequence_number, max_chunks));
        }
        let start = usize::from(sequence_number) * max_chunk_data_length(self.max_chunk_length);
        let end = start + chunk.data().len();
        if end > self.buffer.len() {
            return Err(Error::ChunkOverrun {
                sequence_number: sequence_number,
                end: end,
                record_length: self.buffer.len(),
            });
        }
        self.buffer[start..end].copy_from_slice(chunk.data());
        self.send_time = Some(send_time);
        self.received.insert(sequence_number);
        debug!(
            "merged chunk {} into bytes {}..{} of {}",
            sequence_number,
            start,
            end,
            self.buffer.len()
        );
        Ok(())
    }

    /// Returns true if the base chunk has been merged.
    pub fn has_base_chunk(&self) -> bool {
        self.received.contains(&0)
    }

    /// Returns the sequence numbers merged so far, in order.
    pub fn received(&self) -> Vec<u16> {
        self.received.iter().cloned().collect()
    }

    /// Finishes reassembly and returns the record bytes.
    ///
    /// Chunks after the base chunk are optional; any bytes they would have carried stay zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use rockblock::{Chunk, Reassembler, reassembler::Error};
    /// let mut reassembler = Reassembler::new(4, 10);
    /// reassembler.add(&Chunk::with_max_length(b"\0\0\0\0ID\x01\0cd", 10).unwrap()).unwrap();
    /// assert_eq!(Error::MissingBaseChunk, reassembler.finish().unwrap_err());
    /// ```
    pub fn finish(self) -> Result<Vec<u8>, Error> {
        if self.has_base_chunk() {
            Ok(self.buffer)
        } else {
            Err(Error::MissingBaseChunk)
        }
    }
}

/// Reassembles a whole batch of chunks, stopping at the first one that fails.
///
/// # Examples
///
/// ```
/// let data = (0..100).collect::<Vec<u8>>();
/// let mut chunks = rockblock::encode(&data, 1538456762, 40).unwrap();
/// chunks.reverse();
/// assert_eq!(data, rockblock::reassemble(chunks, 100, 40).unwrap());
/// ```
pub fn reassemble<I>(
    chunks: I,
    record_length: usize,
    max_chunk_length: usize,
) -> Result<Vec<u8>, Error>
where
    I: IntoIterator<Item = Chunk>,
{
    let mut reassembler = Reassembler::new(record_length, max_chunk_length);
    for chunk in chunks {
        reassembler.add(&chunk)?;
    }
    reassembler.finish()
}
