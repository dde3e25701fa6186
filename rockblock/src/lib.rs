//! Split icedrifter records into RockBLOCK-sized chunks, and put them back together.
//!
//! # Background
//!
//! Icedrifter buoys report through a RockBLOCK, an [Iridium
//! SBD](https://github.com/gadomski/sbd-rs) modem. Each SBD message can only be a certain number
//! of bytes, so the buoy splits its data record into numbered chunks, each carrying an eight
//! byte header:
//!
//! ```text
//! [u32 send time][b"ID"][u16 sequence number][data ...]
//! ```
//!
//! All multi-byte header fields are little-endian. Every chunk of one record carries the same
//! send time, and the data of chunk `n` lands at `n * (max chunk length - 8)` in the record.

#![deny(missing_docs, missing_debug_implementations, unsafe_code)]

extern crate byteorder;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
extern crate sbd;

pub mod chunk;
pub mod hex;
pub mod reassembler;

pub use chunk::{encode, Chunk};
pub use reassembler::{reassemble, Reassembler};

/// The largest chunk, header included, that a RockBLOCK will send for us.
pub const MAX_CHUNK_LENGTH: usize = 340;

/// The number of bytes in a chunk header.
pub const HEADER_LENGTH: usize = 8;

/// Every chunk starts its header with these two bytes after the send time.
pub const TAG: [u8; 2] = *b"ID";

/// Returns the number of record bytes that fit in one chunk of the given length.
///
/// # Examples
///
/// ```
/// assert_eq!(332, rockblock::max_chunk_data_length(rockblock::MAX_CHUNK_LENGTH));
/// assert_eq!(0, rockblock::max_chunk_data_length(4));
/// ```
pub fn max_chunk_data_length(max_chunk_length: usize) -> usize {
    max_chunk_length.saturating_sub(HEADER_LENGTH)
}

/// Returns the number of chunks needed to carry a record of `record_length` bytes.
///
/// # Examples
///
/// ```
/// assert_eq!(3, rockblock::max_chunks(868, 340));
/// assert_eq!(1, rockblock::max_chunks(36, 340));
/// assert_eq!(usize::max_value() / 2 + 1, rockblock::max_chunks(usize::max_value(), 10));
/// ```
pub fn max_chunks(record_length: usize, max_chunk_length: usize) -> usize {
    let data_length = max_chunk_data_length(max_chunk_length);
    if data_length == 0 {
        0
    } else {
        record_length / data_length + usize::from(record_length % data_length != 0)
    }
}
