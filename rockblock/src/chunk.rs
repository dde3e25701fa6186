//! Chunks, which correspond one-to-one with the SBD messages sent by a RockBLOCK.

use byteorder::{ByteOrder, LittleEndian};
use failure::Error as FailureError;
use hex;
use sbd::mo::Message;
use std::path::Path;
use {max_chunk_data_length, max_chunks, HEADER_LENGTH, MAX_CHUNK_LENGTH, TAG};

/// One piece of an icedrifter record.
///
/// # Examples
///
/// You can read chunks from the filesystem:
///
/// ```
/// use rockblock::{Chunk, MAX_CHUNK_LENGTH};
/// let path = "fixtures/300234010000000-20181002050602-0.bin";
/// let chunk = Chunk::from_path(path, MAX_CHUNK_LENGTH).unwrap();
/// assert_eq!(0, chunk.sequence_number());
/// ```
///
/// Or build them from raw bytes:
///
/// ```
/// use rockblock::Chunk;
/// let chunk = Chunk::new(b"\x2a\0\0\0ID\x01\0abc").unwrap();
/// assert_eq!(42, chunk.send_time());
/// assert_eq!(1, chunk.sequence_number());
/// assert_eq!(b"abc", chunk.data());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Chunk {
    send_time: u32,
    sequence_number: u16,
    data: Vec<u8>,
    message: Option<Message>,
}

/// An error returned when reading or building chunks.
#[derive(Debug, Fail, PartialEq)]
pub enum Error {
    /// The chunk has no bytes at all, or more than the transport allows.
    #[fail(
        display = "chunk is empty or too long: {} bytes (max {})",
        length,
        max
    )]
    OversizedOrEmpty {
        /// The length of the chunk, header included.
        length: usize,

        /// The maximum allowed chunk length.
        max: usize,
    },

    /// The chunk is too short to hold a header.
    #[fail(display = "chunk is only {} bytes, too short for a header", _0)]
    Truncated(usize),

    /// The chunk does not carry the `ID` tag.
    #[fail(display = "invalid chunk tag: {:?}", _0)]
    InvalidTag([u8; 2]),

    /// The maximum chunk length leaves no room for data.
    #[fail(display = "a maximum chunk length of {} leaves no room for data", _0)]
    ChunkLengthTooSmall(usize),

    /// The record needs more chunks than a sequence number can count.
    #[fail(display = "{} chunks would be needed, more than a sequence number can hold", _0)]
    TooManyChunks(usize),
}

impl Chunk {
    /// Reads a chunk from a raw binary file, such as the attachment of a RockBLOCK email.
    ///
    /// # Examples
    ///
    /// ```
    /// use rockblock::{Chunk, MAX_CHUNK_LENGTH};
    /// let path = "fixtures/300234010000000-20181002050602-1.bin";
    /// let chunk = Chunk::from_path(path, MAX_CHUNK_LENGTH).unwrap();
    /// assert_eq!(1, chunk.sequence_number());
    /// ```
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        max_chunk_length: usize,
    ) -> Result<Chunk, FailureError> {
        let bytes = ::std::fs::read(path)?;
        Chunk::with_max_length(&bytes, max_chunk_length).map_err(FailureError::from)
    }

    /// Reads a chunk from an Iridium SBD message on the filesystem.
    ///
    /// # Examples
    ///
    /// ```
    /// use rockblock::{Chunk, MAX_CHUNK_LENGTH};
    /// let chunk = Chunk::from_sbd_path("fixtures/chunk-0.sbd", MAX_CHUNK_LENGTH).unwrap();
    /// assert_eq!(Some("300234010000000"), chunk.imei());
    /// ```
    pub fn from_sbd_path<P: AsRef<Path>>(
        path: P,
        max_chunk_length: usize,
    ) -> Result<Chunk, FailureError> {
        Chunk::from_message(Message::from_path(path)?, max_chunk_length).map_err(FailureError::from)
    }

    /// Creates a chunk from an `sbd::mo::Message`.
    pub fn from_message(message: Message, max_chunk_length: usize) -> Result<Chunk, Error> {
        let mut chunk = Chunk::with_max_length(message.payload(), max_chunk_length)?;
        chunk.message = Some(message);
        Ok(chunk)
    }

    /// Creates a chunk from text hex digits, as they appear in the body of a RockBLOCK email.
    ///
    /// # Examples
    ///
    /// ```
    /// use rockblock::{Chunk, MAX_CHUNK_LENGTH};
    /// let chunk = Chunk::from_hex("2a000000494401006162\r\n", MAX_CHUNK_LENGTH).unwrap();
    /// assert_eq!(Chunk::new(b"\x2a\0\0\0ID\x01\0ab").unwrap(), chunk);
    /// ```
    pub fn from_hex(text: &str, max_chunk_length: usize) -> Result<Chunk, FailureError> {
        let bytes = hex::decode(text)?;
        Chunk::with_max_length(&bytes, max_chunk_length).map_err(FailureError::from)
    }

    /// Creates a chunk from raw bytes, using the default `MAX_CHUNK_LENGTH`.
    pub fn new(bytes: &[u8]) -> Result<Chunk, Error> {
        Chunk::with_max_length(bytes, MAX_CHUNK_LENGTH)
    }

    /// Creates a chunk from raw bytes no longer than `max_chunk_length`.
    ///
    /// The length is checked before the tag.
    ///
    /// # Examples
    ///
    /// ```
    /// use rockblock::{Chunk, chunk::Error};
    /// assert_eq!(
    ///     Error::OversizedOrEmpty { length: 12, max: 10 },
    ///     Chunk::with_max_length(b"\0\0\0\0XX\0\0abcd", 10).unwrap_err()
    /// );
    /// assert_eq!(
    ///     Error::InvalidTag(*b"XX"),
    ///     Chunk::with_max_length(b"\0\0\0\0XX\0\0ab", 10).unwrap_err()
    /// );
    /// ```
    pub fn with_max_length(bytes: &[u8], max_chunk_length: usize) -> Result<Chunk, Error> {
        if bytes.is_empty() || bytes.len() > max_chunk_length {
            return Err(Error::OversizedOrEmpty {
                length: bytes.len(),
                max: max_chunk_length,
            });
        }
        if bytes.len() < HEADER_LENGTH {
            return Err(Error::Truncated(bytes.len()));
        }
        let tag = [bytes[4], bytes[5]];
        if tag != TAG {
            return Err(Error::InvalidTag(tag));
        }
        Ok(Chunk {
            send_time: LittleEndian::read_u32(&bytes[0..4]),
            sequence_number: LittleEndian::read_u16(&bytes[6..8]),
            data: bytes[HEADER_LENGTH..].to_vec(),
            message: None,
        })
    }

    /// Returns the time the record was sent, in seconds since the epoch.
    pub fn send_time(&self) -> u32 {
        self.send_time
    }

    /// Returns this chunk's sequence number.
    ///
    /// The base chunk, which holds the start of the record, is number zero.
    pub fn sequence_number(&self) -> u16 {
        self.sequence_number
    }

    /// Returns a reference to this chunk's record data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the length of this chunk on the wire, header included.
    ///
    /// # Examples
    ///
    /// ```
    /// use rockblock::Chunk;
    /// assert_eq!(11, Chunk::new(b"\0\0\0\0ID\0\0abc").unwrap().wire_len());
    /// ```
    pub fn wire_len(&self) -> usize {
        HEADER_LENGTH + self.data.len()
    }

    /// Returns true if this chunk carries record data after its header.
    pub fn has_data(&self) -> bool {
        !self.data.is_empty()
    }

    /// Returns a reference to the SBD message this chunk arrived in, if any.
    pub fn message(&self) -> Option<&Message> {
        self.message.as_ref()
    }

    /// Returns the IMEI of the modem that sent this chunk.
    ///
    /// Only available if this chunk was created from an SBD message.
    pub fn imei(&self) -> Option<&str> {
        self.message.as_ref().map(|m| m.imei())
    }

    /// Returns this chunk as it is sent over the wire.
    ///
    /// # Examples
    ///
    /// ```
    /// use rockblock::Chunk;
    /// let bytes = b"\x2a\0\0\0ID\x01\0abc";
    /// assert_eq!(bytes.to_vec(), Chunk::new(bytes).unwrap().to_bytes());
    /// ```
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0; HEADER_LENGTH];
        LittleEndian::write_u32(&mut bytes[0..4], self.send_time);
        bytes[4..6].copy_from_slice(&TAG);
        LittleEndian::write_u16(&mut bytes[6..8], self.sequence_number);
        bytes.extend_from_slice(&self.data);
        bytes
    }
}

/// Splits record bytes into chunks no longer than `max_chunk_length`.
///
/// Every chunk gets the same `send_time`. Sequence numbers start at zero, and every chunk but
/// the last is full.
///
/// # Examples
///
/// ```
/// let chunks = rockblock::encode(&[0u8; 700], 1538456762, 340).unwrap();
/// assert_eq!(3, chunks.len());
/// assert_eq!(340, chunks[0].wire_len());
/// assert_eq!(340, chunks[1].wire_len());
/// assert_eq!(44, chunks[2].wire_len());
/// ```
pub fn encode(data: &[u8], send_time: u32, max_chunk_length: usize) -> Result<Vec<Chunk>, Error> {
    let data_length = max_chunk_data_length(max_chunk_length);
    if data_length == 0 {
        return Err(Error::ChunkLengthTooSmall(max_chunk_length));
    }
    let count = max_chunks(data.len(), max_chunk_length);
    if count > usize::from(u16::max_value()) + 1 {
        return Err(Error::TooManyChunks(count));
    }
    Ok(data
        .chunks(data_length)
        .enumerate()
        .map(|(i, slice)| {
            debug!(
                "encoded chunk {} with {} bytes at offset {}",
                i,
                slice.len(),
                i * data_length
            );
            Chunk {
                send_time: send_time,
                sequence_number: i as u16,
                data: slice.to_vec(),
                message: None,
            }
        }).collect())
}
