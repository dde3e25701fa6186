//! Byte order conversion for chain sensor data.
//!
//! The chain sensors hand their readings to the buoy as big-endian 16-bit words, and the buoy
//! sends them along untouched. The rest of the record is little-endian, so the chain region of a
//! reassembled record is swapped exactly once before the record is read.

/// An error returned when swapping bytes.
#[derive(Debug, Fail, PartialEq)]
pub enum Error {
    /// The buffer can't be split into 16-bit words.
    #[fail(display = "cannot swap 16-bit words in a buffer of odd length {}", _0)]
    OddLengthBuffer(usize),
}

/// Swaps the bytes of every 16-bit word in the buffer, in place.
///
/// Converts big-endian words to little-endian, or back again.
///
/// # Examples
///
/// ```
/// use icedrifter::endian::{swap_u16, Error};
/// let mut buffer = [0x01, 0x02, 0x03, 0x04];
/// swap_u16(&mut buffer).unwrap();
/// assert_eq!([0x02, 0x01, 0x04, 0x03], buffer);
/// assert_eq!(Error::OddLengthBuffer(3), swap_u16(&mut [0; 3]).unwrap_err());
/// ```
pub fn swap_u16(buffer: &mut [u8]) -> Result<(), Error> {
    if buffer.len() % 2 != 0 {
        return Err(Error::OddLengthBuffer(buffer.len()));
    }
    for word in buffer.chunks_mut(2) {
        word.swap(0, 1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twice_restores() {
        let original = (0..64).collect::<Vec<u8>>();
        let mut buffer = original.clone();
        swap_u16(&mut buffer).unwrap();
        assert_ne!(original, buffer);
        swap_u16(&mut buffer).unwrap();
        assert_eq!(original, buffer);
    }

    #[test]
    fn empty() {
        let mut buffer: [u8; 0] = [];
        assert!(swap_u16(&mut buffer).is_ok());
    }

    #[test]
    fn odd_buffer_is_untouched() {
        let mut buffer = [1, 2, 3];
        assert!(swap_u16(&mut buffer).is_err());
        assert_eq!([1, 2, 3], buffer);
    }
}
