//! Text hex digits, the form chunks take when pasted out of a RockBLOCK email.

const TERMINATORS: [char; 3] = ['\0', '\r', '\n'];

/// An error returned when decoding hex text.
#[derive(Debug, Fail, PartialEq)]
pub enum Error {
    /// A character that is not a hex digit.
    #[fail(
        display = "invalid hex character {:?} at position {}",
        character,
        position
    )]
    InvalidHexCharacter {
        /// The character position in the text, counting from zero.
        position: usize,

        /// The offending character.
        character: char,
    },
}

/// Decodes pairs of hex digits into bytes.
///
/// Decoding stops at the end of the text or at the first NUL, CR, or LF. Digits are
/// case-insensitive. A lone digit at the end becomes the high nibble of a final byte.
///
/// # Examples
///
/// ```
/// use rockblock::hex::{decode, Error};
/// assert_eq!(vec![0x49, 0x44], decode("4944").unwrap());
/// assert_eq!(vec![0xab, 0xcd], decode("aBCd\r\nffff").unwrap());
/// assert_eq!(vec![0x12, 0x30], decode("123").unwrap());
/// assert_eq!(
///     Error::InvalidHexCharacter { position: 1, character: 'g' },
///     decode("4g").unwrap_err()
/// );
/// ```
pub fn decode(text: &str) -> Result<Vec<u8>, Error> {
    let mut bytes = Vec::with_capacity(text.len() / 2);
    let mut high: Option<u8> = None;
    for (position, character) in text.chars().enumerate() {
        if TERMINATORS.contains(&character) {
            break;
        }
        let nibble = character
            .to_digit(16)
            .ok_or(Error::InvalidHexCharacter {
                position: position,
                character: character,
            })? as u8;
        high = match high {
            Some(n) => {
                bytes.push(n << 4 | nibble);
                None
            }
            None => Some(nibble),
        };
    }
    if let Some(n) = high {
        bytes.push(n << 4);
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty() {
        assert!(decode("").unwrap().is_empty());
        assert!(decode("\n4944").unwrap().is_empty());
    }

    #[test]
    fn terminators() {
        assert_eq!(vec![0x01], decode("01\0ff").unwrap());
        assert_eq!(vec![0x01], decode("01\rff").unwrap());
        assert_eq!(vec![0x01], decode("01\nff").unwrap());
    }

    #[test]
    fn invalid_character() {
        assert_eq!(
            Error::InvalidHexCharacter {
                position: 4,
                character: ' '
            },
            decode("0102 03").unwrap_err()
        );
    }
}
