//! Validated residue views.
//!
//! A `Sequence` is the only form in which residues reach the kernels. It is
//! checked once when built from database data and is never re-validated on
//! the hot path.

use std::fmt;
use std::ops::Index;

use crate::core::compute::encoding::{decode_protein, Letter, ALPHABET_SIZE, DELIMITER};
use crate::error::{Result, SwipeError};

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Sequence<'a> {
    data: &'a [Letter],
}

impl<'a> Sequence<'a> {
    /// Validates `data` and wraps it.
    ///
    /// Rejects empty input, the buffer delimiter anywhere inside the data and
    /// any code outside the alphabet.
    pub fn new(data: &'a [Letter]) -> Result<Self> {
        if data.is_empty() {
            return Err(SwipeError::EmptySequence);
        }
        for (position, &code) in data.iter().enumerate() {
            if code == DELIMITER {
                return Err(SwipeError::DelimiterInSequence { position });
            }
            if code as usize >= ALPHABET_SIZE {
                return Err(SwipeError::InvalidResidue { position, code });
            }
        }
        Ok(Self { data })
    }

    /// Extracts the sequence stored between two delimiters in a concatenated
    /// buffer, checking both sentinels. `begin` is the first residue.
    pub fn from_delimited(buffer: &'a [Letter], begin: usize, len: usize) -> Result<Self> {
        let available = buffer.len().saturating_sub(begin + 1);
        if begin == 0
            || begin >= buffer.len()
            || buffer[begin - 1] != DELIMITER
            || available < len
        {
            return Err(SwipeError::LengthMismatch {
                target: begin,
                declared: len,
                available,
            });
        }
        if buffer[begin + len] != DELIMITER {
            return Err(SwipeError::LengthMismatch {
                target: begin,
                declared: len,
                available: buffer[begin..]
                    .iter()
                    .position(|&c| c == DELIMITER)
                    .unwrap_or(available),
            });
        }
        Self::new(&buffer[begin..begin + len])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn letters(&self) -> &'a [Letter] {
        self.data
    }
}

impl Index<usize> for Sequence<'_> {
    type Output = Letter;

    #[inline]
    fn index(&self, i: usize) -> &Letter {
        &self.data[i]
    }
}

impl fmt::Debug for Sequence<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sequence({})", decode_protein(self.data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::compute::encoding::encode_protein;

    #[test]
    fn test_rejects_empty() {
        assert_eq!(Sequence::new(&[]).unwrap_err(), SwipeError::EmptySequence);
    }

    #[test]
    fn test_rejects_delimiter_mid_sequence() {
        let data = [0, 1, DELIMITER, 2];
        assert_eq!(
            Sequence::new(&data).unwrap_err(),
            SwipeError::DelimiterInSequence { position: 2 }
        );
    }

    #[test]
    fn test_rejects_out_of_alphabet_code() {
        let data = [0, 1, 24];
        assert_eq!(
            Sequence::new(&data).unwrap_err(),
            SwipeError::InvalidResidue { position: 2, code: 24 }
        );
    }

    #[test]
    fn test_from_delimited_buffer() {
        let mut buffer = vec![DELIMITER];
        buffer.extend(encode_protein(b"MPEEEY").unwrap());
        buffer.push(DELIMITER);
        buffer.extend(encode_protein(b"AA").unwrap());
        buffer.push(DELIMITER);

        let first = Sequence::from_delimited(&buffer, 1, 6).unwrap();
        assert_eq!(first.len(), 6);
        let second = Sequence::from_delimited(&buffer, 8, 2).unwrap();
        assert_eq!(second[1], 0);

        // declared length runs past the trailing delimiter
        assert!(matches!(
            Sequence::from_delimited(&buffer, 1, 7),
            Err(SwipeError::LengthMismatch { declared: 7, available: 6, .. })
        ));
    }
}
