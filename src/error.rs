//! Error types for ferrous-swipe

use thiserror::Error;

/// Result type alias for alignment operations
pub type Result<T> = std::result::Result<T, SwipeError>;

/// Errors reported before any DP work is done.
///
/// Saturation is not an error: saturated lanes are re-run at a wider width.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwipeError {
    /// A sequence holds a code outside the alphabet
    #[error("invalid residue code {code} at position {position}")]
    InvalidResidue { position: usize, code: u8 },

    /// An input character has no encoding
    #[error("unknown character {character:?} at position {position}")]
    UnknownCharacter { position: usize, character: char },

    /// A delimiter code appears inside a sequence
    #[error("delimiter inside sequence at position {position}")]
    DelimiterInSequence { position: usize },

    #[error("empty sequence")]
    EmptySequence,

    /// A target's declared length disagrees with its data
    #[error("target {target}: declared length {declared}, {available} residues available")]
    LengthMismatch {
        target: usize,
        declared: usize,
        available: usize,
    },

    #[error("invalid band: begin {begin} > end {end}")]
    InvalidBand { begin: i32, end: i32 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SwipeError::LengthMismatch {
            target: 3,
            declared: 10,
            available: 8,
        };
        assert_eq!(
            err.to_string(),
            "target 3: declared length 10, 8 residues available"
        );
        assert_eq!(
            SwipeError::InvalidBand { begin: 4, end: 2 }.to_string(),
            "invalid band: begin 4 > end 2"
        );
    }
}
