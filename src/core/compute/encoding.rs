//! # Residue Encoding
//!
//! Amino-acid and nucleotide encodings shared by every kernel in the crate.
//!
//! ```text
//! code:   0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19 20 21 22 23
//! letter: A R N D C Q E G H I L  K  M  F  P  S  T  W  Y  V  B  Z  X  *
//! ```
//!
//! Codes `0..TRUE_AA` are the twenty standard amino acids and are the only
//! letters that take part in composition statistics. `DELIMITER` never
//! appears inside a sequence; it marks boundaries in concatenated buffers.

use crate::error::{Result, SwipeError};

/// A single encoded residue.
pub type Letter = u8;

pub const AMINO_ACID_ALPHABET: &[u8; 24] = b"ARNDCQEGHILKMFPSTWYVBZX*";

/// Number of residue codes a profile row must cover.
pub const ALPHABET_SIZE: usize = 24;

/// Number of standard amino acids.
pub const TRUE_AA: usize = 20;

pub const MASK_LETTER: Letter = 22;
pub const STOP_LETTER: Letter = 23;

/// Boundary sentinel for concatenated sequence buffers.
pub const DELIMITER: Letter = 31;

// ============================================================================
// AMINO ACID ENCODING
// ============================================================================

/// Encodes one ASCII amino-acid character. Returns `None` for characters
/// without a protein meaning.
#[inline]
pub fn encode_amino_acid(c: u8) -> Option<Letter> {
    let upper = c.to_ascii_uppercase();
    match upper {
        b'U' | b'O' | b'J' => Some(MASK_LETTER),
        _ => AMINO_ACID_ALPHABET
            .iter()
            .position(|&a| a == upper)
            .map(|p| p as Letter),
    }
}

/// Encodes an ASCII protein sequence, case-insensitive.
pub fn encode_protein(ascii: &[u8]) -> Result<Vec<Letter>> {
    ascii
        .iter()
        .enumerate()
        .map(|(position, &c)| {
            encode_amino_acid(c).ok_or(SwipeError::UnknownCharacter {
                position,
                character: c as char,
            })
        })
        .collect()
}

/// Decodes a residue code back to ASCII (`?` for codes outside the alphabet).
#[inline]
pub fn decode_letter(letter: Letter) -> u8 {
    AMINO_ACID_ALPHABET
        .get(letter as usize)
        .copied()
        .unwrap_or(b'?')
}

pub fn decode_protein(letters: &[Letter]) -> String {
    letters.iter().map(|&l| decode_letter(l) as char).collect()
}

// ============================================================================
// NUCLEOTIDE ENCODING AND TRANSLATION
// ============================================================================

/// Encodes a nucleotide as A=0, C=1, G=2, T=3, N=4.
#[inline]
pub fn encode_nucleotide(c: u8) -> Option<u8> {
    match c.to_ascii_uppercase() {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' | b'U' => Some(3),
        b'N' => Some(4),
        _ => None,
    }
}

/// Standard genetic code indexed by `16 * n0 + 4 * n1 + n2` in ACGT order.
const STANDARD_CODE: &[u8; 64] =
    b"KNKNTTTTRSRSIIMIQHQHPPPPRRRRLLLLEDEDAAAAGGGGVVVV*Y*YSSSS*CWCLFLF";

#[inline]
fn translate_codon(n0: u8, n1: u8, n2: u8) -> Letter {
    if n0 > 3 || n1 > 3 || n2 > 3 {
        return MASK_LETTER;
    }
    let aa = STANDARD_CODE[(n0 as usize) * 16 + (n1 as usize) * 4 + n2 as usize];
    encode_amino_acid(aa).unwrap_or(MASK_LETTER)
}

fn translate_frame(nt: &[u8], offset: usize) -> Vec<Letter> {
    if nt.len() < offset + 3 {
        return Vec::new();
    }
    nt[offset..]
        .chunks_exact(3)
        .map(|c| translate_codon(c[0], c[1], c[2]))
        .collect()
}

/// All six reading frames of a nucleotide query.
///
/// Frames 0..3 are the forward strand starting at nucleotide offsets 0, 1 and
/// 2. Frames 3..6 are the same offsets on the reverse complement.
#[derive(Debug, Clone)]
pub struct TranslatedQuery {
    frames: [Vec<Letter>; 6],
    dna_len: usize,
}

impl TranslatedQuery {
    pub fn from_dna(ascii: &[u8]) -> Result<Self> {
        if ascii.is_empty() {
            return Err(SwipeError::EmptySequence);
        }
        let mut forward = Vec::with_capacity(ascii.len());
        for (position, &c) in ascii.iter().enumerate() {
            let code = encode_nucleotide(c).ok_or(SwipeError::UnknownCharacter {
                position,
                character: c as char,
            })?;
            forward.push(code);
        }
        // shorter than one codon: every frame would be empty
        if forward.len() < 3 {
            return Err(SwipeError::EmptySequence);
        }
        let reverse: Vec<u8> = forward
            .iter()
            .rev()
            .map(|&n| if n < 4 { 3 - n } else { n })
            .collect();

        let frames = [
            translate_frame(&forward, 0),
            translate_frame(&forward, 1),
            translate_frame(&forward, 2),
            translate_frame(&reverse, 0),
            translate_frame(&reverse, 1),
            translate_frame(&reverse, 2),
        ];
        Ok(Self {
            frames,
            dna_len: ascii.len(),
        })
    }

    #[inline]
    pub fn frame(&self, frame: usize) -> &[Letter] {
        &self.frames[frame]
    }

    /// The three frames of one strand (0 = forward, 1 = reverse).
    pub fn strand(&self, strand: usize) -> [&[Letter]; 3] {
        let base = strand * 3;
        [
            &self.frames[base],
            &self.frames[base + 1],
            &self.frames[base + 2],
        ]
    }

    pub fn dna_len(&self) -> usize {
        self.dna_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_protein_round_trip_letters() {
        let enc = encode_protein(b"mpeeeY*").unwrap();
        assert_eq!(enc, vec![12, 14, 6, 6, 6, 18, 23]);
        assert_eq!(decode_protein(&enc), "MPEEEY*");
    }

    #[test]
    fn test_encode_protein_rejects_digits() {
        let err = encode_protein(b"MP3E").unwrap_err();
        assert_eq!(
            err,
            SwipeError::UnknownCharacter {
                position: 2,
                character: '3'
            }
        );
    }

    #[test]
    fn test_rare_residues_map_to_mask() {
        assert_eq!(encode_amino_acid(b'U'), Some(MASK_LETTER));
        assert_eq!(encode_amino_acid(b'x'), Some(MASK_LETTER));
    }

    #[test]
    fn test_translation_six_frames() {
        // ATG GCC TAA -> M A *
        let q = TranslatedQuery::from_dna(b"ATGGCCTAA").unwrap();
        assert_eq!(decode_protein(q.frame(0)), "MA*");
        assert_eq!(q.frame(1).len(), 2);
        assert_eq!(q.frame(2).len(), 2);
        // reverse complement TTAGGCCAT -> L G H
        assert_eq!(decode_protein(q.frame(3)), "LGH");
        assert_eq!(q.dna_len(), 9);
    }

    #[test]
    fn test_translation_ambiguous_codon_is_masked() {
        let q = TranslatedQuery::from_dna(b"ATGNNNTGG").unwrap();
        assert_eq!(decode_protein(q.frame(0)), "MXW");
    }

    #[test]
    fn test_translation_needs_one_codon() {
        assert_eq!(TranslatedQuery::from_dna(b"AT").unwrap_err(), SwipeError::EmptySequence);
        assert_eq!(
            TranslatedQuery::from_dna(b"AQ").unwrap_err(),
            SwipeError::UnknownCharacter {
                position: 1,
                character: 'Q'
            }
        );
        let q = TranslatedQuery::from_dna(b"ATG").unwrap();
        assert_eq!(decode_protein(q.frame(0)), "M");
        assert!(q.frame(1).is_empty());
    }
}
