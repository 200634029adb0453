//! The 80-bit GBT transport word.

use super::bitset::BitSet;
use super::constants::{DATE_BYTES_PER_GBT, GBT_WORD_SIZE};

/// An 80-bit GBT word, transported as 10 bytes. Bit `8*i + k` of the
/// logical word is bit `k` of byte `i`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GbtWord {
    bytes: [u8; GBT_WORD_SIZE],
}

impl GbtWord {
    /// Build a GBT word from one 16-byte DATE step. The step interleaves
    /// equipment framing words with the payload; only 10 of the 16 bytes
    /// carry the GBT word:
    ///
    /// ```text
    /// gbt[0..4]  = step[12..16]
    /// gbt[4..8]  = step[ 8..12]
    /// gbt[8..10] = step[ 4.. 6]
    /// ```
    pub fn from_date_step(step: &[u8]) -> GbtWord {
        assert_eq!(step.len(), DATE_BYTES_PER_GBT);
        let mut bytes = [0u8; GBT_WORD_SIZE];
        bytes[0..4].copy_from_slice(&step[12..16]);
        bytes[4..8].copy_from_slice(&step[8..12]);
        bytes[8..10].copy_from_slice(&step[4..6]);
        GbtWord { bytes }
    }

    pub fn bytes(&self) -> &[u8; GBT_WORD_SIZE] {
        &self.bytes
    }

    /// The word as an 80-bit bitset.
    pub fn to_bitset(&self) -> BitSet {
        BitSet::from_bytes(&self.bytes)
    }
}

impl std::fmt::Display for GbtWord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_bitset().to_string_lsb_right())
    }
}
