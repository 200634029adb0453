//! The SAMPA data header (SDH) and its packet type codes.
//!
//! The SDH is a fixed 50-bit header:
//!
//! ```text
//!  6 bits hamming code
//!  1 bit parity (odd) of header including hamming
//!  3 bits packet type
//! 10 bits number of 10-bit words in data payload
//!  4 bits hardware address of chip
//!  5 bits channel address
//! 20 bits bunch-crossing counter (40MHz counter)
//!  1 bit parity (odd) of data payload
//! ```
//!
//! See the SAMPA specification document, table 2.5.

use lazy_static::lazy_static;

use super::bitset::BitSet;
use super::constants::{SDH_SIZE, SYNC_PATTERN_VALUE};
use super::error::SampaHeaderError;

const HAMMING_FIRST_BIT: usize = 0;
const HAMMING_LAST_BIT: usize = 5;
const P_BIT: usize = 6;
const PKT_FIRST_BIT: usize = 7;
const PKT_LAST_BIT: usize = 9;
const NUM_WORDS_FIRST_BIT: usize = 10;
const NUM_WORDS_LAST_BIT: usize = 19;
const HADD_FIRST_BIT: usize = 20;
const HADD_LAST_BIT: usize = 23;
const CHADD_FIRST_BIT: usize = 24;
const CHADD_LAST_BIT: usize = 28;
const BXCOUNT_FIRST_BIT: usize = 29;
const BXCOUNT_LAST_BIT: usize = 48;
const DP_BIT: usize = 49;

/// The 3-bit packet type carried in an SDH.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    HeartBeat = 0,
    DataTruncated = 1,
    Sync = 2,
    DataTruncatedTriggerTooEarly = 3,
    Data = 4,
    DataNumWords = 5,
    DataTriggerTooEarly = 6,
    DataTriggerTooEarlyNumWords = 7,
}

impl PacketType {
    /// Decode the 3-bit PKT field. Only the low 3 bits are considered.
    pub fn from_raw(v: u8) -> PacketType {
        match v & 0b111 {
            0 => PacketType::HeartBeat,
            1 => PacketType::DataTruncated,
            2 => PacketType::Sync,
            3 => PacketType::DataTruncatedTriggerTooEarly,
            4 => PacketType::Data,
            5 => PacketType::DataNumWords,
            6 => PacketType::DataTriggerTooEarly,
            _ => PacketType::DataTriggerTooEarlyNumWords,
        }
    }
}

/// The fixed-length 50-bit SAMPA data header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampaDataHeader {
    bits: BitSet,
}

impl SampaDataHeader {
    pub fn new() -> Self {
        SampaDataHeader {
            bits: BitSet::with_capacity(SDH_SIZE),
        }
    }

    /// Wrap an existing 50-bit bitset.
    pub fn from_bits(bits: BitSet) -> Self {
        SampaDataHeader { bits }
    }

    pub fn bits(&self) -> &BitSet {
        &self.bits
    }

    pub fn hamming(&self) -> u8 {
        self.bits.uint8(HAMMING_FIRST_BIT, HAMMING_LAST_BIT)
    }

    pub fn p(&self) -> bool {
        self.bits.uint8(P_BIT, P_BIT) == 1
    }

    pub fn pkt(&self) -> PacketType {
        PacketType::from_raw(self.pkt_raw())
    }

    /// The raw 3-bit PKT field value.
    pub fn pkt_raw(&self) -> u8 {
        self.bits.uint8(PKT_FIRST_BIT, PKT_LAST_BIT)
    }

    pub fn num_words(&self) -> u16 {
        self.bits.uint16(NUM_WORDS_FIRST_BIT, NUM_WORDS_LAST_BIT)
    }

    pub fn hadd(&self) -> u8 {
        self.bits.uint8(HADD_FIRST_BIT, HADD_LAST_BIT)
    }

    pub fn chadd(&self) -> u8 {
        self.bits.uint8(CHADD_FIRST_BIT, CHADD_LAST_BIT)
    }

    pub fn bxcount(&self) -> u32 {
        self.bits.uint32(BXCOUNT_FIRST_BIT, BXCOUNT_LAST_BIT)
    }

    pub fn dp(&self) -> bool {
        self.bits.uint8(DP_BIT, DP_BIT) == 1
    }

    fn set_field(
        &mut self,
        name: &'static str,
        first: usize,
        last: usize,
        v: u32,
    ) -> Result<(), SampaHeaderError> {
        let nbits = last - first + 1;
        if u64::from(v) > (1 << nbits) - 1 {
            return Err(SampaHeaderError::FieldOverflow(name, v, nbits));
        }
        self.bits.set_range_from_uint32(first, last, v)?;
        Ok(())
    }

    pub fn set_hamming(&mut self, v: u8) -> Result<(), SampaHeaderError> {
        self.set_field("hamming", HAMMING_FIRST_BIT, HAMMING_LAST_BIT, v.into())
    }

    pub fn set_p(&mut self, v: bool) -> Result<(), SampaHeaderError> {
        self.bits.set(P_BIT, v).map_err(SampaHeaderError::from)
    }

    pub fn set_pkt(&mut self, v: PacketType) -> Result<(), SampaHeaderError> {
        self.set_field("PKT", PKT_FIRST_BIT, PKT_LAST_BIT, v as u32)
    }

    pub fn set_num_words(&mut self, v: u16) -> Result<(), SampaHeaderError> {
        self.set_field(
            "numWords",
            NUM_WORDS_FIRST_BIT,
            NUM_WORDS_LAST_BIT,
            v.into(),
        )
    }

    pub fn set_hadd(&mut self, v: u8) -> Result<(), SampaHeaderError> {
        self.set_field("hadd", HADD_FIRST_BIT, HADD_LAST_BIT, v.into())
    }

    pub fn set_chadd(&mut self, v: u8) -> Result<(), SampaHeaderError> {
        self.set_field("chadd", CHADD_FIRST_BIT, CHADD_LAST_BIT, v.into())
    }

    pub fn set_bxcount(&mut self, v: u32) -> Result<(), SampaHeaderError> {
        self.set_field("bxcount", BXCOUNT_FIRST_BIT, BXCOUNT_LAST_BIT, v)
    }

    pub fn set_dp(&mut self, v: bool) -> Result<(), SampaHeaderError> {
        self.bits.set(DP_BIT, v).map_err(SampaHeaderError::from)
    }
}

impl std::fmt::Display for SampaDataHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "hamming {:#04X} P {} PKT {} numWords {} hadd {} chadd {} bxcount {} DP {}",
            self.hamming(),
            u8::from(self.p()),
            self.pkt_raw(),
            self.num_words(),
            self.hadd(),
            self.chadd(),
            self.bxcount(),
            u8::from(self.dp()),
        )
    }
}

lazy_static! {
    /// The 50-bit header the SAMPA emits for channel alignment.
    pub static ref SYNC_PATTERN: SampaDataHeader = {
        let mut sdh = SampaDataHeader::new();
        sdh.set_hamming(0x13).unwrap();
        sdh.set_p(false).unwrap();
        sdh.set_pkt(PacketType::Sync).unwrap();
        sdh.set_num_words(0).unwrap();
        sdh.set_hadd(0xF).unwrap();
        sdh.set_chadd(0).unwrap();
        sdh.set_bxcount(0xAAAAA).unwrap();
        sdh.set_dp(false).unwrap();
        assert_eq!(sdh.bits().len(), SDH_SIZE);
        assert_eq!(sdh.bits().uint64(0, SDH_SIZE - 1), SYNC_PATTERN_VALUE);
        sdh
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_pattern_value() {
        assert_eq!(SYNC_PATTERN.bits().len(), 50);
        assert_eq!(SYNC_PATTERN.bits().uint64(0, 49), 0x1555540F00113);
        assert_eq!(SYNC_PATTERN.bits().count(), 15);
        assert_eq!(SYNC_PATTERN.pkt(), PacketType::Sync);
    }

    #[test]
    fn field_roundtrip() {
        let mut sdh = SampaDataHeader::new();
        sdh.set_hamming(0x2A).unwrap();
        sdh.set_p(true).unwrap();
        sdh.set_pkt(PacketType::Data).unwrap();
        sdh.set_num_words(1023).unwrap();
        sdh.set_hadd(0x9).unwrap();
        sdh.set_chadd(0x1F).unwrap();
        sdh.set_bxcount(0xFFFFF).unwrap();
        sdh.set_dp(true).unwrap();

        assert_eq!(sdh.hamming(), 0x2A);
        assert!(sdh.p());
        assert_eq!(sdh.pkt(), PacketType::Data);
        assert_eq!(sdh.num_words(), 1023);
        assert_eq!(sdh.hadd(), 0x9);
        assert_eq!(sdh.chadd(), 0x1F);
        assert_eq!(sdh.bxcount(), 0xFFFFF);
        assert!(sdh.dp());
    }

    #[test]
    fn field_overflow() {
        let mut sdh = SampaDataHeader::new();
        assert!(matches!(
            sdh.set_hamming(0x40),
            Err(SampaHeaderError::FieldOverflow("hamming", 0x40, 6))
        ));
        assert!(sdh.set_bxcount(0x100000).is_err());
    }

    #[test]
    fn packet_type_from_raw() {
        assert_eq!(PacketType::from_raw(0), PacketType::HeartBeat);
        assert_eq!(PacketType::from_raw(2), PacketType::Sync);
        assert_eq!(PacketType::from_raw(4), PacketType::Data);
        assert_eq!(PacketType::from_raw(7), PacketType::DataTriggerTooEarlyNumWords);
        assert_eq!(PacketType::from_raw(0b1010), PacketType::Sync);
    }
}
