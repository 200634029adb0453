//! The per-elink packet state machine.
//!
//! Each elink is an independent serial bit stream. The state machine first
//! hunts for the 50-bit sync pattern, then interprets 50-bit SAMPA data
//! headers and the variable-length 10-bit word payloads they announce,
//! emitting decoded [`Packet`]s.

use super::bitset::BitSet;
use super::constants::{ELINK_INITIAL_CAPACITY, SDH_SIZE};
use super::error::ElinkError;
use super::packet::Packet;
use super::sampa_header::{PacketType, SampaDataHeader, SYNC_PATTERN};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Searching for the sync pattern.
    Hunt,
    /// Synchronized, waiting for a 50-bit header.
    Header,
    /// Accumulating a `numWords * 10` bit payload.
    Data,
}

/// One of the 40 logical serial channels multiplexed onto a GBT word.
#[derive(Debug)]
pub struct Elink {
    id: usize,
    bits: BitSet,
    /// Next bit count at which the accumulated bits must be examined.
    checkpoint: usize,
    state: State,
    nsync: u32,
    sdh: SampaDataHeader,
}

impl Elink {
    pub fn new(id: usize) -> Self {
        Elink {
            id,
            bits: BitSet::with_capacity(ELINK_INITIAL_CAPACITY),
            checkpoint: SDH_SIZE,
            state: State::Hunt,
            nsync: 0,
            sdh: SampaDataHeader::new(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn nsync(&self) -> u32 {
        self.nsync
    }

    pub fn checkpoint(&self) -> usize {
        self.checkpoint
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// The bits accumulated since the last checkpoint reset.
    pub fn bits(&self) -> &BitSet {
        &self.bits
    }

    /// Add one bit at the end of the stream. If the accumulated length
    /// reaches the checkpoint the stream is further interpreted, which may
    /// complete a packet.
    pub fn append_bit(&mut self, bit: bool) -> Result<Option<Packet>, ElinkError> {
        self.bits
            .append(bit)
            .map_err(|e| ElinkError::BitSet(self.id, e))?;
        if self.bits.len() != self.checkpoint {
            return Ok(None);
        }
        self.process()
    }

    /// Add the two bits an elink receives per GBT word, in arrival order.
    pub fn append(&mut self, bit0: bool, bit1: bool) -> Result<Option<Packet>, ElinkError> {
        let packet0 = self.append_bit(bit0)?;
        let packet1 = self.append_bit(bit1)?;
        match (packet0, packet1) {
            (Some(_), Some(_)) => Err(ElinkError::DoublePacket(self.id)),
            (Some(p), None) | (None, Some(p)) => Ok(Some(p)),
            (None, None) => Ok(None),
        }
    }

    /// Reset to the hunting state between events. A payload currently being
    /// collected is left untouched.
    pub fn force_clear(&mut self) {
        if self.state == State::Data {
            return;
        }
        self.nsync = 0;
        self.bits.clear();
        self.state = State::Hunt;
    }

    // Interpret the accumulated bits as sync candidate, header or payload,
    // depending on the current state.
    fn process(&mut self) -> Result<Option<Packet>, ElinkError> {
        if self.bits.len() != self.checkpoint {
            return Err(ElinkError::CheckpointMismatch(
                self.id,
                self.bits.len(),
                self.checkpoint,
            ));
        }
        match self.state {
            State::Hunt => self.find_sync().map(|_| None),
            State::Header => self.process_header(),
            State::Data => {
                let packet = self.make_packet()?;
                self.bits.clear();
                self.checkpoint = SDH_SIZE;
                self.state = State::Header;
                Ok(Some(packet))
            }
        }
    }

    // Compare the last 50 bits against the sync pattern, sliding the
    // checkpoint one bit at a time until it matches.
    fn find_sync(&mut self) -> Result<(), ElinkError> {
        let Some(tail) = self.bits.last(SDH_SIZE) else {
            return Err(ElinkError::CheckpointMismatch(
                self.id,
                self.bits.len(),
                self.checkpoint,
            ));
        };
        let candidate = SampaDataHeader::from_bits(tail);
        if candidate.bits() != SYNC_PATTERN.bits() {
            self.checkpoint += 1;
            return Ok(());
        }
        if candidate.pkt() != PacketType::Sync {
            return Err(ElinkError::BadSyncPacketType(self.id, candidate.pkt_raw()));
        }
        spdlog::debug!("elink {}: acquired sync #{}", self.id, self.nsync + 1);
        self.bits.clear();
        self.checkpoint = SDH_SIZE;
        self.nsync += 1;
        self.state = State::Header;
        Ok(())
    }

    fn process_header(&mut self) -> Result<Option<Packet>, ElinkError> {
        let Some(tail) = self.bits.last(SDH_SIZE) else {
            return Err(ElinkError::CheckpointMismatch(
                self.id,
                self.bits.len(),
                self.checkpoint,
            ));
        };
        self.sdh = SampaDataHeader::from_bits(tail);
        match self.sdh.pkt() {
            // data with a problem is still data: there will be payload
            // words to read in
            PacketType::Data
            | PacketType::DataTruncated
            | PacketType::DataTruncatedTriggerTooEarly
            | PacketType::DataTriggerTooEarly
            | PacketType::DataTriggerTooEarlyNumWords => {
                let num_words = self.sdh.num_words();
                self.bits.clear();
                if num_words == 0 {
                    self.checkpoint = SDH_SIZE;
                    return Ok(Some(Packet::new(self.sdh.clone(), self.id)));
                }
                self.checkpoint = usize::from(num_words) * 10;
                self.state = State::Data;
                Ok(None)
            }
            PacketType::Sync => {
                if self.sdh.bits() != SYNC_PATTERN.bits() {
                    return Err(ElinkError::BadSyncHeader(self.id));
                }
                self.nsync += 1;
                self.bits.clear();
                self.checkpoint = SDH_SIZE;
                Ok(None)
            }
            PacketType::HeartBeat => {
                spdlog::debug!("elink {}: heartbeat at bx {}", self.id, self.sdh.bxcount());
                self.bits.clear();
                self.checkpoint = SDH_SIZE;
                Ok(None)
            }
            PacketType::DataNumWords => {
                self.bits.clear();
                self.checkpoint = SDH_SIZE;
                Ok(None)
            }
        }
    }

    // Decode the accumulated payload into a packet. Clusters are only
    // extracted from clean data packets; truncated variants keep the header
    // and drop the samples.
    fn make_packet(&mut self) -> Result<Packet, ElinkError> {
        let words = self.split_10bit();
        let mut packet = Packet::new(self.sdh.clone(), self.id);
        if self.sdh.pkt() != PacketType::Data {
            return Ok(packet);
        }
        let mut i = 0;
        while i + 1 < words.len() {
            let n = usize::from(words[i]);
            let ts = words[i + 1];
            if i + 2 + n > words.len() {
                return Err(ElinkError::TruncatedCluster(self.id, n, i, words.len()));
            }
            packet.add_cluster(ts, words[i + 2..i + 2 + n].to_vec());
            i += n + 2;
        }
        Ok(packet)
    }

    // Partition the accumulated bits into 10-bit integers, LSB at each
    // group start.
    fn split_10bit(&self) -> Vec<u16> {
        (0..self.bits.len() / 10)
            .map(|k| self.bits.uint16(10 * k, 10 * k + 9))
            .collect()
    }
}

impl std::fmt::Display for Elink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "elink {} len {} checkpoint {} state {:?} nsync {}",
            self.id,
            self.bits.len(),
            self.checkpoint,
            self.state,
            self.nsync
        )
    }
}
