//! Demultiplexing GBT words onto the 40 elinks.

use super::constants::{DISPATCH_BYTES, GBT_WORD_SIZE, N_BITS_PER_CHANNEL, N_ELINKS};
use super::elink::Elink;
use super::error::DispatchError;
use super::packet::Packet;

/// Fans the bytes of each GBT word out to the 40 elink state machines,
/// two bits per elink per word, collecting the packets they emit.
///
/// Elinks whose bit is set in the mask are skipped; their bit pairs are
/// dropped on the floor.
#[derive(Debug)]
pub struct Dispatcher {
    elinks: Vec<Elink>,
    mask: u64,
}

impl Dispatcher {
    pub fn new(mask: u64) -> Self {
        Dispatcher {
            elinks: (0..N_ELINKS).map(Elink::new).collect(),
            mask,
        }
    }

    /// Split a 10-byte GBT word into per-elink bit pairs and push them
    /// through the state machines. Packets completed by this word are
    /// returned in elink order.
    pub fn dispatch(&mut self, bytes: &[u8]) -> Result<Vec<Packet>, DispatchError> {
        if bytes.len() != GBT_WORD_SIZE {
            return Err(DispatchError::IncorrectSize(bytes.len()));
        }
        let mut packets = Vec::new();
        let mut elink: usize = 0;
        for &b in bytes.iter().take(DISPATCH_BYTES) {
            for j in (0..8).step_by(N_BITS_PER_CHANNEL) {
                let target = elink % N_ELINKS;
                elink += 1;
                if self.mask & (1 << target) != 0 {
                    continue;
                }
                let bit0 = (b >> (j + 1)) & 1 == 1;
                let bit1 = (b >> j) & 1 == 1;
                if let Some(packet) = self.elinks[target].append(bit0, bit1)? {
                    packets.push(packet);
                }
            }
        }
        Ok(packets)
    }

    /// Reset every elink to the hunting state, as done on event boundaries.
    pub fn force_clear(&mut self) {
        for elink in &mut self.elinks {
            elink.force_clear();
        }
    }

    pub fn elinks(&self) -> &[Elink] {
        &self.elinks
    }
}
