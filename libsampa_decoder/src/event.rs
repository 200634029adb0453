//! DATE events: an 80-byte header plus an equipment payload.

use byteorder::{ByteOrder, LittleEndian};

use super::constants::{
    EQUIPMENT_HEADER_SIZE, EVENT_HEADER_SIZE, EVENT_MAGIC, MAX_PAYLOAD_SIZE, SOP_SIZE,
};
use super::error::{DateFileError, EventError};

/// The fixed 80-byte DATE event header. All fields are little-endian.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventHeader {
    pub event_size: u32,
    pub event_magic: u32,
    pub header_size: u32,
    pub version: u32,
    pub event_type: u32,
    pub run_number: u32,
    pub event_id: u64,
    pub trigger: [u64; 2],
    pub detectors: u32,
    pub attributes: [u32; 3],
    pub ldc: u32,
    pub gdc: u32,
    pub timestamp_sec: u32,
    pub timestamp_usec: u32,
}

impl EventHeader {
    /// Decode a header from its 80-byte wire form.
    ///
    /// Fails if the magic word is absent or the event size is below the
    /// header size; both are non-recoverable framing errors.
    pub fn from_bytes(buf: &[u8; EVENT_HEADER_SIZE]) -> Result<Self, EventError> {
        let header = EventHeader {
            event_size: LittleEndian::read_u32(&buf[0..4]),
            event_magic: LittleEndian::read_u32(&buf[4..8]),
            header_size: LittleEndian::read_u32(&buf[8..12]),
            version: LittleEndian::read_u32(&buf[12..16]),
            event_type: LittleEndian::read_u32(&buf[16..20]),
            run_number: LittleEndian::read_u32(&buf[20..24]),
            event_id: LittleEndian::read_u64(&buf[24..32]),
            trigger: [
                LittleEndian::read_u64(&buf[32..40]),
                LittleEndian::read_u64(&buf[40..48]),
            ],
            detectors: LittleEndian::read_u32(&buf[48..52]),
            attributes: [
                LittleEndian::read_u32(&buf[52..56]),
                LittleEndian::read_u32(&buf[56..60]),
                LittleEndian::read_u32(&buf[60..64]),
            ],
            ldc: LittleEndian::read_u32(&buf[64..68]),
            gdc: LittleEndian::read_u32(&buf[68..72]),
            timestamp_sec: LittleEndian::read_u32(&buf[72..76]),
            timestamp_usec: LittleEndian::read_u32(&buf[76..80]),
        };
        if header.event_magic != EVENT_MAGIC {
            return Err(EventError::BadMagic(header.event_magic));
        }
        if (header.event_size as usize) < EVENT_HEADER_SIZE {
            return Err(EventError::BadEventSize(header.event_size));
        }
        Ok(header)
    }
}

impl std::fmt::Display for EventHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "eveSize {:08X} magic {:08X} headSize {:08X} version {:08X}",
            self.event_size, self.event_magic, self.header_size, self.version
        )?;
        writeln!(
            f,
            "eveType {:08X} run {:08X} id {:016X}",
            self.event_type, self.run_number, self.event_id
        )?;
        writeln!(f, "trigger {:016X}{:016X}", self.trigger[0], self.trigger[1])?;
        writeln!(
            f,
            "dets {:08X} attr {:08X}{:08X}{:08X}",
            self.detectors, self.attributes[0], self.attributes[1], self.attributes[2]
        )?;
        write!(
            f,
            "LDC {:08X} GDC {:08X} time(s) {:08X} time(us) {:08X}",
            self.ldc, self.gdc, self.timestamp_sec, self.timestamp_usec
        )
    }
}

/// The 28-byte equipment sub-header at the start of an event payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct EquipmentHeader {
    pub size: u32,
    pub equipment_type: u32,
    pub id: u32,
    pub attributes: [u32; 3],
    pub elem_size: u32,
}

impl EquipmentHeader {
    pub fn from_bytes(buf: &[u8]) -> Self {
        EquipmentHeader {
            size: LittleEndian::read_u32(&buf[0..4]),
            equipment_type: LittleEndian::read_u32(&buf[4..8]),
            id: LittleEndian::read_u32(&buf[8..12]),
            attributes: [
                LittleEndian::read_u32(&buf[12..16]),
                LittleEndian::read_u32(&buf[16..20]),
                LittleEndian::read_u32(&buf[20..24]),
            ],
            elem_size: LittleEndian::read_u32(&buf[24..28]),
        }
    }
}

/// A DATE event: header plus a reusable payload buffer. The payload buffer
/// lives for the whole run and only its first `size` bytes are valid.
#[derive(Debug)]
pub struct Event {
    pub header: EventHeader,
    payload: Vec<u8>,
    size: usize,
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}

impl Event {
    pub fn new() -> Self {
        Event {
            header: EventHeader::default(),
            payload: vec![0; MAX_PAYLOAD_SIZE],
            size: 0,
        }
    }

    /// Replace the event with a header-only (empty) event.
    pub fn set_header_only(&mut self, header: EventHeader) {
        self.header = header;
        self.size = 0;
    }

    /// The payload buffer to read `size` bytes into.
    pub fn payload_mut(&mut self, size: usize) -> &mut [u8] {
        if self.payload.len() < size {
            self.payload.resize(size, 0);
        }
        self.size = size;
        &mut self.payload[..size]
    }

    /// Number of valid payload bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The valid payload, equipment header included.
    pub fn payload(&self) -> &[u8] {
        &self.payload[..self.size]
    }

    /// Whether this event carries enough payload to hold an equipment
    /// header, the SOP slot and any data at all.
    pub fn has_payload(&self) -> bool {
        self.size > EQUIPMENT_HEADER_SIZE + SOP_SIZE
    }

    /// The decoded equipment sub-header.
    pub fn equipment_header(&self) -> Option<EquipmentHeader> {
        if self.size < EQUIPMENT_HEADER_SIZE {
            return None;
        }
        Some(EquipmentHeader::from_bytes(&self.payload[..EQUIPMENT_HEADER_SIZE]))
    }

    /// Validate the 16-byte start-of-packet marker following the equipment
    /// header: three zero 32-bit words and a trailing one.
    pub fn check_sop(&self) -> Result<(), DateFileError> {
        if !self.has_payload() {
            return Err(DateFileError::EmptyEvent);
        }
        let sop = &self.payload[EQUIPMENT_HEADER_SIZE..EQUIPMENT_HEADER_SIZE + SOP_SIZE];
        let a = LittleEndian::read_u32(&sop[0..4]);
        let b = LittleEndian::read_u32(&sop[4..8]);
        let c = LittleEndian::read_u32(&sop[8..12]);
        let d = LittleEndian::read_u32(&sop[12..16]);
        if a != 0 || b != 0 || c != 0 || d != 1 {
            return Err(DateFileError::InvalidSop(a, b, c, d));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(event_size: u32) -> [u8; EVENT_HEADER_SIZE] {
        let mut buf = [0u8; EVENT_HEADER_SIZE];
        LittleEndian::write_u32(&mut buf[0..4], event_size);
        LittleEndian::write_u32(&mut buf[4..8], EVENT_MAGIC);
        LittleEndian::write_u32(&mut buf[8..12], EVENT_HEADER_SIZE as u32);
        LittleEndian::write_u32(&mut buf[20..24], 257); // run number
        LittleEndian::write_u64(&mut buf[24..32], 42); // event id
        buf
    }

    #[test]
    fn header_from_bytes() {
        let header = EventHeader::from_bytes(&header_bytes(80)).unwrap();
        assert_eq!(header.event_size, 80);
        assert_eq!(header.event_magic, EVENT_MAGIC);
        assert_eq!(header.run_number, 257);
        assert_eq!(header.event_id, 42);
    }

    #[test]
    fn header_rejects_bad_magic() {
        let mut buf = header_bytes(80);
        LittleEndian::write_u32(&mut buf[4..8], 0xDEADBEEF);
        assert!(matches!(
            EventHeader::from_bytes(&buf),
            Err(EventError::BadMagic(0xDEADBEEF))
        ));
    }

    #[test]
    fn header_rejects_undersized_event() {
        let buf = header_bytes(79);
        assert!(matches!(
            EventHeader::from_bytes(&buf),
            Err(EventError::BadEventSize(79))
        ));
    }

    #[test]
    fn equipment_header_decode() {
        let mut buf = [0u8; EQUIPMENT_HEADER_SIZE];
        LittleEndian::write_u32(&mut buf[0..4], 124);
        LittleEndian::write_u32(&mut buf[4..8], 2);
        LittleEndian::write_u32(&mut buf[8..12], 33);
        LittleEndian::write_u32(&mut buf[24..28], 4);
        let eq = EquipmentHeader::from_bytes(&buf);
        assert_eq!(eq.size, 124);
        assert_eq!(eq.equipment_type, 2);
        assert_eq!(eq.id, 33);
        assert_eq!(eq.elem_size, 4);
    }

    #[test]
    fn sop_check() {
        let mut event = Event::new();
        let payload = event.payload_mut(EQUIPMENT_HEADER_SIZE + SOP_SIZE + 1);
        payload[EQUIPMENT_HEADER_SIZE + 12] = 1;
        assert!(event.check_sop().is_ok());

        let payload = event.payload_mut(EQUIPMENT_HEADER_SIZE + SOP_SIZE + 1);
        payload.fill(0);
        payload[EQUIPMENT_HEADER_SIZE] = 2;
        assert!(matches!(
            event.check_sop(),
            Err(DateFileError::InvalidSop(2, 0, 0, 0))
        ));
    }

    #[test]
    fn payload_buffer_reuse() {
        let mut event = Event::new();
        event.payload_mut(100).fill(0xAB);
        assert_eq!(event.size(), 100);
        assert!(event.payload().iter().all(|&b| b == 0xAB));
        event.payload_mut(10);
        assert_eq!(event.size(), 10);
        assert_eq!(event.payload().len(), 10);
    }
}
