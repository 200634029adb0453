//! Reading DATE events and GBT words from a byte source.

use byteorder::{ByteOrder, LittleEndian};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use super::constants::{
    DATE_BYTES_PER_GBT, EQUIPMENT_HEADER_SIZE, EVENT_HEADER_SIZE, EVENT_TRAILER_SIZE,
    READ_BUFFER_SIZE, SOP_SIZE,
};
use super::error::{DateFileError, EventError};
use super::event::{Event, EventHeader};
use super::gbt::GbtWord;

// Read until buf is full or the source is exhausted, returning the number
// of bytes actually read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, std::io::Error> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Pull-based reader of DATE events, layered with a GBT word stream.
///
/// The reader owns a single payload buffer that is reused from event to
/// event; the current event is only valid until the next call. Neither
/// sequence is restartable: replaying a file requires a fresh reader.
#[derive(Debug)]
pub struct DateFile<R: Read> {
    reader: R,
    event: Event,
    /// Payload offset of the next GBT step; None between events.
    pos: Option<usize>,
    head_buf: [u8; EVENT_HEADER_SIZE],
    nevents: u64,
    ngbt: u64,
    bytes_read: u64,
}

impl DateFile<BufReader<File>> {
    /// Open a DATE file for reading through a buffered reader.
    pub fn from_path(path: &Path) -> Result<Self, DateFileError> {
        if !path.exists() {
            return Err(DateFileError::BadFilePath(path.to_path_buf()));
        }
        let file = File::open(path)?;
        Ok(Self::new(BufReader::with_capacity(READ_BUFFER_SIZE, file)))
    }
}

impl<R: Read> DateFile<R> {
    pub fn new(reader: R) -> Self {
        DateFile {
            reader,
            event: Event::new(),
            pos: None,
            head_buf: [0; EVENT_HEADER_SIZE],
            nevents: 0,
            ngbt: 0,
            bytes_read: 0,
        }
    }

    /// Number of events read so far.
    pub fn nevents(&self) -> u64 {
        self.nevents
    }

    /// Number of GBT words produced so far.
    pub fn ngbt(&self) -> u64 {
        self.ngbt
    }

    /// Number of bytes consumed from the source so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// The last event read.
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// Read the next DATE event into the reusable payload buffer.
    ///
    /// Returns [`DateFileError::EndOfFile`] on a clean end of stream, and a
    /// fatal error on any framing problem (bad magic, short reads, an
    /// equipment size that does not match the payload size).
    pub fn next_event(&mut self) -> Result<&Event, DateFileError> {
        let n = read_full(&mut self.reader, &mut self.head_buf)?;
        if n == 0 {
            return Err(DateFileError::EndOfFile);
        }
        if n != EVENT_HEADER_SIZE {
            return Err(DateFileError::ShortRead(EVENT_HEADER_SIZE, n));
        }
        self.bytes_read += n as u64;

        let header = EventHeader::from_bytes(&self.head_buf)?;
        self.nevents += 1;
        self.event.set_header_only(header);

        let ndata = header.event_size as usize - EVENT_HEADER_SIZE;
        if ndata == 0 {
            return Ok(&self.event);
        }

        let buf = self.event.payload_mut(ndata);
        let n = read_full(&mut self.reader, buf)?;
        if n != ndata {
            return Err(DateFileError::ShortRead(ndata, n));
        }
        self.bytes_read += n as u64;

        // sole supported layout: one equipment spanning the whole payload,
        // checked as soon as the size field itself is readable
        if ndata >= 4 {
            let equipment_size = LittleEndian::read_u32(&self.event.payload()[0..4]);
            if equipment_size as usize != ndata {
                return Err(EventError::EquipmentSizeMismatch(equipment_size, ndata).into());
            }
        }
        Ok(&self.event)
    }

    /// Produce the next 80-bit GBT word.
    ///
    /// Events without payload or with an incorrect start-of-packet are
    /// signalled as [`DateFileError::EmptyEvent`] / [`DateFileError::InvalidSop`]
    /// and skipped on the next call; [`DateFileError::EndOfEvent`] marks the
    /// boundary before the reader moves on to the next event.
    pub fn next_gbt(&mut self) -> Result<GbtWord, DateFileError> {
        let pos = match self.pos {
            Some(pos) => pos,
            None => {
                self.next_event()?;
                if !self.event.has_payload() {
                    return Err(DateFileError::EmptyEvent);
                }
                self.event.check_sop()?;
                EQUIPMENT_HEADER_SIZE + SOP_SIZE
            }
        };

        // the last two GBT-word-sized slots of the payload are the trailer
        if pos + DATE_BYTES_PER_GBT > self.event.size() - EVENT_TRAILER_SIZE {
            self.pos = None;
            return Err(DateFileError::EndOfEvent);
        }

        let word = GbtWord::from_date_step(&self.event.payload()[pos..pos + DATE_BYTES_PER_GBT]);
        self.pos = Some(pos + DATE_BYTES_PER_GBT);
        self.ngbt += 1;
        Ok(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::EVENT_MAGIC;
    use byteorder::{ByteOrder, LittleEndian};
    use std::io::Cursor;

    fn event_header_bytes(event_size: u32) -> Vec<u8> {
        let mut buf = vec![0u8; EVENT_HEADER_SIZE];
        LittleEndian::write_u32(&mut buf[0..4], event_size);
        LittleEndian::write_u32(&mut buf[4..8], EVENT_MAGIC);
        LittleEndian::write_u32(&mut buf[8..12], EVENT_HEADER_SIZE as u32);
        buf
    }

    // One full event: equipment header + SOP + the given 16-byte steps +
    // a two-slot trailer.
    fn event_bytes(steps: &[[u8; DATE_BYTES_PER_GBT]]) -> Vec<u8> {
        let payload_size =
            EQUIPMENT_HEADER_SIZE + SOP_SIZE + steps.len() * DATE_BYTES_PER_GBT + EVENT_TRAILER_SIZE;
        let mut buf = event_header_bytes((EVENT_HEADER_SIZE + payload_size) as u32);

        let mut equipment = vec![0u8; EQUIPMENT_HEADER_SIZE];
        LittleEndian::write_u32(&mut equipment[0..4], payload_size as u32);
        buf.extend_from_slice(&equipment);

        let mut sop = [0u8; SOP_SIZE];
        sop[12] = 1;
        buf.extend_from_slice(&sop);

        for step in steps {
            buf.extend_from_slice(step);
        }
        buf.extend_from_slice(&[0u8; EVENT_TRAILER_SIZE]);
        buf
    }

    #[test]
    fn empty_event_is_skippable() {
        let mut file = DateFile::new(Cursor::new(event_header_bytes(80)));
        assert!(matches!(file.next_gbt(), Err(DateFileError::EmptyEvent)));
        assert_eq!(file.nevents(), 1);
        assert!(matches!(file.next_gbt(), Err(DateFileError::EndOfFile)));
    }

    #[test]
    fn bad_magic_is_fatal() {
        let mut buf = event_header_bytes(80);
        LittleEndian::write_u32(&mut buf[4..8], 0xDEADBEEF);
        let mut file = DateFile::new(Cursor::new(buf));
        assert!(matches!(
            file.next_event(),
            Err(DateFileError::BadFrame(EventError::BadMagic(0xDEADBEEF)))
        ));
    }

    #[test]
    fn short_header_is_fatal() {
        let mut file = DateFile::new(Cursor::new(vec![0u8; 12]));
        assert!(matches!(
            file.next_event(),
            Err(DateFileError::ShortRead(80, 12))
        ));
    }

    #[test]
    fn short_payload_is_fatal() {
        let mut buf = event_header_bytes(200);
        buf.extend_from_slice(&[0u8; 30]);
        let mut file = DateFile::new(Cursor::new(buf));
        assert!(matches!(
            file.next_event(),
            Err(DateFileError::ShortRead(120, 30))
        ));
    }

    #[test]
    fn equipment_size_mismatch_is_fatal() {
        let mut buf = event_bytes(&[[0u8; DATE_BYTES_PER_GBT]]);
        // corrupt the equipment size field
        LittleEndian::write_u32(&mut buf[EVENT_HEADER_SIZE..EVENT_HEADER_SIZE + 4], 7);
        let mut file = DateFile::new(Cursor::new(buf));
        assert!(matches!(
            file.next_event(),
            Err(DateFileError::BadFrame(EventError::EquipmentSizeMismatch(7, _)))
        ));
    }

    // even a payload too short for a full equipment header carries the
    // 4-byte size field, and a mismatch there is fatal too
    #[test]
    fn equipment_size_checked_on_undersized_payload() {
        let mut buf = event_header_bytes((EVENT_HEADER_SIZE + 10) as u32);
        let mut payload = [0u8; 10];
        LittleEndian::write_u32(&mut payload[0..4], 7);
        buf.extend_from_slice(&payload);
        let mut file = DateFile::new(Cursor::new(buf));
        assert!(matches!(
            file.next_event(),
            Err(DateFileError::BadFrame(EventError::EquipmentSizeMismatch(7, 10)))
        ));

        // with a consistent size field the event is read and then skipped
        // as payload-less by the GBT stream
        let mut buf = event_header_bytes((EVENT_HEADER_SIZE + 10) as u32);
        let mut payload = [0u8; 10];
        LittleEndian::write_u32(&mut payload[0..4], 10);
        buf.extend_from_slice(&payload);
        let mut file = DateFile::new(Cursor::new(buf));
        assert!(matches!(file.next_gbt(), Err(DateFileError::EmptyEvent)));
    }

    #[test]
    fn invalid_sop_is_skippable() {
        let mut buf = event_bytes(&[[0u8; DATE_BYTES_PER_GBT]]);
        buf[EVENT_HEADER_SIZE + EQUIPMENT_HEADER_SIZE + 12] = 9;
        let mut file = DateFile::new(Cursor::new(buf));
        assert!(matches!(
            file.next_gbt(),
            Err(DateFileError::InvalidSop(0, 0, 0, 9))
        ));
        assert!(matches!(file.next_gbt(), Err(DateFileError::EndOfFile)));
    }

    #[test]
    fn gbt_stream_over_one_event() {
        let mut step0 = [0u8; DATE_BYTES_PER_GBT];
        step0[4..].copy_from_slice(&[
            0x02, 0x01, 0xBB, 0xAA, 0x06, 0x05, 0x04, 0x03, 0x10, 0x09, 0x08, 0x07,
        ]);
        let step1 = [0xFFu8; DATE_BYTES_PER_GBT];
        let mut file = DateFile::new(Cursor::new(event_bytes(&[step0, step1])));

        let word = file.next_gbt().unwrap();
        assert_eq!(
            word.bytes(),
            &[0x10, 0x09, 0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]
        );
        let word = file.next_gbt().unwrap();
        assert_eq!(word.bytes(), &[0xFF; 10]);

        assert!(matches!(file.next_gbt(), Err(DateFileError::EndOfEvent)));
        assert_eq!(file.nevents(), 1);
        assert_eq!(file.ngbt(), 2);
        assert!(matches!(file.next_gbt(), Err(DateFileError::EndOfFile)));
    }

    #[test]
    fn gbt_stream_spans_events() {
        let mut buf = event_bytes(&[[0x11u8; DATE_BYTES_PER_GBT]]);
        buf.extend_from_slice(&event_bytes(&[[0x22u8; DATE_BYTES_PER_GBT]]));
        let mut file = DateFile::new(Cursor::new(buf));

        assert!(file.next_gbt().is_ok());
        assert!(matches!(file.next_gbt(), Err(DateFileError::EndOfEvent)));
        let word = file.next_gbt().unwrap();
        assert_eq!(word.bytes()[0], 0x22);
        assert!(matches!(file.next_gbt(), Err(DateFileError::EndOfEvent)));
        assert!(matches!(file.next_gbt(), Err(DateFileError::EndOfFile)));
        assert_eq!(file.nevents(), 2);
        assert_eq!(file.ngbt(), 2);
        assert_eq!(file.bytes_read(), (2 * (EVENT_HEADER_SIZE + 28 + 16 + 16 + 32)) as u64);
    }

    #[test]
    fn missing_file_is_reported() {
        assert!(matches!(
            DateFile::from_path(Path::new("/nonexistent/run.raw")),
            Err(DateFileError::BadFilePath(_))
        ));
    }
}
