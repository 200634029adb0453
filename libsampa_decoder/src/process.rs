//! The decode pipeline driver.
//!
//! Wires a [`DateFile`] to a [`Dispatcher`] and decides which reader
//! conditions are fatal and which only skip an event or mark an event
//! boundary.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufReader, Read};
use std::sync::mpsc::Sender;

use super::config::Config;
use super::date_file::DateFile;
use super::dispatcher::Dispatcher;
use super::error::{DateFileError, ProcessorError};
use super::packet::Packet;
use super::worker_status::WorkerStatus;

/// Counters accumulated over one processed file.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunSummary {
    pub nevents: u64,
    pub ngbt: u64,
    pub npackets: u64,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} events, {} GBT words, {} packets",
            self.nevents, self.ngbt, self.npackets
        )
    }
}

/// Pull-based packet source over a DATE byte stream.
///
/// Empty events and events with an invalid start-of-packet are skipped;
/// event boundaries force-clear the elinks so each event re-acquires sync.
#[derive(Debug)]
pub struct Decoder<R: Read> {
    file: DateFile<R>,
    dispatcher: Dispatcher,
    pending: VecDeque<Packet>,
    config: Config,
    npackets: u64,
}

impl Decoder<BufReader<File>> {
    /// Open the input named by the config.
    pub fn from_config(config: &Config) -> Result<Self, ProcessorError> {
        let file = DateFile::from_path(&config.input_path)?;
        Ok(Self::new(file, config))
    }
}

impl<R: Read> Decoder<R> {
    pub fn new(file: DateFile<R>, config: &Config) -> Self {
        Decoder {
            file,
            dispatcher: Dispatcher::new(config.elink_mask),
            pending: VecDeque::new(),
            config: config.clone(),
            npackets: 0,
        }
    }

    pub fn nevents(&self) -> u64 {
        self.file.nevents()
    }

    pub fn ngbt(&self) -> u64 {
        self.file.ngbt()
    }

    pub fn npackets(&self) -> u64 {
        self.npackets
    }

    pub fn bytes_read(&self) -> u64 {
        self.file.bytes_read()
    }

    /// The next decoded packet, or None once the input (or a configured
    /// limit) is exhausted.
    pub fn get_next_packet(&mut self) -> Result<Option<Packet>, ProcessorError> {
        loop {
            if let Some(packet) = self.pending.pop_front() {
                self.npackets += 1;
                return Ok(Some(packet));
            }
            if self.config.is_event_limit_reached(self.file.nevents())
                || self.config.is_gbt_limit_reached(self.file.ngbt())
            {
                return Ok(None);
            }
            match self.file.next_gbt() {
                Ok(word) => {
                    let packets = self.dispatcher.dispatch(word.bytes())?;
                    self.pending.extend(packets);
                }
                Err(DateFileError::EmptyEvent) => {
                    spdlog::debug!("event {} without payload, skipping", self.file.nevents());
                }
                Err(DateFileError::InvalidSop(a, b, c, d)) => {
                    spdlog::debug!(
                        "event {} with invalid SOP {:08X} {:08X} {:08X} {:08X}, skipping",
                        self.file.nevents(),
                        a,
                        b,
                        c,
                        d
                    );
                }
                Err(DateFileError::EndOfEvent) => self.dispatcher.force_clear(),
                Err(DateFileError::EndOfFile) => return Ok(None),
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// The main loop: decode one file and hand every packet to the sink.
///
/// Progress is reported over the channel in roughly 1% increments of the
/// consumed input size.
pub fn process_run<F>(
    config: &Config,
    tx: &Sender<WorkerStatus>,
    mut on_packet: F,
) -> Result<RunSummary, ProcessorError>
where
    F: FnMut(Packet),
{
    let mut decoder = Decoder::from_config(config)?;
    let total_bytes = std::fs::metadata(&config.input_path)?.len().max(1);

    spdlog::info!("Decoding {}...", config.input_path.to_string_lossy());
    let flush_frac: f32 = 0.01;
    let mut last_progress: f32 = 0.0;
    tx.send(WorkerStatus::new(0.0, 0, 0))?;

    while let Some(packet) = decoder.get_next_packet()? {
        on_packet(packet);
        let progress = decoder.bytes_read() as f32 / total_bytes as f32;
        if progress - last_progress >= flush_frac {
            last_progress = progress;
            tx.send(WorkerStatus::new(
                progress,
                decoder.nevents(),
                decoder.npackets(),
            ))?;
        }
    }

    let summary = RunSummary {
        nevents: decoder.nevents(),
        ngbt: decoder.ngbt(),
        npackets: decoder.npackets(),
    };
    tx.send(WorkerStatus::new(1.0, summary.nevents, summary.npackets))?;
    spdlog::info!("Done: {}", summary);
    Ok(summary)
}
