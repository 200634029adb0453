//! # sampa_decoder
//!
//! sampa_decoder decodes raw data produced by a SAMPA front-end readout
//! chain, written in Rust. It takes DATE files recorded by the data
//! acquisition, extracts the 80-bit GBT words carried in each event,
//! demultiplexes them onto 40 elink serial streams and decodes the SAMPA
//! packets (clusters of 10-bit ADC samples) those streams carry.
//!
//! ## Pipeline
//!
//! The decode is staged:
//!
//! 1. [`date_file::DateFile`] reads length-prefixed DATE events (magic
//!    `0xDA1E5AFE`, 80-byte header) and validates the single-equipment
//!    layout and the start-of-packet marker.
//! 2. The GBT layer walks the event payload in 16-byte steps and reorders
//!    each into a 10-byte [`gbt::GbtWord`].
//! 3. [`dispatcher::Dispatcher`] splits every GBT word into two-bit groups,
//!    one per elink.
//! 4. Each [`elink::Elink`] hunts for the 50-bit sync pattern, parses SAMPA
//!    data headers and collects payloads, emitting [`packet::Packet`]s.
//!
//! Everything is built on [`bitset::BitSet`], a growable bit string with
//! word-aligned accessors.
//!
//! ## Use
//!
//! The expected entry point is [`process::Decoder`], which pulls packets
//! out of a file (or any byte source):
//!
//! ```no_run
//! use libsampa_decoder::config::Config;
//! use libsampa_decoder::process::Decoder;
//!
//! let mut config = Config::default();
//! config.input_path = "/data/run_0042.raw".into();
//! let mut decoder = Decoder::from_config(&config).unwrap();
//! while let Some(packet) = decoder.get_next_packet().unwrap() {
//!     println!("{packet}");
//! }
//! ```
//!
//! [`process::process_run`] wraps the same loop with progress reporting for
//! the CLI front-end; see the `sampa_decoder_cli` crate.
//!
//! ## Input format
//!
//! A DATE file is a sequence of events. Each event is an 80-byte
//! little-endian header followed by the payload: a 28-byte equipment
//! header, a 16-byte start-of-packet slot (`0x…01`), a run of 16-byte data
//! steps of which 10 bytes each form a GBT word, and a 32-byte trailer.
//! Within a GBT word elink `n` owns bits `2n` and `2n+1`; the elink bit
//! streams are framed by 50-bit SAMPA data headers whose `numWords` field
//! announces the length of the following 10-bit-word payload.
//!
//! Decoded packets keep the full header (including the Hamming and parity
//! fields, which are not checked here) plus the clusters: a 10-bit
//! timestamp and a run of 10-bit ADC samples each.
pub mod bitset;
pub mod config;
pub mod constants;
pub mod date_file;
pub mod dispatcher;
pub mod elink;
pub mod error;
pub mod event;
pub mod gbt;
pub mod packet;
pub mod process;
pub mod sampa_header;
pub mod worker_status;
