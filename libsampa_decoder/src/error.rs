use std::path::PathBuf;
use thiserror::Error;

use super::constants::*;
use super::worker_status::WorkerStatus;

#[derive(Debug, Clone, Error)]
pub enum BitSetError {
    #[error("Bit range [{0},{1}] does not fit in a {2}-bit value")]
    InvalidRange(usize, usize, usize),
    #[error("Bit range [{0},{1}] is outside the bitset length {2}")]
    OutOfBounds(usize, usize, usize),
    #[error("Refusing to grow a BitSet past {max} bits (requested {0})", max = MAX_BITSET_BITS)]
    TooLarge(usize),
    #[error("Invalid bit string {0:?}; only '0' and '1' are allowed")]
    InvalidBitString(String),
    #[error("Cannot prune {0} bits from a bitset of length {1}")]
    PruneTooLong(usize, usize),
}

#[derive(Debug, Clone, Error)]
pub enum SampaHeaderError {
    #[error("Value {1} does not fit in the {2}-bit {0} field")]
    FieldOverflow(&'static str, u32, usize),
    #[error("SampaDataHeader failed due to bitset error: {0}")]
    BitSet(#[from] BitSetError),
}

#[derive(Debug, Clone, Error)]
pub enum EventError {
    #[error("Incorrect magic {0:#010X} found in event header; expected {exp:#010X}", exp = EVENT_MAGIC)]
    BadMagic(u32),
    #[error("Incorrect event size {0} found in event header; headers alone are {size} bytes", size = EVENT_HEADER_SIZE)]
    BadEventSize(u32),
    #[error("Equipment size {0} does not match the event payload size {1}")]
    EquipmentSizeMismatch(u32, usize),
}

#[derive(Debug, Error)]
pub enum DateFileError {
    #[error("Could not open DATE file because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("DateFile failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Short read: expected {0} bytes, got {1}")]
    ShortRead(usize, usize),
    #[error("Error when parsing event from DateFile: {0}")]
    BadFrame(#[from] EventError),
    #[error("Event without payload")]
    EmptyEvent,
    #[error("Invalid start-of-packet {0:08X} {1:08X} {2:08X} {3:08X}")]
    InvalidSop(u32, u32, u32, u32),
    #[error("Reached end of event")]
    EndOfEvent,
    #[error("Reached end of DateFile")]
    EndOfFile,
}

#[derive(Debug, Error)]
pub enum ElinkError {
    #[error("Elink {0} failed due to bitset error: {1}")]
    BitSet(usize, #[source] BitSetError),
    #[error("Elink {0} processed at length {1} away from checkpoint {2}")]
    CheckpointMismatch(usize, usize, usize),
    #[error("Elink {0} matched the sync pattern with packet type {1}; sync packets must have type 2")]
    BadSyncPacketType(usize, u8),
    #[error("Elink {0} got a sync packet type with a header that is not the sync pattern")]
    BadSyncHeader(usize),
    #[error("Elink {0} emitted a packet on both half-bits of one append")]
    DoublePacket(usize),
    #[error("Elink {0} payload truncated: cluster of {1} samples at word {2} of {3}")]
    TruncatedCluster(usize, usize, usize, usize),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Incorrect GBT word size {0}; expected {size} bytes", size = GBT_WORD_SIZE)]
    IncorrectSize(usize),
    #[error("Dispatch failed due to elink error: {0}")]
    Elink(#[from] ElinkError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Processor failed due to DateFile error: {0}")]
    DateFile(#[from] DateFileError),
    #[error("Processor failed due to dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
    #[error("Processor failed due to configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Processor failed due to send error: {0}")]
    SendError(#[from] std::sync::mpsc::SendError<WorkerStatus>),
    #[error("Processor failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
}
