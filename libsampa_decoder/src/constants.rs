// Container format sizes and markers
pub const EVENT_MAGIC: u32 = 0xDA1E5AFE;
pub const EVENT_HEADER_SIZE: usize = 80;
pub const EQUIPMENT_HEADER_SIZE: usize = 28;
pub const SOP_SIZE: usize = 16;
pub const EVENT_TRAILER_SIZE: usize = 32; // two GBT-word slots at the end of each event

// GBT transport constants
pub const GBT_WORD_SIZE: usize = 10; // bytes kept out of every DATE step
pub const DATE_BYTES_PER_GBT: usize = 16; // bytes consumed per GBT word
// Only the first byte of each GBT word is demultiplexed: a single SAMPA per
// SOLAR populates elinks 0..4 only. TODO: widen to all 10 bytes (or make it
// a configuration item) once multi-SAMPA links are read out.
pub const DISPATCH_BYTES: usize = 1;

// Elink constants
pub const N_ELINKS: usize = 40;
pub const N_BITS_PER_CHANNEL: usize = 2; // bits per elink in a 80-bit GBT word
pub const ELINK_INITIAL_CAPACITY: usize = 100_000; // bits

// SAMPA data header
pub const SDH_SIZE: usize = 50; // bits
pub const SYNC_PATTERN_VALUE: u64 = 0x1555540F00113;

// Reader buffers
pub const READ_BUFFER_SIZE: usize = 4 * 1024 * 1024;
pub const MAX_PAYLOAD_SIZE: usize = 1024 * 1024;

// Growth cap for any single bit container: 200 MiB of backing bytes
pub const MAX_BITSET_BITS: usize = 200 * 1024 * 1024 * 8;
