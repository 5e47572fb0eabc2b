//! Network-wide constants shared across the wallet crates.

/// Block heights are always below this value. An `unlock_time` at or below
/// it is a block height; above it, a UNIX timestamp.
pub const MAX_BLOCK_NUMBER: u64 = 500_000_000;

/// Coinbase outputs can only be spent after this number of new blocks.
pub const MINED_MONEY_UNLOCK_WINDOW: u64 = 60;

/// Target seconds between blocks.
pub const DIFFICULTY_TARGET: u64 = 30;

/// Timestamp of the genesis block.
pub const GENESIS_BLOCK_TIMESTAMP: u64 = 1_514_764_800;

/// The maximum allowed size for a serialized fusion transaction, in bytes.
pub const FUSION_TX_MAX_SIZE: u64 = 30_000;

/// A fusion transaction must consume at least this many inputs.
pub const FUSION_TX_MIN_INPUT_COUNT: usize = 12;

/// A fusion transaction must have at least this many inputs per output.
pub const FUSION_TX_MIN_IN_OUT_COUNT_RATIO: u64 = 4;

/// Base58 address prefix. Addresses encode varint(prefix) before the keys.
pub const ADDRESS_BASE58_PREFIX: u64 = 0x2ce4;

/// Margin subtracted from the wall clock when stamping a fresh wallet's
/// sync start, so a slightly-drifted chain cannot out-run the first scan.
pub const TIMESTAMP_SYNC_SAFETY_MARGIN: u64 = 3_600;
