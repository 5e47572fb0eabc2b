//! Size and sync heuristics that depend only on network constants.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::constants::{
    DIFFICULTY_TARGET, GENESIS_BLOCK_TIMESTAMP, MAX_BLOCK_NUMBER, TIMESTAMP_SYNC_SAFETY_MARGIN,
};

/// `true` if the dual-purpose `unlock_time` field holds a UNIX timestamp
/// rather than a block height.
pub fn unlock_time_is_timestamp(unlock_time: u64) -> bool {
    unlock_time > MAX_BLOCK_NUMBER
}

/// Approximate how many inputs fit in a transaction of `max_tx_size` bytes
/// carrying `output_count` outputs with `mixin` decoys per ring.
///
/// The byte model matches the serialized layout: a fixed header, key
/// outputs, and per-input key image + ring signatures + offset deltas.
/// Varint-encoded fields are budgeted at their worst case.
pub fn approximate_maximum_input_count(max_tx_size: u64, output_count: u64, mixin: u64) -> u64 {
    const KEY_IMAGE_SIZE: u64 = 32;
    const OUTPUT_KEY_SIZE: u64 = 32;
    const AMOUNT_SIZE: u64 = 8 + 2;
    const GLOBAL_INDEXES_VECTOR_SIZE_SIZE: u64 = 1;
    const GLOBAL_INDEXES_INITIAL_VALUE_SIZE: u64 = 4;
    const GLOBAL_INDEXES_DIFFERENCE_SIZE: u64 = 4;
    const SIGNATURE_SIZE: u64 = 64;
    const EXTRA_TAG_SIZE: u64 = 1;
    const INPUT_TAG_SIZE: u64 = 1;
    const OUTPUT_TAG_SIZE: u64 = 1;
    const PUBLIC_KEY_SIZE: u64 = 32;
    const TRANSACTION_VERSION_SIZE: u64 = 1;
    const TRANSACTION_UNLOCK_TIME_SIZE: u64 = 8;

    let outputs_size = output_count * (OUTPUT_TAG_SIZE + OUTPUT_KEY_SIZE + AMOUNT_SIZE);
    let header_size = TRANSACTION_VERSION_SIZE
        + TRANSACTION_UNLOCK_TIME_SIZE
        + EXTRA_TAG_SIZE
        + PUBLIC_KEY_SIZE;
    let input_size = INPUT_TAG_SIZE
        + AMOUNT_SIZE
        + KEY_IMAGE_SIZE
        + SIGNATURE_SIZE
        + GLOBAL_INDEXES_VECTOR_SIZE_SIZE
        + GLOBAL_INDEXES_INITIAL_VALUE_SIZE
        + mixin * (GLOBAL_INDEXES_DIFFERENCE_SIZE + SIGNATURE_SIZE);

    max_tx_size.saturating_sub(header_size + outputs_size) / input_size
}

/// Estimate the block timestamp a scan height corresponds to.
///
/// Height zero maps to timestamp zero so a from-genesis wallet never skips
/// blocks. The per-block estimate is discounted by 5% so a chain that ran
/// faster than target cannot out-run it.
pub fn scan_height_to_timestamp(height: u64) -> u64 {
    if height == 0 {
        return 0;
    }

    let seconds_since_launch = height.saturating_mul(DIFFICULTY_TARGET) / 100 * 95;

    GENESIS_BLOCK_TIMESTAMP.saturating_add(seconds_since_launch)
}

/// Wall-clock UNIX time in seconds.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Wall-clock UNIX time minus a safety margin, used to stamp a fresh
/// wallet's sync start.
pub fn current_adjusted_timestamp() -> u64 {
    current_timestamp().saturating_sub(TIMESTAMP_SYNC_SAFETY_MARGIN)
}
