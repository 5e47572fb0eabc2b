//! Network constants, monetary units, and currency heuristics.

pub mod constants;
pub mod currency;
pub mod money;

pub use currency::{
    approximate_maximum_input_count, current_adjusted_timestamp, current_timestamp,
    scan_height_to_timestamp, unlock_time_is_timestamp,
};
pub use money::{money_range, Amount, COIN, MAX_MONEY};
