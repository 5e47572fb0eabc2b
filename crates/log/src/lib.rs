//! Leveled stderr logging shared by the wallet crates.
//!
//! The whole runtime configuration lives in one packed atomic word, so the
//! enabled-check on the hot path is a single relaxed load. The only lock
//! taken while emitting is the stderr handle itself.

use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::json;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl Level {
    const ALL: [Level; 5] = [
        Self::Trace,
        Self::Debug,
        Self::Info,
        Self::Warn,
        Self::Error,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("warning") {
            return Some(Self::Warn);
        }
        Self::ALL
            .into_iter()
            .find(|level| raw.eq_ignore_ascii_case(level.name()))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Format {
    Text,
    Json,
}

impl Format {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("text") {
            Some(Self::Text)
        } else if raw.eq_ignore_ascii_case("json") {
            Some(Self::Json)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct LogConfig {
    pub level: Level,
    pub format: Format,
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::Info,
            format: Format::Text,
            timestamps: true,
        }
    }
}

// Bits 0-2 hold the minimum level, the rest are flags.
const LEVEL_MASK: u32 = 0b111;
const FLAG_JSON: u32 = 1 << 3;
const FLAG_TIMESTAMPS: u32 = 1 << 4;

static CONFIG: AtomicU32 = AtomicU32::new(Level::Info as u32 | FLAG_TIMESTAMPS);

fn pack(config: LogConfig) -> u32 {
    let mut word = config.level as u32;
    if config.format == Format::Json {
        word |= FLAG_JSON;
    }
    if config.timestamps {
        word |= FLAG_TIMESTAMPS;
    }
    word
}

pub fn init(config: LogConfig) {
    CONFIG.store(pack(config), Ordering::Relaxed);
}

pub fn enabled(level: Level) -> bool {
    level as u32 >= CONFIG.load(Ordering::Relaxed) & LEVEL_MASK
}

pub fn current_level() -> Level {
    let raw = CONFIG.load(Ordering::Relaxed) & LEVEL_MASK;
    Level::ALL
        .into_iter()
        .find(|level| *level as u32 == raw)
        .unwrap_or(Level::Info)
}

pub fn emit(level: Level, module: &'static str, args: fmt::Arguments<'_>) {
    let config = CONFIG.load(Ordering::Relaxed);
    if (level as u32) < config & LEVEL_MASK {
        return;
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();

    let mut err = io::stderr().lock();
    if config & FLAG_JSON != 0 {
        let record = json!({
            "time": IsoTime(now).to_string(),
            "severity": level.name(),
            "module": module,
            "message": args.to_string(),
        });
        let _ = writeln!(err, "{record}");
    } else if config & FLAG_TIMESTAMPS != 0 {
        let _ = writeln!(err, "{} [{}] {}: {}", IsoTime(now), level.name(), module, args);
    } else {
        let _ = writeln!(err, "[{}] {}: {}", level.name(), module, args);
    }
}

#[macro_export]
macro_rules! log {
    ($level:expr, $($arg:tt)*) => {{
        if $crate::enabled($level) {
            $crate::emit($level, module_path!(), format_args!($($arg)*));
        }
    }};
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => { $crate::log!($crate::Level::Error, $($arg)*) };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => { $crate::log!($crate::Level::Warn, $($arg)*) };
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => { $crate::log!($crate::Level::Info, $($arg)*) };
}

#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => { $crate::log!($crate::Level::Debug, $($arg)*) };
}

#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => { $crate::log!($crate::Level::Trace, $($arg)*) };
}

/// A UNIX duration rendered as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
struct IsoTime(Duration);

impl fmt::Display for IsoTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0.as_secs();
        let (year, month, day) = date_from_day_number(secs / 86_400);
        write!(
            f,
            "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}.{:03}Z",
            secs / 3_600 % 24,
            secs / 60 % 60,
            secs % 60,
            self.0.subsec_millis(),
        )
    }
}

fn is_leap_year(year: u64) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Walk forward from the epoch. A logger emits current timestamps only, so
/// the handful of iterations per record is irrelevant next to the write.
fn date_from_day_number(mut days: u64) -> (u64, u32, u32) {
    let mut year = 1970;
    loop {
        let year_len = if is_leap_year(year) { 366 } else { 365 };
        if days < year_len {
            break;
        }
        days -= year_len;
        year += 1;
    }

    const MONTH_LENGTHS: [u64; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    let mut month = 0usize;
    loop {
        let mut month_len = MONTH_LENGTHS[month];
        if month == 1 && is_leap_year(year) {
            month_len += 1;
        }
        if days < month_len {
            break;
        }
        days -= month_len;
        month += 1;
    }

    (year, month as u32 + 1, days as u32 + 1)
}
