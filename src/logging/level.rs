use crate::error::{GridwatchError, Result};
use tracing::Level;

/// Parse a level name, case-insensitively
pub fn parse_log_level(level_str: &str) -> Result<Level> {
    match level_str.to_uppercase().as_str() {
        "TRACE" => Ok(Level::TRACE),
        "DEBUG" => Ok(Level::DEBUG),
        "INFO" => Ok(Level::INFO),
        "WARN" | "WARNING" => Ok(Level::WARN),
        "ERROR" => Ok(Level::ERROR),
        _ => Err(GridwatchError::config(format!(
            "Invalid log level: {}",
            level_str
        ))),
    }
}

pub const fn level_rank(level: Level) -> u8 {
    match level {
        Level::TRACE => 0,
        Level::DEBUG => 1,
        Level::INFO => 2,
        Level::WARN => 3,
        Level::ERROR => 4,
    }
}

/// The more verbose of two levels
pub const fn min_level(a: Level, b: Level) -> Level {
    if level_rank(a) <= level_rank(b) { a } else { b }
}

/// Resolve an optional per-layer override, falling back to `base`
pub fn layer_level(override_level: Option<&String>, base: Level) -> Level {
    override_level
        .and_then(|s| parse_log_level(s).ok())
        .unwrap_or(base)
}
