//! Resource scaling and tool version thresholds

/// Each memory unit is this many times the previous one.
pub const MEMORY_UNIT_STEP: u64 = 1024;

/// Memory values carrying this literal are treated as absent.
pub const MEMORY_NOT_SPECIFIED: &str = "not specified";

/// First viash release that speaks `--engine` instead of `--platform`.
pub const ENGINE_VOCABULARY_SINCE: (u64, u64, u64) = (0, 9, 0);
