//! Tool locations, descriptor fields and environment keys

/// Build tool invoked when nothing else is configured.
pub const DEFAULT_TOOL: &str = "viash";

/// Target selected when the caller names neither an engine nor a platform.
pub const DEFAULT_TARGET: &str = "docker";

/// Target that needs a `---setup cachedbuild` step before running.
pub const SETUP_TARGET: &str = "docker";

/// Descriptor sections that may carry a back-reference to the source config,
/// newest layout first.
pub const BACK_REFERENCE_SECTIONS: &[&str] = &["build_info", "info"];
pub const BACK_REFERENCE_FIELD: &str = "config";

/// Harness configuration overrides.
pub const ENV_TOOL: &str = "VIASH_HARNESS_TOOL";
pub const ENV_TARGET: &str = "VIASH_HARNESS_TARGET";
pub const ENV_STDERR: &str = "VIASH_HARNESS_STDERR";

/// Prefix of the meta variables viash exports to components and their tests.
pub const ENV_META_PREFIX: &str = "VIASH_META_";
