//! Configuration constants and structures for the viash test harness
//!
//! This module centralizes the defaults the runner falls back to and the
//! environment variables that override them.

pub mod errors;
pub mod limits;
pub mod paths;

use std::path::PathBuf;

use crate::process::StderrMode;

/// Settings shared by every component invocation made through a runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Location of the `viash` executable used for `viash run`.
    pub tool: PathBuf,
    /// Engine or platform selected when the caller names neither.
    pub default_target: String,
    /// What happens to the component's standard error.
    pub stderr: StderrMode,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            tool: PathBuf::from(paths::DEFAULT_TOOL),
            default_target: paths::DEFAULT_TARGET.to_string(),
            stderr: StderrMode::Merge,
        }
    }
}

impl HarnessConfig {
    /// Load configuration from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - VIASH_HARNESS_TOOL: path or name of the viash executable (default: viash)
    /// - VIASH_HARNESS_TARGET: default engine/platform (default: docker)
    /// - VIASH_HARNESS_STDERR: merge | capture | discard | inherit (default: merge)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let tool = non_empty_env(paths::ENV_TOOL)
            .map(PathBuf::from)
            .unwrap_or(defaults.tool);

        let default_target = non_empty_env(paths::ENV_TARGET).unwrap_or(defaults.default_target);

        let stderr = non_empty_env(paths::ENV_STDERR)
            .and_then(|v| v.parse::<StderrMode>().ok())
            .unwrap_or(defaults.stderr);

        Self {
            tool,
            default_target,
            stderr,
        }
    }

    pub fn with_tool(mut self, tool: impl Into<PathBuf>) -> Self {
        self.tool = tool.into();
        self
    }

    pub fn with_default_target(mut self, target: impl Into<String>) -> Self {
        self.default_target = target.into();
        self
    }

    pub fn with_stderr(mut self, stderr: StderrMode) -> Self {
        self.stderr = stderr;
        self
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
