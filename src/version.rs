//! viash version detection and the `--platform` / `--engine` vocabulary.

use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::limits::ENGINE_VOCABULARY_SINCE;
use crate::config::paths;
use crate::error::{HarnessError, Result};
use crate::process::{CommandRunner, StderrMode};

static VERSION_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<name>\S+) (?P<version>\d+\.\d+\.\d+\S*).* \(c\) (?P<year>\d+) (?P<vendor>\S.*)$",
    )
    .expect("version line regex")
});

/// `major.minor.patch` of the installed build tool.
///
/// Pre-release and build suffixes (`0.9.0-RC6`) are dropped: the vocabulary
/// switch happened during the 0.9.0 release candidates, so an RC counts as
/// the release it precedes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ToolVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl ToolVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse the full output of `viash --version`.
    pub fn parse_output(output: &str) -> Result<Self> {
        let trimmed = output.trim();
        let parse_err = || HarnessError::VersionParse {
            output: trimmed.to_string(),
        };
        let caps = VERSION_LINE.captures(trimmed).ok_or_else(parse_err)?;
        let parsed = semver::Version::parse(&caps["version"]).map_err(|_| parse_err())?;
        Ok(Self::new(parsed.major, parsed.minor, parsed.patch))
    }

    /// The vocabulary this version of the tool expects.
    pub fn vocabulary(self) -> Vocabulary {
        let (major, minor, patch) = ENGINE_VOCABULARY_SINCE;
        if self >= ToolVersion::new(major, minor, patch) {
            Vocabulary::Engine
        } else {
            Vocabulary::Platform
        }
    }
}

impl fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for ToolVersion {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_output(s)
    }
}

/// Term used on the command line to select the build/run target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vocabulary {
    Platform,
    Engine,
}

impl Vocabulary {
    pub fn as_str(self) -> &'static str {
        match self {
            Vocabulary::Platform => "platform",
            Vocabulary::Engine => "engine",
        }
    }

    /// `--platform` or `--engine`.
    pub fn flag(self) -> String {
        format!("--{}", self.as_str())
    }
}

impl fmt::Display for Vocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A target requested by the caller, tagged with the term they used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRequest {
    pub vocabulary: Vocabulary,
    pub target: String,
}

/// Combine the caller's optional `engine` / `platform` into at most one request.
pub fn requested_target(
    engine: Option<&str>,
    platform: Option<&str>,
) -> Result<Option<TargetRequest>> {
    match (engine, platform) {
        (Some(_), Some(_)) => Err(HarnessError::VocabularyConflict),
        (Some(target), None) => Ok(Some(TargetRequest {
            vocabulary: Vocabulary::Engine,
            target: target.to_string(),
        })),
        (None, Some(target)) => Ok(Some(TargetRequest {
            vocabulary: Vocabulary::Platform,
            target: target.to_string(),
        })),
        (None, None) => Ok(None),
    }
}

/// Settle vocabulary and target for `version`, falling back to `default_target`.
pub fn select_target(
    version: ToolVersion,
    request: Option<&TargetRequest>,
    default_target: &str,
) -> Result<(Vocabulary, String)> {
    let expected = version.vocabulary();
    match request {
        Some(req) if req.vocabulary != expected => Err(HarnessError::VocabularyMismatch {
            version,
            expected,
            given: req.vocabulary,
        }),
        Some(req) => Ok((expected, req.target.clone())),
        None => Ok((expected, default_target.to_string())),
    }
}

/// Ask `tool` for its version.
///
/// Failing to run the tool at all is a setup problem, not a component
/// failure: the cause is kept intact as the error's source.
pub fn probe_tool_version<R: CommandRunner>(runner: &R, tool: &Path) -> Result<ToolVersion> {
    let argv: Vec<OsString> = vec![tool.as_os_str().to_owned(), "--version".into()];
    let stdout = match runner.check_output(&argv, StderrMode::Capture) {
        Ok(stdout) => stdout,
        Err(source) => {
            tracing::error!(
                target: "viash_harness",
                tool = %tool.display(),
                error = %source,
                "Could not run '{} --version'. Make sure viash is installed and on the PATH, \
                 set {} to its location, or pass the location to the runner explicitly.",
                tool.display(),
                paths::ENV_TOOL,
            );
            return Err(HarnessError::ToolDiscovery {
                tool: tool.to_path_buf(),
                source,
            });
        }
    };
    let version = ToolVersion::parse_output(&String::from_utf8_lossy(&stdout))?;
    tracing::debug!(
        target: "viash_harness",
        tool = %tool.display(),
        version = %version,
        vocabulary = %version.vocabulary(),
        "detected viash version"
    );
    Ok(version)
}
