use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::errors::ERR_COMPONENT_FAILED;
use crate::process::ProcessError;
use crate::version::{ToolVersion, Vocabulary};

pub type Result<T> = std::result::Result<T, HarnessError>;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(
        "E-VSH-0100: could not find '{key}' key in the metadata of {origin}. \
         Please make sure it is defined."
    )]
    MissingMetadata { key: String, origin: String },
    #[error("E-VSH-0101: invalid '{key}' in the metadata of {origin}: {detail}")]
    InvalidMetadata {
        key: String,
        origin: String,
        detail: String,
    },
    #[error("E-VSH-0200: {} does not exist or is not a file.", path.display())]
    NotAFile { path: PathBuf },
    #[error("E-VSH-0201: Directory {} does not exist or is not a directory.", path.display())]
    NotADirectory { path: PathBuf },
    #[error(
        "E-VSH-0202: Tarfile would have been unpacked to {}, \
         but a file or directory already exists at this location.",
        path.display()
    )]
    DestinationExists { path: PathBuf },
    #[error("E-VSH-0203: {} is not a tarfile.", path.display())]
    NotAnArchive { path: PathBuf },
    #[error("E-VSH-0204: {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("E-VSH-0300: The config file was empty ({}).", path.display())]
    EmptyDescriptor { path: PathBuf },
    #[error(
        "E-VSH-0301: Expected viash config to contain a map. \
         Please make sure that providing a valid viash config yaml ({}).",
        path.display()
    )]
    DescriptorNotMap { path: PathBuf },
    #[error("E-VSH-0302: failed to parse {}", path.display())]
    DescriptorSyntax {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("E-VSH-0400: Specifying both 'engine' and 'platform' is not allowed.")]
    VocabularyConflict,
    #[error("E-VSH-0401: viash {version} expects '{expected}' to be used instead of '{given}'.")]
    VocabularyMismatch {
        version: ToolVersion,
        expected: Vocabulary,
        given: Vocabulary,
    },
    #[error("E-VSH-0402: Could not parse the viash version from '{output}'.")]
    VersionParse { output: String },
    #[error("E-VSH-0403: could not query the version of '{}'", tool.display())]
    ToolDiscovery {
        tool: PathBuf,
        #[source]
        source: ProcessError,
    },
    #[error("E-VSH-0500: invalid memory value for '{field}': {detail}")]
    InvalidMemory { field: String, detail: String },
    #[error(transparent)]
    Component(#[from] ComponentFailure),
    /// The component's process could not be started or waited on.
    #[error(transparent)]
    Process(ProcessError),
}

impl HarnessError {
    pub(crate) fn io(
        action: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        HarnessError::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// The redacted component failure, when this error is one.
    pub fn as_component_failure(&self) -> Option<&ComponentFailure> {
        match self {
            HarnessError::Component(failure) => Some(failure),
            _ => None,
        }
    }
}

/// A component that ran and exited unsuccessfully.
///
/// Carries only what the component itself produced. It has no `source`, so a
/// rendered error chain ends here instead of walking back through the
/// harness's own process plumbing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentFailure {
    code: Option<i32>,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl ComponentFailure {
    pub(crate) fn new(code: Option<i32>, stdout: Vec<u8>, stderr: Vec<u8>) -> Self {
        Self {
            code,
            stdout,
            stderr,
        }
    }

    /// Exit code, `None` when the component was killed by a signal.
    pub fn code(&self) -> Option<i32> {
        self.code
    }

    /// Captured standard output (with standard error interleaved when merged).
    pub fn stdout(&self) -> &[u8] {
        &self.stdout
    }

    /// Standard error, only populated when it was captured separately.
    pub fn stderr(&self) -> &[u8] {
        &self.stderr
    }

    /// Everything the component printed, decoded lossily.
    pub fn output_text(&self) -> String {
        let stdout = String::from_utf8_lossy(&self.stdout);
        let stderr = String::from_utf8_lossy(&self.stderr);
        match (stdout.trim_end(), stderr.trim_end()) {
            ("", "") => String::new(),
            (out, "") => out.to_string(),
            ("", err) => err.to_string(),
            (out, err) => format!("{out}\n{err}"),
        }
    }
}

impl fmt::Display for ComponentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ERR_COMPONENT_FAILED}: ")?;
        match self.code {
            Some(code) => write!(f, "component exited with status {code}")?,
            None => f.write_str("component was terminated by a signal")?,
        }
        let output = self.output_text();
        if !output.is_empty() {
            write!(f, "\n{output}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ComponentFailure {}
