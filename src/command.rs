//! Argument vectors for `viash run` and for calling a built component directly.
//!
//! The order of every token here is observed by log and string matching
//! downstream; keep it stable.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::paths::SETUP_TARGET;
use crate::resources::ResourceSpec;
use crate::version::Vocabulary;

/// Dash prefix for `cpus` / `memory` flags.
///
/// `viash run` takes `--cpus`; a built component parses `---cpus` itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagPrefix {
    /// Through the `viash run` wrapper.
    Wrapper,
    /// Straight to the built executable.
    Executable,
}

impl FlagPrefix {
    pub fn as_str(self) -> &'static str {
        match self {
            FlagPrefix::Wrapper => "--",
            FlagPrefix::Executable => "---",
        }
    }
}

/// `cpus` then `memory`, each only when set and non-zero. Memory is always
/// in bytes.
pub fn resource_flags(resources: &ResourceSpec, prefix: FlagPrefix) -> Vec<OsString> {
    let dashes = prefix.as_str();
    let mut out = Vec::with_capacity(4);
    if let Some(cpus) = resources.cpus.filter(|c| *c > 0) {
        out.push(format!("{dashes}cpus").into());
        out.push(cpus.to_string().into());
    }
    if let Some(bytes) = resources.memory_bytes.filter(|b| *b > 0) {
        out.push(format!("{dashes}memory").into());
        out.push(format!("{bytes}B").into());
    }
    out
}

/// `[executable, args..., ---cpus N, ---memory NB]`
pub fn built_component_args(
    executable: &Path,
    args: &[OsString],
    resources: &ResourceSpec,
) -> Vec<OsString> {
    let mut argv = Vec::with_capacity(1 + args.len() + 4);
    argv.push(executable.as_os_str().to_owned());
    argv.extend(args.iter().cloned());
    argv.extend(resource_flags(resources, FlagPrefix::Executable));
    argv
}

/// Builds the `viash run` command lines for one source descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandBuilder {
    tool: PathBuf,
    descriptor: PathBuf,
    vocabulary: Vocabulary,
    target: String,
}

impl CommandBuilder {
    pub fn new(
        tool: impl Into<PathBuf>,
        descriptor: impl Into<PathBuf>,
        vocabulary: Vocabulary,
        target: impl Into<String>,
    ) -> Self {
        Self {
            tool: tool.into(),
            descriptor: descriptor.into(),
            vocabulary,
            target: target.into(),
        }
    }

    pub fn vocabulary(&self) -> Vocabulary {
        self.vocabulary
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Config override tagging the selected target's image as `test`.
    pub fn target_override(&self) -> String {
        format!(
            ".{}s[.type == '{}'].target_tag := 'test'",
            self.vocabulary, self.target
        )
    }

    /// Only the docker target has an image to build before running.
    pub fn needs_setup(&self) -> bool {
        self.target == SETUP_TARGET
    }

    fn base(&self) -> Vec<OsString> {
        vec![
            self.tool.as_os_str().to_owned(),
            "run".into(),
            self.descriptor.as_os_str().to_owned(),
            self.vocabulary.flag().into(),
            self.target.clone().into(),
            "-c".into(),
            self.target_override().into(),
        ]
    }

    /// Build step: same prefix as the run step, no resource flags.
    pub fn setup_args(&self) -> Vec<OsString> {
        let mut argv = self.base();
        argv.extend(["--", "---setup", "cachedbuild"].map(OsString::from));
        argv
    }

    /// Run step: prefix, resource flags, `--`, then the user's arguments.
    pub fn run_args(&self, resources: &ResourceSpec, args: &[OsString]) -> Vec<OsString> {
        let mut argv = self.base();
        argv.extend(resource_flags(resources, FlagPrefix::Wrapper));
        argv.push("--".into());
        argv.extend(args.iter().cloned());
        argv
    }
}
