//! Deciding how a component is invoked and invoking it.
//!
//! A test started inline points `config` at the user's descriptor; the
//! component is then built and run from source through `viash run`, so the
//! latest edits are always exercised. A test started by `viash test` points
//! `config` at a generated descriptor whose back-reference does not exist in
//! the test's sandbox; the pre-built `executable` is called directly instead.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::command::{built_component_args, CommandBuilder};
use crate::config::HarnessConfig;
use crate::descriptor::{read_descriptor, resolve_source_config_path};
use crate::error::{HarnessError, Result};
use crate::metadata::InvocationMetadata;
use crate::process::{CommandRunner, StderrMode, SystemRunner};
use crate::redact::ErrorRedactor;
use crate::resources::{MemoryUnit, MemoryValue, ResourceSpec};
use crate::version::{probe_tool_version, requested_target, select_target};

/// How the next `run` will reach the component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationMode {
    /// Build and run from the user-authored descriptor.
    Source { config: PathBuf },
    /// Call the pre-built executable.
    Built { executable: PathBuf },
}

/// Per-call overrides for [`ComponentRunner::run_with`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOptions {
    pub engine: Option<String>,
    pub platform: Option<String>,
    /// Replaces the metadata's `cpus`.
    pub cpus: Option<u32>,
    /// When non-empty, replaces every memory value from the metadata.
    pub memory: Vec<(MemoryUnit, MemoryValue)>,
    /// Replaces the runner's configured stderr handling.
    pub stderr: Option<StderrMode>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn cpus(mut self, cpus: u32) -> Self {
        self.cpus = Some(cpus);
        self
    }

    pub fn memory(mut self, unit: MemoryUnit, value: MemoryValue) -> Self {
        self.memory.push((unit, value));
        self
    }

    pub fn stderr(mut self, stderr: StderrMode) -> Self {
        self.stderr = Some(stderr);
        self
    }
}

/// Runs one component, from source or pre-built, and returns its stdout.
#[derive(Debug, Clone)]
pub struct ComponentRunner<R = SystemRunner> {
    executable: PathBuf,
    config: PathBuf,
    cpus: Option<u32>,
    memory: Vec<(MemoryUnit, MemoryValue)>,
    settings: HarnessConfig,
    runner: R,
}

impl ComponentRunner<SystemRunner> {
    /// Both `executable` and `config` must be present in `metadata`.
    pub fn from_metadata(metadata: &InvocationMetadata, settings: HarnessConfig) -> Result<Self> {
        Ok(Self {
            executable: metadata.executable()?,
            config: metadata.config_path()?,
            cpus: metadata.cpus()?,
            memory: metadata.memory_values()?,
            settings,
            runner: SystemRunner,
        })
    }
}

impl<R: CommandRunner> ComponentRunner<R> {
    /// Swap the process backend, keeping everything else.
    pub fn with_runner<T: CommandRunner>(self, runner: T) -> ComponentRunner<T> {
        ComponentRunner {
            executable: self.executable,
            config: self.config,
            cpus: self.cpus,
            memory: self.memory,
            settings: self.settings,
            runner,
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn config_path(&self) -> &Path {
        &self.config
    }

    pub fn settings(&self) -> &HarnessConfig {
        &self.settings
    }

    /// Read the descriptor and decide the invocation mode.
    ///
    /// Decided afresh on every call; nothing about the previous run is kept.
    pub fn resolve_mode(&self) -> Result<InvocationMode> {
        let descriptor = read_descriptor(&self.config)?;
        let source = resolve_source_config_path(&self.config, &descriptor);
        if source.is_file() {
            return Ok(InvocationMode::Source { config: source });
        }
        tracing::info!(
            target: "viash_harness",
            source = %source.display(),
            executable = %self.executable.display(),
            "Could not find the original viash config source. \
             Assuming test script is run from 'viash test' or 'viash_test'."
        );
        Ok(InvocationMode::Built {
            executable: self.executable.clone(),
        })
    }

    /// Run the component with `args` and the metadata's resources.
    pub fn run<I, S>(&self, args: I) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.run_with(args, &RunOptions::default())
    }

    pub fn run_with<I, S>(&self, args: I, options: &RunOptions) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        // Rejected in both modes before anything is spawned.
        let request = requested_target(options.engine.as_deref(), options.platform.as_deref())?;
        let resources = self.resources(options)?;
        let stderr = options.stderr.unwrap_or(self.settings.stderr);
        let redactor = ErrorRedactor::new(&self.runner);

        match self.resolve_mode()? {
            InvocationMode::Source { config } => {
                let version = probe_tool_version(&self.runner, &self.settings.tool)?;
                let (vocabulary, target) =
                    select_target(version, request.as_ref(), &self.settings.default_target)?;
                let builder = CommandBuilder::new(&self.settings.tool, config, vocabulary, target);
                if builder.needs_setup() {
                    tracing::debug!(
                        target: "viash_harness",
                        target_name = builder.target(),
                        "building component image"
                    );
                    redactor.check_output(&builder.setup_args(), stderr)?;
                }
                redactor.check_output(&builder.run_args(&resources, &args), stderr)
            }
            InvocationMode::Built { executable } => {
                if !executable.is_file() {
                    return Err(HarnessError::NotAFile { path: executable });
                }
                let argv = built_component_args(&executable, &args, &resources);
                redactor.check_output(&argv, stderr)
            }
        }
    }

    fn resources(&self, options: &RunOptions) -> Result<ResourceSpec> {
        let cpus = options.cpus.or(self.cpus);
        let memory = if options.memory.is_empty() {
            &self.memory
        } else {
            &options.memory
        };
        ResourceSpec::new(cpus, memory)
    }
}
