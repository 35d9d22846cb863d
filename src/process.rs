//! Blocking subprocess execution with `check_output` semantics.
//!
//! The harness never talks to `std::process` directly; it goes through
//! [`CommandRunner`] so tests can record argument vectors and replay canned
//! outputs instead of spawning real tools.

use std::ffi::{OsStr, OsString};
use std::io::Read;
use std::process::{Command, ExitStatus, Stdio};
use std::str::FromStr;

use thiserror::Error;

/// Where a child's standard error goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StderrMode {
    /// Interleave stderr into the captured stdout bytes.
    #[default]
    Merge,
    /// Capture stderr separately; only surfaced on failure.
    Capture,
    /// Send stderr to the null device.
    Discard,
    /// Let stderr go to the parent's stderr.
    Inherit,
}

impl FromStr for StderrMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "merge" | "stdout" => Ok(StderrMode::Merge),
            "capture" | "pipe" => Ok(StderrMode::Capture),
            "discard" | "devnull" => Ok(StderrMode::Discard),
            "inherit" => Ok(StderrMode::Inherit),
            other => Err(format!("unknown stderr mode '{other}'")),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("E-VSH-0601: refusing to run an empty command line")]
    EmptyCommand,
    #[error("E-VSH-0601: failed to spawn {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("E-VSH-0601: lost track of {program} while collecting its output")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("E-VSH-0600: {program} exited with status {}", display_code(*code))]
    Exit {
        program: String,
        args: Vec<String>,
        code: Option<i32>,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
    },
}

fn display_code(code: Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "<signal>".to_string())
}

/// Runs an argument vector to completion and returns its stdout.
///
/// A non-zero exit is an error carrying everything that was captured.
pub trait CommandRunner {
    fn check_output(
        &self,
        argv: &[OsString],
        stderr: StderrMode,
    ) -> Result<Vec<u8>, ProcessError>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn check_output(
        &self,
        argv: &[OsString],
        stderr: StderrMode,
    ) -> Result<Vec<u8>, ProcessError> {
        (**self).check_output(argv, stderr)
    }
}

/// Spawns real processes through `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn check_output(
        &self,
        argv: &[OsString],
        stderr: StderrMode,
    ) -> Result<Vec<u8>, ProcessError> {
        let (program, args) = argv.split_first().ok_or(ProcessError::EmptyCommand)?;
        let program_name = program.to_string_lossy().into_owned();
        tracing::debug!(
            target: "viash_harness",
            program = %program_name,
            args = ?args,
            stderr = ?stderr,
            "spawning process"
        );

        let (status, stdout, stderr_bytes) = match stderr {
            StderrMode::Merge => run_merged(program, args, &program_name)?,
            other => {
                let mut cmd = Command::new(program);
                cmd.args(args);
                cmd.stdin(Stdio::inherit());
                cmd.stdout(Stdio::piped());
                cmd.stderr(match other {
                    StderrMode::Capture => Stdio::piped(),
                    StderrMode::Discard => Stdio::null(),
                    _ => Stdio::inherit(),
                });
                let output = cmd.output().map_err(|source| ProcessError::Spawn {
                    program: program_name.clone(),
                    source,
                })?;
                (output.status, output.stdout, output.stderr)
            }
        };

        finish(program_name, args, status, stdout, stderr_bytes)
    }
}

fn run_merged(
    program: &OsStr,
    args: &[OsString],
    program_name: &str,
) -> Result<(ExitStatus, Vec<u8>, Vec<u8>), ProcessError> {
    let spawn_err = |source| ProcessError::Spawn {
        program: program_name.to_string(),
        source,
    };
    let (mut reader, writer) = std::io::pipe().map_err(spawn_err)?;
    let writer_for_stderr = writer.try_clone().map_err(spawn_err)?;

    // INVARIANT: the Command (and with it our copies of the pipe's write end)
    // is dropped before reading, otherwise read_to_end never sees EOF.
    let mut child = {
        let mut cmd = Command::new(program);
        cmd.args(args);
        cmd.stdin(Stdio::inherit());
        cmd.stdout(writer);
        cmd.stderr(writer_for_stderr);
        cmd.spawn().map_err(spawn_err)?
    };

    let mut combined = Vec::new();
    let read_result = reader.read_to_end(&mut combined);
    let status = child.wait().map_err(|source| ProcessError::Wait {
        program: program_name.to_string(),
        source,
    })?;
    read_result.map_err(|source| ProcessError::Wait {
        program: program_name.to_string(),
        source,
    })?;
    Ok((status, combined, Vec::new()))
}

fn finish(
    program: String,
    args: &[OsString],
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
) -> Result<Vec<u8>, ProcessError> {
    if status.success() {
        return Ok(stdout);
    }
    Err(ProcessError::Exit {
        program,
        args: args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect(),
        code: status.code(),
        stdout,
        stderr,
    })
}
