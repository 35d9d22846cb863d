//! Turning a failed component run into an error a test author can read.
//!
//! A component that exits non-zero surfaces as [`ComponentFailure`]: its
//! output, its exit code, and nothing of the harness's own call stack. The
//! output is also written to the log, with the arguments the component was
//! given, so it shows up next to the failing test.

use std::ffi::OsString;

use crate::error::{ComponentFailure, HarnessError, Result};
use crate::process::{CommandRunner, ProcessError, StderrMode};

/// Wraps a [`CommandRunner`] so every failure it reports is redacted.
#[derive(Debug, Clone, Copy)]
pub struct ErrorRedactor<R> {
    runner: R,
}

impl<R: CommandRunner> ErrorRedactor<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// Run `argv`, returning its stdout unchanged on success.
    pub fn check_output(&self, argv: &[OsString], stderr: StderrMode) -> Result<Vec<u8>> {
        self.runner.check_output(argv, stderr).map_err(redact)
    }
}

/// Map a process error into the harness's error type.
///
/// Only an unsuccessful exit is a component failure. Not being able to start
/// the process at all keeps its cause, since there is no component output to
/// show instead.
pub fn redact(err: ProcessError) -> HarnessError {
    match err {
        ProcessError::Exit {
            program,
            args,
            code,
            stdout,
            stderr,
        } => {
            let failure = ComponentFailure::new(code, stdout, stderr);
            tracing::info!(
                target: "viash_harness",
                program = %program,
                args = ?args,
                code = ?code,
                "component output:\n{}",
                failure.output_text()
            );
            HarnessError::Component(failure)
        }
        other => HarnessError::Process(other),
    }
}
