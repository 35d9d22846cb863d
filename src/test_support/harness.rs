use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::Path;

use parking_lot::Mutex;

use crate::process::{CommandRunner, ProcessError, StderrMode};

enum Canned {
    Ok(Vec<u8>),
    Exit {
        code: i32,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
    },
    SpawnError,
}

/// Records every argument vector it is asked to run and replays canned
/// results in order. Once the queue is drained every call succeeds with
/// empty output.
#[derive(Default)]
pub struct FakeRunner {
    responses: Mutex<VecDeque<Canned>>,
    calls: Mutex<Vec<(Vec<String>, StderrMode)>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_ok(self, stdout: impl AsRef<[u8]>) -> Self {
        self.responses
            .lock()
            .push_back(Canned::Ok(stdout.as_ref().to_vec()));
        self
    }

    pub fn respond_exit(
        self,
        code: i32,
        stdout: impl AsRef<[u8]>,
        stderr: impl AsRef<[u8]>,
    ) -> Self {
        self.responses.lock().push_back(Canned::Exit {
            code,
            stdout: stdout.as_ref().to_vec(),
            stderr: stderr.as_ref().to_vec(),
        });
        self
    }

    pub fn respond_spawn_error(self) -> Self {
        self.responses.lock().push_back(Canned::SpawnError);
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .iter()
            .map(|(argv, _)| argv.clone())
            .collect()
    }

    /// Each recorded argument vector joined by single spaces.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .map(|(argv, _)| argv.join(" "))
            .collect()
    }

    pub fn stderr_modes(&self) -> Vec<StderrMode> {
        self.calls.lock().iter().map(|(_, mode)| *mode).collect()
    }
}

impl CommandRunner for FakeRunner {
    fn check_output(
        &self,
        argv: &[OsString],
        stderr: StderrMode,
    ) -> Result<Vec<u8>, ProcessError> {
        let argv: Vec<String> = argv
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        self.calls.lock().push((argv.clone(), stderr));
        let program = argv.first().cloned().unwrap_or_default();
        match self.responses.lock().pop_front() {
            None => Ok(Vec::new()),
            Some(Canned::Ok(stdout)) => Ok(stdout),
            Some(Canned::Exit {
                code,
                stdout,
                stderr,
            }) => Err(ProcessError::Exit {
                program,
                args: argv[1..].to_vec(),
                code: Some(code),
                stdout,
                stderr,
            }),
            Some(Canned::SpawnError) => Err(ProcessError::Spawn {
                program,
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "No such file or directory",
                ),
            }),
        }
    }
}

/// Write an executable shell stub.
#[cfg(unix)]
pub fn write_exec(path: &Path, content: &str) {
    use std::os::unix::fs::PermissionsExt;
    std::fs::write(path, content).expect("write stub");
    let mut perms = std::fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms).unwrap();
}
