use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tempfile::TempDir;
use viash_harness::InvocationMetadata;

pub const DUMMY_CONFIG: &str =
    "functionality:\n  name: foo\n  description: This is a dummy config for testing\n";

pub fn write_exec(path: &Path, content: &str) {
    let mut f = fs::File::create(path).expect("create stub");
    f.write_all(content.as_bytes()).expect("write stub");
    drop(f);
    let mut perms = fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).unwrap();
}

/// A fake `viash` reporting `version` that appends each non-version call's
/// arguments to `calls.log` next to it.
pub fn fake_viash(dir: &Path, version: &str) -> (PathBuf, PathBuf) {
    let tool = dir.join("viash");
    let log = dir.join("calls.log");
    write_exec(
        &tool,
        &format!(
            "#!/bin/sh\n\
             if [ \"$1\" = \"--version\" ]; then\n\
             \x20 echo \"viash {version} (c) 2020 Data Intuitive\"\n\
             \x20 exit 0\n\
             fi\n\
             printf '%s\\n' \"$*\" >> '{log}'\n\
             echo \"component ran\"\n",
            log = log.display()
        ),
    );
    (tool, log)
}

pub fn read_calls(log: &Path) -> Vec<String> {
    fs::read_to_string(log)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

/// Source descriptor and a built descriptor whose back-reference is missing.
pub fn configs(dir: &TempDir) -> (PathBuf, PathBuf) {
    let source = dir.path().join("config.vsh.yaml");
    fs::write(&source, DUMMY_CONFIG).unwrap();
    let built = dir.path().join(".config.vsh.yaml");
    fs::write(
        &built,
        format!("{DUMMY_CONFIG}build_info:\n  config: /lorem/ipsum.vsh.yaml\n"),
    )
    .unwrap();
    (source, built)
}

pub fn metadata(value: Value) -> InvocationMetadata {
    let Value::Object(map) = value else {
        panic!("metadata must be an object");
    };
    InvocationMetadata::from_map("tests/integration_run.rs", map)
}

pub fn meta(executable: &Path, config: &Path) -> Value {
    json!({"executable": executable, "config": config})
}
