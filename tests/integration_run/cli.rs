use std::path::Path;
use std::process::{Command, Output};

use tempfile::tempdir;
use viash_harness::config::errors::{ERR_CLI_METADATA, ERR_CLI_USAGE};

use super::support::{configs, fake_viash, read_calls, write_exec};

fn vsh_run(envs: &[(&str, &Path)], args: &[&str]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_vsh-run"));
    cmd.args(args)
        .env_remove("RUST_LOG")
        .env_remove("VIASH_META_EXECUTABLE")
        .env_remove("VIASH_META_CONFIG");
    for (key, value) in envs {
        cmd.env(key, value);
    }
    cmd.output().expect("spawn vsh-run")
}

fn meta<'a>(executable: &'a Path, config: &'a Path) -> [(&'static str, &'a Path); 2] {
    [
        ("VIASH_META_EXECUTABLE", executable),
        ("VIASH_META_CONFIG", config),
    ]
}

#[test]
fn runs_a_built_component_from_meta_variables() {
    let dir = tempdir().unwrap();
    let (_, built) = configs(&dir);
    let exe = dir.path().join("foo");
    write_exec(&exe, "#!/bin/sh\necho \"args: $*\"\n");

    let out = vsh_run(&meta(&exe, &built), &["--", "bar", "--flag"]);
    assert!(
        out.status.success(),
        "{}",
        String::from_utf8_lossy(&out.stderr)
    );
    assert_eq!(out.stdout, b"args: bar --flag\n");
}

#[test]
fn tool_flag_selects_viash() {
    let dir = tempdir().unwrap();
    let (source, _) = configs(&dir);
    let (tool, log) = fake_viash(dir.path(), "0.9.1");
    let exe = dir.path().join("foo");

    let out = vsh_run(
        &meta(&exe, &source),
        &["--tool", tool.to_str().unwrap(), "--engine", "native", "--", "bar"],
    );
    assert!(
        out.status.success(),
        "{}",
        String::from_utf8_lossy(&out.stderr)
    );
    assert_eq!(out.stdout, b"component ran\n");
    let calls = read_calls(&log);
    assert_eq!(calls.len(), 1);
    assert!(calls[0].contains("--engine native"));
}

#[test]
fn failing_component_exits_non_zero_with_its_output() {
    let dir = tempdir().unwrap();
    let (_, built) = configs(&dir);
    let exe = dir.path().join("foo");
    write_exec(&exe, "#!/bin/sh\necho 'This script should fail'\nexit 1\n");

    let out = vsh_run(&meta(&exe, &built), &["--", "bar"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("This script should fail"), "{stderr}");
}

#[test]
fn missing_metadata_is_reported() {
    let out = vsh_run(&[], &["--", "bar"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains(ERR_CLI_METADATA), "{stderr}");
    assert!(
        stderr.contains("could not find 'executable' key"),
        "{stderr}"
    );
}

#[test]
fn unexpected_flags_are_usage_errors() {
    let dir = tempdir().unwrap();
    let (_, built) = configs(&dir);
    let exe = dir.path().join("foo");
    write_exec(&exe, "#!/bin/sh\necho 'should not run'\n");

    let out = vsh_run(&meta(&exe, &built), &["--verbose", "bar"]);
    assert!(!out.status.success());
    assert!(out.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains(&format!("{ERR_CLI_USAGE}: unexpected flag '--verbose'")),
        "{stderr}"
    );

    let out = vsh_run(&meta(&exe, &built), &["--engine"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains(&format!("{ERR_CLI_USAGE}: --engine expects a name")),
        "{stderr}"
    );
}

#[test]
fn engine_and_platform_together_are_rejected() {
    let dir = tempdir().unwrap();
    let (_, built) = configs(&dir);
    let exe = dir.path().join("foo");
    let out = vsh_run(
        &meta(&exe, &built),
        &["--engine", "docker", "--platform", "docker", "--", "bar"],
    );
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("E-VSH-0400"));
}
