use std::error::Error as _;

use tempfile::tempdir;
use viash_harness::{ComponentRunner, HarnessConfig, HarnessError, StderrMode};

use super::support::{configs, meta, metadata, write_exec};

#[test]
fn calls_the_executable_with_triple_dash_resources() {
    let dir = tempdir().unwrap();
    let (_, built) = configs(&dir);
    let exe = dir.path().join("foo");
    write_exec(&exe, "#!/bin/sh\necho \"args: $*\"\n");
    let mut values = meta(&exe, &built);
    values["cpus"] = 2.into();
    values["memory_mb"] = "not specified".into();

    let runner = ComponentRunner::from_metadata(
        &metadata(values),
        HarnessConfig::default().with_tool(dir.path().join("unused-viash")),
    )
    .unwrap();
    assert_eq!(runner.run(["bar"]).unwrap(), b"args: bar ---cpus 2\n");
}

#[test]
fn failure_shows_component_output_only() {
    let dir = tempdir().unwrap();
    let (_, built) = configs(&dir);
    let exe = dir.path().join("foo");
    write_exec(
        &exe,
        "#!/bin/sh\necho 'RuntimeError: This script should fail' >&2\nexit 1\n",
    );
    let runner =
        ComponentRunner::from_metadata(&metadata(meta(&exe, &built)), HarnessConfig::default())
            .unwrap();

    let err = runner.run(["bar"]).unwrap_err();
    let failure = err.as_component_failure().expect("component failure");
    assert_eq!(failure.code(), Some(1));
    assert_eq!(
        err.to_string(),
        "E-VSH-0600: component exited with status 1\nRuntimeError: This script should fail"
    );
    assert!(err.source().is_none());
}

#[test]
fn discarded_stderr_is_not_reported() {
    let dir = tempdir().unwrap();
    let (_, built) = configs(&dir);
    let exe = dir.path().join("foo");
    write_exec(&exe, "#!/bin/sh\necho visible\necho hidden >&2\nexit 3\n");
    let runner = ComponentRunner::from_metadata(
        &metadata(meta(&exe, &built)),
        HarnessConfig::default().with_stderr(StderrMode::Discard),
    )
    .unwrap();

    let err = runner.run(Vec::<String>::new()).unwrap_err();
    let failure = err.as_component_failure().expect("component failure");
    assert_eq!(failure.output_text(), "visible");
}

#[test]
fn missing_executable_is_named() {
    let dir = tempdir().unwrap();
    let (_, built) = configs(&dir);
    let exe = dir.path().join("foo");
    let runner =
        ComponentRunner::from_metadata(&metadata(meta(&exe, &built)), HarnessConfig::default())
            .unwrap();
    let err = runner.run(["bar"]).unwrap_err();
    assert!(matches!(err, HarnessError::NotAFile { ref path } if *path == exe));
}
