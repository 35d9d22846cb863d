use tempfile::tempdir;
use viash_harness::{
    ComponentRunner, HarnessConfig, HarnessError, MemoryUnit, MemoryValue, RunOptions,
};

use super::support::{configs, fake_viash, meta, metadata, read_calls};

#[test]
fn docker_target_builds_before_running() {
    let dir = tempdir().unwrap();
    let (source, _) = configs(&dir);
    let (tool, log) = fake_viash(dir.path(), "0.8.2");
    let mut values = meta(&dir.path().join("foo"), &source);
    values["cpus"] = 2.into();
    values["memory_gb"] = 6.into();

    let runner = ComponentRunner::from_metadata(
        &metadata(values),
        HarnessConfig::default().with_tool(&tool),
    )
    .unwrap();
    let out = runner.run(["--input", "a.txt"]).unwrap();
    assert_eq!(out, b"component ran\n");

    let prefix = format!(
        "run {} --platform docker -c .platforms[.type == 'docker'].target_tag := 'test'",
        source.display()
    );
    assert_eq!(
        read_calls(&log),
        vec![
            format!("{prefix} -- ---setup cachedbuild"),
            format!("{prefix} --cpus 2 --memory 6442450944B -- --input a.txt"),
        ]
    );
}

#[test]
fn newer_viash_gets_engine_and_no_setup_off_docker() {
    let dir = tempdir().unwrap();
    let (source, _) = configs(&dir);
    let (tool, log) = fake_viash(dir.path(), "0.9.0");
    let runner = ComponentRunner::from_metadata(
        &metadata(meta(&dir.path().join("foo"), &source)),
        HarnessConfig::default()
            .with_tool(&tool)
            .with_default_target("native"),
    )
    .unwrap();

    let options = RunOptions::new().memory(MemoryUnit::Mb, MemoryValue::Int(512));
    runner.run_with(["bar"], &options).unwrap();
    let calls = read_calls(&log);
    assert_eq!(calls.len(), 1);
    assert!(calls[0].contains("--engine native"));
    assert!(calls[0].ends_with("--memory 536870912B -- bar"));
}

#[test]
fn old_viash_rejects_engine() {
    let dir = tempdir().unwrap();
    let (source, _) = configs(&dir);
    let (tool, log) = fake_viash(dir.path(), "0.8.2");
    let runner = ComponentRunner::from_metadata(
        &metadata(meta(&dir.path().join("foo"), &source)),
        HarnessConfig::default().with_tool(&tool),
    )
    .unwrap();

    let err = runner
        .run_with(["bar"], &RunOptions::new().engine("x"))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "E-VSH-0401: viash 0.8.2 expects 'platform' to be used instead of 'engine'."
    );
    assert!(read_calls(&log).is_empty());
}

#[test]
fn missing_viash_is_a_discovery_error() {
    let dir = tempdir().unwrap();
    let (source, _) = configs(&dir);
    let runner = ComponentRunner::from_metadata(
        &metadata(meta(&dir.path().join("foo"), &source)),
        HarnessConfig::default().with_tool(dir.path().join("no-such-viash")),
    )
    .unwrap();
    let err = runner.run(["bar"]).unwrap_err();
    assert!(matches!(err, HarnessError::ToolDiscovery { .. }));
    assert!(std::error::Error::source(&err).is_some());
}
