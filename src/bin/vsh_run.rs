use std::{env, ffi::OsString, io::Write, path::PathBuf, process::ExitCode};

use anyhow::{anyhow, bail, Context, Result};
use viash_harness::config::errors::{ERR_CLI_METADATA, ERR_CLI_OUTPUT, ERR_CLI_USAGE};
use viash_harness::{init_tracing, ComponentContext, RunOptions};

fn main() -> ExitCode {
    init_tracing();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("vsh-run: {err:?}");
            ExitCode::FAILURE
        }
    }
}

struct Invocation {
    tool: Option<PathBuf>,
    options: RunOptions,
    args: Vec<OsString>,
}

fn run() -> Result<()> {
    let Some(invocation) = parse_args(env::args_os().skip(1).collect())? else {
        print_usage();
        return Ok(());
    };

    let mut context = ComponentContext::from_env().with_context(|| {
        format!("{ERR_CLI_METADATA}: failed to read component metadata from the environment")
    })?;
    if let Some(tool) = invocation.tool {
        context = context.with_tool(tool);
    }
    let runner = context.runner()?;
    let stdout = runner.run_with(invocation.args, &invocation.options)?;

    let mut out = std::io::stdout().lock();
    out.write_all(&stdout)
        .and_then(|()| out.flush())
        .with_context(|| format!("{ERR_CLI_OUTPUT}: failed to write component output"))?;
    Ok(())
}

/// `None` when help was requested.
fn parse_args(raw: Vec<OsString>) -> Result<Option<Invocation>> {
    let mut invocation = Invocation {
        tool: None,
        options: RunOptions::new(),
        args: Vec::new(),
    };
    let mut iter = raw.into_iter();
    while let Some(arg) = iter.next() {
        let flag = arg
            .to_str()
            .ok_or_else(|| anyhow!("{ERR_CLI_USAGE}: flag {arg:?} is not valid UTF-8"))?;
        match flag {
            "--" => {
                invocation.args.extend(iter);
                return Ok(Some(invocation));
            }
            "--help" | "-h" => return Ok(None),
            "--tool" => {
                let value = iter
                    .next()
                    .with_context(|| format!("{ERR_CLI_USAGE}: --tool expects a path"))?;
                invocation.tool = Some(PathBuf::from(value));
            }
            "--engine" => {
                invocation.options.engine = Some(string_value(iter.next(), "--engine")?);
            }
            "--platform" => {
                invocation.options.platform = Some(string_value(iter.next(), "--platform")?);
            }
            other => bail!(
                "{ERR_CLI_USAGE}: unexpected flag '{other}' (component arguments go after '--')"
            ),
        }
    }
    Ok(Some(invocation))
}

fn string_value(value: Option<OsString>, flag: &str) -> Result<String> {
    value
        .with_context(|| format!("{ERR_CLI_USAGE}: {flag} expects a name"))?
        .into_string()
        .map_err(|raw| anyhow!("{ERR_CLI_USAGE}: {flag} value {raw:?} is not valid UTF-8"))
}

fn print_usage() {
    eprintln!(
        "Usage: vsh-run [--tool PATH] [--engine NAME | --platform NAME] -- ARGS...\n\
         \n\
         Runs the component described by VIASH_META_EXECUTABLE and VIASH_META_CONFIG,\n\
         building it from source with viash when the source config is available.\n\
         Resource limits come from VIASH_META_CPUS and VIASH_META_MEMORY_*."
    );
}
