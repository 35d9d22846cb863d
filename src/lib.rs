pub mod archive;
pub mod command;
pub mod config;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod process;
pub mod redact;
pub mod resolver;
pub mod resources;
pub mod version;

pub use archive::extract_tar;
pub use command::{built_component_args, resource_flags, CommandBuilder, FlagPrefix};
pub use config::HarnessConfig;
pub use context::ComponentContext;
pub use descriptor::{back_reference, read_descriptor, resolve_source_config_path, Descriptor};
pub use error::{ComponentFailure, HarnessError, Result};
pub use logging::init_tracing;
pub use metadata::InvocationMetadata;
pub use process::{CommandRunner, ProcessError, StderrMode, SystemRunner};
pub use redact::ErrorRedactor;
pub use resolver::{ComponentRunner, InvocationMode, RunOptions};
pub use resources::{normalize_memory, MemoryUnit, MemoryValue, ResourceSpec};
pub use version::{
    probe_tool_version, requested_target, select_target, TargetRequest, ToolVersion, Vocabulary,
};

// Test support infrastructure (test_support/) is only compiled when running
// unit tests. It is excluded from release builds.
#[cfg(test)]
mod test_support;
