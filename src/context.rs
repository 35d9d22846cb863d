//! Everything a component test needs, derived from one set of metadata.

use std::path::{Path, PathBuf};

use crate::config::HarnessConfig;
use crate::descriptor::{read_descriptor, resolve_source_config_path, Descriptor};
use crate::error::Result;
use crate::metadata::InvocationMetadata;
use crate::resolver::ComponentRunner;

/// Metadata plus harness settings for a single test module.
#[derive(Debug, Clone)]
pub struct ComponentContext {
    metadata: InvocationMetadata,
    settings: HarnessConfig,
}

impl ComponentContext {
    pub fn new(metadata: InvocationMetadata, settings: HarnessConfig) -> Self {
        Self { metadata, settings }
    }

    /// Metadata from `VIASH_META_*`, settings from `VIASH_HARNESS_*`.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(
            InvocationMetadata::from_env()?,
            HarnessConfig::from_env(),
        ))
    }

    /// Point the context at a different build tool.
    pub fn with_tool(mut self, tool: impl Into<PathBuf>) -> Self {
        self.settings = self.settings.with_tool(tool);
        self
    }

    pub fn metadata(&self) -> &InvocationMetadata {
        &self.metadata
    }

    pub fn executable(&self) -> Result<PathBuf> {
        self.metadata.executable()
    }

    /// Location of the build tool.
    pub fn tool(&self) -> &Path {
        &self.settings.tool
    }

    pub fn meta_config_path(&self) -> Result<PathBuf> {
        self.metadata.config_path()
    }

    pub fn meta_config(&self) -> Result<Descriptor> {
        read_descriptor(&self.meta_config_path()?)
    }

    /// The user-authored descriptor behind `meta_config`.
    pub fn source_config_path(&self) -> Result<PathBuf> {
        let path = self.meta_config_path()?;
        let descriptor = read_descriptor(&path)?;
        Ok(resolve_source_config_path(&path, &descriptor))
    }

    pub fn source_config(&self) -> Result<Descriptor> {
        read_descriptor(&self.source_config_path()?)
    }

    pub fn runner(&self) -> Result<ComponentRunner> {
        ComponentRunner::from_metadata(&self.metadata, self.settings.clone())
    }
}
