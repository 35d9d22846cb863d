//! Loading viash component descriptors (`*.vsh.yaml`) and following a built
//! descriptor back to the source config it was generated from.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::config::paths::{BACK_REFERENCE_FIELD, BACK_REFERENCE_SECTIONS};
use crate::error::{HarnessError, Result};

/// Top-level mapping of a descriptor.
pub type Descriptor = Map<String, Value>;

/// Read and parse a descriptor. The file must hold a non-empty YAML map.
pub fn read_descriptor(path: &Path) -> Result<Descriptor> {
    if !path.is_file() {
        return Err(HarnessError::NotAFile {
            path: path.to_path_buf(),
        });
    }
    let raw = std::fs::read_to_string(path)
        .map_err(|e| HarnessError::io("failed to read", path, e))?;
    parse_descriptor(&raw, path)
}

fn parse_descriptor(raw: &str, path: &Path) -> Result<Descriptor> {
    let empty = || HarnessError::EmptyDescriptor {
        path: path.to_path_buf(),
    };
    if raw.trim().is_empty() {
        return Err(empty());
    }
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(raw).map_err(|source| HarnessError::DescriptorSyntax {
            path: path.to_path_buf(),
            source,
        })?;
    // Round-trip through JSON so the rest of the crate deals with one value type.
    let json = serde_json::to_value(yaml).map_err(|_| HarnessError::DescriptorNotMap {
        path: path.to_path_buf(),
    })?;
    match json {
        Value::Null => Err(empty()),
        Value::Object(map) if map.is_empty() => Err(empty()),
        Value::Object(map) => Ok(map),
        _ => Err(HarnessError::DescriptorNotMap {
            path: path.to_path_buf(),
        }),
    }
}

/// The source config a built descriptor points back to, if any.
///
/// viash >= 0.9 writes `build_info.config`, older releases `info.config`.
pub fn back_reference(descriptor: &Descriptor) -> Option<PathBuf> {
    BACK_REFERENCE_SECTIONS.iter().find_map(|section| {
        descriptor
            .get(*section)
            .and_then(|s| s.get(BACK_REFERENCE_FIELD))
            .and_then(Value::as_str)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
    })
}

/// Where the user-authored config for `descriptor_path` lives.
///
/// Without a back-reference the descriptor is its own source.
pub fn resolve_source_config_path(descriptor_path: &Path, descriptor: &Descriptor) -> PathBuf {
    back_reference(descriptor).unwrap_or_else(|| descriptor_path.to_path_buf())
}
