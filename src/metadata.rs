//! The `meta` values viash hands to a component's tests.
//!
//! A test either builds the mapping itself ([`InvocationMetadata::from_map`])
//! or picks up the `VIASH_META_*` variables exported by `viash test`
//! ([`InvocationMetadata::from_env`]).

use std::path::PathBuf;

use serde_json::{Map, Number, Value};

use crate::config::limits::MEMORY_NOT_SPECIFIED;
use crate::config::paths::ENV_META_PREFIX;
use crate::error::{HarnessError, Result};
use crate::resources::{MemoryUnit, MemoryValue, ResourceSpec};

pub const KEY_EXECUTABLE: &str = "executable";
pub const KEY_CONFIG: &str = "config";
pub const KEY_CPUS: &str = "cpus";

/// Externally supplied metadata for one test context.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationMetadata {
    origin: String,
    values: Map<String, Value>,
}

impl InvocationMetadata {
    /// `origin` names where the values came from (usually the test module) and
    /// shows up in lookup errors.
    pub fn from_map(origin: impl Into<String>, values: Map<String, Value>) -> Self {
        Self {
            origin: origin.into(),
            values,
        }
    }

    /// Collect every `VIASH_META_<KEY>` variable as `<key>`.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    pub(crate) fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Result<Self> {
        let mut values = Map::new();
        for (name, raw) in vars {
            let Some(key) = name.strip_prefix(ENV_META_PREFIX) else {
                continue;
            };
            let key = key.to_ascii_lowercase();
            let raw = raw.trim();
            if key.is_empty() || raw.is_empty() {
                continue;
            }
            let value = typed_env_value(&key, raw)?;
            values.insert(key, value);
        }
        Ok(Self::from_map("environment", values))
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key).filter(|v| !v.is_null())
    }

    fn require_str(&self, key: &str) -> Result<&str> {
        match self.get(key) {
            None => Err(HarnessError::MissingMetadata {
                key: key.to_string(),
                origin: self.origin.clone(),
            }),
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(self.invalid(key, format!("expected a path, got {other}"))),
        }
    }

    fn invalid(&self, key: &str, detail: String) -> HarnessError {
        HarnessError::InvalidMetadata {
            key: key.to_string(),
            origin: self.origin.clone(),
            detail,
        }
    }

    /// Path of the built component executable.
    pub fn executable(&self) -> Result<PathBuf> {
        self.require_str(KEY_EXECUTABLE).map(PathBuf::from)
    }

    /// Path of the descriptor the test was started with.
    pub fn config_path(&self) -> Result<PathBuf> {
        self.require_str(KEY_CONFIG).map(PathBuf::from)
    }

    /// Number of CPUs, when limited. Must be a positive integer.
    pub fn cpus(&self) -> Result<Option<u32>> {
        match self.get(KEY_CPUS) {
            None => Ok(None),
            Some(Value::String(s)) if s.trim() == MEMORY_NOT_SPECIFIED => Ok(None),
            Some(Value::Number(n)) => n
                .as_u64()
                .filter(|v| *v > 0)
                .and_then(|v| u32::try_from(v).ok())
                .map(Some)
                .ok_or_else(|| {
                    self.invalid(KEY_CPUS, format!("expected a positive integer, got {n}"))
                }),
            Some(other) => Err(self.invalid(
                KEY_CPUS,
                format!("expected a positive integer, got {other}"),
            )),
        }
    }

    /// Memory values present in the metadata, smallest unit first.
    pub fn memory_values(&self) -> Result<Vec<(MemoryUnit, MemoryValue)>> {
        let mut out = Vec::new();
        for unit in MemoryUnit::ALL {
            let field = unit.field();
            if let Some(value) = self.get(&field) {
                if let Some(parsed) = MemoryValue::from_json(&field, value)? {
                    out.push((unit, parsed));
                }
            }
        }
        Ok(out)
    }

    /// CPU and memory limits with memory collapsed to bytes.
    pub fn resources(&self) -> Result<ResourceSpec> {
        ResourceSpec::new(self.cpus()?, &self.memory_values()?)
    }
}

fn typed_env_value(key: &str, raw: &str) -> Result<Value> {
    if key == KEY_CPUS {
        return Ok(match raw.parse::<u64>() {
            Ok(v) => Value::Number(Number::from(v)),
            Err(_) => Value::String(raw.to_string()),
        });
    }
    if let Some(unit) = MemoryUnit::ALL.iter().find(|u| u.field() == key) {
        return Ok(match MemoryValue::parse(&unit.field(), raw)? {
            MemoryValue::Int(v) => Value::Number(Number::from(v)),
            MemoryValue::Float(v) => Number::from_f64(v)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(raw.to_string())),
            MemoryValue::NotSpecified => Value::String(MEMORY_NOT_SPECIFIED.to_string()),
        });
    }
    Ok(Value::String(raw.to_string()))
}
