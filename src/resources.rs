//! CPU and memory limits handed to a component.
//!
//! Memory can arrive in up to six units at once (`memory_b` … `memory_pb`).
//! They are collapsed into a single byte count here.

use std::fmt;

use serde_json::Value;

use crate::config::limits::{MEMORY_NOT_SPECIFIED, MEMORY_UNIT_STEP};
use crate::error::{HarnessError, Result};

/// Memory units, smallest first. Each is 1024 times the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MemoryUnit {
    B,
    Kb,
    Mb,
    Gb,
    Tb,
    Pb,
}

impl MemoryUnit {
    pub const ALL: [MemoryUnit; 6] = [
        MemoryUnit::B,
        MemoryUnit::Kb,
        MemoryUnit::Mb,
        MemoryUnit::Gb,
        MemoryUnit::Tb,
        MemoryUnit::Pb,
    ];

    pub fn suffix(self) -> &'static str {
        match self {
            MemoryUnit::B => "b",
            MemoryUnit::Kb => "kb",
            MemoryUnit::Mb => "mb",
            MemoryUnit::Gb => "gb",
            MemoryUnit::Tb => "tb",
            MemoryUnit::Pb => "pb",
        }
    }

    /// Metadata key holding a value in this unit, e.g. `memory_gb`.
    pub fn field(self) -> String {
        format!("memory_{}", self.suffix())
    }

    /// Distance from bytes.
    pub fn exponent(self) -> u32 {
        self as u32
    }

    pub fn multiplier(self) -> u64 {
        MEMORY_UNIT_STEP.pow(self.exponent())
    }
}

impl fmt::Display for MemoryUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.field())
    }
}

/// A raw memory value as supplied by metadata or a caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MemoryValue {
    Int(u64),
    Float(f64),
    /// The literal `"not specified"`; behaves like an absent value.
    NotSpecified,
}

impl MemoryValue {
    /// Interpret a metadata value. `null` means absent.
    pub fn from_json(field: &str, value: &Value) -> Result<Option<Self>> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) if s.trim() == MEMORY_NOT_SPECIFIED => {
                Ok(Some(MemoryValue::NotSpecified))
            }
            Value::Number(n) => {
                if let Some(v) = n.as_u64() {
                    Ok(Some(MemoryValue::Int(v)))
                } else if n.is_i64() {
                    Err(invalid(field, format!("{n} is negative")))
                } else {
                    n.as_f64()
                        .map(|v| Some(MemoryValue::Float(v)))
                        .ok_or_else(|| invalid(field, format!("{n} is not representable")))
                }
            }
            other => Err(invalid(
                field,
                format!("expected an integer or a float, got {other}"),
            )),
        }
    }

    /// Interpret a textual value, e.g. from an environment variable.
    pub fn parse(field: &str, raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw == MEMORY_NOT_SPECIFIED {
            return Ok(MemoryValue::NotSpecified);
        }
        if let Ok(v) = raw.parse::<u64>() {
            return Ok(MemoryValue::Int(v));
        }
        match raw.parse::<f64>() {
            Ok(v) => Ok(MemoryValue::Float(v)),
            Err(_) => Err(invalid(
                field,
                format!("expected an integer or a float, got '{raw}'"),
            )),
        }
    }

    /// Byte count for this value in `unit`; `None` for the sentinel.
    pub fn to_bytes(self, unit: MemoryUnit) -> Result<Option<u64>> {
        let field = unit.field();
        match self {
            MemoryValue::NotSpecified => Ok(None),
            MemoryValue::Int(v) => v
                .checked_mul(unit.multiplier())
                .map(Some)
                .ok_or_else(|| invalid(&field, format!("{v} overflows a byte count"))),
            MemoryValue::Float(v) => {
                if !v.is_finite() || v < 0.0 {
                    return Err(invalid(&field, format!("{v} is not a non-negative number")));
                }
                let bytes = v * unit.multiplier() as f64;
                if bytes >= u64::MAX as f64 {
                    return Err(invalid(&field, format!("{v} overflows a byte count")));
                }
                // Fractional bytes are truncated.
                Ok(Some(bytes as u64))
            }
        }
    }
}

impl fmt::Display for MemoryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryValue::Int(v) => write!(f, "{v}"),
            MemoryValue::Float(v) => write!(f, "{v}"),
            MemoryValue::NotSpecified => f.write_str(MEMORY_NOT_SPECIFIED),
        }
    }
}

fn invalid(field: &str, detail: String) -> HarnessError {
    HarnessError::InvalidMemory {
        field: field.to_string(),
        detail,
    }
}

/// Collapse memory values given in several units into one byte count.
///
/// Every value is validated before anything is compared. When the present
/// values disagree, a single warning is logged and the value in the smallest
/// unit wins.
pub fn normalize_memory(values: &[(MemoryUnit, MemoryValue)]) -> Result<Option<u64>> {
    let mut present: Vec<(MemoryUnit, MemoryValue, u64)> = Vec::with_capacity(values.len());
    for (unit, value) in values {
        if let Some(bytes) = value.to_bytes(*unit)? {
            present.push((*unit, *value, bytes));
        }
    }
    // Stable: when a unit shows up twice the first occurrence wins.
    present.sort_by_key(|(unit, _, _)| *unit);

    let Some(&(chosen_unit, _, chosen)) = present.first() else {
        return Ok(None);
    };
    if present.iter().any(|(_, _, bytes)| *bytes != chosen) {
        let supplied = present
            .iter()
            .map(|(unit, value, _)| format!("{unit}={value}"))
            .collect::<Vec<_>>()
            .join(", ");
        tracing::warn!(
            target: "viash_harness",
            supplied = %supplied,
            chosen = %chosen_unit,
            bytes = chosen,
            "Different values were defined for the memory limit, \
             choosing the one with the smallest unit"
        );
    }
    Ok(Some(chosen))
}

/// Normalized resource limits for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceSpec {
    pub cpus: Option<u32>,
    pub memory_bytes: Option<u64>,
}

impl ResourceSpec {
    pub fn new(cpus: Option<u32>, memory: &[(MemoryUnit, MemoryValue)]) -> Result<Self> {
        Ok(Self {
            cpus,
            memory_bytes: normalize_memory(memory)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.cpus.is_none() && self.memory_bytes.is_none()
    }
}
