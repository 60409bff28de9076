//! Configuration option store with scoped overlays.
//!
//! Options are keyed by dotted names (`pp.colors`, `tactic.try_for_ms`) and
//! hold typed values. An [`Options`] value is an immutable stack of layers:
//! `push` returns a new store whose top layer shadows, but does not destroy,
//! the values below it, and `pop` returns the store as it was before the
//! matching `push`. Because every operation returns a new value, concurrent
//! tactic branches can each hold their own view without locking.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::kernel::Name;

/// A typed option value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Unsigned(u64),
    Int(i64),
    Double(f64),
    String(String),
}

impl OptionValue {
    /// The value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The value as an unsigned integer, if it is a non-negative integer.
    pub fn as_unsigned(&self) -> Option<u64> {
        match self {
            Self::Unsigned(n) => Some(*n),
            Self::Int(n) => u64::try_from(*n).ok(),
            _ => None,
        }
    }

    /// The value as a signed integer, if it is an integer that fits.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Unsigned(n) => i64::try_from(*n).ok(),
            _ => None,
        }
    }

    /// The value as a float; integers are widened.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(x) => Some(*x),
            Self::Int(n) => Some(*n as f64),
            Self::Unsigned(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// The value as a string slice, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    fn from_json(key: &str, value: &Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::String(s) => Ok(Self::String(s.clone())),
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Ok(Self::Unsigned(u))
                } else if let Some(i) = n.as_i64() {
                    Ok(Self::Int(i))
                } else {
                    n.as_f64()
                        .map(Self::Double)
                        .ok_or_else(|| {
                            Error::config(format!("option '{key}' has an invalid number"))
                        })
                }
            }
            other => Err(Error::config(format!(
                "option '{key}' must be a boolean, number or string, got {other}"
            ))),
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Unsigned(n) => write!(f, "{n}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Double(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<u64> for OptionValue {
    fn from(value: u64) -> Self {
        Self::Unsigned(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

type Layer = BTreeMap<Name, OptionValue>;

/// Stack of option layers; lookups search from the top down.
#[derive(Debug, Clone, Default)]
pub struct Options {
    layers: Vec<Arc<Layer>>,
}

impl Options {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding a single option.
    pub fn single(key: impl Into<Name>, value: impl Into<OptionValue>) -> Self {
        Self::new().set(key, value)
    }

    /// Return a store with `key` set in the top layer.
    pub fn set(&self, key: impl Into<Name>, value: impl Into<OptionValue>) -> Self {
        let mut layers = self.layers.clone();
        match layers.last_mut() {
            Some(top) => {
                Arc::make_mut(top).insert(key.into(), value.into());
            }
            None => {
                let mut layer = Layer::new();
                layer.insert(key.into(), value.into());
                layers.push(Arc::new(layer));
            }
        }
        Self { layers }
    }

    /// Return a store with `overrides` pushed as a new top layer.
    pub fn push(&self, overrides: &Options) -> Self {
        let mut layers = self.layers.clone();
        layers.push(Arc::new(overrides.flatten()));
        Self { layers }
    }

    /// Return the store without its top layer.
    pub fn pop(&self) -> Self {
        let mut layers = self.layers.clone();
        layers.pop();
        Self { layers }
    }

    /// Number of layers.
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    /// Current value of `key`, looking through the layers from the top.
    pub fn get(&self, key: &Name) -> Option<&OptionValue> {
        self.layers.iter().rev().find_map(|layer| layer.get(key))
    }

    /// Boolean option with a default.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(&Name::new(key))
            .and_then(OptionValue::as_bool)
            .unwrap_or(default)
    }

    /// Unsigned option with a default.
    pub fn get_unsigned(&self, key: &str, default: u64) -> u64 {
        self.get(&Name::new(key))
            .and_then(OptionValue::as_unsigned)
            .unwrap_or(default)
    }

    /// Signed integer option with a default.
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        self.get(&Name::new(key))
            .and_then(OptionValue::as_int)
            .unwrap_or(default)
    }

    /// Floating-point option with a default.
    pub fn get_double(&self, key: &str, default: f64) -> f64 {
        self.get(&Name::new(key))
            .and_then(OptionValue::as_double)
            .unwrap_or(default)
    }

    /// String option with a default.
    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.get(&Name::new(key))
            .and_then(OptionValue::as_str)
            .unwrap_or(default)
            .to_string()
    }

    /// Whether no option is set in any layer.
    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(|layer| layer.is_empty())
    }

    /// Visible options with shadowed values removed.
    pub fn flatten(&self) -> BTreeMap<Name, OptionValue> {
        let mut flat = BTreeMap::new();
        for layer in &self.layers {
            for (key, value) in layer.iter() {
                flat.insert(key.clone(), value.clone());
            }
        }
        flat
    }

    /// Parse a JSON object of options; nested objects become dotted names.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json_value(&value)
    }

    /// Build options from an already parsed JSON object.
    pub fn from_json_value(value: &Value) -> Result<Self> {
        let Value::Object(_) = value else {
            return Err(Error::config("options must be a JSON object"));
        };
        let mut layer = Layer::new();
        flatten_json("", value, &mut layer)?;
        Ok(Self {
            layers: vec![Arc::new(layer)],
        })
    }
}

fn flatten_json(prefix: &str, value: &Value, out: &mut Layer) -> Result<()> {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let name = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_json(&name, child, out)?;
            }
            Ok(())
        }
        leaf => {
            out.insert(Name::new(prefix), OptionValue::from_json(prefix, leaf)?);
            Ok(())
        }
    }
}

impl PartialEq for Options {
    fn eq(&self, other: &Self) -> bool {
        self.flatten() == other.flatten()
    }
}

impl Serialize for Options {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.flatten())
    }
}

impl fmt::Display for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (index, (key, value)) in self.flatten().iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key} {value}")?;
        }
        f.write_str(")")
    }
}
