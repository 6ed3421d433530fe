//! Command-line options for the conversion process.
//!
//! Options are an opaque mapping from flag name to value. The names map 1:1
//! to wkhtmltopdf flags (`margin_top` becomes `--margin-top`); values are
//! never interpreted here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single option value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Flag(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        Self::Flag(b)
    }
}

impl From<i64> for OptionValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for OptionValue {
    fn from(i: i32) -> Self {
        Self::Int(i.into())
    }
}

impl From<f64> for OptionValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&std::path::Path> for OptionValue {
    fn from(p: &std::path::Path) -> Self {
        Self::Text(p.to_string_lossy().into_owned())
    }
}

/// Mapping of option name to value.
///
/// A `None` value means the option is present but carries nothing: it is
/// skipped when building arguments, yet still counts as set for
/// [`CmdOptions::set_default`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CmdOptions(BTreeMap<String, Option<OptionValue>>);

impl<'de> Deserialize<'de> for CmdOptions {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, Option<OptionValue>>::deserialize(deserializer)?;
        Ok(Self(raw.into_iter().map(|(k, v)| (normalize(&k), v)).collect()))
    }
}

/// Normalise an option name to its underscore form.
fn normalize(name: &str) -> String {
    name.trim_start_matches('-').replace('-', "_")
}

impl CmdOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option, replacing any previous value.
    pub fn set(&mut self, name: &str, value: impl Into<OptionValue>) {
        self.0.insert(normalize(name), Some(value.into()));
    }

    /// Mark an option as present without a value.
    pub fn set_none(&mut self, name: &str) {
        self.0.insert(normalize(name), None);
    }

    /// Set an option only if it is not already present.
    ///
    /// Returns `true` if the value was inserted.
    pub fn set_default(&mut self, name: &str, value: impl Into<OptionValue>) -> bool {
        let key = normalize(name);
        if self.0.contains_key(&key) {
            return false;
        }
        self.0.insert(key, Some(value.into()));
        true
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<OptionValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.0.get(&normalize(name)).and_then(Option::as_ref)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(&normalize(name))
    }

    pub fn remove(&mut self, name: &str) -> Option<Option<OptionValue>> {
        self.0.remove(&normalize(name))
    }

    /// Overlay `other` on top of these options; `other` wins on conflicts.
    pub fn merge(&mut self, other: &Self) {
        for (name, value) in &other.0 {
            self.0.insert(name.clone(), value.clone());
        }
    }

    /// Return a copy with `overrides` applied on top.
    #[must_use]
    pub fn merged(&self, overrides: &Self) -> Self {
        let mut merged = self.clone();
        merged.merge(overrides);
        merged
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&OptionValue>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    /// Convert to command-line arguments, sorted by option name.
    ///
    /// `None` and `false` are skipped, `true` emits only the flag, any other
    /// value emits the flag followed by the value.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.0.len() * 2);
        for (name, value) in &self.0 {
            match value {
                None | Some(OptionValue::Flag(false)) => {}
                Some(OptionValue::Flag(true)) => args.push(flag_name(name)),
                Some(value) => {
                    args.push(flag_name(name));
                    args.push(value.to_string());
                }
            }
        }
        args
    }

    /// Parse a `name=value` pair as given on a command line.
    ///
    /// A bare `name` is a flag. Values that look like integers or floats are
    /// kept as text since the process receives them as text anyway.
    pub fn parse_pair(pair: &str) -> (String, OptionValue) {
        match pair.split_once('=') {
            Some((name, value)) => (normalize(name), OptionValue::Text(value.to_string())),
            None => (normalize(pair), OptionValue::Flag(true)),
        }
    }
}

fn flag_name(name: &str) -> String {
    format!("--{}", name.replace('_', "-"))
}

impl<K: AsRef<str>, V: Into<OptionValue>> FromIterator<(K, V)> for CmdOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut options = Self::new();
        for (name, value) in iter {
            options.set(name.as_ref(), value);
        }
        options
    }
}
