//! Flat mutation configuration
//!
//! Settings are held as a flat `dotted.key -> value` map. The built-in
//! defaults ship as an embedded TOML document, are flattened once and cached
//! for the whole process. User files are layered on top key by key, so a file
//! only has to mention what it changes.

use crate::error::{ConfigError, ConfigResult};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

const DEFAULTS_TOML: &str = include_str!("defaults.toml");

static DEFAULTS: Lazy<ConfigResult<Properties>> = Lazy::new(|| Properties::parse(DEFAULTS_TOML));

/// Flattened configuration values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    entries: BTreeMap<String, toml::Value>,
}

impl Properties {
    /// Create empty property set
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Built-in defaults
    ///
    /// # Errors
    /// Only fails if the embedded document is broken.
    pub fn defaults() -> ConfigResult<Self> {
        DEFAULTS.as_ref().map(Clone::clone).map_err(Clone::clone)
    }

    /// Parse a TOML document into a flat property set
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for malformed TOML.
    pub fn parse(document: &str) -> ConfigResult<Self> {
        let table: toml::Table =
            toml::from_str(document).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut entries = BTreeMap::new();
        flatten_into(&mut entries, String::new(), table);
        Ok(Self { entries })
    }

    /// Defaults overlaid with the given TOML file
    ///
    /// # Errors
    /// Fails if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let mut properties = Self::defaults()?;
        properties.overlay(Self::parse(&document)?);
        Ok(properties)
    }

    /// Layer `other` on top of this set, replacing matching keys
    pub fn overlay(&mut self, other: Properties) {
        self.entries.extend(other.entries);
    }

    /// Set a single key
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<toml::Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Builder-style [`set`](Self::set)
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<toml::Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Raw value lookup
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&toml::Value> {
        self.entries.get(key)
    }

    /// Number of keys
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no key is set
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value for `key`, or [`ConfigError::MissingKey`]
    ///
    /// # Errors
    /// Fails when the key is absent.
    pub fn require(&self, key: &str) -> ConfigResult<&toml::Value> {
        self.get(key)
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
    }

    /// Boolean value; accepts `true`/`false` strings too
    ///
    /// # Errors
    /// Fails when absent or not a boolean.
    pub fn flag(&self, key: &str) -> ConfigResult<bool> {
        match self.require(key)? {
            toml::Value::Boolean(b) => Ok(*b),
            other => self.parse_scalar(key, other),
        }
    }

    /// Parse any scalar value through [`FromStr`]
    ///
    /// # Errors
    /// Fails when absent, not a scalar, or unparseable as `T`.
    pub fn value<T>(&self, key: &str) -> ConfigResult<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.parse_scalar(key, self.require(key)?)
    }

    /// Float value; integers are widened
    ///
    /// # Errors
    /// Fails when absent or not numeric.
    pub fn float(&self, key: &str) -> ConfigResult<f64> {
        match self.require(key)? {
            toml::Value::Float(f) => Ok(*f),
            #[allow(clippy::cast_precision_loss)]
            toml::Value::Integer(i) => Ok(*i as f64),
            other => self.parse_scalar(key, other),
        }
    }

    /// Integer value
    ///
    /// # Errors
    /// Fails when absent or not an integer.
    pub fn integer(&self, key: &str) -> ConfigResult<i64> {
        match self.require(key)? {
            toml::Value::Integer(i) => Ok(*i),
            other => self.parse_scalar(key, other),
        }
    }

    /// List value, each element rendered as a string
    ///
    /// A plain string is accepted as a comma-separated list.
    ///
    /// # Errors
    /// Fails when absent or not a list.
    pub fn list(&self, key: &str) -> ConfigResult<Vec<String>> {
        match self.require(key)? {
            toml::Value::Array(items) => Ok(items.iter().map(scalar_text).collect()),
            toml::Value::String(s) => Ok(s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()),
            other => Err(ConfigError::invalid(
                key,
                format!("expected a list, got {}", other.type_str()),
            )),
        }
    }

    /// Keys under the given dotted prefix
    pub fn keys_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .keys()
            .filter(move |k| k.starts_with(prefix))
            .map(String::as_str)
    }

    fn parse_scalar<T>(&self, key: &str, value: &toml::Value) -> ConfigResult<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        if matches!(value, toml::Value::Array(_) | toml::Value::Table(_)) {
            return Err(ConfigError::invalid(
                key,
                format!("expected a scalar, got {}", value.type_str()),
            ));
        }
        scalar_text(value)
            .parse()
            .map_err(|e: T::Err| ConfigError::invalid(key, e.to_string()))
    }
}

fn scalar_text(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn flatten_into(out: &mut BTreeMap<String, toml::Value>, prefix: String, table: toml::Table) {
    for (key, value) in table {
        let full = if prefix.is_empty() {
            key
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            toml::Value::Table(inner) => flatten_into(out, full, inner),
            leaf => {
                out.insert(full, leaf);
            }
        }
    }
}

/// View of the properties under one dotted prefix
#[derive(Debug, Clone)]
pub struct Section<'a> {
    properties: &'a Properties,
    prefix: String,
}

impl<'a> Section<'a> {
    /// Create section view
    #[inline]
    #[must_use]
    pub fn new(properties: &'a Properties, prefix: impl Into<String>) -> Self {
        Self {
            properties,
            prefix: prefix.into(),
        }
    }

    /// Dotted prefix of this section
    #[inline]
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Nested section `<prefix>.<name>`
    #[inline]
    #[must_use]
    pub fn child(&self, name: &str) -> Section<'a> {
        Section::new(self.properties, self.key(name))
    }

    /// True when the key exists
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.properties.get(&self.key(name)).is_some()
    }

    /// Full key for a name relative to this section
    #[inline]
    #[must_use]
    pub fn key(&self, name: &str) -> String {
        format!("{}.{name}", self.prefix)
    }

    /// Boolean under this section
    ///
    /// # Errors
    /// See [`Properties::flag`].
    pub fn flag(&self, name: &str) -> ConfigResult<bool> {
        self.properties.flag(&self.key(name))
    }

    /// Float under this section
    ///
    /// # Errors
    /// See [`Properties::float`].
    pub fn float(&self, name: &str) -> ConfigResult<f64> {
        self.properties.float(&self.key(name))
    }

    /// Float under this section, or `default` when absent
    ///
    /// # Errors
    /// Fails when present but not numeric.
    pub fn float_or(&self, name: &str, default: f64) -> ConfigResult<f64> {
        if self.contains(name) {
            self.float(name)
        } else {
            Ok(default)
        }
    }

    /// Integer under this section
    ///
    /// # Errors
    /// See [`Properties::integer`].
    pub fn integer(&self, name: &str) -> ConfigResult<i64> {
        self.properties.integer(&self.key(name))
    }

    /// String under this section
    ///
    /// # Errors
    /// Fails when absent or not a scalar.
    pub fn string(&self, name: &str) -> ConfigResult<String> {
        self.properties.value(&self.key(name))
    }

    /// List under this section
    ///
    /// # Errors
    /// See [`Properties::list`].
    pub fn list(&self, name: &str) -> ConfigResult<Vec<String>> {
        self.properties.list(&self.key(name))
    }

    /// Inclusive non-negative `[min, max]` count range
    ///
    /// # Errors
    /// Fails when either bound is missing, negative, or `min > max`.
    pub fn count_range(&self, min: &str, max: &str) -> ConfigResult<(usize, usize)> {
        let lo = self.count(min)?;
        let hi = self.count(max)?;
        if lo > hi {
            return Err(ConfigError::invalid(
                self.key(min),
                format!("{lo} is greater than {} ({hi})", self.key(max)),
            ));
        }
        Ok((lo, hi))
    }

    fn count(&self, name: &str) -> ConfigResult<usize> {
        let raw = self.integer(name)?;
        usize::try_from(raw)
            .map_err(|_| ConfigError::invalid(self.key(name), format!("{raw} is negative")))
    }
}
