#![forbid(unsafe_code)]

//! Raw field values and the per-form value map.
//!
//! Values are stored exactly as the renderer hands them over. Typing and
//! coercion (numeric strings, `"true"`/`"false"`) happen in the schema
//! compiler, never here.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// FileHandle
// ---------------------------------------------------------------------------

/// Metadata for a file chosen in a `file` field.
///
/// The handle never holds file contents; previews read them through a
/// host-supplied source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileHandle {
    /// File name including its extension.
    pub name: String,
    /// MIME type as reported by the host (may be empty).
    #[serde(rename = "type", default)]
    pub mime: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
}

impl FileHandle {
    /// Create a new file handle.
    #[must_use]
    pub fn new(name: impl Into<String>, mime: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            size,
        }
    }

    /// Whether the MIME type is in the `image/` category.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

// ---------------------------------------------------------------------------
// FieldValue
// ---------------------------------------------------------------------------

/// The current raw value of one field.
///
/// Deserializes from plain JSON: `null`, booleans, numbers, strings, string
/// arrays, and file objects (`{"name", "type", "size"}`) or arrays of them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// No value (never set, or cleared).
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
    File(FileHandle),
    Files(Vec<FileHandle>),
}

impl FieldValue {
    /// Whether the value counts as "not provided".
    ///
    /// Empty text, empty lists and empty file lists are blank. Whitespace
    /// counts as content. Booleans and numbers are never blank.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Files(files) => files.is_empty(),
            Self::Bool(_) | Self::Number(_) | Self::File(_) => false,
        }
    }

    /// Short name of the variant, for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::File(_) => "file",
            Self::Files(_) => "files",
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// All file handles held by the value (a single file yields one entry).
    #[must_use]
    pub fn files(&self) -> Vec<&FileHandle> {
        match self {
            Self::File(file) => vec![file],
            Self::Files(files) => files.iter().collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::List(items) => f.write_str(&items.join(", ")),
            Self::File(file) => f.write_str(&file.name),
            Self::Files(files) => {
                let names: Vec<&str> = files.iter().map(|file| file.name.as_str()).collect();
                f.write_str(&names.join(", "))
            }
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(value: Vec<&str>) -> Self {
        Self::List(value.into_iter().map(str::to_string).collect())
    }
}

impl From<FileHandle> for FieldValue {
    fn from(value: FileHandle) -> Self {
        Self::File(value)
    }
}

impl From<Vec<FileHandle>> for FieldValue {
    fn from(value: Vec<FileHandle>) -> Self {
        Self::Files(value)
    }
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

static EMPTY: FieldValue = FieldValue::Empty;

/// Field name → current raw value.
///
/// Ordered by name so that iteration, serialization and error reporting are
/// deterministic.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(BTreeMap<String, FieldValue>);

impl Values {
    /// Create an empty value map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for `name`, or [`FieldValue::Empty`] when unset.
    #[must_use]
    pub fn get(&self, name: &str) -> &FieldValue {
        self.0.get(name).unwrap_or(&EMPTY)
    }

    /// Whether a value has been recorded for `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Set a value, returning the previous one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.0.insert(name.into(), value.into())
    }

    /// Remove a value.
    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.0.remove(name)
    }

    /// Iterate `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate field names in name order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A copy holding only the entries whose names pass `keep`.
    #[must_use]
    pub fn retain_names(&self, mut keep: impl FnMut(&str) -> bool) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(k, _)| keep(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// A copy of `self` with every entry of `overrides` applied on top.
    #[must_use]
    pub fn merged_with(&self, overrides: &Values) -> Self {
        let mut merged = self.clone();
        for (name, value) in &overrides.0 {
            merged.0.insert(name.clone(), value.clone());
        }
        merged
    }

    /// Render as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl<K, V> FromIterator<(K, V)> for Values
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
