//! Local/remote asset locations.

use std::fmt;
use std::path::Path;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::{fileio, httpx};

/// A local file path or a remote URL.
///
/// The local/remote tag is decided once, when the value is parsed, and
/// carried along from then on. It is never re-inferred from the string
/// shape downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetPath {
    Local(String),
    Remote(String),
}

impl AssetPath {
    /// Tags a raw value as local or remote. URL-like values and values
    /// based on the `{repository}` placeholder are remote.
    pub fn parse(value: &str) -> Self {
        if httpx::is_url(value) || value.starts_with("{repository}") {
            AssetPath::Remote(value.to_string())
        } else {
            AssetPath::Local(value.to_string())
        }
    }

    pub fn value(&self) -> &str {
        match self {
            AssetPath::Local(v) | AssetPath::Remote(v) => v,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, AssetPath::Remote(_))
    }

    /// Replaces the inner value, keeping the tag.
    pub(crate) fn set_value(&mut self, value: String) {
        match self {
            AssetPath::Local(v) | AssetPath::Remote(v) => *v = value,
        }
    }

    /// Appends a filename to the path.
    pub fn join(&self, file_name: &str) -> AssetPath {
        match self {
            AssetPath::Remote(v) => {
                AssetPath::Remote(format!("{}/{}", v.trim_end_matches('/'), file_name))
            }
            AssetPath::Local(v) => {
                let joined = Path::new(v).join(file_name);
                AssetPath::Local(joined.to_string_lossy().into_owned())
            }
        }
    }

    /// Checks if the asset actually exists at the said path.
    pub fn exists(&self) -> bool {
        match self {
            AssetPath::Remote(v) => httpx::exists(v),
            AssetPath::Local(v) => fileio::exists(Path::new(v)),
        }
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

// Spec documents store the path as a plain string; the tag is derived
// on deserialization.
impl Serialize for AssetPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.value())
    }
}

impl<'de> Deserialize<'de> for AssetPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(AssetPath::parse(&value))
    }
}

// Allows `#[serde(default)]` on optional asset paths in older specs.
impl Default for AssetPath {
    fn default() -> Self {
        AssetPath::Local(String::new())
    }
}
