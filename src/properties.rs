use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::error::TilesetError;

/// A single typed custom property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// `bool`
    Bool(bool),
    /// `int` and `object` references
    I64(i64),
    /// `float`
    F32(f32),
    /// `string`, `file`, `color` and `class`
    String(String),
}

/// Custom properties keyed by name. Unknown keys read back as `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    values: HashMap<String, PropertyValue>,
}

impl Properties {
    /// Empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name`, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.values.insert(name.into(), value);
    }

    /// Raw value of `name`.
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.values.get(name)
    }

    /// `name` as a bool, `None` if absent or of another type.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// `name` as an integer.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            PropertyValue::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// `name` as an integer that fits `i32`.
    pub fn get_i32(&self, name: &str) -> Option<i32> {
        self.get_i64(name).and_then(|v| i32::try_from(v).ok())
    }

    /// `name` as a float.
    pub fn get_f32(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            PropertyValue::F32(v) => Some(*v),
            _ => None,
        }
    }

    /// `name` as a string.
    pub fn get_string(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            PropertyValue::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// `true` when no properties are set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Property entry as Tiled writes it: `{"name", "type", "value"}`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct JsonProperty {
    name: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    value: JsonValue,
}

impl JsonProperty {
    /// Typed value, or `None` when the JSON value does not match the
    /// declared type. `origin` names the file for error reporting.
    fn typed_value(&self, origin: &Path) -> Result<Option<PropertyValue>, TilesetError> {
        let v = &self.value;
        let kind = match self.kind.as_deref() {
            Some(kind) => kind,
            // untyped entries take the first JSON type that matches
            None => {
                return Ok(v
                    .as_bool()
                    .map(PropertyValue::Bool)
                    .or_else(|| v.as_i64().map(PropertyValue::I64))
                    .or_else(|| v.as_f64().map(|n| PropertyValue::F32(n as f32)))
                    .or_else(|| v.as_str().map(|s| PropertyValue::String(s.to_owned()))));
            }
        };
        Ok(match kind {
            "bool" => v.as_bool().map(PropertyValue::Bool),
            "int" | "object" => v.as_i64().map(PropertyValue::I64),
            "float" => v.as_f64().map(|n| PropertyValue::F32(n as f32)),
            "string" | "file" | "color" | "class" => {
                v.as_str().map(|s| PropertyValue::String(s.to_owned()))
            }
            other => {
                return Err(TilesetError::UnsupportedPropertyType {
                    path: origin.to_path_buf(),
                    name: self.name.clone(),
                    kind: other.to_owned(),
                })
            }
        })
    }
}

pub(crate) fn properties_from_json(
    props: Vec<JsonProperty>,
    origin: &Path,
) -> Result<Properties, TilesetError> {
    let mut out = Properties::new();
    for p in props {
        if let Some(value) = p.typed_value(origin)? {
            out.insert(p.name, value);
        }
    }
    Ok(out)
}
