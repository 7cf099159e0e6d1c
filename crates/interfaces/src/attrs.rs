//! Typed attribute values and lookups.

use crate::error::{Error, Side};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single attribute value as declared in package metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl AttrValue {
    /// Article-qualified type name, as used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            AttrValue::Bool(_) => BOOL,
            AttrValue::Int(_) => INT,
            AttrValue::Str(_) => STRING,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl std::fmt::Display for AttrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Int(n) => write!(f, "{n}"),
            AttrValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for AttrValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

const BOOL: &str = "a bool";
const INT: &str = "an int";
const STRING: &str = "a string";

/// Why a typed attribute lookup failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrError {
    Missing,
    WrongType { expected: &'static str },
}

impl AttrError {
    /// Turns a failed lookup on a declaration into a validation error.
    pub fn into_validation(self, interface: &str, side: Side, attr: &str) -> Error {
        match self {
            AttrError::Missing => Error::MissingAttribute {
                interface: interface.to_string(),
                side,
                attr: attr.to_string(),
            },
            AttrError::WrongType { expected } => Error::AttributeType {
                interface: interface.to_string(),
                side,
                attr: attr.to_string(),
                expected,
            },
        }
    }
}

/// Attribute mapping of a declaration or a connection.
///
/// Backed by a `BTreeMap` so iteration order never depends on hashing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attrs(BTreeMap<String, AttrValue>);

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttrValue)> {
        self.0.iter()
    }
}

impl FromIterator<(String, AttrValue)> for Attrs {
    fn from_iter<I: IntoIterator<Item = (String, AttrValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Typed read access to attributes.
///
/// Implementors provide the raw lookup; the typed getters report a missing
/// key and a mistyped value as distinct errors.
pub trait Attributes {
    fn lookup(&self, key: &str) -> Option<&AttrValue>;

    fn int_attr(&self, key: &str) -> std::result::Result<i64, AttrError> {
        let value = self.lookup(key).ok_or(AttrError::Missing)?;
        value
            .as_int()
            .ok_or(AttrError::WrongType { expected: INT })
    }

    fn str_attr(&self, key: &str) -> std::result::Result<&str, AttrError> {
        let value = self.lookup(key).ok_or(AttrError::Missing)?;
        value
            .as_str()
            .ok_or(AttrError::WrongType { expected: STRING })
    }

    fn bool_attr(&self, key: &str) -> std::result::Result<bool, AttrError> {
        let value = self.lookup(key).ok_or(AttrError::Missing)?;
        value
            .as_bool()
            .ok_or(AttrError::WrongType { expected: BOOL })
    }
}

impl Attributes for Attrs {
    fn lookup(&self, key: &str) -> Option<&AttrValue> {
        self.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_getters() {
        let attrs = Attrs::new()
            .with("number", 100_i64)
            .with("direction", "out")
            .with("active-low", true);

        assert_eq!(attrs.int_attr("number"), Ok(100));
        assert_eq!(attrs.str_attr("direction"), Ok("out"));
        assert_eq!(attrs.bool_attr("active-low"), Ok(true));
        assert_eq!(attrs.int_attr("missing"), Err(AttrError::Missing));
        assert_eq!(
            attrs.int_attr("direction"),
            Err(AttrError::WrongType { expected: "an int" })
        );
        assert_eq!(
            attrs.str_attr("number"),
            Err(AttrError::WrongType { expected: "a string" })
        );
    }

    #[test]
    fn test_into_validation() {
        let err = AttrError::WrongType { expected: "an int" }.into_validation(
            "gpio",
            Side::Slot,
            "number",
        );
        assert_eq!(err.to_string(), "gpio slot number attribute must be an int");
    }

    #[test]
    fn test_untagged_deserialize() {
        let attrs: Attrs = toml::from_str("a = 1\nb = \"two\"\nc = false").unwrap();
        assert_eq!(attrs.get("a"), Some(&AttrValue::Int(1)));
        assert_eq!(attrs.get("b"), Some(&AttrValue::Str("two".into())));
        assert_eq!(attrs.get("c"), Some(&AttrValue::Bool(false)));
    }
}
