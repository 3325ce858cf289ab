//! Bus value model
//!
//! Remote calls and property maps carry loosely-typed values. This module
//! models them as a small variant type with coercion helpers; wire-level
//! serialization stays behind the transport seam.

use crate::errors::{ProxyError, ProxyResult};
use crate::identifiers::ObjectPath;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// A loosely-typed value received from or sent to the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Boolean.
    Bool(bool),
    /// Unsigned 32-bit integer (protocol handles, statuses).
    U32(u32),
    /// Signed 64-bit integer.
    I64(i64),
    /// UTF-8 string.
    Str(String),
    /// Object path.
    Path(ObjectPath),
    /// Homogeneous or mixed list.
    List(Vec<Value>),
    /// String-keyed mapping.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Short name of the variant, used in shape-mismatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::U32(_) => "u32",
            Value::I64(_) => "i64",
            Value::Str(_) => "string",
            Value::Path(_) => "object-path",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Borrow as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow as a u32.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::U32(n) => Some(*n),
            _ => None,
        }
    }

    /// Borrow as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow as a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow as a map.
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Coerce to a list of strings.
    pub fn to_strings(&self) -> ProxyResult<Vec<String>> {
        let items = self.as_list().ok_or_else(|| self.shape_error("list of strings"))?;
        items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_owned)
                    .ok_or_else(|| item.shape_error("string"))
            })
            .collect()
    }

    /// Coerce to a list of object paths.
    ///
    /// Some buggy services return an array of plain strings where an array
    /// of object paths is expected. That one misshape is accepted and
    /// converted, with a recorded warning; every other shape mismatch is an
    /// error.
    pub fn to_object_paths(&self) -> ProxyResult<Vec<ObjectPath>> {
        let items = self
            .as_list()
            .ok_or_else(|| self.shape_error("list of object paths"))?;

        if items.iter().all(|item| matches!(item, Value::Path(_))) {
            return Ok(items
                .iter()
                .filter_map(|item| match item {
                    Value::Path(path) => Some(path.clone()),
                    _ => None,
                })
                .collect());
        }

        if items.iter().all(|item| matches!(item, Value::Str(_))) {
            warn!(
                count = items.len(),
                "service returned wrong type (expected object paths, got strings); working around it"
            );
            return Ok(items
                .iter()
                .filter_map(Value::as_str)
                .map(ObjectPath::new)
                .collect());
        }

        Err(self.shape_error("list of object paths"))
    }

    fn shape_error(&self, expected: &str) -> ProxyError {
        ProxyError::unexpected_shape(expected, self.type_name())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::U32(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<ObjectPath> for Value {
    fn from(path: ObjectPath) -> Self {
        Value::Path(path)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn object_paths_from_typed_list() {
        let value = Value::List(vec![
            Value::Path(ObjectPath::new("/a")),
            Value::Path(ObjectPath::new("/b")),
        ]);
        let paths = value.to_object_paths().unwrap();
        assert_eq!(paths, vec![ObjectPath::new("/a"), ObjectPath::new("/b")]);
    }

    #[test]
    fn object_paths_from_misshapen_string_list() {
        // Known interoperability workaround: accept strings where paths
        // were expected.
        let value = Value::List(vec![Value::from("/a"), Value::from("/b")]);
        let paths = value.to_object_paths().unwrap();
        assert_eq!(paths, vec![ObjectPath::new("/a"), ObjectPath::new("/b")]);
    }

    #[test]
    fn object_paths_reject_other_shapes() {
        let value = Value::List(vec![Value::U32(1)]);
        assert_matches!(
            value.to_object_paths(),
            Err(ProxyError::UnexpectedShape { .. })
        );

        let not_a_list = Value::U32(1);
        assert_matches!(
            not_a_list.to_object_paths(),
            Err(ProxyError::UnexpectedShape { .. })
        );
    }

    #[test]
    fn empty_list_is_fine_either_way() {
        let value = Value::List(vec![]);
        assert!(value.to_object_paths().unwrap().is_empty());
        assert!(value.to_strings().unwrap().is_empty());
    }

    #[test]
    fn serde_round_trip() {
        let value = Value::Map(BTreeMap::from([
            ("Interfaces".to_owned(), Value::from(vec!["org.example.A"])),
            ("Count".to_owned(), Value::U32(2)),
        ]));
        let json = serde_json::to_string(&value).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }
}
