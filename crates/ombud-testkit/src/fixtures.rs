//! Canned property maps and replies
//!
//! Builders for the core property map in its well-formed and misshapen
//! variants, and for handle-map resolution replies.

use ombud_core::{ObjectPath, Value};
use std::collections::BTreeMap;

/// A well-formed core property map.
pub fn core_properties(
    interfaces: &[&str],
    valid_paths: &[&str],
    invalid_paths: &[&str],
) -> BTreeMap<String, Value> {
    let mut properties = BTreeMap::new();
    properties.insert(
        "Interfaces".to_owned(),
        Value::List(interfaces.iter().map(|name| Value::from(*name)).collect()),
    );
    properties.insert(
        "ValidPaths".to_owned(),
        Value::List(
            valid_paths
                .iter()
                .map(|path| Value::Path(ObjectPath::new(*path)))
                .collect(),
        ),
    );
    properties.insert(
        "InvalidPaths".to_owned(),
        Value::List(
            invalid_paths
                .iter()
                .map(|path| Value::Path(ObjectPath::new(*path)))
                .collect(),
        ),
    );
    properties
}

/// A core property map whose member lists are plain strings instead of
/// object paths, as some non-conformant services return them.
pub fn misshapen_core_properties(
    interfaces: &[&str],
    valid_paths: &[&str],
) -> BTreeMap<String, Value> {
    let mut properties = BTreeMap::new();
    properties.insert(
        "Interfaces".to_owned(),
        Value::List(interfaces.iter().map(|name| Value::from(*name)).collect()),
    );
    properties.insert(
        "ValidPaths".to_owned(),
        Value::List(valid_paths.iter().map(|path| Value::from(*path)).collect()),
    );
    properties
}

/// A handle-map reply accepting the given identifier/handle pairs.
pub fn handle_reply(accepted: &[(&str, u32)]) -> Value {
    Value::Map(
        accepted
            .iter()
            .map(|(identifier, handle)| ((*identifier).to_owned(), Value::U32(*handle)))
            .collect(),
    )
}

/// A `GetAttributes` reply entry for one handle.
pub fn attribute_entry(
    identifier: &str,
    interfaces: &[(&str, &[(&str, Value)])],
) -> Value {
    let mut entry = BTreeMap::new();
    entry.insert("id".to_owned(), Value::from(identifier));
    for (interface, attributes) in interfaces {
        entry.insert(
            (*interface).to_owned(),
            Value::Map(
                attributes
                    .iter()
                    .map(|(name, value)| ((*name).to_owned(), value.clone()))
                    .collect(),
            ),
        );
    }
    Value::Map(entry)
}

/// A full `GetAttributes` reply.
pub fn attribute_reply(entries: &[(u32, Value)]) -> Value {
    Value::Map(
        entries
            .iter()
            .map(|(handle, entry)| (handle.to_string(), entry.clone()))
            .collect(),
    )
}
