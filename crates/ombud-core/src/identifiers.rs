//! Identifier types for remote objects and protocol handles
//!
//! Everything a proxy can be keyed by lives here. Paths and names are opaque
//! strings as far as this layer is concerned; their formatting rules belong
//! to the bus transport.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bus path of a remote object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectPath(String);

impl ObjectPath {
    /// Create a path from any string-like value.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ObjectPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// Well-known or unique name a remote service is reachable under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BusName(String);

impl BusName {
    /// Create a bus name from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BusName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of a remote capability interface advertised by an object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InterfaceName(String);

impl InterfaceName {
    /// Create an interface name from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InterfaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for InterfaceName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Opaque protocol handle referring to a remote-side entity.
///
/// Not to be confused with a completion handle: this is the wire-level
/// integer token the remote service hands out for resolved entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityHandle(pub u32);

impl EntityHandle {
    /// The raw protocol value.
    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handle-{}", self.0)
    }
}

impl From<u32> for EntityHandle {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

/// Stable key a constructed proxy is registered under.
///
/// Collection-style objects key their members by object path; resolution
/// results key entities by protocol handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProxyKey {
    /// Keyed by bus object path.
    Path(ObjectPath),
    /// Keyed by protocol handle.
    Handle(EntityHandle),
}

impl fmt::Display for ProxyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyKey::Path(path) => write!(f, "{path}"),
            ProxyKey::Handle(handle) => write!(f, "{handle}"),
        }
    }
}

impl From<ObjectPath> for ProxyKey {
    fn from(path: ObjectPath) -> Self {
        Self::Path(path)
    }
}

impl From<EntityHandle> for ProxyKey {
    fn from(handle: EntityHandle) -> Self {
        Self::Handle(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_round_trip() {
        let path = ObjectPath::new("/org/example/Account/0");
        assert_eq!(path.as_str(), "/org/example/Account/0");
        assert_eq!(path.to_string(), "/org/example/Account/0");
    }

    #[test]
    fn handle_display_and_raw() {
        let handle = EntityHandle(7);
        assert_eq!(handle.raw(), 7);
        assert_eq!(handle.to_string(), "handle-7");
    }

    #[test]
    fn proxy_key_from_either_identity() {
        let by_path = ProxyKey::from(ObjectPath::new("/a"));
        let by_handle = ProxyKey::from(EntityHandle(1));
        assert_ne!(by_path, by_handle);
        assert_eq!(by_handle, ProxyKey::Handle(EntityHandle(1)));
    }
}
