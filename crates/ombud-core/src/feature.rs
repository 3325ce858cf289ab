//! Feature vocabulary for readiness introspection
//!
//! A feature is a named unit of optional introspected capability. Objects
//! advance features to Ready by running their introspection routines; which
//! features may run is gated by the object's status and by the interfaces it
//! advertises.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Identity of a feature in the readiness graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Feature(String);

impl Feature {
    /// Create a feature identity from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The feature name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Feature {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A set of feature identities, ordered for deterministic iteration.
pub type FeatureSet = BTreeSet<Feature>;

/// Status of a remote object, as advertised by the service.
///
/// Objects without a status concept simulate [`Status::SIMULATED`] so that
/// status gating degrades to always-open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Status(pub u32);

impl Status {
    /// Simulated status for objects with no status concept.
    pub const SIMULATED: Status = Status(0);

    /// The raw status value.
    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_ordering_is_by_name() {
        let mut set = FeatureSet::new();
        set.insert(Feature::new("b"));
        set.insert(Feature::new("a"));
        let names: Vec<_> = set.iter().map(Feature::as_str).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn simulated_status_is_zero() {
        assert_eq!(Status::SIMULATED.raw(), 0);
    }
}
