//! Resolved local entities
//!
//! An [`Entity`] is the finished product of the resolution pipeline: a
//! local representative of a remote-side entity, holding its protocol
//! handle, its textual identifier, and whatever per-interface attribute
//! data the requested features implied.

use ombud_core::{EntityHandle, FeatureSet, InterfaceName, Value};
use std::collections::BTreeMap;

/// Local representative of a resolved remote entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    handle: EntityHandle,
    identifier: String,
    attributes: BTreeMap<InterfaceName, BTreeMap<String, Value>>,
    features: FeatureSet,
}

impl Entity {
    /// Build an entity from resolution output.
    pub fn new(
        handle: EntityHandle,
        identifier: impl Into<String>,
        attributes: BTreeMap<InterfaceName, BTreeMap<String, Value>>,
        features: FeatureSet,
    ) -> Self {
        Self {
            handle,
            identifier: identifier.into(),
            attributes,
            features,
        }
    }

    /// The protocol handle this entity was resolved from.
    pub fn handle(&self) -> EntityHandle {
        self.handle
    }

    /// The entity's textual identifier.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Features whose data was attached during resolution.
    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    /// One attribute of one capability interface, if present.
    pub fn attribute(&self, interface: &InterfaceName, name: &str) -> Option<&Value> {
        self.attributes.get(interface).and_then(|map| map.get(name))
    }

    /// All attribute data for one capability interface.
    pub fn interface_attributes(
        &self,
        interface: &InterfaceName,
    ) -> Option<&BTreeMap<String, Value>> {
        self.attributes.get(interface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_lookup() {
        let iface = InterfaceName::new("org.example.Presence");
        let mut attrs = BTreeMap::new();
        attrs.insert(
            iface.clone(),
            BTreeMap::from([("status".to_owned(), Value::from("online"))]),
        );
        let entity = Entity::new(EntityHandle(4), "alice@example.org", attrs, FeatureSet::new());

        assert_eq!(entity.identifier(), "alice@example.org");
        assert_eq!(
            entity.attribute(&iface, "status"),
            Some(&Value::from("online"))
        );
        assert_eq!(entity.attribute(&iface, "absent"), None);
    }
}
