//! Proxy configuration

use crate::introspect::core_feature;
use ombud_core::{Feature, FeatureSet, InterfaceName};
use std::collections::BTreeMap;

/// Configuration for a [`crate::RemoteObject`].
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Interface whose property map the core introspection reads.
    pub core_interface: InterfaceName,
    /// Interface the resolution calls are issued against.
    pub resolution_interface: InterfaceName,
    /// Feature set substituted when a readiness request passes an empty set.
    pub default_features: FeatureSet,
    /// Which capability interface carries each feature's per-entity
    /// attribute data. Features without a mapping contribute no interface
    /// to attribute resolution.
    pub feature_interfaces: BTreeMap<Feature, InterfaceName>,
    /// Capacity of the registry event broadcast channel.
    pub event_capacity: usize,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        let mut default_features = FeatureSet::new();
        default_features.insert(core_feature());
        Self {
            core_interface: InterfaceName::new("org.ombud.Core"),
            resolution_interface: InterfaceName::new("org.ombud.Resolution"),
            default_features,
            feature_interfaces: BTreeMap::new(),
            event_capacity: 64,
        }
    }
}

impl ProxyConfig {
    /// Register the interface carrying a feature's attribute data.
    pub fn map_feature(mut self, feature: Feature, interface: InterfaceName) -> Self {
        self.feature_interfaces.insert(feature, interface);
        self
    }
}
