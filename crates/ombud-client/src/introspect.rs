//! Core introspection driver
//!
//! The core feature is the object's "describe yourself" step: one batch
//! property read that yields the advertised interface list, the member
//! validity partitions for collection-style objects, and the baseline
//! property map. Everything else in the readiness graph keys off its
//! results, directly or through interface dependencies.

use crate::readiness::{Introspectable, IntrospectFn, ReadinessHelper};
use crate::transport::BusTransport;
use ombud_core::{Feature, InterfaceName, ObjectPath, ProxyError, ProxyResult, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Name of the core feature every proxy registers.
pub const CORE_FEATURE_NAME: &str = "core";

/// The core feature identity.
pub fn core_feature() -> Feature {
    Feature::new(CORE_FEATURE_NAME)
}

/// Data extracted by the core introspection step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoreProperties {
    /// Capability interfaces the object advertises.
    pub interfaces: Vec<InterfaceName>,
    /// Member paths the service reports as valid.
    pub valid_paths: Vec<ObjectPath>,
    /// Member paths the service reports as invalid.
    pub invalid_paths: Vec<ObjectPath>,
    /// The full baseline property map, verbatim.
    pub properties: BTreeMap<String, Value>,
}

/// Sink the driver delivers extracted core data into.
pub type CoreSink = Arc<dyn Fn(CoreProperties) + Send + Sync>;

/// Extract [`CoreProperties`] from a `get_all_properties` reply.
///
/// Absent keys are tolerated (a minimal service exposes none of them). The
/// member lists go through the strings-for-paths interoperability
/// workaround; any other malformed shape is a loud error.
pub fn parse_core_properties(
    properties: BTreeMap<String, Value>,
) -> ProxyResult<CoreProperties> {
    let interfaces = match properties.get("Interfaces") {
        Some(value) => value
            .to_strings()?
            .into_iter()
            .map(InterfaceName::new)
            .collect(),
        None => Vec::new(),
    };
    let valid_paths = match properties.get("ValidPaths") {
        Some(value) => value.to_object_paths()?,
        None => Vec::new(),
    };
    let invalid_paths = match properties.get("InvalidPaths") {
        Some(value) => value.to_object_paths()?,
        None => Vec::new(),
    };
    Ok(CoreProperties {
        interfaces,
        valid_paths,
        invalid_paths,
        properties,
    })
}

/// Issues the core "describe yourself" call and feeds the readiness graph.
pub struct IntrospectionDriver {
    transport: Arc<dyn BusTransport>,
    object: ObjectPath,
    core_interface: InterfaceName,
    sink: Option<CoreSink>,
}

impl IntrospectionDriver {
    /// Create a driver for `object`, reading properties of
    /// `core_interface`.
    pub fn new(
        transport: Arc<dyn BusTransport>,
        object: ObjectPath,
        core_interface: InterfaceName,
    ) -> Self {
        Self {
            transport,
            object,
            core_interface,
            sink: None,
        }
    }

    /// Deliver extracted core data to `sink` before the feature is marked
    /// ready.
    pub fn with_sink(mut self, sink: CoreSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// The core feature descriptor to register with a [`ReadinessHelper`].
    ///
    /// The routine issues the property call on the runtime; the reply (or
    /// error reply) later marks the feature Ready or Missing.
    pub fn core_introspectable(&self) -> Introspectable {
        let transport = Arc::clone(&self.transport);
        let object = self.object.clone();
        let interface = self.core_interface.clone();
        let sink = self.sink.clone();

        let routine: IntrospectFn = Arc::new(move |helper: &ReadinessHelper| {
            let transport = Arc::clone(&transport);
            let object = object.clone();
            let interface = interface.clone();
            let sink = sink.clone();
            let helper = helper.clone();
            tokio::spawn(async move {
                debug!(object = %object, "introspecting core properties");
                match transport.get_all_properties(&object, &interface).await {
                    Ok(properties) => match parse_core_properties(properties) {
                        Ok(core) => {
                            helper.set_interfaces(core.interfaces.clone());
                            if let Some(sink) = sink {
                                sink(core);
                            }
                            helper.mark_ready(&core_feature());
                        }
                        Err(err) => {
                            warn!(object = %object, error = %err, "core reply had invalid shape");
                            helper.mark_missing(&core_feature(), Some(err));
                        }
                    },
                    Err(remote) => {
                        warn!(
                            object = %object,
                            name = %remote.name,
                            message = %remote.message,
                            "core introspection failed"
                        );
                        helper.mark_missing(
                            &core_feature(),
                            Some(ProxyError::remote_introspection(remote)),
                        );
                    }
                }
            });
        });

        Introspectable::new(core_feature(), routine)
    }
}
