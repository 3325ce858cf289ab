//! Remote object proxy
//!
//! [`RemoteObject`] is the local representative of one remote service
//! object: it seeds the readiness graph with the core feature, routes bus
//! notifications into the registry and the readiness graph, and exposes the
//! readiness and resolution surface callers actually use.

use crate::config::ProxyConfig;
use crate::entity::Entity;
use crate::introspect::{CoreProperties, IntrospectionDriver};
use crate::pending::PendingOperation;
use crate::readiness::{Introspectable, ReadinessHelper};
use crate::registry::{ProxyRegistry, RegistryEvent};
use crate::resolve::{Resolved, ResolutionPipeline};
use crate::tasks::TaskRegistry;
use crate::transport::{BusNotification, BusTransport};
use ombud_core::{
    BusName, EntityHandle, FeatureSet, InterfaceName, ObjectPath, ProxyKey, ProxyResult, Status,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// Client-side proxy for one remote service object.
///
/// Construction must happen on a Tokio runtime: the proxy spawns a
/// notification pump that lives until the proxy is dropped.
pub struct RemoteObject {
    transport: Arc<dyn BusTransport>,
    bus_name: BusName,
    path: ObjectPath,
    readiness: ReadinessHelper,
    registry: Arc<ProxyRegistry<Entity>>,
    pipeline: ResolutionPipeline,
    core: Arc<Mutex<Option<CoreProperties>>>,
    tasks: TaskRegistry,
}

impl RemoteObject {
    /// Build a proxy for the object at `path` on `bus_name`.
    ///
    /// `status` is the object's current status, or `None` for objects with
    /// no status concept (status gating is then bypassed). The core feature
    /// is registered and its introspection begins with the first readiness
    /// request that includes it.
    pub fn new(
        transport: Arc<dyn BusTransport>,
        bus_name: BusName,
        path: ObjectPath,
        status: Option<Status>,
        config: ProxyConfig,
    ) -> ProxyResult<Arc<Self>> {
        debug!(bus = %bus_name, object = %path, "creating proxy");

        let readiness = ReadinessHelper::new(status, config.default_features.clone());
        let registry = Arc::new(ProxyRegistry::new(config.event_capacity));
        let core = Arc::new(Mutex::new(None));

        let sink = {
            let registry = Arc::clone(&registry);
            let core = Arc::clone(&core);
            Arc::new(move |properties: CoreProperties| {
                registry.seed_partitions(
                    properties.valid_paths.iter().cloned().map(ProxyKey::Path),
                    properties.invalid_paths.iter().cloned().map(ProxyKey::Path),
                );
                *core.lock() = Some(properties);
            })
        };
        let driver = IntrospectionDriver::new(
            Arc::clone(&transport),
            path.clone(),
            config.core_interface.clone(),
        )
        .with_sink(sink);
        readiness.register_feature(driver.core_introspectable())?;

        let pipeline = ResolutionPipeline::new(
            Arc::clone(&transport),
            path.clone(),
            config.resolution_interface.clone(),
            Arc::clone(&registry),
            config.feature_interfaces.clone(),
        );

        let proxy = Arc::new(Self {
            transport: Arc::clone(&transport),
            bus_name,
            path,
            readiness,
            registry,
            pipeline,
            core,
            tasks: TaskRegistry::new(),
        });
        proxy.spawn_notification_pump();
        Ok(proxy)
    }

    /// Route bus notifications into the registry and the readiness graph
    /// until the proxy is dropped.
    fn spawn_notification_pump(self: &Arc<Self>) {
        let mut notifications = self.transport.notifications();
        let readiness = self.readiness.clone();
        let registry = Arc::clone(&self.registry);
        let own_path = self.path.clone();
        self.tasks.spawn(async move {
            loop {
                match notifications.recv().await {
                    Ok(BusNotification::ValidityChanged { path, valid }) => {
                        registry.set_validity(ProxyKey::Path(path), valid);
                    }
                    Ok(BusNotification::Removed { path }) => {
                        if path == own_path {
                            // The object itself is gone; later readiness
                            // requests must fail instead of queuing.
                            readiness.set_registered(false);
                        }
                        registry.remove(&ProxyKey::Path(path));
                    }
                    Ok(BusNotification::StatusChanged { path, status }) => {
                        if path == own_path {
                            readiness.status_changed(status);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        debug!(missed, "notification pump lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    /// The bus name this proxy talks to.
    pub fn bus_name(&self) -> &BusName {
        &self.bus_name
    }

    /// The remote object's path.
    pub fn path(&self) -> &ObjectPath {
        &self.path
    }

    /// Register an additional feature for this object.
    pub fn register_feature(&self, descriptor: Introspectable) -> ProxyResult<()> {
        self.readiness.register_feature(descriptor)
    }

    /// Request that `features` become ready, substituting the configured
    /// default set when empty.
    pub fn request_ready(&self, features: &FeatureSet) -> PendingOperation<FeatureSet> {
        let handle = PendingOperation::new();
        handle.chain_from(&self.readiness.request_ready(features));
        handle
    }

    /// Whether the given features (default set when empty) are all Ready.
    pub fn is_ready(&self, features: &FeatureSet) -> bool {
        self.readiness.is_ready(features)
    }

    /// The readiness graph, for callers that need feature-level state.
    pub fn readiness(&self) -> &ReadinessHelper {
        &self.readiness
    }

    /// Interfaces the object advertises, once core introspection ran.
    pub fn interfaces(&self) -> Option<Vec<InterfaceName>> {
        self.readiness.advertised_interfaces()
    }

    /// The object's current status, if it has a status concept.
    pub fn status(&self) -> Option<Status> {
        self.readiness.status()
    }

    /// Baseline properties extracted by core introspection.
    pub fn core_properties(&self) -> Option<CoreProperties> {
        self.core.lock().clone()
    }

    /// Resolve textual identifiers into entities.
    pub fn resolve_identifiers(
        &self,
        identifiers: Vec<String>,
        features: FeatureSet,
    ) -> PendingOperation<Resolved> {
        self.pipeline.resolve_identifiers(identifiers, features)
    }

    /// Resolve vcard-field addresses into entities.
    pub fn resolve_addresses(
        &self,
        field: &str,
        addresses: Vec<String>,
        features: FeatureSet,
    ) -> PendingOperation<Resolved> {
        self.pipeline.resolve_addresses(field, addresses, features)
    }

    /// Resolve URIs into entities.
    pub fn resolve_uris(&self, uris: Vec<String>, features: FeatureSet) -> PendingOperation<Resolved> {
        self.pipeline.resolve_uris(uris, features)
    }

    /// Resolve already-known handles into entities.
    pub fn resolve_handles(
        &self,
        handles: Vec<EntityHandle>,
        features: FeatureSet,
    ) -> PendingOperation<Resolved> {
        self.pipeline.resolve_handles(handles, features)
    }

    /// Look up an already-constructed entity. Never calls the transport.
    pub fn get_entity(&self, key: &ProxyKey) -> Option<Arc<Entity>> {
        self.registry.get(key)
    }

    /// Member keys currently tracked as valid.
    pub fn valid_keys(&self) -> Vec<ProxyKey> {
        self.registry.valid_keys()
    }

    /// Member keys currently tracked as invalid.
    pub fn invalid_keys(&self) -> Vec<ProxyKey> {
        self.registry.invalid_keys()
    }

    /// Every tracked member key.
    pub fn all_keys(&self) -> Vec<ProxyKey> {
        self.registry.all_keys()
    }

    /// Subscribe to registry change events.
    pub fn events(&self) -> broadcast::Receiver<RegistryEvent> {
        self.registry.subscribe()
    }

    /// Stop background work eagerly instead of waiting for drop.
    pub fn shutdown(&self) {
        self.tasks.shutdown();
    }
}
