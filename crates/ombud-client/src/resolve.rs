//! Batch resolution pipeline
//!
//! Turns a batch of opaque identifiers (textual identifiers, vcard-field
//! addresses, or URIs) into validated protocol handles and then into
//! fully-populated local entities. Individual bad inputs are data, not
//! faults: the pipeline's handle succeeds with the invalid inputs reported
//! in the result's invalid partition, and fails only when a remote call
//! itself could not be completed.

use crate::entity::Entity;
use crate::pending::PendingOperation;
use crate::registry::ProxyRegistry;
use crate::transport::BusTransport;
use indexmap::IndexMap;
use ombud_core::{
    EntityHandle, Feature, FeatureSet, InterfaceName, ObjectPath, ProxyError, ProxyKey,
    ProxyResult, Value,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Remote method resolving textual identifiers to handles.
const METHOD_REQUEST_HANDLES: &str = "RequestHandles";
/// Remote method resolving vcard-field addresses to handles.
const METHOD_GET_BY_ADDRESS: &str = "GetByAddress";
/// Remote method resolving URIs to handles.
const METHOD_GET_BY_URI: &str = "GetByUri";
/// Remote method fetching per-entity attributes for a handle set.
const METHOD_GET_ATTRIBUTES: &str = "GetAttributes";

/// Final result of a resolution request.
///
/// `valid` and `invalid` form a complete, disjoint partition of the input
/// identifiers; `valid` preserves input relation order. For handle-entry
/// resolution there are no input identifiers and `valid` maps each
/// resolved entity's identifier instead.
#[derive(Debug, Clone, Default)]
pub struct Resolved {
    /// One entity per resolved handle, in request order.
    pub entities: Vec<Arc<Entity>>,
    /// Identifiers the service accepted, with their handles.
    pub valid: IndexMap<String, EntityHandle>,
    /// Identifiers the service rejected.
    pub invalid: BTreeSet<String>,
}

/// Partition a handle-map reply against the requested identifier batch.
///
/// The service replies with a mapping of accepted identifiers to handles;
/// requested identifiers absent from the mapping were rejected. Every input
/// ends up in exactly one partition.
pub fn partition_reply(
    identifiers: &[String],
    reply: &Value,
) -> ProxyResult<(IndexMap<String, EntityHandle>, BTreeSet<String>)> {
    let map = reply
        .as_map()
        .ok_or_else(|| ProxyError::unexpected_shape("map of identifier to handle", reply.type_name()))?;

    let mut valid = IndexMap::new();
    let mut invalid = BTreeSet::new();
    for identifier in identifiers {
        match map.get(identifier) {
            Some(value) => {
                let handle = value.as_u32().ok_or_else(|| {
                    ProxyError::unexpected_shape("u32 handle", value.type_name())
                })?;
                valid.insert(identifier.clone(), EntityHandle(handle));
            }
            None => {
                invalid.insert(identifier.clone());
            }
        }
    }
    Ok((valid, invalid))
}

/// Multi-stage resolver for one remote object.
///
/// Cheap to clone; clones share the transport and the entity registry.
#[derive(Clone)]
pub struct ResolutionPipeline {
    transport: Arc<dyn BusTransport>,
    object: ObjectPath,
    resolution_interface: InterfaceName,
    registry: Arc<ProxyRegistry<Entity>>,
    feature_interfaces: BTreeMap<Feature, InterfaceName>,
}

impl ResolutionPipeline {
    /// Create a pipeline issuing calls against `object`.
    pub fn new(
        transport: Arc<dyn BusTransport>,
        object: ObjectPath,
        resolution_interface: InterfaceName,
        registry: Arc<ProxyRegistry<Entity>>,
        feature_interfaces: BTreeMap<Feature, InterfaceName>,
    ) -> Self {
        Self {
            transport,
            object,
            resolution_interface,
            registry,
            feature_interfaces,
        }
    }

    /// Resolve textual identifiers into entities.
    pub fn resolve_identifiers(
        &self,
        identifiers: Vec<String>,
        features: FeatureSet,
    ) -> PendingOperation<Resolved> {
        self.resolve_strings(
            METHOD_REQUEST_HANDLES,
            vec![Value::from(identifiers.clone())],
            identifiers,
            features,
        )
    }

    /// Resolve addresses of one vcard field into entities.
    pub fn resolve_addresses(
        &self,
        field: &str,
        addresses: Vec<String>,
        features: FeatureSet,
    ) -> PendingOperation<Resolved> {
        self.resolve_strings(
            METHOD_GET_BY_ADDRESS,
            vec![Value::from(field), Value::from(addresses.clone())],
            addresses,
            features,
        )
    }

    /// Resolve URIs into entities.
    pub fn resolve_uris(&self, uris: Vec<String>, features: FeatureSet) -> PendingOperation<Resolved> {
        self.resolve_strings(
            METHOD_GET_BY_URI,
            vec![Value::from(uris.clone())],
            uris,
            features,
        )
    }

    /// Resolve already-known handles into entities, skipping the identifier
    /// stage.
    pub fn resolve_handles(
        &self,
        handles: Vec<EntityHandle>,
        features: FeatureSet,
    ) -> PendingOperation<Resolved> {
        let pipeline = self.clone();
        PendingOperation::from_future(async move {
            let requested: Vec<(Option<String>, EntityHandle)> =
                handles.into_iter().map(|handle| (None, handle)).collect();
            let entities = pipeline.fetch_entities(&requested, &features).await?;
            let valid = entities
                .iter()
                .map(|entity| (entity.identifier().to_owned(), entity.handle()))
                .collect();
            Ok(Resolved {
                entities,
                valid,
                invalid: BTreeSet::new(),
            })
        })
    }

    fn resolve_strings(
        &self,
        method: &'static str,
        args: Vec<Value>,
        identifiers: Vec<String>,
        features: FeatureSet,
    ) -> PendingOperation<Resolved> {
        let pipeline = self.clone();
        debug!(
            method,
            count = identifiers.len(),
            "resolving identifier batch"
        );
        PendingOperation::from_future(async move {
            let reply = pipeline
                .transport
                .invoke(
                    &pipeline.object,
                    &pipeline.resolution_interface,
                    method,
                    args,
                )
                .await
                .map_err(ProxyError::remote_call)?;

            let (valid, invalid) = partition_reply(&identifiers, &reply)?;
            debug!(
                accepted = valid.len(),
                rejected = invalid.len(),
                "identifier batch partitioned"
            );

            let requested: Vec<(Option<String>, EntityHandle)> = valid
                .iter()
                .map(|(identifier, handle)| (Some(identifier.clone()), *handle))
                .collect();
            let entities = pipeline.fetch_entities(&requested, &features).await?;

            Ok(Resolved {
                entities,
                valid,
                invalid,
            })
        })
    }

    /// Interfaces implied by the requested feature set.
    fn interfaces_for(&self, features: &FeatureSet) -> Vec<InterfaceName> {
        let mut interfaces = BTreeSet::new();
        for feature in features {
            match self.feature_interfaces.get(feature) {
                Some(interface) => {
                    interfaces.insert(interface.clone());
                }
                None => {
                    warn!(feature = %feature, "no interface is known for feature");
                }
            }
        }
        interfaces.into_iter().collect()
    }

    /// Features that actually map to an interface, i.e. whose data can be
    /// attached to entities.
    fn attachable_features(&self, features: &FeatureSet) -> FeatureSet {
        features
            .iter()
            .filter(|feature| self.feature_interfaces.contains_key(*feature))
            .cloned()
            .collect()
    }

    /// Second stage: attribute resolution and entity construction.
    ///
    /// Handles already present in the registry are reused; only unseen
    /// handles are fetched and constructed. The output has one entry per
    /// requested handle, in request order, regardless of reuse.
    async fn fetch_entities(
        &self,
        requested: &[(Option<String>, EntityHandle)],
        features: &FeatureSet,
    ) -> ProxyResult<Vec<Arc<Entity>>> {
        let unseen: Vec<(Option<String>, EntityHandle)> = requested
            .iter()
            .filter(|(_, handle)| self.registry.get(&ProxyKey::Handle(*handle)).is_none())
            .cloned()
            .collect();

        let mut fetched: BTreeMap<EntityHandle, BTreeMap<String, Value>> = BTreeMap::new();
        if !unseen.is_empty() {
            let handles =
                Value::List(unseen.iter().map(|(_, handle)| Value::U32(handle.raw())).collect());
            let interfaces = Value::List(
                self.interfaces_for(features)
                    .into_iter()
                    .map(|interface| Value::Str(interface.as_str().to_owned()))
                    .collect(),
            );
            let reply = self
                .transport
                .invoke(
                    &self.object,
                    &self.resolution_interface,
                    METHOD_GET_ATTRIBUTES,
                    vec![handles, interfaces],
                )
                .await
                .map_err(ProxyError::remote_call)?;
            fetched = parse_attribute_reply(&reply)?;
        }

        let attachable = self.attachable_features(features);
        let mut entities = Vec::with_capacity(requested.len());
        for (identifier, handle) in requested {
            let key = ProxyKey::Handle(*handle);
            let attributes = fetched.remove(handle).unwrap_or_default();
            let entity = self.registry.get_or_create(key, || {
                build_entity(*handle, identifier.clone(), attributes, attachable.clone())
            });
            entities.push(entity);
        }
        Ok(entities)
    }
}

/// Parse a `GetAttributes` reply: a map of decimal handle to per-entity
/// attribute map.
fn parse_attribute_reply(
    reply: &Value,
) -> ProxyResult<BTreeMap<EntityHandle, BTreeMap<String, Value>>> {
    let map = reply
        .as_map()
        .ok_or_else(|| ProxyError::unexpected_shape("map of handle to attributes", reply.type_name()))?;

    let mut parsed = BTreeMap::new();
    for (key, value) in map {
        let raw: u32 = key
            .parse()
            .map_err(|_| ProxyError::unexpected_shape("decimal handle key", "string"))?;
        let attributes = value
            .as_map()
            .ok_or_else(|| ProxyError::unexpected_shape("attribute map", value.type_name()))?;
        parsed.insert(EntityHandle(raw), attributes.clone());
    }
    Ok(parsed)
}

/// Construct one entity from its per-entity attribute map.
///
/// The map's `"id"` entry carries the identifier for handle-entry
/// resolution; identifier-entry resolution already knows it. Every other
/// key is a capability interface with its attribute map.
fn build_entity(
    handle: EntityHandle,
    known_identifier: Option<String>,
    mut raw: BTreeMap<String, Value>,
    features: FeatureSet,
) -> Entity {
    let identifier = known_identifier
        .or_else(|| raw.get("id").and_then(Value::as_str).map(str::to_owned))
        .unwrap_or_else(|| handle.to_string());
    raw.remove("id");

    let mut attributes = BTreeMap::new();
    for (interface, value) in raw {
        match value.as_map() {
            Some(map) => {
                attributes.insert(InterfaceName::new(interface), map.clone());
            }
            None => {
                warn!(
                    interface = %interface,
                    "dropping non-map attribute entry"
                );
            }
        }
    }
    Entity::new(handle, identifier, attributes, features)
}
