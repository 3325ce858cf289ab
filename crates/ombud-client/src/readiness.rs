//! Feature-gated readiness graph
//!
//! A remote object is introspected incrementally: each named feature
//! declares the statuses it makes sense for, the features that must be
//! Ready before it, the interfaces the object must advertise, and the
//! routine that actually introspects it. [`ReadinessHelper`] owns the
//! resulting graph and drives routines in dependency order.
//!
//! Readiness is monotonic: Ready never reverts, and Missing is permanent
//! for the current status epoch, propagating to every dependent feature and
//! to every readiness request whose closure touches it. Because reply
//! arrival order need not match issue order, eligibility is recomputed from
//! scratch on every state change rather than following a precomputed
//! schedule.

use crate::pending::PendingOperation;
use ombud_core::{Feature, FeatureSet, InterfaceName, ProxyError, ProxyResult, Status};
use parking_lot::Mutex;
use petgraph::algo::is_cyclic_directed;
use petgraph::graphmap::DiGraphMap;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

/// Routine that introspects one feature.
///
/// Invoked exactly once, when the feature's full dependency frontier has
/// resolved. The routine reports back through [`ReadinessHelper::mark_ready`]
/// or [`ReadinessHelper::mark_missing`], either synchronously or from a
/// spawned task once a remote reply arrives.
pub type IntrospectFn = Arc<dyn Fn(&ReadinessHelper) + Send + Sync>;

/// Introspection state of a single feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureState {
    /// Introspection has not been scheduled yet.
    NotStarted,
    /// The introspection routine is running.
    InProgress,
    /// Introspection finished; the feature's data is available.
    Ready,
    /// The object cannot satisfy this feature under its current
    /// capabilities. Permanent for the current status epoch.
    Missing,
}

/// Descriptor for one feature in the readiness graph.
#[derive(Clone)]
pub struct Introspectable {
    /// Feature identity.
    pub feature: Feature,
    /// Statuses under which introspecting this feature makes sense. Empty
    /// means the feature is not status-gated.
    pub makes_sense_for_statuses: BTreeSet<Status>,
    /// Features that must be Ready before this one may run.
    pub depends_on_features: FeatureSet,
    /// Interfaces the object must advertise for this feature to be
    /// satisfiable.
    pub depends_on_interfaces: Vec<InterfaceName>,
    /// The introspection routine.
    pub introspect: IntrospectFn,
}

impl Introspectable {
    /// Descriptor with no gates and no dependencies.
    pub fn new(feature: Feature, introspect: IntrospectFn) -> Self {
        Self {
            feature,
            makes_sense_for_statuses: BTreeSet::new(),
            depends_on_features: FeatureSet::new(),
            depends_on_interfaces: Vec::new(),
            introspect,
        }
    }

    /// Gate the feature on a set of statuses.
    pub fn for_statuses(mut self, statuses: impl IntoIterator<Item = Status>) -> Self {
        self.makes_sense_for_statuses = statuses.into_iter().collect();
        self
    }

    /// Declare feature dependencies.
    pub fn depends_on_features(mut self, features: impl IntoIterator<Item = Feature>) -> Self {
        self.depends_on_features = features.into_iter().collect();
        self
    }

    /// Declare interface dependencies.
    pub fn depends_on_interfaces(
        mut self,
        interfaces: impl IntoIterator<Item = InterfaceName>,
    ) -> Self {
        self.depends_on_interfaces = interfaces.into_iter().collect();
        self
    }
}

struct Watcher {
    required: FeatureSet,
    pending: PendingOperation<FeatureSet>,
}

struct Inner {
    descriptors: HashMap<Feature, Introspectable>,
    states: HashMap<Feature, FeatureState>,
    /// Failure cause for Missing features that went missing with one.
    causes: HashMap<Feature, ProxyError>,
    /// Interned ids for the cycle check.
    ids: HashMap<Feature, u32>,
    /// Dependency relation, feature -> dependency.
    graph: DiGraphMap<u32, ()>,
    /// Advertised interfaces, once the core introspection has run.
    interfaces: Option<BTreeSet<InterfaceName>>,
    status: Option<Status>,
    registered: bool,
    default_features: FeatureSet,
    requested: FeatureSet,
    watchers: Vec<Watcher>,
}

impl Inner {
    fn gate_holds(&self, descriptor: &Introspectable) -> bool {
        if descriptor.makes_sense_for_statuses.is_empty() {
            return true;
        }
        match self.status {
            // No status concept: gating is bypassed.
            None => true,
            Some(status) => descriptor.makes_sense_for_statuses.contains(&status),
        }
    }

    fn state(&self, feature: &Feature) -> FeatureState {
        self.states
            .get(feature)
            .copied()
            .unwrap_or(FeatureState::NotStarted)
    }

    /// Transitive dependency closure of `requested`, failing on the first
    /// feature (requested or inherited) that was never registered.
    fn closure(&self, requested: &FeatureSet) -> ProxyResult<FeatureSet> {
        let mut closure = FeatureSet::new();
        let mut stack: Vec<Feature> = requested.iter().cloned().collect();
        while let Some(feature) = stack.pop() {
            if !closure.insert(feature.clone()) {
                continue;
            }
            let descriptor = self
                .descriptors
                .get(&feature)
                .ok_or_else(|| ProxyError::unknown_feature(feature.clone()))?;
            for dep in &descriptor.depends_on_features {
                if !closure.contains(dep) {
                    stack.push(dep.clone());
                }
            }
        }
        Ok(closure)
    }

    fn failure_for(&self, feature: &Feature) -> ProxyError {
        self.causes
            .get(feature)
            .cloned()
            .unwrap_or_else(|| ProxyError::feature_unavailable(feature.clone()))
    }
}

/// Registry and scheduler for a remote object's features.
///
/// Cheap to clone; clones share state. Mutation happens only through the
/// introspection flow and status-change notifications of the object that
/// owns this helper.
#[derive(Clone)]
pub struct ReadinessHelper {
    inner: Arc<Mutex<Inner>>,
}

impl ReadinessHelper {
    /// Create a helper for an object currently in `status`.
    ///
    /// `None` means the object has no status concept at all, which bypasses
    /// status gating entirely. `default_features` is substituted for empty
    /// readiness requests.
    pub fn new(status: Option<Status>, default_features: FeatureSet) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                descriptors: HashMap::new(),
                states: HashMap::new(),
                causes: HashMap::new(),
                ids: HashMap::new(),
                graph: DiGraphMap::new(),
                interfaces: None,
                status,
                registered: true,
                default_features,
                requested: FeatureSet::new(),
                watchers: Vec::new(),
            })),
        }
    }

    /// Add a feature descriptor.
    ///
    /// Fails with [`ProxyError::DuplicateFeature`] if the identity is
    /// already registered and [`ProxyError::DependencyCycle`] if the
    /// declared dependencies would close a cycle. Dependencies on features
    /// registered later are allowed; they are checked when a readiness
    /// request reaches them.
    pub fn register_feature(&self, descriptor: Introspectable) -> ProxyResult<()> {
        let mut inner = self.inner.lock();
        let feature = descriptor.feature.clone();
        if inner.descriptors.contains_key(&feature) {
            return Err(ProxyError::duplicate_feature(feature));
        }
        if descriptor.depends_on_features.contains(&feature) {
            return Err(ProxyError::dependency_cycle(feature));
        }

        let next_id = inner.ids.len() as u32;
        let id = *inner.ids.entry(feature.clone()).or_insert(next_id);
        let mut added = Vec::new();
        for dep in descriptor.depends_on_features.clone() {
            let next_id = inner.ids.len() as u32;
            let dep_id = *inner.ids.entry(dep).or_insert(next_id);
            if inner.graph.add_edge(id, dep_id, ()).is_none() {
                added.push((id, dep_id));
            }
        }
        if is_cyclic_directed(&inner.graph) {
            for (a, b) in added {
                inner.graph.remove_edge(a, b);
            }
            return Err(ProxyError::dependency_cycle(feature));
        }

        inner.states.insert(feature.clone(), FeatureState::NotStarted);
        inner.descriptors.insert(feature, descriptor);
        drop(inner);
        self.evaluate();
        Ok(())
    }

    /// Request that `features` (transitively) become Ready.
    ///
    /// An empty set requests the configured default feature set. The
    /// returned handle succeeds with the closed-over feature set once every
    /// feature in the closure is Ready, and fails as soon as any of them is
    /// determined Missing.
    pub fn request_ready(&self, features: &FeatureSet) -> PendingOperation<FeatureSet> {
        let pending = {
            let mut inner = self.inner.lock();
            if !inner.registered {
                return PendingOperation::failed(ProxyError::NotRegistered);
            }
            let requested = if features.is_empty() {
                inner.default_features.clone()
            } else {
                features.clone()
            };
            let required = match inner.closure(&requested) {
                Ok(closure) => closure,
                Err(err) => return PendingOperation::failed(err),
            };
            inner.requested.extend(required.iter().cloned());
            let pending = PendingOperation::new();
            inner.watchers.push(Watcher {
                required,
                pending: pending.clone(),
            });
            pending
        };
        self.evaluate();
        pending
    }

    /// Record that a feature's introspection completed successfully.
    pub fn mark_ready(&self, feature: &Feature) {
        {
            let mut inner = self.inner.lock();
            debug!(feature = %feature, "feature ready");
            inner.states.insert(feature.clone(), FeatureState::Ready);
        }
        self.evaluate();
    }

    /// Record that the object will never satisfy `feature` under its
    /// current capabilities, optionally with the failure that determined
    /// this.
    pub fn mark_missing(&self, feature: &Feature, cause: Option<ProxyError>) {
        {
            let mut inner = self.inner.lock();
            debug!(feature = %feature, "feature missing");
            inner.states.insert(feature.clone(), FeatureState::Missing);
            if let Some(cause) = cause {
                inner.causes.insert(feature.clone(), cause);
            }
        }
        self.evaluate();
    }

    /// React to a status change of the underlying remote object.
    ///
    /// Ready features are never reverted; features whose status gate no
    /// longer holds are simply excluded from future scheduling, and
    /// features whose gate now holds become eligible.
    pub fn status_changed(&self, new_status: Status) {
        {
            let mut inner = self.inner.lock();
            debug!(status = %new_status, "object status changed");
            inner.status = Some(new_status);
        }
        self.evaluate();
    }

    /// Record the interface list the object advertises.
    ///
    /// Until this is known, features with interface dependencies stay
    /// unscheduled; afterwards, features whose required interfaces are not
    /// advertised become Missing.
    pub fn set_interfaces(&self, interfaces: impl IntoIterator<Item = InterfaceName>) {
        {
            let mut inner = self.inner.lock();
            inner.interfaces = Some(interfaces.into_iter().collect());
        }
        self.evaluate();
    }

    /// Mark the object as not (or no longer) validly registered on the bus.
    ///
    /// Subsequent readiness requests fail immediately instead of queuing
    /// forever.
    pub fn set_registered(&self, registered: bool) {
        self.inner.lock().registered = registered;
    }

    /// Whether every feature in `features` is Ready. An empty set checks
    /// the configured default feature set.
    pub fn is_ready(&self, features: &FeatureSet) -> bool {
        let inner = self.inner.lock();
        let checked = if features.is_empty() {
            &inner.default_features
        } else {
            features
        };
        checked
            .iter()
            .all(|feature| inner.state(feature) == FeatureState::Ready)
    }

    /// Introspection state of one feature, if it is registered.
    pub fn feature_state(&self, feature: &Feature) -> Option<FeatureState> {
        let inner = self.inner.lock();
        inner.descriptors.contains_key(feature).then(|| inner.state(feature))
    }

    /// Every feature ever requested, transitive dependencies included.
    pub fn requested_features(&self) -> FeatureSet {
        self.inner.lock().requested.clone()
    }

    /// Requested features that are Ready.
    pub fn actual_features(&self) -> FeatureSet {
        let inner = self.inner.lock();
        inner
            .requested
            .iter()
            .filter(|feature| inner.state(feature) == FeatureState::Ready)
            .cloned()
            .collect()
    }

    /// Requested features that are Missing.
    pub fn missing_features(&self) -> FeatureSet {
        let inner = self.inner.lock();
        inner
            .requested
            .iter()
            .filter(|feature| inner.state(feature) == FeatureState::Missing)
            .cloned()
            .collect()
    }

    /// The object's current status, if it has a status concept.
    pub fn status(&self) -> Option<Status> {
        self.inner.lock().status
    }

    /// The advertised interface list, once known.
    pub fn advertised_interfaces(&self) -> Option<Vec<InterfaceName>> {
        self.inner
            .lock()
            .interfaces
            .as_ref()
            .map(|set| set.iter().cloned().collect())
    }

    /// Recompute eligibility and watcher settlement from scratch.
    ///
    /// Runs introspection routines and watcher completions outside the
    /// lock, so routines and listeners may re-enter the helper.
    fn evaluate(&self) {
        let mut to_run: Vec<(Feature, IntrospectFn)> = Vec::new();
        let mut settled: Vec<(PendingOperation<FeatureSet>, Result<FeatureSet, ProxyError>)> =
            Vec::new();
        {
            let mut inner = self.inner.lock();

            // Missing propagates transitively before anything is scheduled.
            loop {
                let mut newly_missing: Vec<Feature> = Vec::new();
                for (feature, descriptor) in &inner.descriptors {
                    if inner.state(feature) != FeatureState::NotStarted {
                        continue;
                    }
                    let dep_missing = descriptor
                        .depends_on_features
                        .iter()
                        .any(|dep| inner.state(dep) == FeatureState::Missing);
                    let iface_missing = match (&inner.interfaces, descriptor.depends_on_interfaces.is_empty()) {
                        (_, true) => false,
                        (None, false) => false,
                        (Some(advertised), false) => !descriptor
                            .depends_on_interfaces
                            .iter()
                            .all(|iface| advertised.contains(iface)),
                    };
                    if dep_missing || iface_missing {
                        newly_missing.push(feature.clone());
                    }
                }
                if newly_missing.is_empty() {
                    break;
                }
                for feature in newly_missing {
                    inner.states.insert(feature, FeatureState::Missing);
                }
            }

            // Schedule every requested feature whose frontier has resolved.
            let requested = inner.requested.clone();
            for feature in &requested {
                let Some(descriptor) = inner.descriptors.get(feature) else {
                    continue;
                };
                if inner.state(feature) != FeatureState::NotStarted {
                    continue;
                }
                if !inner.gate_holds(descriptor) {
                    continue;
                }
                let deps_ready = descriptor
                    .depends_on_features
                    .iter()
                    .all(|dep| inner.state(dep) == FeatureState::Ready);
                let ifaces_known = descriptor.depends_on_interfaces.is_empty()
                    || inner.interfaces.is_some();
                if deps_ready && ifaces_known {
                    to_run.push((feature.clone(), Arc::clone(&descriptor.introspect)));
                }
            }
            for (feature, _) in &to_run {
                inner.states.insert(feature.clone(), FeatureState::InProgress);
            }

            // Settle watchers whose full dependency set is determined.
            let mut remaining = Vec::new();
            let watchers = std::mem::take(&mut inner.watchers);
            for watcher in watchers {
                let missing = watcher
                    .required
                    .iter()
                    .find(|feature| inner.state(feature) == FeatureState::Missing)
                    .cloned();
                if let Some(feature) = missing {
                    let cause = inner.failure_for(&feature);
                    settled.push((watcher.pending, Err(cause)));
                } else if watcher
                    .required
                    .iter()
                    .all(|feature| inner.state(feature) == FeatureState::Ready)
                {
                    let ready = watcher.required.clone();
                    settled.push((watcher.pending, Ok(ready)));
                } else {
                    remaining.push(watcher);
                }
            }
            inner.watchers = remaining;
        }

        for (pending, outcome) in settled {
            let _ = pending.complete_with(outcome);
        }
        for (_, introspect) in to_run {
            introspect(self);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn feature(name: &str) -> Feature {
        Feature::new(name)
    }

    /// Routine that marks its feature ready synchronously.
    fn instant(name: &str) -> IntrospectFn {
        let feature = Feature::new(name);
        Arc::new(move |helper: &ReadinessHelper| helper.mark_ready(&feature))
    }

    /// Routine that does nothing until the test completes it by hand.
    fn manual() -> IntrospectFn {
        Arc::new(|_: &ReadinessHelper| {})
    }

    fn helper() -> ReadinessHelper {
        ReadinessHelper::new(Some(Status::SIMULATED), FeatureSet::new())
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let helper = helper();
        helper
            .register_feature(Introspectable::new(feature("core"), instant("core")))
            .unwrap();
        let err = helper
            .register_feature(Introspectable::new(feature("core"), instant("core")))
            .unwrap_err();
        assert_matches!(err, ProxyError::DuplicateFeature { .. });
    }

    #[test]
    fn unknown_feature_fails_immediately() {
        let helper = helper();
        let pending = helper.request_ready(&[feature("ghost")].into_iter().collect());
        assert_matches!(
            pending.peek(),
            Some(Err(ProxyError::UnknownFeature { .. }))
        );
    }

    #[test]
    fn unregistered_object_fails_immediately() {
        let helper = helper();
        helper
            .register_feature(Introspectable::new(feature("core"), instant("core")))
            .unwrap();
        helper.set_registered(false);
        let pending = helper.request_ready(&[feature("core")].into_iter().collect());
        assert_matches!(pending.peek(), Some(Err(ProxyError::NotRegistered)));
    }

    #[test]
    fn cycle_is_rejected_at_registration() {
        let helper = helper();
        helper
            .register_feature(
                Introspectable::new(feature("a"), manual())
                    .depends_on_features([feature("b")]),
            )
            .unwrap();
        let err = helper
            .register_feature(
                Introspectable::new(feature("b"), manual())
                    .depends_on_features([feature("a")]),
            )
            .unwrap_err();
        assert_matches!(err, ProxyError::DependencyCycle { .. });
    }

    #[test]
    fn dependency_chain_becomes_ready_in_order() {
        let helper = helper();
        helper
            .register_feature(Introspectable::new(feature("core"), instant("core")))
            .unwrap();
        helper
            .register_feature(
                Introspectable::new(feature("info"), instant("info"))
                    .depends_on_features([feature("core")]),
            )
            .unwrap();
        helper
            .register_feature(
                Introspectable::new(feature("avatar"), instant("avatar"))
                    .depends_on_features([feature("info")]),
            )
            .unwrap();

        let pending = helper.request_ready(&[feature("avatar")].into_iter().collect());
        let ready = pending.peek().unwrap().unwrap();
        let names: Vec<_> = ready.iter().map(Feature::as_str).collect();
        assert_eq!(names, vec!["avatar", "core", "info"]);
        assert!(helper.is_ready(&[feature("core"), feature("avatar")].into_iter().collect()));
    }

    #[test]
    fn missing_fails_dependents_and_watchers() {
        let helper = helper();
        helper
            .register_feature(Introspectable::new(feature("core"), manual()))
            .unwrap();
        helper
            .register_feature(
                Introspectable::new(feature("info"), manual())
                    .depends_on_features([feature("core")]),
            )
            .unwrap();

        let pending = helper.request_ready(&[feature("info")].into_iter().collect());
        assert!(!pending.is_completed());

        helper.mark_missing(&feature("core"), None);
        assert_matches!(
            pending.peek(),
            Some(Err(ProxyError::FeatureUnavailable { feature })) if feature.as_str() == "core"
        );
        // Transitive propagation made the dependent Missing too.
        assert_eq!(
            helper.feature_state(&feature("info")),
            Some(FeatureState::Missing)
        );
    }

    #[test]
    fn missing_with_cause_surfaces_the_cause() {
        let helper = helper();
        helper
            .register_feature(Introspectable::new(feature("core"), manual()))
            .unwrap();
        let pending = helper.request_ready(&[feature("core")].into_iter().collect());

        helper.mark_missing(
            &feature("core"),
            Some(ProxyError::RemoteIntrospection {
                name: "org.example.Error.Timeout".into(),
                message: "no reply".into(),
            }),
        );
        assert_matches!(
            pending.peek(),
            Some(Err(ProxyError::RemoteIntrospection { .. }))
        );
    }

    #[test]
    fn unavailable_interface_makes_feature_missing() {
        let helper = helper();
        helper
            .register_feature(Introspectable::new(feature("core"), instant("core")))
            .unwrap();
        helper
            .register_feature(
                Introspectable::new(feature("presence"), manual())
                    .depends_on_features([feature("core")])
                    .depends_on_interfaces([InterfaceName::new("org.example.Presence")]),
            )
            .unwrap();

        let pending = helper.request_ready(&[feature("presence")].into_iter().collect());
        assert!(!pending.is_completed());

        // Interfaces become known and the required one is absent.
        helper.set_interfaces([InterfaceName::new("org.example.Other")]);
        assert_matches!(
            pending.peek(),
            Some(Err(ProxyError::FeatureUnavailable { feature })) if feature.as_str() == "presence"
        );
    }

    #[test]
    fn feature_waits_for_interfaces_before_running() {
        let helper = helper();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let presence = feature("presence");
        let routine: IntrospectFn = {
            let presence = presence.clone();
            Arc::new(move |h: &ReadinessHelper| {
                counter.fetch_add(1, Ordering::SeqCst);
                h.mark_ready(&presence);
            })
        };
        helper
            .register_feature(
                Introspectable::new(presence.clone(), routine)
                    .depends_on_interfaces([InterfaceName::new("org.example.Presence")]),
            )
            .unwrap();

        let pending = helper.request_ready(&[presence.clone()].into_iter().collect());
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        helper.set_interfaces([InterfaceName::new("org.example.Presence")]);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(pending.peek().unwrap().is_ok());
    }

    #[test]
    fn overlapping_requests_run_each_routine_once() {
        let helper = helper();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let core = feature("core");
        let counted: IntrospectFn = {
            let core = core.clone();
            Arc::new(move |_h: &ReadinessHelper| {
                counter.fetch_add(1, Ordering::SeqCst);
                // Completed by hand below, after both requests are queued.
            })
        };
        helper
            .register_feature(Introspectable::new(core.clone(), counted))
            .unwrap();
        helper
            .register_feature(
                Introspectable::new(feature("info"), instant("info"))
                    .depends_on_features([core.clone()]),
            )
            .unwrap();

        let first = helper.request_ready(&[core.clone()].into_iter().collect());
        let second =
            helper.request_ready(&[core.clone(), feature("info")].into_iter().collect());
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        helper.mark_ready(&core);
        assert!(first.peek().unwrap().is_ok());
        assert!(second.peek().unwrap().is_ok());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn status_gate_defers_scheduling_until_applicable() {
        let helper = ReadinessHelper::new(Some(Status(1)), FeatureSet::new());
        let connected_only = feature("roster");
        helper
            .register_feature(
                Introspectable::new(connected_only.clone(), instant("roster"))
                    .for_statuses([Status(2)]),
            )
            .unwrap();

        let pending = helper.request_ready(&[connected_only.clone()].into_iter().collect());
        assert!(!pending.is_completed());
        assert_eq!(
            helper.feature_state(&connected_only),
            Some(FeatureState::NotStarted)
        );

        helper.status_changed(Status(2));
        assert!(pending.peek().unwrap().is_ok());
    }

    #[test]
    fn empty_request_uses_default_features() {
        let core = feature("core");
        let defaults: FeatureSet = [core.clone()].into_iter().collect();
        let helper = ReadinessHelper::new(Some(Status::SIMULATED), defaults);
        helper
            .register_feature(Introspectable::new(core.clone(), instant("core")))
            .unwrap();

        let pending = helper.request_ready(&FeatureSet::new());
        let ready = pending.peek().unwrap().unwrap();
        assert!(ready.contains(&core));
    }

    #[test]
    fn requested_actual_and_missing_accessors() {
        let helper = helper();
        helper
            .register_feature(Introspectable::new(feature("core"), instant("core")))
            .unwrap();
        helper
            .register_feature(Introspectable::new(feature("extra"), manual()))
            .unwrap();

        let _ = helper.request_ready(&[feature("core"), feature("extra")].into_iter().collect());
        helper.mark_missing(&feature("extra"), None);

        assert!(helper.requested_features().contains(&feature("core")));
        assert!(helper.actual_features().contains(&feature("core")));
        assert!(helper.missing_features().contains(&feature("extra")));
    }
}
