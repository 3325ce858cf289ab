//! Proxy registry
//!
//! At most one live local proxy exists per remote key. Entries are inserted
//! through [`ProxyRegistry::get_or_create`] and removed only on an
//! authoritative removal notification from the bus, never by reference
//! counting; a validity flip moves a key between the valid and invalid
//! partitions without discarding the proxy identity.

use ombud_core::ProxyKey;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// Change events published by a registry.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryEvent {
    /// A previously-unknown key appeared.
    Created(ProxyKey),
    /// A key flipped between valid and invalid.
    ValidityChanged(ProxyKey, bool),
    /// A key was removed authoritatively.
    Removed(ProxyKey),
}

struct Inner<T> {
    entries: HashMap<ProxyKey, Arc<T>>,
    valid: BTreeSet<ProxyKey>,
    invalid: BTreeSet<ProxyKey>,
}

/// Registry of constructed proxies, keyed by object path or handle.
pub struct ProxyRegistry<T> {
    inner: Mutex<Inner<T>>,
    events: broadcast::Sender<RegistryEvent>,
}

impl<T> ProxyRegistry<T> {
    /// Create an empty registry whose event channel holds `capacity`
    /// undelivered events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                valid: BTreeSet::new(),
                invalid: BTreeSet::new(),
            }),
            events,
        }
    }

    /// Subscribe to registry change events.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    /// Look up an entry without constructing anything.
    pub fn get(&self, key: &ProxyKey) -> Option<Arc<T>> {
        self.inner.lock().entries.get(key).cloned()
    }

    /// Return the existing entry for `key`, or build one with `factory`.
    ///
    /// Lookups never reach the transport; only `factory` may, and it runs
    /// at most once per live key.
    pub fn get_or_create<F>(&self, key: ProxyKey, factory: F) -> Arc<T>
    where
        F: FnOnce() -> T,
    {
        let (entry, created) = {
            let mut inner = self.inner.lock();
            match inner.entries.get(&key) {
                Some(existing) => (Arc::clone(existing), false),
                None => {
                    let built = Arc::new(factory());
                    inner.entries.insert(key.clone(), Arc::clone(&built));
                    (built, true)
                }
            }
        };
        if created {
            debug!(key = %key, "proxy created");
            let _ = self.events.send(RegistryEvent::Created(key));
        }
        entry
    }

    /// Drop the entry for `key` on an authoritative removal notification.
    pub fn remove(&self, key: &ProxyKey) -> Option<Arc<T>> {
        let removed = {
            let mut inner = self.inner.lock();
            inner.valid.remove(key);
            inner.invalid.remove(key);
            inner.entries.remove(key)
        };
        debug!(key = %key, "proxy removed");
        let _ = self.events.send(RegistryEvent::Removed(key.clone()));
        removed
    }

    /// Apply a validity flip for `key`.
    ///
    /// The key moves between the valid and invalid partitions; an existing
    /// proxy keeps its identity. A key never seen before is tracked as
    /// newly created (the service may announce members this way).
    pub fn set_validity(&self, key: ProxyKey, valid: bool) {
        let newly_tracked = {
            let mut inner = self.inner.lock();
            let known = inner.valid.contains(&key) || inner.invalid.contains(&key);
            if valid {
                inner.invalid.remove(&key);
                inner.valid.insert(key.clone());
            } else {
                inner.valid.remove(&key);
                inner.invalid.insert(key.clone());
            }
            !known
        };
        if newly_tracked {
            debug!(key = %key, valid, "member appeared");
            let _ = self.events.send(RegistryEvent::Created(key.clone()));
            // A member announced invalid on first sight still gets the flip
            // reported, mirroring how services announce abnormal members.
            if !valid {
                let _ = self.events.send(RegistryEvent::ValidityChanged(key, false));
            }
        } else {
            debug!(key = %key, valid, "member validity changed");
            let _ = self.events.send(RegistryEvent::ValidityChanged(key, valid));
        }
    }

    /// Seed the partitions from introspected member lists.
    pub fn seed_partitions(
        &self,
        valid: impl IntoIterator<Item = ProxyKey>,
        invalid: impl IntoIterator<Item = ProxyKey>,
    ) {
        let mut inner = self.inner.lock();
        inner.valid.extend(valid);
        inner.invalid.extend(invalid);
    }

    /// Keys currently tracked as valid.
    pub fn valid_keys(&self) -> Vec<ProxyKey> {
        self.inner.lock().valid.iter().cloned().collect()
    }

    /// Keys currently tracked as invalid.
    pub fn invalid_keys(&self) -> Vec<ProxyKey> {
        self.inner.lock().invalid.iter().cloned().collect()
    }

    /// Every tracked key, valid first.
    pub fn all_keys(&self) -> Vec<ProxyKey> {
        let inner = self.inner.lock();
        inner
            .valid
            .iter()
            .chain(inner.invalid.iter())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ombud_core::{EntityHandle, ObjectPath};

    fn key(path: &str) -> ProxyKey {
        ProxyKey::Path(ObjectPath::new(path))
    }

    #[test]
    fn get_or_create_builds_once() {
        let registry: ProxyRegistry<String> = ProxyRegistry::new(8);
        let first = registry.get_or_create(key("/a"), || "proxy".to_owned());
        let second = registry.get_or_create(key("/a"), || unreachable!("must reuse"));
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn lookup_of_unknown_key_is_none() {
        let registry: ProxyRegistry<String> = ProxyRegistry::new(8);
        assert!(registry.get(&ProxyKey::Handle(EntityHandle(1))).is_none());
    }

    #[test]
    fn validity_flip_keeps_identity() {
        let registry: ProxyRegistry<String> = ProxyRegistry::new(8);
        let entry = registry.get_or_create(key("/acct"), || "acct".to_owned());
        registry.set_validity(key("/acct"), true);
        registry.set_validity(key("/acct"), false);

        assert_eq!(registry.invalid_keys(), vec![key("/acct")]);
        assert!(registry.valid_keys().is_empty());
        let same = registry.get(&key("/acct")).unwrap();
        assert!(Arc::ptr_eq(&entry, &same));
    }

    #[test]
    fn removal_clears_entry_and_partitions() {
        let registry: ProxyRegistry<String> = ProxyRegistry::new(8);
        registry.get_or_create(key("/acct"), || "acct".to_owned());
        registry.set_validity(key("/acct"), true);

        registry.remove(&key("/acct"));
        assert!(registry.get(&key("/acct")).is_none());
        assert!(registry.all_keys().is_empty());
    }

    #[test]
    fn events_are_published_in_order() {
        let registry: ProxyRegistry<String> = ProxyRegistry::new(8);
        let mut events = registry.subscribe();

        registry.set_validity(key("/new"), true);
        registry.set_validity(key("/new"), false);
        registry.remove(&key("/new"));

        assert_eq!(
            events.try_recv().unwrap(),
            RegistryEvent::Created(key("/new"))
        );
        assert_eq!(
            events.try_recv().unwrap(),
            RegistryEvent::ValidityChanged(key("/new"), false)
        );
        assert_eq!(events.try_recv().unwrap(), RegistryEvent::Removed(key("/new")));
    }
}
