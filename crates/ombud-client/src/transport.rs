//! Bus transport seam
//!
//! Everything wire-level lives behind [`BusTransport`]: issuing named
//! remote calls, batch property reads, and delivery of out-of-band
//! notifications. Error replies preserve the namespaced bus error name and
//! message verbatim; transport-level timeouts arrive as ordinary error
//! replies.

use async_trait::async_trait;
use ombud_core::{InterfaceName, ObjectPath, RemoteError, Status, Value};
use std::collections::BTreeMap;
use tokio::sync::broadcast;

/// Out-of-band signals delivered by the bus.
#[derive(Debug, Clone, PartialEq)]
pub enum BusNotification {
    /// A member object flipped between valid and invalid.
    ValidityChanged {
        /// Path of the affected object
        path: ObjectPath,
        /// New validity
        valid: bool,
    },
    /// A member object was removed or invalidated authoritatively.
    Removed {
        /// Path of the removed object
        path: ObjectPath,
    },
    /// The remote object's advertised status changed.
    StatusChanged {
        /// Path of the object whose status changed
        path: ObjectPath,
        /// The new status
        status: Status,
    },
}

/// The external collaborator used to reach the bus.
///
/// Implementations own serialization, timeouts, and connection management;
/// this layer only sees replies, error replies, and notifications.
#[async_trait]
pub trait BusTransport: Send + Sync {
    /// Invoke a named remote call against `object`.
    async fn invoke(
        &self,
        object: &ObjectPath,
        interface: &InterfaceName,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, RemoteError>;

    /// Fetch every property the object exposes on `interface`.
    async fn get_all_properties(
        &self,
        object: &ObjectPath,
        interface: &InterfaceName,
    ) -> Result<BTreeMap<String, Value>, RemoteError>;

    /// Subscribe to out-of-band notifications.
    fn notifications(&self) -> broadcast::Receiver<BusNotification>;
}
