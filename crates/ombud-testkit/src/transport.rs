//! Scripted in-memory bus transport
//!
//! Tests queue replies per (interface, method) ahead of time; each invoke
//! consumes the next queued reply and records the call. Unscripted calls
//! fail with a recognizable error instead of hanging, so a test that
//! forgets a script line fails loudly.

use async_trait::async_trait;
use ombud_client::transport::{BusNotification, BusTransport};
use ombud_core::{InterfaceName, ObjectPath, RemoteError, Value};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, VecDeque};
use tokio::sync::broadcast;

/// One recorded remote call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Target object path.
    pub object: ObjectPath,
    /// Interface the call was issued against.
    pub interface: InterfaceName,
    /// Method name.
    pub method: String,
    /// Arguments, verbatim.
    pub args: Vec<Value>,
}

type ReplyQueue = VecDeque<Result<Value, RemoteError>>;
type PropertyQueue = VecDeque<Result<BTreeMap<String, Value>, RemoteError>>;

/// In-memory transport with scripted replies.
pub struct ScriptedBus {
    replies: Mutex<HashMap<(InterfaceName, String), ReplyQueue>>,
    properties: Mutex<HashMap<InterfaceName, PropertyQueue>>,
    calls: Mutex<Vec<RecordedCall>>,
    notifications: broadcast::Sender<BusNotification>,
}

impl ScriptedBus {
    /// Create an empty scripted bus.
    pub fn new() -> Self {
        let (notifications, _) = broadcast::channel(64);
        Self {
            replies: Mutex::new(HashMap::new()),
            properties: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            notifications,
        }
    }

    /// Queue the next reply for `method` on `interface`.
    pub fn script_reply(
        &self,
        interface: InterfaceName,
        method: &str,
        reply: Result<Value, RemoteError>,
    ) {
        self.replies
            .lock()
            .entry((interface, method.to_owned()))
            .or_default()
            .push_back(reply);
    }

    /// Queue the next `get_all_properties` result for `interface`.
    pub fn script_properties(
        &self,
        interface: InterfaceName,
        result: Result<BTreeMap<String, Value>, RemoteError>,
    ) {
        self.properties
            .lock()
            .entry(interface)
            .or_default()
            .push_back(result);
    }

    /// Deliver an out-of-band notification to every subscriber.
    pub fn push_notification(&self, notification: BusNotification) {
        let _ = self.notifications.send(notification);
    }

    /// Every call issued so far, in issue order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Calls of one method, in issue order.
    pub fn calls_of(&self, method: &str) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.method == method)
            .cloned()
            .collect()
    }

    fn unscripted(what: &str) -> RemoteError {
        RemoteError::new(
            "org.ombud.Testkit.Unscripted",
            format!("no scripted reply for {what}"),
        )
    }
}

impl Default for ScriptedBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BusTransport for ScriptedBus {
    async fn invoke(
        &self,
        object: &ObjectPath,
        interface: &InterfaceName,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, RemoteError> {
        self.calls.lock().push(RecordedCall {
            object: object.clone(),
            interface: interface.clone(),
            method: method.to_owned(),
            args,
        });
        self.replies
            .lock()
            .get_mut(&(interface.clone(), method.to_owned()))
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(Self::unscripted(method)))
    }

    async fn get_all_properties(
        &self,
        object: &ObjectPath,
        interface: &InterfaceName,
    ) -> Result<BTreeMap<String, Value>, RemoteError> {
        self.calls.lock().push(RecordedCall {
            object: object.clone(),
            interface: interface.clone(),
            method: "GetAll".to_owned(),
            args: Vec::new(),
        });
        self.properties
            .lock()
            .get_mut(interface)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(Self::unscripted("GetAll")))
    }

    fn notifications(&self) -> broadcast::Receiver<BusNotification> {
        self.notifications.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replies_are_consumed_in_order() {
        let bus = ScriptedBus::new();
        let iface = InterfaceName::new("org.example.Resolution");
        bus.script_reply(iface.clone(), "Ping", Ok(Value::U32(1)));
        bus.script_reply(iface.clone(), "Ping", Ok(Value::U32(2)));

        let object = ObjectPath::new("/obj");
        assert_eq!(
            bus.invoke(&object, &iface, "Ping", vec![]).await,
            Ok(Value::U32(1))
        );
        assert_eq!(
            bus.invoke(&object, &iface, "Ping", vec![]).await,
            Ok(Value::U32(2))
        );
        assert_eq!(bus.calls_of("Ping").len(), 2);
    }

    #[tokio::test]
    async fn unscripted_call_fails_loudly() {
        let bus = ScriptedBus::new();
        let err = bus
            .invoke(
                &ObjectPath::new("/obj"),
                &InterfaceName::new("org.example.X"),
                "Nope",
                vec![],
            )
            .await
            .unwrap_err();
        assert_eq!(err.name, "org.ombud.Testkit.Unscripted");
    }
}
