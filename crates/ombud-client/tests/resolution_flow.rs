//! End-to-end resolution flows over a scripted bus.

use assert_matches::assert_matches;
use ombud_client::transport::BusTransport;
use ombud_client::{ProxyConfig, RemoteObject};
use ombud_core::{
    BusName, EntityHandle, Feature, FeatureSet, InterfaceName, ObjectPath, ProxyError, ProxyKey,
    RemoteError, Status, Value,
};
use ombud_testkit::{fixtures, ScriptedBus};
use std::collections::BTreeSet;
use std::sync::Arc;

const RESOLUTION: &str = "org.ombud.Resolution";
const PRESENCE: &str = "org.example.Presence";

fn presence_config() -> ProxyConfig {
    ProxyConfig::default().map_feature(
        Feature::new("presence"),
        InterfaceName::new(PRESENCE),
    )
}

fn proxy_on(bus: &Arc<ScriptedBus>, config: ProxyConfig) -> Arc<RemoteObject> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    RemoteObject::new(
        Arc::clone(bus) as Arc<dyn BusTransport>,
        BusName::new("org.example.Service"),
        ObjectPath::new("/org/example/Service"),
        Some(Status::SIMULATED),
        config,
    )
    .expect("fresh proxy")
}

fn presence_features() -> FeatureSet {
    [Feature::new("presence")].into_iter().collect()
}

fn script_two_entities(bus: &ScriptedBus) {
    bus.script_reply(
        InterfaceName::new(RESOLUTION),
        "RequestHandles",
        Ok(fixtures::handle_reply(&[("a@x", 1), ("c@x", 2)])),
    );
    bus.script_reply(
        InterfaceName::new(RESOLUTION),
        "GetAttributes",
        Ok(fixtures::attribute_reply(&[
            (
                1,
                fixtures::attribute_entry(
                    "a@x",
                    &[(PRESENCE, &[("status", Value::from("online"))])],
                ),
            ),
            (
                2,
                fixtures::attribute_entry(
                    "c@x",
                    &[(PRESENCE, &[("status", Value::from("away"))])],
                ),
            ),
        ])),
    );
}

#[tokio::test]
async fn invalid_identifiers_are_data_not_failures() {
    let bus = Arc::new(ScriptedBus::new());
    script_two_entities(&bus);

    let proxy = proxy_on(&bus, presence_config());
    let resolved = proxy
        .resolve_identifiers(
            vec!["a@x".to_owned(), "bad".to_owned(), "c@x".to_owned()],
            presence_features(),
        )
        .wait()
        .await
        .expect("bad inputs never fail the batch");

    assert_eq!(resolved.valid.get("a@x"), Some(&EntityHandle(1)));
    assert_eq!(resolved.valid.get("c@x"), Some(&EntityHandle(2)));
    assert_eq!(resolved.invalid, BTreeSet::from(["bad".to_owned()]));
    assert_eq!(resolved.valid.len() + resolved.invalid.len(), 3);

    assert_eq!(resolved.entities.len(), 2);
    let first = &resolved.entities[0];
    assert_eq!(first.identifier(), "a@x");
    assert_eq!(
        first.attribute(&InterfaceName::new(PRESENCE), "status"),
        Some(&Value::from("online"))
    );
}

#[tokio::test]
async fn attribute_call_requests_only_mapped_interfaces() {
    let bus = Arc::new(ScriptedBus::new());
    script_two_entities(&bus);

    let proxy = proxy_on(&bus, presence_config());
    proxy
        .resolve_identifiers(vec!["a@x".to_owned(), "c@x".to_owned()], presence_features())
        .wait()
        .await
        .expect("resolution succeeds");

    let calls = bus.calls_of("GetAttributes");
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].args[1],
        Value::List(vec![Value::from(PRESENCE)])
    );
}

#[tokio::test]
async fn already_resolved_handles_are_reused_not_rebuilt() {
    let bus = Arc::new(ScriptedBus::new());
    script_two_entities(&bus);
    // Second round resolves one already-seen identifier; only the handle
    // request is scripted, attribute resolution must not run again.
    bus.script_reply(
        InterfaceName::new(RESOLUTION),
        "RequestHandles",
        Ok(fixtures::handle_reply(&[("a@x", 1)])),
    );

    let proxy = proxy_on(&bus, presence_config());
    let first = proxy
        .resolve_identifiers(vec!["a@x".to_owned(), "c@x".to_owned()], presence_features())
        .wait()
        .await
        .expect("first resolution");
    let second = proxy
        .resolve_identifiers(vec!["a@x".to_owned()], presence_features())
        .wait()
        .await
        .expect("second resolution");

    assert_eq!(bus.calls_of("GetAttributes").len(), 1);
    assert!(Arc::ptr_eq(&first.entities[0], &second.entities[0]));
    assert!(Arc::ptr_eq(
        &second.entities[0],
        &proxy
            .get_entity(&ProxyKey::Handle(EntityHandle(1)))
            .expect("registry keeps the entity")
    ));
}

#[tokio::test]
async fn transport_failure_fails_the_whole_request() {
    let bus = Arc::new(ScriptedBus::new());
    bus.script_reply(
        InterfaceName::new(RESOLUTION),
        "RequestHandles",
        Err(RemoteError::new("org.example.Error.Disconnected", "gone")),
    );

    let proxy = proxy_on(&bus, presence_config());
    let outcome = proxy
        .resolve_identifiers(vec!["a@x".to_owned()], presence_features())
        .wait()
        .await;
    assert_matches!(
        outcome,
        Err(ProxyError::RemoteCall { name, .. }) if name == "org.example.Error.Disconnected"
    );
}

#[tokio::test]
async fn address_and_uri_modes_use_their_methods() {
    let bus = Arc::new(ScriptedBus::new());
    bus.script_reply(
        InterfaceName::new(RESOLUTION),
        "GetByAddress",
        Ok(fixtures::handle_reply(&[("alice@mail", 7)])),
    );
    bus.script_reply(
        InterfaceName::new(RESOLUTION),
        "GetAttributes",
        Ok(fixtures::attribute_reply(&[(
            7,
            fixtures::attribute_entry("alice", &[]),
        )])),
    );
    bus.script_reply(
        InterfaceName::new(RESOLUTION),
        "GetByUri",
        Ok(fixtures::handle_reply(&[("proto:alice", 7)])),
    );

    let proxy = proxy_on(&bus, presence_config());
    let by_address = proxy
        .resolve_addresses(
            "email",
            vec!["alice@mail".to_owned(), "junk".to_owned()],
            presence_features(),
        )
        .wait()
        .await
        .expect("address resolution");
    assert_eq!(by_address.valid.get("alice@mail"), Some(&EntityHandle(7)));
    assert_eq!(by_address.invalid, BTreeSet::from(["junk".to_owned()]));

    let address_calls = bus.calls_of("GetByAddress");
    assert_eq!(address_calls[0].args[0], Value::from("email"));

    // Handle 7 is now cached; the URI round reuses it.
    let by_uri = proxy
        .resolve_uris(vec!["proto:alice".to_owned()], presence_features())
        .wait()
        .await
        .expect("uri resolution");
    assert!(Arc::ptr_eq(&by_address.entities[0], &by_uri.entities[0]));
    assert_eq!(bus.calls_of("GetAttributes").len(), 1);
}

#[tokio::test]
async fn handle_entry_mode_reads_identifiers_from_attributes() {
    let bus = Arc::new(ScriptedBus::new());
    bus.script_reply(
        InterfaceName::new(RESOLUTION),
        "GetAttributes",
        Ok(fixtures::attribute_reply(&[(
            9,
            fixtures::attribute_entry("carol@x", &[]),
        )])),
    );

    let proxy = proxy_on(&bus, presence_config());
    let resolved = proxy
        .resolve_handles(vec![EntityHandle(9)], presence_features())
        .wait()
        .await
        .expect("handle resolution");

    assert_eq!(resolved.entities.len(), 1);
    assert_eq!(resolved.entities[0].identifier(), "carol@x");
    assert_eq!(resolved.valid.get("carol@x"), Some(&EntityHandle(9)));
    assert!(resolved.invalid.is_empty());
    assert!(bus.calls_of("RequestHandles").is_empty());
}
