//! Integration tests for bring-up: connect → announce → purge → online.
//!
//! These run on the host (x86_64) and drive `NodeService::bring_up`
//! against scripted fakes, asserting on the broker session history.

use radthing::app::events::AppEvent;
use radthing::app::ports::{LastWill, Qos};
use radthing::config::NodeConfig;
use radthing::connectivity::LinkState;

use super::mock_hw::{make_node, BrokerCall, FakeClock, RecordingSink, TEST_MAC};

const AVAILABILITY: &str = "homeassistant/sensor/esp8266thing/availability";
const DIAGNOSTICS: &str = "homeassistant/sensor/esp8266thing/diagnostics";
const SETTER: &str = "homeassistant/number/esp8266thing/refreshrate/set";
const GETTER: &str = "homeassistant/number/esp8266thing/refreshrate/get";

const DISCOVERY_TOPICS: [&str; 5] = [
    "homeassistant/sensor/esp8266thing/frequency/config",
    "homeassistant/number/esp8266thing/refreshrate/config",
    "homeassistant/sensor/esp8266thing/wifi_rssi/config",
    "homeassistant/sensor/esp8266thing/wifi_ip/config",
    "homeassistant/sensor/esp8266thing/wifi_mac/config",
];

// ── Happy path ────────────────────────────────────────────────

#[test]
fn bring_up_runs_in_order() {
    let mut node = make_node(&NodeConfig::default());
    let mut clock = FakeClock::new();
    let mut sink = RecordingSink::new();

    node.bring_up(&mut clock, &mut sink);

    assert_eq!(node.state(), LinkState::Ready);
    assert_eq!(node.sensing_mut().setup_calls, 1);

    let broker = node.supervisor().broker();
    let will = LastWill {
        topic: AVAILABILITY.to_owned(),
        payload: "offline",
        retained: true,
        qos: Qos::AtLeastOnce,
    };
    assert_eq!(
        &broker.calls[..4],
        &[
            BrokerCall::Disconnect,
            BrokerCall::SetWill(will),
            BrokerCall::Connect {
                client_id: "esp8266thing".to_owned()
            },
            BrokerCall::Subscribe(SETTER.to_owned()),
        ]
    );

    let published = broker.published();
    assert_eq!(published.len(), 8, "5 announcements, online, interval, diagnostics");
    for (i, topic) in DISCOVERY_TOPICS.iter().enumerate() {
        assert_eq!(published[i].0, *topic);
        assert!(published[i].2, "discovery must be retained");
        assert_eq!(published[i].3, Qos::AtLeastOnce);
    }
    assert_eq!(published[5], (AVAILABILITY, "online", true, Qos::AtLeastOnce));
    assert_eq!(published[6], (GETTER, "5", true, Qos::AtLeastOnce));
    assert_eq!(
        published[7],
        (
            DIAGNOSTICS,
            r#"{"wifi_rssi":-61,"wifi_ip":"10.0.0.50","wifi_mac":"DE:AD:BE:EF:00:01"}"#,
            false,
            Qos::AtMostOnce
        )
    );
}

#[test]
fn bring_up_emits_lifecycle_events() {
    let mut node = make_node(&NodeConfig::default());
    let mut clock = FakeClock::new();
    let mut sink = RecordingSink::new();

    node.bring_up(&mut clock, &mut sink);

    assert_eq!(
        sink.events,
        vec![
            AppEvent::LinkChanged {
                from: LinkState::Down,
                to: LinkState::Ready
            },
            AppEvent::DiscoveryProgress { pending: 0 },
            AppEvent::DiscoveryPurged { records: 5 },
            AppEvent::DiagnosticsPublished,
            AppEvent::Ready,
        ]
    );
}

#[test]
fn registry_is_purged_after_bring_up() {
    let mut node = make_node(&NodeConfig::default());
    node.bring_up(&mut FakeClock::new(), &mut RecordingSink::new());

    assert_eq!(node.registry().pending(), 0);
    assert!(node.registry().is_purged());
    assert_eq!(node.registry().len(), 5);
}

#[test]
fn discovery_payloads_carry_the_device_identity() {
    let mut node = make_node(&NodeConfig::default());
    node.bring_up(&mut FakeClock::new(), &mut RecordingSink::new());

    let broker = node.supervisor().broker();
    let frequency = broker.payloads_on(DISCOVERY_TOPICS[0]);
    assert_eq!(frequency.len(), 1);
    assert!(frequency[0].contains(&format!(r#""identifiers":"{TEST_MAC}""#)));
    assert!(frequency[0].contains(r#""availability_topic":"homeassistant/sensor/esp8266thing/availability""#));

    let control = broker.payloads_on(DISCOVERY_TOPICS[1]);
    assert!(control[0].contains(&format!(r#""command_topic":"{SETTER}""#)));
    assert!(control[0].contains(r#""min": 1, "max": 60, "step": 1"#));
}

#[test]
fn configured_device_id_flows_into_topics() {
    let mut config = NodeConfig::default();
    config.device.id = "labnode".into();
    config.report_interval_secs = 600;
    let mut node = make_node(&config);
    node.bring_up(&mut FakeClock::new(), &mut RecordingSink::new());

    let broker = node.supervisor().broker();
    assert!(broker.calls.contains(&BrokerCall::Connect {
        client_id: "labnode".to_owned()
    }));
    assert_eq!(
        broker.payloads_on("homeassistant/number/labnode/refreshrate/get"),
        vec!["10"]
    );
    assert!(broker
        .discovery_topics()
        .iter()
        .all(|t| t.contains("/labnode/")));
}

// ── Retry behaviour ───────────────────────────────────────────

#[test]
fn failed_announcements_are_retried_until_accepted() {
    let mut node = make_node(&NodeConfig::default());
    node.supervisor_mut().broker_mut().fail_publishes = 2;
    let mut clock = FakeClock::new();
    let mut sink = RecordingSink::new();

    node.bring_up(&mut clock, &mut sink);

    assert_eq!(sink.count(|e| *e == AppEvent::DiscoveryProgress { pending: 2 }), 1);
    assert_eq!(sink.count(|e| *e == AppEvent::DiscoveryProgress { pending: 0 }), 1);
    assert!(clock.delays.contains(&1_000), "discovery retry pause");

    // Each entity accepted exactly once; the failed pair goes out on the retry.
    let topics = node.supervisor().broker().discovery_topics();
    assert_eq!(
        topics,
        vec![
            DISCOVERY_TOPICS[2],
            DISCOVERY_TOPICS[3],
            DISCOVERY_TOPICS[4],
            DISCOVERY_TOPICS[0],
            DISCOVERY_TOPICS[1],
        ]
    );
    assert!(node.registry().is_purged());
}

#[test]
fn network_failures_cool_down_before_retrying() {
    let mut node = make_node(&NodeConfig::default());
    node.supervisor_mut().network_mut().fail_next = 2;
    let mut clock = FakeClock::new();

    node.bring_up(&mut clock, &mut RecordingSink::new());

    assert_eq!(node.supervisor().network().attempts, 3);
    assert_eq!(clock.delays.iter().filter(|d| **d == 30_000).count(), 2);
    assert_eq!(node.state(), LinkState::Ready);
}

#[test]
fn broker_refusals_cool_down_before_retrying() {
    let mut node = make_node(&NodeConfig::default());
    node.supervisor_mut().broker_mut().refuse_connects = 2;
    let mut clock = FakeClock::new();

    node.bring_up(&mut clock, &mut RecordingSink::new());

    assert_eq!(clock.delays.iter().filter(|d| **d == 10_000).count(), 2);
    assert_eq!(node.supervisor().broker().connect_count(), 1);
    // One fresh network link, so the client is re-armed only once.
    assert_eq!(
        node.supervisor()
            .broker()
            .count(|c| matches!(c, BrokerCall::SetWill(_))),
        1
    );
}

#[test]
fn failed_subscription_forces_a_new_session() {
    let mut node = make_node(&NodeConfig::default());
    node.supervisor_mut().broker_mut().fail_subscribes = 1;

    node.bring_up(&mut FakeClock::new(), &mut RecordingSink::new());

    let broker = node.supervisor().broker();
    assert_eq!(broker.connect_count(), 2);
    assert_eq!(broker.subscribe_count(), 1);
    assert!(!node.supervisor().subscription_required());
}
