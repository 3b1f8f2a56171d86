//! Integration tests for the steady-state poll loop: readings, inbound
//! commands, interval reports and link recovery.

use radthing::app::events::AppEvent;
use radthing::app::ports::{Qos, RadiationReading};
use radthing::connectivity::LinkState;

use super::mock_hw::{ready_node, BrokerCall};

const AVAILABILITY: &str = "homeassistant/sensor/esp8266thing/availability";
const STATE: &str = "homeassistant/sensor/esp8266thing/state";
const DIAGNOSTICS: &str = "homeassistant/sensor/esp8266thing/diagnostics";
const SETTER: &str = "homeassistant/number/esp8266thing/refreshrate/set";
const GETTER: &str = "homeassistant/number/esp8266thing/refreshrate/get";

fn reading() -> RadiationReading {
    RadiationReading {
        cpm: 60.0,
        usvh: 1.13,
        usvh_error: 0.1,
    }
}

// ── Readings ──────────────────────────────────────────────────

#[test]
fn pulse_publishes_reading_on_state_topic() {
    let (mut node, mut clock, mut sink) = ready_node();
    node.sensing_mut().pulse(reading());

    node.poll_cycle(&mut clock, &mut sink);

    assert_eq!(
        node.supervisor().broker().published(),
        vec![(
            STATE,
            r#"{"frequency":1.0000,"frequency_details":{"dose":1.13,"dose_err":0.10,"cpm":60.00}}"#,
            false,
            Qos::AtMostOnce
        )]
    );
    assert_eq!(sink.events, vec![AppEvent::ReadingPublished(reading())]);
}

#[test]
fn each_pulse_publishes_its_own_reading() {
    let (mut node, mut clock, mut sink) = ready_node();
    node.sensing_mut().pulse(reading());
    node.sensing_mut().pulse(reading());

    node.poll_cycle(&mut clock, &mut sink);

    assert_eq!(node.supervisor().broker().payloads_on(STATE).len(), 2);
}

#[test]
fn failed_reading_is_dropped_not_retried() {
    let (mut node, mut clock, mut sink) = ready_node();
    node.supervisor_mut().broker_mut().fail_publishes = 1;
    node.sensing_mut().pulse(reading());

    node.poll_cycle(&mut clock, &mut sink);
    node.poll_cycle(&mut clock, &mut sink);

    assert!(node.supervisor().broker().payloads_on(STATE).is_empty());
    assert_eq!(sink.count(|e| *e == AppEvent::ReadingDropped), 1);
    // A failed publish alone does not tear the session down.
    assert_eq!(node.state(), LinkState::Ready);
}

#[test]
fn reading_while_broker_is_down_is_dropped() {
    let (mut node, mut clock, mut sink) = ready_node();
    node.supervisor_mut().broker_mut().drop_session();
    node.sensing_mut().pulse(reading());

    node.poll_cycle(&mut clock, &mut sink);

    assert_eq!(sink.count(|e| *e == AppEvent::ReadingDropped), 1);
    assert!(node.supervisor().broker().payloads_on(STATE).is_empty());
    assert_eq!(node.state(), LinkState::Ready, "recovered in the same cycle");
}

#[test]
fn noise_is_reported_without_publishing() {
    let (mut node, mut clock, mut sink) = ready_node();
    node.sensing_mut().noise();

    node.poll_cycle(&mut clock, &mut sink);

    assert!(node.supervisor().broker().published().is_empty());
    assert_eq!(sink.events, vec![AppEvent::NoiseDetected]);
}

// ── Inbound commands ──────────────────────────────────────────

#[test]
fn refresh_command_updates_interval_and_echoes_it() {
    let (mut node, mut clock, mut sink) = ready_node();
    node.supervisor_mut().broker_mut().deliver(SETTER, "15");

    node.poll_cycle(&mut clock, &mut sink);

    assert_eq!(node.reporter().interval_minutes(), 15);
    assert_eq!(node.reporter().interval_ms(), 15 * 60_000);
    assert_eq!(
        node.supervisor().broker().published(),
        vec![(GETTER, "15", true, Qos::AtLeastOnce)]
    );
    assert_eq!(sink.events, vec![AppEvent::ReportIntervalChanged { minutes: 15 }]);
}

#[test]
fn out_of_range_refresh_is_clamped() {
    let (mut node, mut clock, mut sink) = ready_node();
    node.supervisor_mut().broker_mut().deliver(SETTER, "240");

    node.poll_cycle(&mut clock, &mut sink);

    assert_eq!(node.reporter().interval_minutes(), 60);
    assert_eq!(node.supervisor().broker().payloads_on(GETTER), vec!["60"]);
}

#[test]
fn unknown_messages_are_ignored() {
    let (mut node, mut clock, mut sink) = ready_node();
    let broker = node.supervisor_mut().broker_mut();
    broker.deliver("homeassistant/status", "online");
    broker.deliver(SETTER, "soon");

    node.poll_cycle(&mut clock, &mut sink);

    assert_eq!(sink.count(|e| *e == AppEvent::MessageIgnored), 2);
    assert_eq!(node.reporter().interval_minutes(), 5);
    assert!(node.supervisor().broker().published().is_empty());
}

#[test]
fn broker_is_polled_every_cycle() {
    let (mut node, mut clock, mut sink) = ready_node();
    let before = node.supervisor().broker().polls;
    for _ in 0..3 {
        node.poll_cycle(&mut clock, &mut sink);
    }
    assert_eq!(node.supervisor().broker().polls, before + 3);
}

// ── Interval reports ──────────────────────────────────────────

#[test]
fn liveness_and_diagnostics_follow_the_interval() {
    let (mut node, mut clock, mut sink) = ready_node();

    clock.advance(299_999);
    node.poll_cycle(&mut clock, &mut sink);
    assert!(node.supervisor().broker().published().is_empty());

    clock.advance(1);
    node.poll_cycle(&mut clock, &mut sink);
    let broker = node.supervisor().broker();
    assert_eq!(broker.payloads_on(AVAILABILITY), vec!["online"]);
    assert_eq!(broker.payloads_on(DIAGNOSTICS).len(), 1);
    assert_eq!(sink.count(|e| *e == AppEvent::DiagnosticsPublished), 1);

    // Re-armed: nothing more until another full interval.
    node.poll_cycle(&mut clock, &mut sink);
    assert_eq!(node.supervisor().broker().payloads_on(AVAILABILITY).len(), 1);
}

#[test]
fn shorter_interval_takes_effect_on_the_running_timer() {
    let (mut node, mut clock, mut sink) = ready_node();
    node.supervisor_mut().broker_mut().deliver(SETTER, "1");
    node.poll_cycle(&mut clock, &mut sink);

    clock.advance(60_000);
    node.poll_cycle(&mut clock, &mut sink);

    assert_eq!(node.supervisor().broker().payloads_on(AVAILABILITY), vec!["online"]);
}

#[test]
fn interval_survives_clock_wrap() {
    let (mut node, mut clock, mut sink) = ready_node();
    // Fire once just below the wrap point, which re-arms there.
    clock.now = u64::MAX - 1_000;
    node.poll_cycle(&mut clock, &mut sink);
    let reported = node.supervisor().broker().payloads_on(AVAILABILITY).len();
    assert_eq!(reported, 1);

    clock.advance(300_000);
    node.poll_cycle(&mut clock, &mut sink);
    assert_eq!(
        node.supervisor().broker().payloads_on(AVAILABILITY).len(),
        reported + 1
    );
}

// ── Link recovery ─────────────────────────────────────────────

#[test]
fn network_drop_recovers_and_resubscribes() {
    let (mut node, mut clock, mut sink) = ready_node();
    let network = node.supervisor_mut().network_mut();
    network.drop_link();
    network.fail_next = 1;

    node.poll_cycle(&mut clock, &mut sink);

    assert_eq!(node.state(), LinkState::Ready);
    assert_eq!(
        sink.events,
        vec![
            AppEvent::LinkChanged {
                from: LinkState::Ready,
                to: LinkState::Down
            },
            AppEvent::LinkChanged {
                from: LinkState::Down,
                to: LinkState::Ready
            },
        ]
    );
    let broker = node.supervisor().broker();
    assert_eq!(broker.count(|c| *c == BrokerCall::Disconnect), 1);
    assert_eq!(broker.count(|c| matches!(c, BrokerCall::SetWill(_))), 1);
    assert_eq!(broker.subscribe_count(), 1);
    assert!(clock.delays.contains(&30_000));
}

#[test]
fn discovery_is_not_repeated_after_reconnect() {
    let (mut node, mut clock, mut sink) = ready_node();
    node.supervisor_mut().network_mut().drop_link();

    node.poll_cycle(&mut clock, &mut sink);

    assert!(node.supervisor().broker().discovery_topics().is_empty());
    assert!(node.registry().is_purged());
}

#[test]
fn broker_drop_alone_reconnects_and_resubscribes() {
    let (mut node, mut clock, mut sink) = ready_node();
    node.supervisor_mut().broker_mut().drop_session();

    node.poll_cycle(&mut clock, &mut sink);

    let broker = node.supervisor().broker();
    assert_eq!(broker.connect_count(), 1);
    assert_eq!(broker.subscribe_count(), 1);
    assert_eq!(broker.count(|c| matches!(c, BrokerCall::SetWill(_))), 0);
    assert_eq!(node.state(), LinkState::Ready);
}

#[test]
fn setter_is_resubscribed_after_session_loss() {
    let (mut node, mut clock, mut sink) = ready_node();
    node.supervisor_mut().broker_mut().drop_session();
    node.poll_cycle(&mut clock, &mut sink);

    let calls = &node.supervisor().broker().calls;
    let connect = calls
        .iter()
        .position(|c| matches!(c, BrokerCall::Connect { .. }));
    let subscribe = calls
        .iter()
        .position(|c| *c == BrokerCall::Subscribe(SETTER.to_owned()));
    assert!(matches!((connect, subscribe), (Some(c), Some(s)) if c < s));

    node.supervisor_mut().broker_mut().deliver(SETTER, "20");
    node.poll_cycle(&mut clock, &mut sink);
    assert_eq!(node.reporter().interval_minutes(), 20);
}

#[test]
fn commands_arriving_after_recovery_still_apply() {
    let (mut node, mut clock, mut sink) = ready_node();
    node.supervisor_mut().network_mut().drop_link();
    node.poll_cycle(&mut clock, &mut sink);

    node.supervisor_mut().broker_mut().deliver(SETTER, "30");
    node.poll_cycle(&mut clock, &mut sink);

    assert_eq!(node.reporter().interval_minutes(), 30);
}
