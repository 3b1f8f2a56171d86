//! Mock adapters for integration tests.
//!
//! Every port gets a scripted fake. The broker records each call so tests
//! can assert on the full session history; the clock only moves when a
//! delay is requested or a test advances it.

use std::collections::VecDeque;
use std::net::Ipv4Addr;

use embedded_hal::delay::DelayNs;
use radthing::app::events::AppEvent;
use radthing::app::ports::{
    BrokerEndpoint, BrokerPort, ClockPort, EventSink, InboundMessage, LastWill, NetworkPort, Qos,
    RadiationReading, SensingEvent, SensingPort,
};
use radthing::app::service::NodeService;
use radthing::config::NodeConfig;
use radthing::error::CommsError;

pub const TEST_MAC: &str = "DE:AD:BE:EF:00:01";

// ── Network ───────────────────────────────────────────────────

pub struct FakeNetwork {
    pub up: bool,
    /// Attempts that fail before one succeeds.
    pub fail_next: u32,
    pub attempts: u32,
    pub rssi: Option<i8>,
    pub ip: Option<Ipv4Addr>,
}

#[allow(dead_code)]
impl FakeNetwork {
    pub fn new() -> Self {
        Self {
            up: false,
            fail_next: 0,
            attempts: 0,
            rssi: Some(-61),
            ip: Some(Ipv4Addr::new(10, 0, 0, 50)),
        }
    }

    pub fn drop_link(&mut self) {
        self.up = false;
    }
}

impl NetworkPort for FakeNetwork {
    fn connect(&mut self, _ssid: &str, _passphrase: &str, _attempt_ms: u32) -> Result<(), CommsError> {
        if self.up {
            return Ok(());
        }
        self.attempts += 1;
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(CommsError::NetworkTimeout);
        }
        self.up = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.up
    }

    fn rssi(&self) -> Option<i8> {
        if self.up { self.rssi } else { None }
    }

    fn ip(&self) -> Option<Ipv4Addr> {
        if self.up { self.ip } else { None }
    }
}

// ── Broker ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum BrokerCall {
    SetWill(LastWill),
    Connect { client_id: String },
    Disconnect,
    Publish {
        topic: String,
        payload: String,
        retained: bool,
        qos: Qos,
    },
    Subscribe(String),
}

pub struct FakeBroker {
    pub connected: bool,
    pub calls: Vec<BrokerCall>,
    /// Connects refused before one is accepted.
    pub refuse_connects: u32,
    /// Publishes rejected before one is accepted.
    pub fail_publishes: u32,
    /// Subscribes rejected before one is accepted.
    pub fail_subscribes: u32,
    pub inbox: VecDeque<InboundMessage>,
    pub polls: u32,
}

#[allow(dead_code)]
impl FakeBroker {
    pub fn new() -> Self {
        Self {
            connected: false,
            calls: Vec::new(),
            refuse_connects: 0,
            fail_publishes: 0,
            fail_subscribes: 0,
            inbox: VecDeque::new(),
            polls: 0,
        }
    }

    /// The broker side drops the session.
    pub fn drop_session(&mut self) {
        self.connected = false;
    }

    /// Queue a message as if it arrived on a subscribed topic.
    pub fn deliver(&mut self, topic: &str, payload: &str) {
        if let Some(msg) = InboundMessage::from_parts(topic, payload.as_bytes()) {
            self.inbox.push_back(msg);
        }
    }

    /// Accepted publishes, in order.
    pub fn published(&self) -> Vec<(&str, &str, bool, Qos)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                BrokerCall::Publish {
                    topic,
                    payload,
                    retained,
                    qos,
                } => Some((topic.as_str(), payload.as_str(), *retained, *qos)),
                _ => None,
            })
            .collect()
    }

    /// Accepted payloads on `topic`, in order.
    pub fn payloads_on(&self, topic: &str) -> Vec<&str> {
        self.published()
            .into_iter()
            .filter(|(t, ..)| *t == topic)
            .map(|(_, p, ..)| p)
            .collect()
    }

    pub fn discovery_topics(&self) -> Vec<&str> {
        self.published()
            .into_iter()
            .filter(|(t, ..)| t.ends_with("/config"))
            .map(|(t, ..)| t)
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&BrokerCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn subscribe_count(&self) -> usize {
        self.count(|c| matches!(c, BrokerCall::Subscribe(_)))
    }

    pub fn connect_count(&self) -> usize {
        self.count(|c| matches!(c, BrokerCall::Connect { .. }))
    }
}

impl BrokerPort for FakeBroker {
    fn set_will(&mut self, will: &LastWill) {
        self.calls.push(BrokerCall::SetWill(will.clone()));
    }

    fn connect(&mut self, endpoint: &BrokerEndpoint) -> Result<(), CommsError> {
        if self.connected {
            return Ok(());
        }
        if self.refuse_connects > 0 {
            self.refuse_connects -= 1;
            return Err(CommsError::BrokerConnectFailed);
        }
        self.calls.push(BrokerCall::Connect {
            client_id: endpoint.client_id.clone(),
        });
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.calls.push(BrokerCall::Disconnect);
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn publish(&mut self, topic: &str, payload: &str, retained: bool, qos: Qos) -> Result<(), CommsError> {
        if !self.connected {
            return Err(CommsError::BrokerDown);
        }
        if self.fail_publishes > 0 {
            self.fail_publishes -= 1;
            return Err(CommsError::PublishFailed);
        }
        self.calls.push(BrokerCall::Publish {
            topic: topic.to_owned(),
            payload: payload.to_owned(),
            retained,
            qos,
        });
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), CommsError> {
        if !self.connected {
            return Err(CommsError::BrokerDown);
        }
        if self.fail_subscribes > 0 {
            self.fail_subscribes -= 1;
            return Err(CommsError::SubscribeFailed);
        }
        self.calls.push(BrokerCall::Subscribe(topic.to_owned()));
        Ok(())
    }

    fn poll(&mut self) {
        self.polls += 1;
    }

    fn take_message(&mut self) -> Option<InboundMessage> {
        self.inbox.pop_front()
    }
}

// ── Sensing ───────────────────────────────────────────────────

pub struct FakeSensing {
    pub setup_calls: u32,
    /// Raised by the "interrupt", visible after the next poll.
    raised: Vec<SensingEvent>,
    events: VecDeque<SensingEvent>,
    pub reading: RadiationReading,
}

#[allow(dead_code)]
impl FakeSensing {
    pub fn new() -> Self {
        Self {
            setup_calls: 0,
            raised: Vec::new(),
            events: VecDeque::new(),
            reading: RadiationReading::default(),
        }
    }

    pub fn pulse(&mut self, reading: RadiationReading) {
        self.reading = reading;
        self.raised.push(SensingEvent::Pulse);
    }

    pub fn noise(&mut self) {
        self.raised.push(SensingEvent::Noise);
    }
}

impl SensingPort for FakeSensing {
    fn setup(&mut self) {
        self.setup_calls += 1;
    }

    fn poll(&mut self) {
        self.events.extend(self.raised.drain(..));
    }

    fn next_event(&mut self) -> Option<SensingEvent> {
        self.events.pop_front()
    }

    fn reading(&self) -> RadiationReading {
        self.reading
    }
}

// ── Clock ─────────────────────────────────────────────────────

/// Virtual time: delays advance it instantly.
pub struct FakeClock {
    pub now: u64,
    pub delays: Vec<u32>,
}

#[allow(dead_code)]
impl FakeClock {
    pub fn new() -> Self {
        Self {
            now: 1_000,
            delays: Vec::new(),
        }
    }

    pub fn advance(&mut self, ms: u64) {
        self.now = self.now.wrapping_add(ms);
    }
}

impl DelayNs for FakeClock {
    fn delay_ns(&mut self, ns: u32) {
        self.now = self.now.wrapping_add(u64::from(ns / 1_000_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays.push(ms);
        self.now = self.now.wrapping_add(u64::from(ms));
    }
}

impl ClockPort for FakeClock {
    fn now_ms(&self) -> u64 {
        self.now
    }
}

// ── Event sink ────────────────────────────────────────────────

pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Harness ───────────────────────────────────────────────────

pub type TestNode = NodeService<FakeNetwork, FakeBroker, FakeSensing>;

pub fn make_node(config: &NodeConfig) -> TestNode {
    NodeService::new(config, TEST_MAC, FakeNetwork::new(), FakeBroker::new(), FakeSensing::new())
}

/// A node that has completed bring-up, with the history cleared.
#[allow(dead_code)]
pub fn ready_node() -> (TestNode, FakeClock, RecordingSink) {
    let mut node = make_node(&NodeConfig::default());
    let mut clock = FakeClock::new();
    let mut sink = RecordingSink::new();
    node.bring_up(&mut clock, &mut sink);
    node.supervisor_mut().broker_mut().calls.clear();
    clock.delays.clear();
    sink.clear();
    (node, clock, sink)
}
