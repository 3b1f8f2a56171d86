//! Connectivity supervisor.
//!
//! Brings the node from "no network" to "broker connected and subscribed"
//! and keeps it there. The supervisor singly owns both the network link
//! and the broker client; everything else borrows the broker through it.
//!
//! ```text
//!   Down ──connect──▶ NetworkUp ──broker + subscriptions──▶ Ready
//!    ▲                    │                                   │
//!    └──── link lost ─────┴───────────── link lost ───────────┘
//! ```
//!
//! The state is never stored as a tag; it is derived from the live link
//! status on every observation, so a dropped link is seen immediately.
//! Faults are logged and retried forever, never returned.

pub mod policy;

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{BrokerEndpoint, BrokerPort, ClockPort, EventSink, LastWill, NetworkPort, Qos};
use crate::config::{NodeConfig, WifiConfig};

pub use policy::RetryPolicy;

/// Payload of the availability topic while the node is up.
pub const AVAILABILITY_ONLINE: &str = "online";

/// Payload the broker publishes on our behalf when the session dies.
pub const AVAILABILITY_OFFLINE: &str = "offline";

/// Observed connectivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No network link.
    Down,
    /// Network up; broker down or subscriptions not yet verified.
    NetworkUp,
    /// Network, broker and subscriptions all in place.
    Ready,
}

// ───────────────────────────────────────────────────────────────
// ConnectivitySupervisor
// ───────────────────────────────────────────────────────────────

pub struct ConnectivitySupervisor<N, B> {
    network: N,
    broker: B,
    wifi: WifiConfig,
    endpoint: BrokerEndpoint,
    will: LastWill,
    subscriptions: Vec<String>,
    policy: RetryPolicy,
    /// Set on every fresh network link and broker session, cleared once all
    /// subscriptions succeed.
    subscription_required: bool,
    /// Network status seen at the end of the previous pass.
    network_was_up: bool,
    last_state: LinkState,
    details_logged: bool,
}

impl<N: NetworkPort, B: BrokerPort> ConnectivitySupervisor<N, B> {
    /// Takes ownership of both links. Nothing is attempted until the first
    /// [`step`](Self::step).
    pub fn new(network: N, broker: B, config: &NodeConfig, availability_topic: &str) -> Self {
        Self {
            network,
            broker,
            wifi: config.wifi.clone(),
            endpoint: config.broker_endpoint(),
            will: LastWill {
                topic: availability_topic.to_owned(),
                payload: AVAILABILITY_OFFLINE,
                retained: true,
                qos: Qos::AtLeastOnce,
            },
            subscriptions: Vec::new(),
            policy: config.retry,
            subscription_required: true,
            network_was_up: false,
            last_state: LinkState::Down,
            details_logged: false,
        }
    }

    /// Add a topic to (re)subscribe after every fresh network link.
    pub fn add_subscription(&mut self, topic: impl Into<String>) {
        self.subscriptions.push(topic.into());
        self.subscription_required = true;
    }

    pub fn subscriptions(&self) -> &[String] {
        &self.subscriptions
    }

    /// Current state, read from the live links.
    pub fn state(&self) -> LinkState {
        if !self.network.is_connected() {
            LinkState::Down
        } else if !self.broker.is_connected() || self.subscription_required {
            LinkState::NetworkUp
        } else {
            LinkState::Ready
        }
    }

    pub fn subscription_required(&self) -> bool {
        self.subscription_required
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut N {
        &mut self.network
    }

    pub fn broker(&self) -> &B {
        &self.broker
    }

    pub fn broker_mut(&mut self) -> &mut B {
        &mut self.broker
    }

    /// Both links at once, for reports that read the network while
    /// publishing through the broker.
    pub fn links_mut(&mut self) -> (&N, &mut B) {
        (&self.network, &mut self.broker)
    }

    // ── Driving ───────────────────────────────────────────────

    /// One supervision pass.
    ///
    /// Works from the bottom of the stack up: network, then broker, then
    /// subscriptions. A failed layer sleeps its cooldown and ends the pass;
    /// a successful one falls through to the next. When already
    /// [`LinkState::Ready`] this only queries link status.
    pub fn step(&mut self, clock: &mut impl ClockPort, sink: &mut impl EventSink) -> LinkState {
        if !self.network.is_connected() {
            self.network_was_up = false;
            match self.network.connect(
                &self.wifi.ssid,
                &self.wifi.passphrase,
                self.policy.network_attempt_ms,
            ) {
                Ok(()) => info!("Network: connected to '{}'", self.wifi.ssid),
                Err(e) => {
                    warn!(
                        "Network: {} — retrying in {} ms",
                        e, self.policy.network_cooldown_ms
                    );
                    clock.delay_ms(self.policy.network_cooldown_ms);
                    return self.observe(sink);
                }
            }
        }

        if !self.network_was_up {
            self.network_was_up = true;
            self.reinit_broker(clock);
        }

        if !self.broker.is_connected() {
            match self.broker.connect(&self.endpoint) {
                Ok(()) => {
                    info!(
                        "Broker: connected to {}:{} as '{}'",
                        self.endpoint.host, self.endpoint.port, self.endpoint.client_id
                    );
                    // A new session starts with no subscriptions.
                    self.subscription_required = true;
                }
                Err(e) => {
                    warn!(
                        "Broker: {} — retrying in {} ms",
                        e, self.policy.broker_cooldown_ms
                    );
                    clock.delay_ms(self.policy.broker_cooldown_ms);
                    return self.observe(sink);
                }
            }
        }

        if self.subscription_required {
            self.subscribe_all();
        }

        self.observe(sink)
    }

    /// Block until [`LinkState::Ready`]. Never gives up.
    pub fn assert_connectivity(&mut self, clock: &mut impl ClockPort, sink: &mut impl EventSink) {
        while self.step(clock, sink) != LinkState::Ready {}
    }

    // ── Internal ──────────────────────────────────────────────

    /// A fresh network link may have left the broker session half-open.
    fn reinit_broker(&mut self, clock: &mut impl ClockPort) {
        self.subscription_required = true;
        self.broker.disconnect();
        self.broker.set_will(&self.will);
        debug!(
            "Broker: client re-armed (will '{}' on {})",
            self.will.payload, self.will.topic
        );
        clock.delay_ms(self.policy.settle_ms);
    }

    fn subscribe_all(&mut self) {
        let mut all_ok = true;
        for topic in &self.subscriptions {
            match self.broker.subscribe(topic) {
                Ok(()) => info!("Broker: subscribed to {}", topic),
                Err(e) => {
                    warn!("Broker: subscribe to {} failed — {}", topic, e);
                    all_ok = false;
                }
            }
        }
        if all_ok {
            self.subscription_required = false;
        } else {
            // Reconnect and try the whole round again next pass.
            self.broker.disconnect();
        }
    }

    fn observe(&mut self, sink: &mut impl EventSink) -> LinkState {
        let state = self.state();
        if state != self.last_state {
            info!("Link: {:?} -> {:?}", self.last_state, state);
            sink.emit(&AppEvent::LinkChanged {
                from: self.last_state,
                to: state,
            });
            self.last_state = state;
        }
        if state == LinkState::Ready && !self.details_logged {
            self.details_logged = true;
            info!(
                "Network: ip={:?} rssi={:?} dBm",
                self.network.ip(),
                self.network.rssi()
            );
        }
        state
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
