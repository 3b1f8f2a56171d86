//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ NodeService / ConnectivitySupervisor (domain)
//! ```
//!
//! Driven adapters (WiFi station, MQTT client, radiation counter, clock,
//! event sinks) implement these traits. The domain consumes them via
//! generics, so the core never touches the radio or GPIO directly and is
//! exercised on the host with scripted fakes.

use core::net::Ipv4Addr;

use embedded_hal::delay::DelayNs;

use crate::error::CommsError;

/// Capacity of an inbound topic.
pub const INBOUND_TOPIC_CAP: usize = 128;

/// Capacity of an inbound payload. Control payloads are short numerals.
pub const INBOUND_PAYLOAD_CAP: usize = 32;

// ───────────────────────────────────────────────────────────────
// Network port (driven adapter: domain → WiFi station)
// ───────────────────────────────────────────────────────────────

/// Station-mode network link.
pub trait NetworkPort {
    /// Make **one** association attempt, blocking at most `attempt_ms`.
    ///
    /// Returns `Ok(())` only if the link is up when the call returns.
    fn connect(&mut self, ssid: &str, passphrase: &str, attempt_ms: u32) -> Result<(), CommsError>;

    /// Current link status.
    fn is_connected(&self) -> bool;

    /// Received signal strength in dBm while associated.
    fn rssi(&self) -> Option<i8>;

    /// Station IPv4 address while associated.
    fn ip(&self) -> Option<Ipv4Addr>;
}

// ───────────────────────────────────────────────────────────────
// Broker port (driven adapter: domain ↔ MQTT client)
// ───────────────────────────────────────────────────────────────

/// MQTT delivery guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qos {
    /// QoS 0.
    AtMostOnce,
    /// QoS 1.
    AtLeastOnce,
}

/// Last-will-and-testament message the broker publishes on our behalf
/// when the session drops uncleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastWill {
    pub topic: String,
    pub payload: &'static str,
    pub retained: bool,
    pub qos: Qos,
}

/// Where and as whom to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerEndpoint {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub username: String,
    pub password: String,
    pub keep_alive_secs: u16,
}

/// A message received on a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: heapless::String<INBOUND_TOPIC_CAP>,
    pub payload: heapless::String<INBOUND_PAYLOAD_CAP>,
}

impl InboundMessage {
    /// Build from raw parts. Returns `None` when either part overflows its
    /// fixed capacity or the payload is not UTF-8.
    pub fn from_parts(topic: &str, payload: &[u8]) -> Option<Self> {
        let payload = core::str::from_utf8(payload).ok()?;
        let mut msg = Self {
            topic: heapless::String::new(),
            payload: heapless::String::new(),
        };
        msg.topic.push_str(topic).ok()?;
        msg.payload.push_str(payload).ok()?;
        Some(msg)
    }
}

/// Publish/subscribe client.
///
/// The client is singly owned by the
/// [`ConnectivitySupervisor`](crate::connectivity::ConnectivitySupervisor);
/// other components borrow it through the supervisor.
pub trait BrokerPort {
    /// (Re)arm the last will used by the next [`connect`](Self::connect).
    fn set_will(&mut self, will: &LastWill);

    /// Connect to the broker. A no-op returning `Ok(())` when already connected.
    fn connect(&mut self, endpoint: &BrokerEndpoint) -> Result<(), CommsError>;

    /// Drop the broker session.
    fn disconnect(&mut self);

    /// Current session status.
    fn is_connected(&self) -> bool;

    /// Hand one message to the broker.
    fn publish(&mut self, topic: &str, payload: &str, retained: bool, qos: Qos) -> Result<(), CommsError>;

    /// Subscribe to one topic.
    fn subscribe(&mut self, topic: &str) -> Result<(), CommsError>;

    /// Service the client (keep-alive, inbound delivery). Called once per loop.
    fn poll(&mut self);

    /// Next received message, if any.
    fn take_message(&mut self) -> Option<InboundMessage>;
}

// ───────────────────────────────────────────────────────────────
// Sensing port (driven adapter: radiation counter → domain)
// ───────────────────────────────────────────────────────────────

/// Something the radiation sensor observed since the last poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensingEvent {
    /// A gamma pulse was counted.
    Pulse,
    /// The vibration/noise line fired; the current counting slot was discarded.
    Noise,
}

/// Computed radiation figures.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RadiationReading {
    /// Counts per minute.
    pub cpm: f32,
    /// Dose rate in µSv/h.
    pub usvh: f32,
    /// Dose rate error bound in µSv/h.
    pub usvh_error: f32,
}

/// The external sensing collaborator.
pub trait SensingPort {
    /// Arm interrupts. Called once during bring-up.
    fn setup(&mut self);

    /// Consume pending interrupt indicators and turn them into events.
    fn poll(&mut self);

    /// Next queued event, oldest first.
    fn next_event(&mut self) -> Option<SensingEvent>;

    /// Current computed figures.
    fn reading(&self) -> RadiationReading;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time plus blocking delays.
///
/// Delays come from [`DelayNs`], so any embedded-hal delay provider
/// (FreeRTOS, a test fake) can back it.
pub trait ClockPort: DelayNs {
    /// Milliseconds since boot. Wraps at `u64::MAX`.
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
