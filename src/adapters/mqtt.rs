//! MQTT client adapter.
//!
//! Implements [`BrokerPort`] on top of the ESP-IDF MQTT client. The
//! client's event callback runs on the MQTT task; it only flips the
//! connection flag and pushes received messages into a bounded
//! `embassy-sync` channel. The poll loop drains that channel through
//! [`take_message`](BrokerPort::take_message), so no command is ever
//! handled on the client's receive path.
//!
//! ```text
//! ┌──────────────┐ InboundMessage ┌──────────────┐
//! │  MQTT task   │───────────────▶│  Poll loop   │
//! │  (callback)  │    (inbox)     │  (sync)      │
//! └──────────────┘                └──────────────┘
//! ```
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::mqtt::client::EspMqttClient`.
//! - **all other targets**: an in-memory broker recording every call.

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{debug, info, warn};

use crate::app::ports::{BrokerEndpoint, BrokerPort, InboundMessage, LastWill, Qos};
use crate::error::CommsError;

/// Received messages waiting for the poll loop.
const INBOX_DEPTH: usize = 4;

type Inbox = Channel<CriticalSectionRawMutex, InboundMessage, INBOX_DEPTH>;

/// Hand one received message to the poll loop. Oversized or non-UTF-8
/// messages and messages arriving while the inbox is full are dropped.
fn deliver(inbox: &Inbox, topic: &str, data: &[u8]) {
    let Some(msg) = InboundMessage::from_parts(topic, data) else {
        warn!("MQTT: dropping unreadable message on {}", topic);
        return;
    };
    if inbox.try_send(msg).is_err() {
        warn!("MQTT: inbox full, dropping message on {}", topic);
    }
}

// ───────────────────────────────────────────────────────────────
// MQTT adapter
// ───────────────────────────────────────────────────────────────

pub struct MqttBroker {
    #[cfg(target_os = "espidf")]
    client: Option<esp_idf_svc::mqtt::client::EspMqttClient<'static>>,
    /// Simulation: recorded publishes `(topic, payload, retained, qos)`.
    #[cfg(not(target_os = "espidf"))]
    sim_published: Vec<(String, String, bool, Qos)>,
    /// Simulation: accepted subscriptions.
    #[cfg(not(target_os = "espidf"))]
    sim_subscriptions: Vec<String>,
    /// Simulation: connect attempts that will be refused.
    #[cfg(not(target_os = "espidf"))]
    sim_refuse_connects: u32,
    will: Option<LastWill>,
    connected: Arc<AtomicBool>,
    inbox: Arc<Inbox>,
}

impl Default for MqttBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl MqttBroker {
    pub fn new() -> Self {
        Self {
            #[cfg(target_os = "espidf")]
            client: None,
            #[cfg(not(target_os = "espidf"))]
            sim_published: Vec::new(),
            #[cfg(not(target_os = "espidf"))]
            sim_subscriptions: Vec::new(),
            #[cfg(not(target_os = "espidf"))]
            sim_refuse_connects: 0,
            will: None,
            connected: Arc::new(AtomicBool::new(false)),
            inbox: Arc::new(Channel::new()),
        }
    }

    /// Last will armed for the next connect.
    pub fn will(&self) -> Option<&LastWill> {
        self.will.as_ref()
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self, endpoint: &BrokerEndpoint) -> Result<(), CommsError> {
        use core::time::Duration;

        use esp_idf_hal::delay::FreeRtos;
        use esp_idf_svc::mqtt::client::{
            EspMqttClient, EventPayload, LwtConfiguration, MqttClientConfiguration,
        };

        /// How long to wait for the CONNACK.
        const CONNECT_WAIT_MS: u32 = 5_000;
        const POLL_MS: u32 = 50;

        let url = format!("mqtt://{}:{}", endpoint.host, endpoint.port);
        let lwt = self.will.as_ref().map(|w| LwtConfiguration {
            topic: &w.topic,
            payload: w.payload.as_bytes(),
            qos: to_esp_qos(w.qos),
            retain: w.retained,
        });
        let conf = MqttClientConfiguration {
            client_id: Some(&endpoint.client_id),
            username: (!endpoint.username.is_empty()).then_some(endpoint.username.as_str()),
            password: (!endpoint.password.is_empty()).then_some(endpoint.password.as_str()),
            keep_alive_interval: Some(Duration::from_secs(u64::from(endpoint.keep_alive_secs))),
            lwt,
            ..Default::default()
        };

        let connected = self.connected.clone();
        let inbox = self.inbox.clone();
        let client = EspMqttClient::new_cb(&url, &conf, move |event| match event.payload() {
            EventPayload::Connected(_) => connected.store(true, Ordering::Release),
            EventPayload::Disconnected => connected.store(false, Ordering::Release),
            EventPayload::Received { topic: Some(topic), data, .. } => deliver(&inbox, topic, data),
            _ => {}
        })
        .map_err(|_| CommsError::BrokerConnectFailed)?;
        self.client = Some(client);

        let mut waited = 0;
        while waited < CONNECT_WAIT_MS && !self.connected.load(Ordering::Acquire) {
            FreeRtos::delay_ms(POLL_MS);
            waited += POLL_MS;
        }
        if self.connected.load(Ordering::Acquire) {
            Ok(())
        } else {
            // Drop the client so it does not keep reconnecting on its own.
            self.client = None;
            Err(CommsError::BrokerConnectFailed)
        }
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        self.client = None;
    }

    #[cfg(target_os = "espidf")]
    fn platform_publish(&mut self, topic: &str, payload: &str, retained: bool, qos: Qos) -> Result<(), CommsError> {
        let client = self.client.as_mut().ok_or(CommsError::BrokerDown)?;
        client
            .publish(topic, to_esp_qos(qos), retained, payload.as_bytes())
            .map(|_| ())
            .map_err(|_| CommsError::PublishFailed)
    }

    #[cfg(target_os = "espidf")]
    fn platform_subscribe(&mut self, topic: &str) -> Result<(), CommsError> {
        let client = self.client.as_mut().ok_or(CommsError::BrokerDown)?;
        client
            .subscribe(topic, to_esp_qos(Qos::AtMostOnce))
            .map(|_| ())
            .map_err(|_| CommsError::SubscribeFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self, endpoint: &BrokerEndpoint) -> Result<(), CommsError> {
        if self.sim_refuse_connects > 0 {
            self.sim_refuse_connects -= 1;
            return Err(CommsError::BrokerConnectFailed);
        }
        debug!(
            "MQTT(sim): session for '{}' (will armed: {})",
            endpoint.client_id,
            self.will.is_some()
        );
        self.connected.store(true, Ordering::Release);
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        self.sim_subscriptions.clear();
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_publish(&mut self, topic: &str, payload: &str, retained: bool, qos: Qos) -> Result<(), CommsError> {
        self.sim_published
            .push((topic.to_owned(), payload.to_owned(), retained, qos));
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_subscribe(&mut self, topic: &str) -> Result<(), CommsError> {
        self.sim_subscriptions.push(topic.to_owned());
        Ok(())
    }
}

#[cfg(target_os = "espidf")]
fn to_esp_qos(qos: Qos) -> esp_idf_svc::mqtt::client::QoS {
    use esp_idf_svc::mqtt::client::QoS;
    match qos {
        Qos::AtMostOnce => QoS::AtMostOnce,
        Qos::AtLeastOnce => QoS::AtLeastOnce,
    }
}

/// Host-side controls for the in-memory broker.
#[cfg(not(target_os = "espidf"))]
impl MqttBroker {
    /// The next `n` connects are refused.
    pub fn sim_refuse_next(&mut self, n: u32) {
        self.sim_refuse_connects = n;
    }

    /// The broker drops the session (the will would fire).
    pub fn sim_drop_session(&mut self) {
        self.connected.store(false, Ordering::Release);
        self.sim_subscriptions.clear();
    }

    /// A message arrives as if from the MQTT task.
    pub fn sim_receive(&self, topic: &str, payload: &[u8]) {
        deliver(&self.inbox, topic, payload);
    }

    pub fn sim_published(&self) -> &[(String, String, bool, Qos)] {
        &self.sim_published
    }

    pub fn sim_subscriptions(&self) -> &[String] {
        &self.sim_subscriptions
    }
}

// ───────────────────────────────────────────────────────────────
// BrokerPort
// ───────────────────────────────────────────────────────────────

impl BrokerPort for MqttBroker {
    fn set_will(&mut self, will: &LastWill) {
        self.will = Some(will.clone());
    }

    fn connect(&mut self, endpoint: &BrokerEndpoint) -> Result<(), CommsError> {
        if self.is_connected() {
            return Ok(());
        }
        self.platform_connect(endpoint).inspect_err(|e| {
            warn!("MQTT: connect to {}:{} failed — {}", endpoint.host, endpoint.port, e);
        })
    }

    fn disconnect(&mut self) {
        self.platform_disconnect();
        if self.connected.swap(false, Ordering::AcqRel) {
            info!("MQTT: disconnected");
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn publish(&mut self, topic: &str, payload: &str, retained: bool, qos: Qos) -> Result<(), CommsError> {
        if !self.is_connected() {
            return Err(CommsError::BrokerDown);
        }
        self.platform_publish(topic, payload, retained, qos)
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), CommsError> {
        if !self.is_connected() {
            return Err(CommsError::BrokerDown);
        }
        self.platform_subscribe(topic)
    }

    fn poll(&mut self) {
        // The ESP-IDF client runs its own task; keep-alive needs nothing here.
    }

    fn take_message(&mut self) -> Option<InboundMessage> {
        self.inbox.try_receive().ok()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
