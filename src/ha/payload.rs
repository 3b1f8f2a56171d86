//! JSON payload builders for Home Assistant discovery and state messages.
//!
//! Sensors and diagnostics serialise through [`DiscoveryPayload`]; absent
//! keys are `None` and skipped, so a measured diagnostic with no device
//! class simply has no `device_class` key. Controls lead with their
//! category and use [`ControlPayload`].
//!
//! Field order is the wire order:
//!
//! ```text
//! sensor/diagnostic: device_class, unit_of_measurement, state_class,
//!   entity_category, availability_topic, unique_id, device, name, icon,
//!   state_topic, value_template, json_attributes_topic,
//!   json_attributes_template
//! control: entity_category, unit_of_measurement, availability_topic,
//!   unique_id, device, name, icon, state_topic, command_topic, <custom>
//! ```

use core::fmt::Write as _;

use serde::Serialize;

/// `state_class` used for every numeric measurement.
pub const STATE_CLASS_MEASUREMENT: &str = "measurement";

/// `entity_category` for controls.
pub const ENTITY_CATEGORY_CONFIG: &str = "config";

/// `entity_category` for diagnostics.
pub const ENTITY_CATEGORY_DIAGNOSTIC: &str = "diagnostic";

// ───────────────────────────────────────────────────────────────
// Device identity payload
// ───────────────────────────────────────────────────────────────

/// The `device` object that ties entities to one device in the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DevicePayload<'a> {
    /// Restates manufacturer, model and firmware so the hub can register
    /// the device. Sent with sensors and controls.
    Full {
        name: &'a str,
        identifiers: &'a str,
        mf: &'a str,
        mdl: &'a str,
        sw: &'a str,
    },
    /// Name and identifier only; used by diagnostics, which always
    /// accompany an entity carrying the full form.
    Short { name: &'a str, ids: &'a str },
}

// ───────────────────────────────────────────────────────────────
// Discovery payload
// ───────────────────────────────────────────────────────────────

/// One discovery config object. Built per announcement, serialised once,
/// then dropped.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_of_measurement: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_class: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_category: Option<&'static str>,
    pub availability_topic: &'a str,
    pub unique_id: String,
    pub device: DevicePayload<'a>,
    pub name: String,
    pub icon: &'a str,
    pub state_topic: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_attributes_topic: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_attributes_template: Option<String>,
}

impl<'a> DiscoveryPayload<'a> {
    /// Common skeleton: identity, naming, icon and state topic.
    pub fn new(
        device_id: &str,
        attribute: &str,
        device: DevicePayload<'a>,
        availability_topic: &'a str,
        icon: &'a str,
        state_topic: &'a str,
    ) -> Self {
        Self {
            device_class: None,
            unit_of_measurement: None,
            state_class: None,
            entity_category: None,
            availability_topic,
            unique_id: unique_id(device_id, attribute),
            device,
            name: entity_name(device_id, attribute),
            icon,
            state_topic,
            value_template: None,
            json_attributes_topic: None,
            json_attributes_template: None,
        }
    }

    /// Serialise compactly.
    pub fn to_json(&self) -> String {
        encode(self)
    }
}

/// Discovery config object for a control with getter/setter topics.
#[derive(Debug, Clone, Serialize)]
pub struct ControlPayload<'a> {
    pub entity_category: &'static str,
    pub unit_of_measurement: &'a str,
    pub availability_topic: &'a str,
    pub unique_id: String,
    pub device: DevicePayload<'a>,
    pub name: String,
    pub icon: &'a str,
    pub state_topic: &'a str,
    pub command_topic: &'a str,
}

impl<'a> ControlPayload<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device_id: &str,
        control: &str,
        device: DevicePayload<'a>,
        availability_topic: &'a str,
        icon: &'a str,
        unit: &'a str,
        getter_topic: &'a str,
        setter_topic: &'a str,
    ) -> Self {
        Self {
            entity_category: ENTITY_CATEGORY_CONFIG,
            unit_of_measurement: unit,
            availability_topic,
            unique_id: unique_id(device_id, control),
            device,
            name: entity_name(device_id, control),
            icon,
            state_topic: getter_topic,
            command_topic: setter_topic,
        }
    }

    /// Serialise compactly. `custom_settings` is a raw JSON fragment
    /// (`"min": 1, "max": 60`) spliced in before the closing brace.
    pub fn to_json(&self, custom_settings: &str) -> String {
        let mut json = encode(self);
        let fragment = custom_settings.trim();
        if !fragment.is_empty() && json.ends_with('}') {
            json.pop();
            json.push(',');
            json.push_str(fragment);
            json.push('}');
        }
        json
    }
}

/// `<device_id>_<attribute>`
pub fn unique_id(device_id: &str, attribute: &str) -> String {
    format!("{device_id}_{attribute}")
}

/// `<device_id> <attribute>`
pub fn entity_name(device_id: &str, attribute: &str) -> String {
    format!("{device_id} {attribute}")
}

/// Template extracting one key from the state object.
pub fn value_template(attribute: &str) -> String {
    format!("{{{{ value_json.{attribute} }}}}")
}

/// Template forwarding the `<attribute>_details` object as entity attributes.
pub fn attributes_template(attribute: &str) -> String {
    format!("{{{{ value_json.{attribute}_details | tojson }}}}")
}

// ───────────────────────────────────────────────────────────────
// State and diagnostics payloads
// ───────────────────────────────────────────────────────────────

/// Combined radiation state object.
///
/// ```text
/// {"frequency":0.2833,"frequency_details":{"dose":0.32,"dose_err":0.08,"cpm":17.00}}
/// ```
///
/// Frequency is counts per second. Non-finite inputs are reported as 0.
pub fn build_state_payload(cpm: f32, usvh: f32, usvh_error: f32) -> String {
    let cpm = finite_or_zero(cpm);
    let mut payload = String::with_capacity(96);
    // Writing to a String cannot fail.
    let _ = write!(
        payload,
        "{{\"frequency\":{:.4},\"frequency_details\":{{\"dose\":{:.2},\"dose_err\":{:.2},\"cpm\":{:.2}}}}}",
        cpm / 60.0,
        finite_or_zero(usvh),
        finite_or_zero(usvh_error),
        cpm,
    );
    payload
}

#[derive(Serialize)]
struct DiagnosticsPayload<'a> {
    wifi_rssi: i32,
    wifi_ip: &'a str,
    wifi_mac: &'a str,
}

/// Periodic diagnostics object matching the diagnostic announcements.
pub fn build_diagnostics_payload(rssi: i32, ip: &str, mac: &str) -> String {
    encode(&DiagnosticsPayload {
        wifi_rssi: rssi,
        wifi_ip: ip,
        wifi_mac: mac,
    })
}

// ───────────────────────────────────────────────────────────────
// Internal
// ───────────────────────────────────────────────────────────────

fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() { v } else { 0.0 }
}

fn encode<T: Serialize>(value: &T) -> String {
    // Structs of strings, integers and nested objects always serialise.
    serde_json::to_string(value).unwrap_or_default()
}
