//! Topic builders for the Home Assistant MQTT namespace.
//!
//! Every topic lives under [`HA_TOPIC_BASE`]:
//!
//! ```text
//! homeassistant/<component>/<device_id>/availability
//! homeassistant/<component>/<device_id>/diagnostics
//! homeassistant/<component>/<device_id>/state
//! homeassistant/<component>/<device_id>/<object_id>/config
//! homeassistant/<component>/<device_id>/<control>/set
//! homeassistant/<component>/<device_id>/<control>/get
//! ```

/// Discovery prefix configured on the hub.
pub const HA_TOPIC_BASE: &str = "homeassistant";

fn device_topic(component: &str, device_id: &str, leaf: &str) -> String {
    let mut topic = String::with_capacity(
        HA_TOPIC_BASE.len() + component.len() + device_id.len() + leaf.len() + 3,
    );
    topic.push_str(HA_TOPIC_BASE);
    topic.push('/');
    topic.push_str(component);
    topic.push('/');
    topic.push_str(device_id);
    topic.push('/');
    topic.push_str(leaf);
    topic
}

fn entity_topic(component: &str, device_id: &str, object_id: &str, leaf: &str) -> String {
    let mut topic = device_topic(component, device_id, object_id);
    topic.push('/');
    topic.push_str(leaf);
    topic
}

/// Liveness topic, armed as the broker last will.
pub fn build_availability_topic(component: &str, device_id: &str) -> String {
    device_topic(component, device_id, "availability")
}

/// Topic carrying the periodic diagnostics object.
pub fn build_diagnostic_topic(component: &str, device_id: &str) -> String {
    device_topic(component, device_id, "diagnostics")
}

/// Topic carrying the combined sensor state object.
pub fn build_state_topic(component: &str, device_id: &str) -> String {
    device_topic(component, device_id, "state")
}

/// Retained discovery config topic for one entity.
pub fn build_discovery_topic(component: &str, device_id: &str, object_id: &str) -> String {
    entity_topic(component, device_id, object_id, "config")
}

/// Command topic the hub writes to for a control.
pub fn build_setter_topic(component: &str, device_id: &str, control: &str) -> String {
    entity_topic(component, device_id, control, "set")
}

/// State topic the device reports a control's current value on.
pub fn build_getter_topic(component: &str, device_id: &str, control: &str) -> String {
    entity_topic(component, device_id, control, "get")
}
