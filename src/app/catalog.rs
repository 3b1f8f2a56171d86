//! Static description of everything this node announces to the hub.

use crate::discovery::context::DEVICE_COMPONENT;
use crate::discovery::{Announcement, DiscoveryRegistry};
use crate::ha::topics::{build_getter_topic, build_setter_topic};

use super::commands::{MAX_REPORT_MINUTES, MIN_REPORT_MINUTES};

/// Primary reading: pulse frequency, with dose details as attributes.
pub const FREQUENCY_ATTR: &str = "frequency";

/// Report-interval control.
pub const REFRESH_CONTROL: &str = "refreshrate";
pub const REFRESH_COMPONENT: &str = "number";

pub const RSSI_ATTR: &str = "wifi_rssi";
pub const IP_ATTR: &str = "wifi_ip";
pub const MAC_ATTR: &str = "wifi_mac";

/// The node's announcements, in the order they are filed.
pub fn announcements() -> Vec<Announcement> {
    let refresh_settings = format!(
        "\"min\": {MIN_REPORT_MINUTES}, \"max\": {MAX_REPORT_MINUTES}, \"step\": 1"
    );
    vec![
        Announcement::sensor(DEVICE_COMPONENT, FREQUENCY_ATTR, "frequency", "Hz", "mdi:radioactive", true),
        Announcement::control(
            REFRESH_COMPONENT,
            REFRESH_CONTROL,
            &refresh_settings,
            "mdi:refresh-circle",
            "minutes",
        ),
        Announcement::measured_diagnostic(DEVICE_COMPONENT, RSSI_ATTR, "", "", "", "mdi:wifi-strength-2"),
        Announcement::fact_diagnostic(DEVICE_COMPONENT, IP_ATTR, "mdi:ip-network"),
        Announcement::fact_diagnostic(DEVICE_COMPONENT, MAC_ATTR, "mdi:network-pos"),
    ]
}

/// Registry pre-loaded with [`announcements`].
pub fn registry() -> DiscoveryRegistry {
    DiscoveryRegistry::from_announcements(announcements())
}

/// Topic the hub writes new report intervals to.
pub fn refresh_setter_topic(device_id: &str) -> String {
    build_setter_topic(REFRESH_COMPONENT, device_id, REFRESH_CONTROL)
}

/// Topic the node reports the accepted report interval on.
pub fn refresh_getter_topic(device_id: &str) -> String {
    build_getter_topic(REFRESH_COMPONENT, device_id, REFRESH_CONTROL)
}
