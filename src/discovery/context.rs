//! Device-identity context shared by every announcement.

use crate::config::DeviceConfig;
use crate::ha::payload::DevicePayload;
use crate::ha::topics::{build_availability_topic, build_diagnostic_topic, build_state_topic};

/// Component under which the device-level topics live.
pub const DEVICE_COMPONENT: &str = "sensor";

/// Who the device is and where its shared topics are.
///
/// Built once at bring-up; every announcement borrows it while it is
/// being materialised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceContext {
    pub device_id: String,
    pub name: String,
    /// Hardware identifier, the factory MAC as `AA:BB:CC:DD:EE:FF`.
    pub identifier: String,
    pub manufacturer: String,
    pub model: String,
    pub firmware_version: String,
    pub availability_topic: String,
    pub state_topic: String,
    pub diagnostic_topic: String,
}

impl DeviceContext {
    pub fn new(device: &DeviceConfig, identifier: &str) -> Self {
        let id = device.id.as_str();
        Self {
            device_id: id.to_owned(),
            name: device.name.clone(),
            identifier: identifier.to_owned(),
            manufacturer: device.manufacturer.clone(),
            model: device.model.clone(),
            firmware_version: device.firmware_version.clone(),
            availability_topic: build_availability_topic(DEVICE_COMPONENT, id),
            state_topic: build_state_topic(DEVICE_COMPONENT, id),
            diagnostic_topic: build_diagnostic_topic(DEVICE_COMPONENT, id),
        }
    }

    /// Device object restating manufacturer, model and firmware.
    pub fn full_device(&self) -> DevicePayload<'_> {
        DevicePayload::Full {
            name: &self.name,
            identifiers: &self.identifier,
            mf: &self.manufacturer,
            mdl: &self.model,
            sw: &self.firmware_version,
        }
    }

    /// Name + identifier only.
    pub fn short_device(&self) -> DevicePayload<'_> {
        DevicePayload::Short {
            name: &self.name,
            ids: &self.identifier,
        }
    }
}
