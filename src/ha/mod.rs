//! Home Assistant wire formats — topic and payload builders.
//!
//! Pure, stateless string formatting. Nothing in here performs I/O or
//! holds state; the discovery registry and the reporter call these to
//! materialise one message at a time.

pub mod payload;
pub mod topics;

pub use payload::{ControlPayload, DevicePayload, DiscoveryPayload};
pub use topics::HA_TOPIC_BASE;
