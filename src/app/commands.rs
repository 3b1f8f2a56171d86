//! Inbound commands to the node service.
//!
//! Commands arrive as MQTT messages on a control's setter topic and are
//! interpreted by [`NodeService`](super::service::NodeService) in the
//! poll loop, never from the client's receive path.

use super::ports::InboundMessage;

/// Smallest accepted report interval, in minutes.
pub const MIN_REPORT_MINUTES: u8 = 1;

/// Largest accepted report interval, in minutes.
pub const MAX_REPORT_MINUTES: u8 = 60;

/// Commands the hub can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Change the diagnostics/liveness report interval.
    SetReportInterval { minutes: u8 },
}

impl AppCommand {
    /// Interpret `msg` if it arrived on `report_interval_setter`.
    ///
    /// The hub's `number` entity sends plain numerals (`"5"`, `"5.0"`).
    /// Values are rounded and clamped to
    /// [`MIN_REPORT_MINUTES`]..=[`MAX_REPORT_MINUTES`]; anything that is not
    /// a finite number is rejected.
    pub fn parse(msg: &InboundMessage, report_interval_setter: &str) -> Option<Self> {
        if msg.topic.as_str() != report_interval_setter {
            return None;
        }
        let value: f32 = msg.payload.trim().parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        let minutes = value
            .round()
            .clamp(f32::from(MIN_REPORT_MINUTES), f32::from(MAX_REPORT_MINUTES)) as u8;
        Some(Self::SetReportInterval { minutes })
    }
}
