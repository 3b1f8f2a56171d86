//! Periodic reporter: liveness, readings and diagnostics.
//!
//! Readings go out immediately on every pulse and are best effort; a
//! failed reading is dropped, never queued. Liveness and diagnostics go
//! out once per report interval.

use log::{debug, info, warn};

use crate::connectivity::AVAILABILITY_ONLINE;
use crate::discovery::DeviceContext;
use crate::error::CommsError;
use crate::ha::payload::{build_diagnostics_payload, build_state_payload};

use super::commands::{MAX_REPORT_MINUTES, MIN_REPORT_MINUTES};
use super::ports::{BrokerPort, NetworkPort, Qos, RadiationReading};

const MS_PER_MINUTE: u64 = 60_000;

/// Interval bookkeeping plus the three report kinds.
#[derive(Debug, Clone)]
pub struct Reporter {
    interval_ms: u64,
    last_report_ms: u64,
}

impl Reporter {
    pub fn new(interval_secs: u32) -> Self {
        Self {
            interval_ms: u64::from(interval_secs.max(1)) * 1_000,
            last_report_ms: 0,
        }
    }

    // ── Interval ──────────────────────────────────────────────

    /// Restart the interval at `now_ms`. The next report is due one full
    /// interval later.
    pub fn arm(&mut self, now_ms: u64) {
        self.last_report_ms = now_ms;
    }

    /// Whether a report is due. Robust to the clock wrapping.
    pub fn is_due(&self, now_ms: u64) -> bool {
        now_ms.wrapping_sub(self.last_report_ms) >= self.interval_ms
    }

    /// `true` at most once per interval; re-arms when it fires.
    pub fn take_due(&mut self, now_ms: u64) -> bool {
        if self.is_due(now_ms) {
            self.arm(now_ms);
            true
        } else {
            false
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Current interval rounded to whole minutes.
    pub fn interval_minutes(&self) -> u8 {
        let minutes = (self.interval_ms + MS_PER_MINUTE / 2) / MS_PER_MINUTE;
        minutes.clamp(u64::from(MIN_REPORT_MINUTES), u64::from(MAX_REPORT_MINUTES)) as u8
    }

    /// Adopt a new interval, clamped to the control's range. Returns the
    /// accepted value. The running interval is not restarted.
    pub fn set_interval_minutes(&mut self, minutes: u8) -> u8 {
        let minutes = minutes.clamp(MIN_REPORT_MINUTES, MAX_REPORT_MINUTES);
        self.interval_ms = u64::from(minutes) * MS_PER_MINUTE;
        info!("Reporter: interval set to {} min", minutes);
        minutes
    }

    // ── Publishing ────────────────────────────────────────────

    /// Retained `online` marker on the availability topic.
    pub fn publish_online(&self, broker: &mut impl BrokerPort, ctx: &DeviceContext) -> Result<(), CommsError> {
        broker
            .publish(&ctx.availability_topic, AVAILABILITY_ONLINE, true, Qos::AtLeastOnce)
            .inspect(|_| debug!("Reporter: online -> {}", ctx.availability_topic))
            .inspect_err(|e| warn!("Reporter: online marker failed — {}", e))
    }

    /// One reading on the state topic.
    pub fn publish_reading(
        &self,
        broker: &mut impl BrokerPort,
        ctx: &DeviceContext,
        reading: &RadiationReading,
    ) -> Result<(), CommsError> {
        let payload = build_state_payload(reading.cpm, reading.usvh, reading.usvh_error);
        match broker.publish(&ctx.state_topic, &payload, false, Qos::AtMostOnce) {
            Ok(()) => {
                info!("Reporter: reading {}", payload);
                Ok(())
            }
            Err(e) => {
                warn!("Reporter: reading dropped — {}", e);
                Err(e)
            }
        }
    }

    /// Signal strength, address and MAC on the diagnostic topic.
    pub fn publish_diagnostics(
        &self,
        broker: &mut impl BrokerPort,
        network: &impl NetworkPort,
        ctx: &DeviceContext,
    ) -> Result<(), CommsError> {
        let rssi = network.rssi().map_or(0, i32::from);
        let ip = network
            .ip()
            .map_or_else(|| String::from("0.0.0.0"), |ip| ip.to_string());
        let payload = build_diagnostics_payload(rssi, &ip, &ctx.identifier);
        match broker.publish(&ctx.diagnostic_topic, &payload, false, Qos::AtMostOnce) {
            Ok(()) => {
                info!("Reporter: diagnostics {}", payload);
                Ok(())
            }
            Err(e) => {
                warn!("Reporter: diagnostics failed — {}", e);
                Err(e)
            }
        }
    }
}
