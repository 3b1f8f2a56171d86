//! Discovery registry: the announcement collections and their publisher.

use log::{info, warn};

use crate::app::ports::{BrokerPort, Qos};

use super::context::DeviceContext;
use super::record::{Announcement, AnnouncementRecord};

/// Owns every announcement the node makes, grouped by shape.
///
/// Publishing order is fixed: sensors, controls, measured diagnostics,
/// fact diagnostics. The only code path that expands a record into a
/// wire message is [`publish_pending`](Self::publish_pending).
#[derive(Debug, Default)]
pub struct DiscoveryRegistry {
    sensors: Vec<AnnouncementRecord>,
    controls: Vec<AnnouncementRecord>,
    measured_diagnostics: Vec<AnnouncementRecord>,
    fact_diagnostics: Vec<AnnouncementRecord>,
}

impl DiscoveryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a static description.
    pub fn from_announcements(announcements: impl IntoIterator<Item = Announcement>) -> Self {
        let mut registry = Self::new();
        for a in announcements {
            registry.add(a);
        }
        registry
    }

    /// File an announcement into the collection for its shape.
    pub fn add(&mut self, announcement: Announcement) {
        let list = match announcement {
            Announcement::Sensor { .. } => &mut self.sensors,
            Announcement::Control { .. } => &mut self.controls,
            Announcement::MeasuredDiagnostic { .. } => &mut self.measured_diagnostics,
            Announcement::FactDiagnostic { .. } => &mut self.fact_diagnostics,
        };
        list.push(AnnouncementRecord::new(announcement));
    }

    /// Attempt every unpublished record once, retained at QoS 1.
    ///
    /// Returns how many records are still unpublished afterwards. Safe to
    /// call again after any mix of failures; when nothing is pending it
    /// touches neither the broker nor the records.
    pub fn publish_pending(&mut self, broker: &mut impl BrokerPort, ctx: &DeviceContext) -> usize {
        let mut pending = 0;
        for record in self.records_mut().filter(|r| !r.is_published()) {
            let msg = record.to_wire_message(ctx);
            match broker.publish(&msg.topic, &msg.payload, true, Qos::AtLeastOnce) {
                Ok(()) => {
                    info!("Discovery: {} ... OK", msg.topic);
                    record.mark_published();
                }
                Err(e) => {
                    warn!("Discovery: {} ... failed ({})", msg.topic, e);
                    pending += 1;
                }
            }
        }
        pending
    }

    /// Reclaim the strings of every published record. Unpublished records
    /// are left untouched. Returns how many records were purged.
    pub fn purge(&mut self) -> usize {
        let mut purged = 0;
        for record in self.records_mut().filter(|r| r.is_published()) {
            record.purge();
            purged += 1;
        }
        purged
    }

    /// Records not yet accepted by the broker.
    pub fn pending(&self) -> usize {
        self.records().filter(|r| !r.is_published()).count()
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
            + self.controls.len()
            + self.measured_diagnostics.len()
            + self.fact_diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every record published and stripped to its key.
    pub fn is_purged(&self) -> bool {
        self.records().all(AnnouncementRecord::is_purged)
    }

    /// All records in publishing order.
    pub fn records(&self) -> impl Iterator<Item = &AnnouncementRecord> {
        self.sensors
            .iter()
            .chain(&self.controls)
            .chain(&self.measured_diagnostics)
            .chain(&self.fact_diagnostics)
    }

    fn records_mut(&mut self) -> impl Iterator<Item = &mut AnnouncementRecord> {
        self.sensors
            .iter_mut()
            .chain(&mut self.controls)
            .chain(&mut self.measured_diagnostics)
            .chain(&mut self.fact_diagnostics)
    }
}
