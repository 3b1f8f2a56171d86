//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART in production), one line per event with a
//! fixed tag so the console can be grepped.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::LinkChanged { from, to } => {
                info!("LINK  | {:?} -> {:?}", from, to);
            }
            AppEvent::DiscoveryProgress { pending } => {
                info!("DISC  | pass done, pending={}", pending);
            }
            AppEvent::DiscoveryPurged { records } => {
                info!("DISC  | metadata purged, records={}", records);
            }
            AppEvent::Ready => {
                info!("READY | announced and online");
            }
            AppEvent::ReadingPublished(r) => {
                info!(
                    "READ  | cpm={:.2} | dose={:.2}uSv/h | err={:.2}uSv/h",
                    r.cpm, r.usvh, r.usvh_error
                );
            }
            AppEvent::ReadingDropped => {
                warn!("READ  | dropped (publish failed)");
            }
            AppEvent::DiagnosticsPublished => {
                info!("DIAG  | published");
            }
            AppEvent::NoiseDetected => {
                warn!("NOISE | vibration detected, current slot discarded");
            }
            AppEvent::ReportIntervalChanged { minutes } => {
                info!("CFG   | report interval={}min", minutes);
            }
            AppEvent::MessageIgnored => {
                info!("CMD   | ignored inbound message");
            }
        }
    }
}
