//! Outbound application events.
//!
//! The [`NodeService`](super::service::NodeService) and the
//! [`ConnectivitySupervisor`](crate::connectivity::ConnectivitySupervisor)
//! emit these through the [`EventSink`](super::ports::EventSink) port.

use crate::connectivity::LinkState;

use super::ports::RadiationReading;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The observed connectivity state changed.
    LinkChanged { from: LinkState, to: LinkState },

    /// One discovery pass finished with `pending` records still unpublished.
    DiscoveryProgress { pending: usize },

    /// Discovery metadata was reclaimed after every record was announced.
    DiscoveryPurged { records: usize },

    /// Bring-up finished: connected, announced and online.
    Ready,

    /// A reading went out on the state topic.
    ReadingPublished(RadiationReading),

    /// A reading could not be published and was dropped.
    ReadingDropped,

    /// Diagnostics went out on the diagnostic topic.
    DiagnosticsPublished,

    /// The sensor reported vibration noise.
    NoiseDetected,

    /// The report interval was changed from the hub.
    ReportIntervalChanged { minutes: u8 },

    /// A message arrived that maps to no command.
    MessageIgnored,
}
