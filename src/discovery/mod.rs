//! Home Assistant discovery: what the node announces and how it gets there.
//!
//! - [`record`]: one announcement per entity, expanded on demand.
//! - [`registry`]: owns all records, publishes the pending ones, purges.
//! - [`context`]: device identity and the shared topics.

pub mod context;
pub mod record;
pub mod registry;

pub use context::DeviceContext;
pub use record::{Announcement, AnnouncementRecord, WireMessage};
pub use registry::DiscoveryRegistry;
