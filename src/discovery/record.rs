//! Announcement records and their single expansion path.
//!
//! A record holds only the short strings that vary per entity. The full
//! discovery topic and payload are produced on demand by
//! [`AnnouncementRecord::to_wire_message`] and dropped right after the
//! publish attempt, so at most one expanded announcement exists at a time.

use crate::ha::payload::{
    ControlPayload, DiscoveryPayload, ENTITY_CATEGORY_DIAGNOSTIC, STATE_CLASS_MEASUREMENT,
    attributes_template, value_template,
};
use crate::ha::topics::{build_discovery_topic, build_getter_topic, build_setter_topic};

use super::context::DeviceContext;

/// What the hub should present, one variant per entity shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Announcement {
    /// Primary measured sensor reading from the shared state topic.
    Sensor {
        component: String,
        /// Key in the state object; also the entity's object id.
        attribute: String,
        device_class: String,
        unit: String,
        icon: String,
        /// The state object carries an `<attribute>_details` sub-object.
        has_sub_attr: bool,
    },
    /// Bidirectional control with getter/setter topics.
    Control {
        component: String,
        name: String,
        /// Raw JSON fragment appended to the payload, e.g. `"min": 1, "max": 60`.
        custom_settings: String,
        icon: String,
        unit: String,
    },
    /// Numeric diagnostic. Empty class/unit are omitted from the payload.
    MeasuredDiagnostic {
        component: String,
        attribute: String,
        device_class: String,
        /// Empty means `measurement`.
        state_class: String,
        unit: String,
        icon: String,
    },
    /// Static string diagnostic.
    FactDiagnostic {
        component: String,
        attribute: String,
        icon: String,
    },
}

impl Announcement {
    pub fn sensor(
        component: &str,
        attribute: &str,
        device_class: &str,
        unit: &str,
        icon: &str,
        has_sub_attr: bool,
    ) -> Self {
        Self::Sensor {
            component: component.into(),
            attribute: attribute.into(),
            device_class: device_class.into(),
            unit: unit.into(),
            icon: icon.into(),
            has_sub_attr,
        }
    }

    pub fn control(component: &str, name: &str, custom_settings: &str, icon: &str, unit: &str) -> Self {
        Self::Control {
            component: component.into(),
            name: name.into(),
            custom_settings: custom_settings.into(),
            icon: icon.into(),
            unit: unit.into(),
        }
    }

    pub fn measured_diagnostic(
        component: &str,
        attribute: &str,
        device_class: &str,
        state_class: &str,
        unit: &str,
        icon: &str,
    ) -> Self {
        Self::MeasuredDiagnostic {
            component: component.into(),
            attribute: attribute.into(),
            device_class: device_class.into(),
            state_class: state_class.into(),
            unit: unit.into(),
            icon: icon.into(),
        }
    }

    pub fn fact_diagnostic(component: &str, attribute: &str, icon: &str) -> Self {
        Self::FactDiagnostic {
            component: component.into(),
            attribute: attribute.into(),
            icon: icon.into(),
        }
    }

    /// The identifying key: attribute for sensors and diagnostics, name for controls.
    pub fn key(&self) -> &str {
        match self {
            Self::Sensor { attribute, .. }
            | Self::MeasuredDiagnostic { attribute, .. }
            | Self::FactDiagnostic { attribute, .. } => attribute,
            Self::Control { name, .. } => name,
        }
    }
}

/// A fully expanded `(topic, payload)` pair. Never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireMessage {
    pub topic: String,
    pub payload: String,
}

/// One announcement plus its permanent `published` flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncementRecord {
    pub kind: Announcement,
    published: bool,
}

impl AnnouncementRecord {
    pub fn new(kind: Announcement) -> Self {
        Self {
            kind,
            published: false,
        }
    }

    pub fn is_published(&self) -> bool {
        self.published
    }

    /// Set once the broker accepted the announcement. Never cleared.
    pub(crate) fn mark_published(&mut self) {
        self.published = true;
    }

    /// Expand into the discovery message the hub expects.
    pub fn to_wire_message(&self, ctx: &DeviceContext) -> WireMessage {
        let id = ctx.device_id.as_str();
        match &self.kind {
            Announcement::Sensor {
                component,
                attribute,
                device_class,
                unit,
                icon,
                has_sub_attr,
            } => {
                let mut p = DiscoveryPayload::new(
                    id,
                    attribute,
                    ctx.full_device(),
                    &ctx.availability_topic,
                    icon,
                    &ctx.state_topic,
                );
                p.device_class = non_empty(device_class);
                p.unit_of_measurement = non_empty(unit);
                p.state_class = Some(STATE_CLASS_MEASUREMENT);
                p.value_template = Some(value_template(attribute));
                if *has_sub_attr {
                    p.json_attributes_topic = Some(ctx.state_topic.as_str());
                    p.json_attributes_template = Some(attributes_template(attribute));
                }
                WireMessage {
                    topic: build_discovery_topic(component, id, attribute),
                    payload: p.to_json(),
                }
            }
            Announcement::Control {
                component,
                name,
                custom_settings,
                icon,
                unit,
            } => {
                let getter = build_getter_topic(component, id, name);
                let setter = build_setter_topic(component, id, name);
                let p = ControlPayload::new(
                    id,
                    name,
                    ctx.full_device(),
                    &ctx.availability_topic,
                    icon,
                    unit,
                    &getter,
                    &setter,
                );
                WireMessage {
                    topic: build_discovery_topic(component, id, name),
                    payload: p.to_json(custom_settings),
                }
            }
            Announcement::MeasuredDiagnostic {
                component,
                attribute,
                device_class,
                state_class,
                unit,
                icon,
            } => {
                let mut p = DiscoveryPayload::new(
                    id,
                    attribute,
                    ctx.short_device(),
                    &ctx.availability_topic,
                    icon,
                    &ctx.diagnostic_topic,
                );
                p.device_class = non_empty(device_class);
                p.unit_of_measurement = non_empty(unit);
                p.state_class = Some(non_empty(state_class).unwrap_or(STATE_CLASS_MEASUREMENT));
                p.entity_category = Some(ENTITY_CATEGORY_DIAGNOSTIC);
                p.value_template = Some(value_template(attribute));
                WireMessage {
                    topic: build_discovery_topic(component, id, attribute),
                    payload: p.to_json(),
                }
            }
            Announcement::FactDiagnostic {
                component,
                attribute,
                icon,
            } => {
                let mut p = DiscoveryPayload::new(
                    id,
                    attribute,
                    ctx.short_device(),
                    &ctx.availability_topic,
                    icon,
                    &ctx.diagnostic_topic,
                );
                p.entity_category = Some(ENTITY_CATEGORY_DIAGNOSTIC);
                p.value_template = Some(value_template(attribute));
                WireMessage {
                    topic: build_discovery_topic(component, id, attribute),
                    payload: p.to_json(),
                }
            }
        }
    }

    /// Release every string except the identifying key. Only acts on
    /// published records.
    pub fn purge(&mut self) {
        if !self.published {
            return;
        }
        match &mut self.kind {
            Announcement::Sensor {
                component,
                device_class,
                unit,
                icon,
                ..
            } => release([component, device_class, unit, icon]),
            Announcement::Control {
                component,
                custom_settings,
                icon,
                unit,
                ..
            } => release([component, custom_settings, icon, unit]),
            Announcement::MeasuredDiagnostic {
                component,
                device_class,
                state_class,
                unit,
                icon,
                ..
            } => release([component, device_class, state_class, unit, icon]),
            Announcement::FactDiagnostic { component, icon, .. } => release([component, icon]),
        }
    }

    /// Published and stripped down to its key.
    pub fn is_purged(&self) -> bool {
        if !self.published {
            return false;
        }
        match &self.kind {
            Announcement::Sensor {
                component,
                device_class,
                unit,
                icon,
                ..
            } => all_empty(&[component, device_class, unit, icon]),
            Announcement::Control {
                component,
                custom_settings,
                icon,
                unit,
                ..
            } => all_empty(&[component, custom_settings, icon, unit]),
            Announcement::MeasuredDiagnostic {
                component,
                device_class,
                state_class,
                unit,
                icon,
                ..
            } => all_empty(&[component, device_class, state_class, unit, icon]),
            Announcement::FactDiagnostic { component, icon, .. } => all_empty(&[component, icon]),
        }
    }
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}

fn release<const N: usize>(fields: [&mut String; N]) {
    for field in fields {
        *field = String::new();
    }
}

fn all_empty(fields: &[&String]) -> bool {
    fields.iter().all(|f| f.is_empty())
}
