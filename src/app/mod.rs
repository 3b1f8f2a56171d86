//! Application core — domain logic behind port traits.
//!
//! This module contains the business rules of the radiation node:
//! bring-up, discovery announcement, periodic reporting and inbound
//! commands. All interaction with the radio, the broker and the sensor
//! happens through the **port traits** in [`ports`], keeping this layer
//! fully testable without real peripherals.

pub mod catalog;
pub mod commands;
pub mod events;
pub mod ports;
pub mod reporter;
pub mod service;
