//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements   | Connects to                    |
//! |-------------|--------------|--------------------------------|
//! | `wifi`      | NetworkPort  | ESP-IDF WiFi STA               |
//! | `mqtt`      | BrokerPort   | ESP-IDF MQTT client            |
//! | `radiation` | SensingPort  | Signal/noise GPIO interrupts   |
//! | `time`      | ClockPort    | ESP32 system timer, FreeRTOS   |
//! | `log_sink`  | EventSink    | Serial log output              |
//! | `device_id` | —            | Factory MAC (eFuse)            |

pub mod device_id;
pub mod log_sink;
pub mod mqtt;
pub mod radiation;
pub mod time;
pub(super) mod utils;
pub mod wifi;
