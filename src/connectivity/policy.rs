//! Retry timing for network and broker bring-up.
//!
//! The supervisor never gives up; these values only shape how long each
//! attempt may block and how long it rests between attempts.

use serde::{Deserialize, Serialize};

/// Attempt duration and cooldowns, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Upper bound on a single WiFi association attempt.
    pub network_attempt_ms: u32,
    /// Rest after a failed WiFi attempt.
    pub network_cooldown_ms: u32,
    /// Rest after a failed broker connect.
    pub broker_cooldown_ms: u32,
    /// Pause after re-initialising the broker client on a fresh network link.
    pub settle_ms: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            network_attempt_ms: 5_000,
            network_cooldown_ms: 30_000,
            broker_cooldown_ms: 10_000,
            settle_ms: 100,
        }
    }
}

impl RetryPolicy {
    /// Validation message for the first zero interval, if any.
    pub fn first_zero_field(&self) -> Option<&'static str> {
        if self.network_attempt_ms == 0 {
            Some("retry.network_attempt_ms must be non-zero")
        } else if self.network_cooldown_ms == 0 {
            Some("retry.network_cooldown_ms must be non-zero")
        } else if self.broker_cooldown_ms == 0 {
            Some("retry.broker_cooldown_ms must be non-zero")
        } else if self.settle_ms == 0 {
            Some("retry.settle_ms must be non-zero")
        } else {
            None
        }
    }
}
