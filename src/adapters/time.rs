//! System clock adapter.
//!
//! Implements [`ClockPort`]: a monotonic millisecond counter plus
//! blocking delays.
//!
//! - **`target_os = "espidf"`**: `esp_timer_get_time()` for time and
//!   FreeRTOS task delays, so the idle task and the WiFi stack keep
//!   running while the loop sleeps.
//! - **`not(target_os = "espidf")`**: `std::time::Instant` and
//!   `std::thread::sleep` for host-side runs.

use embedded_hal::delay::DelayNs;

use crate::app::ports::ClockPort;

pub struct SystemClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }
}

#[cfg(target_os = "espidf")]
impl DelayNs for SystemClock {
    fn delay_ns(&mut self, ns: u32) {
        esp_idf_hal::delay::Ets::delay_us(ns.div_ceil(1_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        esp_idf_hal::delay::FreeRtos::delay_ms(ms);
    }
}

#[cfg(not(target_os = "espidf"))]
impl DelayNs for SystemClock {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}

impl ClockPort for SystemClock {
    #[cfg(target_os = "espidf")]
    fn now_ms(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000
    }

    #[cfg(not(target_os = "espidf"))]
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}
