//! Radiation counter adapter.
//!
//! Implements [`SensingPort`] for a Type 5 PIN-photodiode radiation
//! module. The two GPIO interrupts only bump atomic counters; everything
//! else (windowing, dose math, event queueing) happens in
//! [`poll`](SensingPort::poll) on the main loop.
//!
//! ```text
//!  SIG ISR ──▶ pulses++ ─┐
//!                        ├─▶ poll() ──▶ PulseWindow ──▶ SensingEvent queue
//!  NS  ISR ──▶ noise++  ─┘
//! ```
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_hal::gpio::PinDriver` interrupts.
//! - **all other targets**: pulses and noise are injected by the caller.

use core::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use log::{debug, info};

use crate::app::ports::{ClockPort, RadiationReading, SensingEvent, SensingPort};

use super::time::SystemClock;

/// Slots in the rolling window.
pub const WINDOW_SLOTS: usize = 20;

/// Width of one slot.
pub const SLOT_MS: u64 = 3_000;

/// Full window span (one minute).
pub const WINDOW_MS: u64 = SLOT_MS * WINDOW_SLOTS as u64;

/// Counts-per-minute to µSv/h conversion factor of the module.
pub const CPM_PER_USVH: f32 = 53.032;

/// Events buffered between polls.
const EVENT_QUEUE_CAP: usize = 16;

/// Written from interrupt context, drained by `poll()`.
#[derive(Debug, Default)]
struct PendingCounters {
    pulses: AtomicU32,
    noise: AtomicU32,
}

// ───────────────────────────────────────────────────────────────
// PulseWindow
// ───────────────────────────────────────────────────────────────

/// Rolling one-minute pulse count in 3 s slots.
#[derive(Debug, Clone)]
pub struct PulseWindow {
    slots: [u32; WINDOW_SLOTS],
    current: usize,
    slot_start_ms: u64,
    started_ms: u64,
}

impl PulseWindow {
    pub fn new(now_ms: u64) -> Self {
        Self {
            slots: [0; WINDOW_SLOTS],
            current: 0,
            slot_start_ms: now_ms,
            started_ms: now_ms,
        }
    }

    /// Rotate expired slots out. A gap longer than the window clears it.
    pub fn advance(&mut self, now_ms: u64) {
        let elapsed = now_ms.saturating_sub(self.slot_start_ms);
        if elapsed >= WINDOW_MS {
            self.slots = [0; WINDOW_SLOTS];
            self.slot_start_ms = now_ms - elapsed % SLOT_MS;
            return;
        }
        for _ in 0..elapsed / SLOT_MS {
            self.current = (self.current + 1) % WINDOW_SLOTS;
            self.slots[self.current] = 0;
            self.slot_start_ms += SLOT_MS;
        }
    }

    pub fn record(&mut self, pulses: u32) {
        self.slots[self.current] = self.slots[self.current].saturating_add(pulses);
    }

    /// Drop whatever the current slot has counted.
    pub fn discard_current(&mut self) {
        self.slots[self.current] = 0;
    }

    pub fn counts(&self) -> u32 {
        self.slots.iter().sum()
    }

    /// Minutes of data the window covers, at most one.
    fn minutes(&self, now_ms: u64) -> f32 {
        now_ms.saturating_sub(self.started_ms).min(WINDOW_MS) as f32 / WINDOW_MS as f32
    }

    /// Rate and dose figures at `now_ms`.
    pub fn reading(&self, now_ms: u64) -> RadiationReading {
        let minutes = self.minutes(now_ms);
        if minutes <= 0.0 {
            return RadiationReading::default();
        }
        let counts = self.counts() as f32;
        let cpm = counts / minutes;
        RadiationReading {
            cpm,
            usvh: cpm / CPM_PER_USVH,
            usvh_error: counts.sqrt() / minutes / CPM_PER_USVH,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Radiation counter adapter
// ───────────────────────────────────────────────────────────────

pub struct RadiationCounter {
    #[cfg(target_os = "espidf")]
    signal: esp_idf_hal::gpio::PinDriver<'static, esp_idf_hal::gpio::AnyIOPin, esp_idf_hal::gpio::Input>,
    #[cfg(target_os = "espidf")]
    noise: esp_idf_hal::gpio::PinDriver<'static, esp_idf_hal::gpio::AnyIOPin, esp_idf_hal::gpio::Input>,
    pending: Arc<PendingCounters>,
    clock: SystemClock,
    window: PulseWindow,
    events: heapless::Deque<SensingEvent, EVENT_QUEUE_CAP>,
    last: RadiationReading,
}

#[cfg(target_os = "espidf")]
impl RadiationCounter {
    /// Claim the signal and noise pins and attach their interrupt handlers.
    /// Interrupts stay disabled until [`setup`](SensingPort::setup).
    pub fn new(
        signal_pin: esp_idf_hal::gpio::AnyIOPin,
        noise_pin: esp_idf_hal::gpio::AnyIOPin,
    ) -> Result<Self, crate::error::SensingError> {
        use esp_idf_hal::gpio::{InterruptType, PinDriver, Pull};

        use crate::error::SensingError;

        let fail = |_| SensingError::InterruptSetupFailed;
        let pending = Arc::new(PendingCounters::default());

        let mut signal = PinDriver::input(signal_pin).map_err(fail)?;
        signal.set_pull(Pull::Up).map_err(fail)?;
        signal.set_interrupt_type(InterruptType::NegEdge).map_err(fail)?;
        let counters = pending.clone();
        // SAFETY: the handler only touches an atomic owned by the Arc it captures.
        unsafe {
            signal
                .subscribe(move || {
                    counters.pulses.fetch_add(1, Ordering::Relaxed);
                })
                .map_err(fail)?;
        }

        let mut noise = PinDriver::input(noise_pin).map_err(fail)?;
        noise.set_interrupt_type(InterruptType::PosEdge).map_err(fail)?;
        let counters = pending.clone();
        // SAFETY: as above.
        unsafe {
            noise
                .subscribe(move || {
                    counters.noise.fetch_add(1, Ordering::Relaxed);
                })
                .map_err(fail)?;
        }

        let clock = SystemClock::new();
        let window = PulseWindow::new(clock.now_ms());
        Ok(Self {
            signal,
            noise,
            pending,
            clock,
            window,
            events: heapless::Deque::new(),
            last: RadiationReading::default(),
        })
    }

    fn platform_arm(&mut self) {
        // The driver disables a pin's interrupt each time it fires.
        if let Err(e) = self.signal.enable_interrupt() {
            log::warn!("Radiation: signal interrupt not armed — {}", e);
        }
        if let Err(e) = self.noise.enable_interrupt() {
            log::warn!("Radiation: noise interrupt not armed — {}", e);
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for RadiationCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "espidf"))]
impl RadiationCounter {
    pub fn new() -> Self {
        let clock = SystemClock::new();
        let window = PulseWindow::new(clock.now_ms());
        Self {
            pending: Arc::new(PendingCounters::default()),
            clock,
            window,
            events: heapless::Deque::new(),
            last: RadiationReading::default(),
        }
    }

    fn platform_arm(&mut self) {}

    /// Simulation: `n` pulses arrive as if from the signal interrupt.
    pub fn sim_pulses(&self, n: u32) {
        self.pending.pulses.fetch_add(n, Ordering::Relaxed);
    }

    /// Simulation: the noise line fires.
    pub fn sim_noise(&self) {
        self.pending.noise.fetch_add(1, Ordering::Relaxed);
    }
}

impl RadiationCounter {
    /// Drain the interrupt counters into the window at `now_ms`.
    ///
    /// Noise discards the current slot along with any pulses counted since
    /// the last poll. Otherwise every pulse is queued as its own event.
    pub fn poll_at(&mut self, now_ms: u64) {
        self.window.advance(now_ms);
        let pulses = self.pending.pulses.swap(0, Ordering::Relaxed);
        let noise = self.pending.noise.swap(0, Ordering::Relaxed);

        if noise > 0 {
            self.window.discard_current();
            self.last = self.window.reading(now_ms);
            self.enqueue(SensingEvent::Noise);
        } else if pulses > 0 {
            self.window.record(pulses);
            self.last = self.window.reading(now_ms);
            debug!("Radiation: +{} pulses, {:.1} cpm", pulses, self.last.cpm);
            for _ in 0..pulses {
                self.enqueue(SensingEvent::Pulse);
            }
        } else {
            self.last = self.window.reading(now_ms);
        }
        self.platform_arm();
    }

    fn enqueue(&mut self, event: SensingEvent) {
        if self.events.push_back(event).is_err() {
            // Readings are best effort; older queued pulses already carry
            // the same window figures.
            debug!("Radiation: event queue full, dropping {:?}", event);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// SensingPort
// ───────────────────────────────────────────────────────────────

impl SensingPort for RadiationCounter {
    fn setup(&mut self) {
        self.window = PulseWindow::new(self.clock.now_ms());
        self.platform_arm();
        info!("Radiation: counting started");
    }

    fn poll(&mut self) {
        let now = self.clock.now_ms();
        self.poll_at(now);
    }

    fn next_event(&mut self) -> Option<SensingEvent> {
        self.events.pop_front()
    }

    fn reading(&self) -> RadiationReading {
        self.last
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
