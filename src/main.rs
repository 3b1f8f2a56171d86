//! RadThing Firmware — Main Entry Point
//!
//! Hexagonal architecture with a single cooperative poll loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  WifiStation       MqttBroker        RadiationCounter          │
//! │  (NetworkPort)     (BrokerPort)      (SensingPort)             │
//! │  SystemClock       LogEventSink                                │
//! │  (ClockPort)       (EventSink)                                 │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              NodeService (pure logic)                  │    │
//! │  │  ConnectivitySupervisor · DiscoveryRegistry · Reporter │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use embedded_hal::delay::DelayNs;
use esp_idf_hal::gpio::AnyIOPin;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use log::info;

use radthing::adapters::device_id;
use radthing::adapters::log_sink::LogEventSink;
use radthing::adapters::mqtt::MqttBroker;
use radthing::adapters::radiation::RadiationCounter;
use radthing::adapters::time::SystemClock;
use radthing::adapters::wifi::WifiStation;
use radthing::app::service::NodeService;
use radthing::config::NodeConfig;
use radthing::error::Error;
use radthing::pins;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  RadThing v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration (defaults + build-time overlay) ──────
    let config = NodeConfig::load().map_err(Error::from)?;
    info!(
        "Config: device '{}', broker {}:{}, report every {} s",
        config.device.id, config.broker.host, config.broker.port, config.report_interval_secs
    );

    // ── 3. Peripherals and adapters ───────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;

    let identifier = device_id::format_mac(&device_id::read_mac());
    info!("Device: MAC {}", identifier);

    let network = WifiStation::new(peripherals.modem, sysloop)?;
    let broker = MqttBroker::new();

    // SAFETY: each sensor pin is claimed exactly once, here, and no
    // other driver in the firmware touches these GPIOs.
    let (signal_pin, noise_pin) = unsafe { (AnyIOPin::new(pins::SIG_PIN), AnyIOPin::new(pins::NS_PIN)) };
    let sensing = RadiationCounter::new(signal_pin, noise_pin).map_err(Error::from)?;

    // ── 4. Bring-up: connect, announce, go online ─────────────
    let mut clock = SystemClock::new();
    let mut sink = LogEventSink::new();
    let mut node = NodeService::new(&config, identifier.as_str(), network, broker, sensing);
    node.bring_up(&mut clock, &mut sink);

    // ── 5. Main loop ──────────────────────────────────────────
    loop {
        node.poll_cycle(&mut clock, &mut sink);
        clock.delay_ms(config.loop_idle_ms);
    }
}
