//! WiFi station-mode adapter.
//!
//! Implements [`NetworkPort`], the hexagonal boundary for the network
//! link. The adapter makes exactly one bounded association attempt per
//! [`connect`](NetworkPort::connect) call; retry and cooldown belong to
//! the [`ConnectivitySupervisor`](crate::connectivity::ConnectivitySupervisor).
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation with scripted failures for host runs.

use core::net::Ipv4Addr;

use log::{info, warn};

use crate::app::ports::NetworkPort;
use crate::error::CommsError;

use super::utils::is_printable_ascii;

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn validate_credentials(ssid: &str, passphrase: &str) -> Result<(), CommsError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(CommsError::InvalidCredentials);
    }
    if !passphrase.is_empty() && !(8..=64).contains(&passphrase.len()) {
        return Err(CommsError::InvalidCredentials);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiStation {
    #[cfg(target_os = "espidf")]
    wifi: BlockingWifi<EspWifi<'static>>,
    /// Simulation: link status.
    #[cfg(not(target_os = "espidf"))]
    sim_up: bool,
    /// Simulation: attempts that will time out before one succeeds.
    #[cfg(not(target_os = "espidf"))]
    sim_failures: u32,
    /// Simulation: counts platform_connect() calls.
    #[cfg(not(target_os = "espidf"))]
    sim_connect_counter: u32,
    attempts: u32,
}

#[cfg(target_os = "espidf")]
impl WifiStation {
    /// Take the modem and bring up the driver in station mode. Association
    /// happens on the first [`connect`](NetworkPort::connect).
    pub fn new(
        modem: esp_idf_hal::modem::Modem,
        sysloop: esp_idf_svc::eventloop::EspSystemEventLoop,
    ) -> anyhow::Result<Self> {
        // No NVS partition: nothing is persisted, including PHY calibration.
        let wifi = EspWifi::new(modem, sysloop.clone(), None)?;
        let wifi = BlockingWifi::wrap(wifi, sysloop)?;
        Ok(Self { wifi, attempts: 0 })
    }

    fn platform_connect(&mut self, ssid: &str, passphrase: &str, attempt_ms: u32) -> Result<(), CommsError> {
        use esp_idf_hal::delay::FreeRtos;
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        const POLL_MS: u32 = 100;

        let config = Configuration::Client(ClientConfiguration {
            ssid: ssid.try_into().map_err(|_| CommsError::InvalidCredentials)?,
            password: passphrase.try_into().map_err(|_| CommsError::InvalidCredentials)?,
            auth_method: if passphrase.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            },
            ..Default::default()
        });
        self.wifi
            .set_configuration(&config)
            .map_err(|_| CommsError::InvalidCredentials)?;
        if !self.wifi.is_started().unwrap_or(false) {
            self.wifi.start().map_err(|_| CommsError::NetworkDown)?;
        }

        // Non-blocking association, then poll for an address within the window.
        let _ = self.wifi.wifi_mut().disconnect();
        self.wifi
            .wifi_mut()
            .connect()
            .map_err(|_| CommsError::NetworkDown)?;
        let mut waited = 0;
        while waited < attempt_ms {
            if self.platform_is_connected() {
                return Ok(());
            }
            FreeRtos::delay_ms(POLL_MS);
            waited += POLL_MS;
        }
        if self.platform_is_connected() {
            Ok(())
        } else {
            Err(CommsError::NetworkTimeout)
        }
    }

    fn platform_is_connected(&self) -> bool {
        self.wifi.is_up().unwrap_or(false)
    }

    fn platform_rssi(&self) -> Option<i8> {
        let mut ap_info: esp_idf_svc::sys::wifi_ap_record_t = Default::default();
        let rc = unsafe { esp_idf_svc::sys::esp_wifi_sta_get_ap_info(&mut ap_info) };
        (rc == esp_idf_svc::sys::ESP_OK).then_some(ap_info.rssi)
    }

    fn platform_ip(&self) -> Option<Ipv4Addr> {
        self.wifi.wifi().sta_netif().get_ip_info().ok().map(|info| info.ip)
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiStation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "espidf"))]
impl WifiStation {
    pub fn new() -> Self {
        Self {
            sim_up: false,
            sim_failures: 0,
            sim_connect_counter: 0,
            attempts: 0,
        }
    }

    /// Simulation: the next `n` attempts time out.
    pub fn sim_fail_next(&mut self, n: u32) {
        self.sim_failures = n;
    }

    /// Simulation: the access point goes away.
    pub fn sim_drop_link(&mut self) {
        if self.sim_up {
            warn!("WiFi(sim): link lost");
        }
        self.sim_up = false;
    }

    fn platform_connect(&mut self, ssid: &str, _passphrase: &str, attempt_ms: u32) -> Result<(), CommsError> {
        self.sim_connect_counter = self.sim_connect_counter.wrapping_add(1);
        if self.sim_failures > 0 {
            self.sim_failures -= 1;
            warn!(
                "WiFi(sim): no association within {} ms (attempt {})",
                attempt_ms, self.sim_connect_counter
            );
            return Err(CommsError::NetworkTimeout);
        }
        info!("WiFi(sim): associated with '{}' (attempt {})", ssid, self.sim_connect_counter);
        self.sim_up = true;
        Ok(())
    }

    fn platform_is_connected(&self) -> bool {
        self.sim_up
    }

    fn platform_rssi(&self) -> Option<i8> {
        if !self.sim_up {
            return None;
        }
        // Oscillate between -66 and -55 dBm with the attempt counter.
        let oscillation = ((self.sim_connect_counter % 12) as i8) - 6;
        Some(-60_i8.saturating_add(oscillation))
    }

    fn platform_ip(&self) -> Option<Ipv4Addr> {
        self.sim_up.then_some(Ipv4Addr::new(192, 168, 4, 2))
    }
}

impl WifiStation {
    /// Association attempts made so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

// ───────────────────────────────────────────────────────────────
// NetworkPort
// ───────────────────────────────────────────────────────────────

impl NetworkPort for WifiStation {
    fn connect(&mut self, ssid: &str, passphrase: &str, attempt_ms: u32) -> Result<(), CommsError> {
        validate_credentials(ssid, passphrase)?;
        if self.platform_is_connected() {
            return Ok(());
        }
        self.attempts = self.attempts.wrapping_add(1);
        info!("WiFi: connecting to '{}' (window {} ms)", ssid, attempt_ms);
        self.platform_connect(ssid, passphrase, attempt_ms)
            .inspect_err(|e| warn!("WiFi: attempt {} failed — {}", self.attempts, e))
    }

    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }

    fn rssi(&self) -> Option<i8> {
        self.platform_rssi()
    }

    fn ip(&self) -> Option<Ipv4Addr> {
        self.platform_ip()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
