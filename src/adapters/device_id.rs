//! Device identity derived from the factory MAC address.
//!
//! The hub keys the device registry on this identifier, so it must be
//! stable across reboots. The station MAC (eFuse) is.

use core::fmt::Write as _;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// `AA:BB:CC:DD:EE:FF`
pub type MacString = heapless::String<17>;

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

/// Colon-separated uppercase hex.
pub fn format_mac(mac: &MacAddress) -> MacString {
    let mut s = MacString::new();
    for (i, b) in mac.iter().enumerate() {
        if i > 0 {
            let _ = s.push(':');
        }
        let _ = write!(s, "{:02X}", b);
    }
    s
}
