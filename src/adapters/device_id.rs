//! Device identity derived from the ESP32 factory MAC address.
//!
//! Produces a stable device ID in the form `water-dispenser-xxyyzz`
//! (last 3 bytes of the 6-byte MAC in lowercase hex).  It is used as the
//! MQTT client id, which must be unique per broker, whenever the stored
//! config leaves `device_id` empty.

use core::fmt::Write;

use log::warn;

/// Fixed-size device ID string, same capacity as the config field.
pub type DeviceIdString = heapless::String<32>;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    // SAFETY: the buffer is exactly the 6 bytes the call writes.
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

/// Derive the device ID from the last 3 MAC bytes.
pub fn device_id(mac: &MacAddress) -> DeviceIdString {
    let mut id = DeviceIdString::new();
    if write!(
        id,
        "water-dispenser-{:02x}{:02x}{:02x}",
        mac[3], mac[4], mac[5]
    )
    .is_err()
    {
        warn!("device id truncated: '{}'", id);
    }
    id
}

/// `configured` if non-empty, else the MAC-derived id.
pub fn resolve(configured: &str) -> DeviceIdString {
    if configured.is_empty() {
        device_id(&read_mac())
    } else {
        crate::config::str_field(configured)
    }
}
