//! System configuration parameters
//!
//! All tunable parameters for the dispenser.  Defaults match the bench
//! prototype; values can be overridden from NVS (see
//! [`NvsAdapter`](crate::adapters::nvs::NvsAdapter)).

use heapless::String;
use serde::{Deserialize, Serialize};

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};

/// The overrun limit must be at least this many worst-case passes long.
const PASS_TO_LIMIT_RATIO: u64 = 10;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispenserConfig {
    // --- Identity / telemetry ---
    /// MQTT client id and telemetry source label.  Empty = derive from MAC.
    pub device_id: String<32>,
    /// Topic that receives one report per dispense cycle.
    pub report_topic: String<64>,
    /// MQTT broker host name or IP address.
    pub broker_host: String<64>,
    pub broker_port: u16,

    // --- Network ---
    pub wifi_ssid: String<32>,
    pub wifi_password: String<64>,

    // --- Light strip ---
    /// Number of pixels on the strip.
    pub strip_pixel_count: u16,
    /// Global brightness ceiling applied by the strip (0-255).
    pub strip_brightness: u8,
    /// Channel value reached at the top of a fade (0-255).
    pub fade_peak: u8,
    /// Number of intervals in a fade ramp.
    pub fade_steps: u16,
    /// Delay after each fade step for open/close fades (milliseconds).
    pub fade_step_delay_ms: u32,
    /// Delay after each fade step while the alarm is showing (milliseconds).
    pub alarm_fade_step_delay_ms: u32,
    /// Pause between alarm flashes (milliseconds).
    pub alarm_pause_ms: u32,

    // --- Inputs / loop timing ---
    /// Confirmation delay before a presence reading is trusted (milliseconds).
    pub presence_debounce_ms: u32,
    /// Pause between passes while the valve is held open (milliseconds).
    pub hold_poll_ms: u32,
    /// Pause between idle polls (milliseconds).
    pub idle_poll_ms: u32,

    // --- Safety ---
    /// Longest the valve may stay open before the overrun fault latches.
    pub max_open_duration_ms: u32,

    // --- Usage estimate ---
    /// Measured flow rate used for the logged volume estimate.
    pub flow_gal_per_sec: f32,
}

impl Default for DispenserConfig {
    fn default() -> Self {
        Self {
            device_id: str_field("water-dispenser"),
            report_topic: str_field("water"),
            broker_host: str_field("192.168.1.50"),
            broker_port: 1883,

            wifi_ssid: String::new(),
            wifi_password: String::new(),

            strip_pixel_count: 8,
            strip_brightness: 125,
            fade_peak: 255,
            fade_steps: 100,
            fade_step_delay_ms: 5,
            alarm_fade_step_delay_ms: 3,
            alarm_pause_ms: 50,

            presence_debounce_ms: 100,
            hold_poll_ms: 10,
            idle_poll_ms: 50,

            max_open_duration_ms: 60_000,

            flow_gal_per_sec: 0.0072,
        }
    }
}

impl DispenserConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.report_topic.is_empty() {
            return Err(ConfigError::ValidationFailed("report_topic must not be empty"));
        }
        if self.broker_host.is_empty() {
            return Err(ConfigError::ValidationFailed("broker_host must not be empty"));
        }
        if self.broker_port == 0 {
            return Err(ConfigError::ValidationFailed("broker_port must be non-zero"));
        }
        if !(1..=1024).contains(&self.strip_pixel_count) {
            return Err(ConfigError::ValidationFailed("strip_pixel_count must be 1-1024"));
        }
        if self.strip_brightness == 0 {
            return Err(ConfigError::ValidationFailed("strip_brightness must be non-zero"));
        }
        if self.fade_peak == 0 {
            return Err(ConfigError::ValidationFailed("fade_peak must be non-zero"));
        }
        if !(1..=1000).contains(&self.fade_steps) {
            return Err(ConfigError::ValidationFailed("fade_steps must be 1-1000"));
        }
        if self.fade_step_delay_ms > 100 || self.alarm_fade_step_delay_ms > 100 {
            return Err(ConfigError::ValidationFailed("fade step delays must be <= 100 ms"));
        }
        if self.presence_debounce_ms > 1_000 {
            return Err(ConfigError::ValidationFailed("presence_debounce_ms must be <= 1000"));
        }
        if self.hold_poll_ms == 0 || self.idle_poll_ms == 0 {
            return Err(ConfigError::ValidationFailed("poll intervals must be non-zero"));
        }
        if !(1_000..=600_000).contains(&self.max_open_duration_ms) {
            return Err(ConfigError::ValidationFailed(
                "max_open_duration_ms must be 1000-600000",
            ));
        }
        if self.worst_case_pass_ms() * PASS_TO_LIMIT_RATIO > u64::from(self.max_open_duration_ms) {
            return Err(ConfigError::ValidationFailed(
                "fade, debounce and hold poll must fit ten times inside max_open_duration_ms",
            ));
        }
        if !(self.flow_gal_per_sec >= 0.0 && self.flow_gal_per_sec.is_finite()) {
            return Err(ConfigError::ValidationFailed("flow_gal_per_sec must be >= 0"));
        }
        Ok(())
    }

    /// Longest gap between two overrun checks while the valve is open.
    ///
    /// The opening pass runs a full blocking fade (`fade_steps + 1` frames)
    /// before the next check; every later pass adds a hold poll and a
    /// presence re-read.
    pub fn worst_case_pass_ms(&self) -> u64 {
        let step_delay = self.fade_step_delay_ms.max(self.alarm_fade_step_delay_ms);
        (u64::from(self.fade_steps) + 1) * u64::from(step_delay)
            + u64::from(self.presence_debounce_ms)
            + u64::from(self.hold_poll_ms)
    }

    /// Decode a stored config blob and validate it.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let cfg: Self = postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Encode for storage.  Callers validate first.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ConfigError> {
        postcard::to_allocvec(self).map_err(|_| ConfigError::Corrupted)
    }
}

/// Load the stored config, falling back to defaults.
///
/// A missing blob is the normal first-boot case and is logged at `info!`;
/// any other failure is logged at `warn!`.
pub fn load_or_default(store: &impl ConfigPort) -> DispenserConfig {
    match store.load() {
        Ok(cfg) => {
            info!("Config loaded from NVS");
            cfg
        }
        Err(ConfigError::NotFound) => {
            info!("No stored config, using defaults");
            DispenserConfig::default()
        }
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            DispenserConfig::default()
        }
    }
}

/// Build a fixed-capacity string from a literal that is known to fit.
pub(crate) fn str_field<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    for ch in s.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}
