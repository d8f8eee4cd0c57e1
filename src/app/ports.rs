//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ DispenserService (domain)
//! ```
//!
//! Driven adapters (inputs, valve, light strip, clock, telemetry, storage)
//! implement these traits.  The [`DispenserService`](super::service::DispenserService)
//! consumes them via generics, so the domain core never touches hardware
//! directly.
//!
//! ## Notes
//!
//! - **ConfigPort** implementations MUST validate before persisting.
//! - Input ports report *asserted* logic.  Pin polarity is the adapter's job.

use crate::config::DispenserConfig;
use crate::error::CommsError;

// ───────────────────────────────────────────────────────────────
// Input port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to sample the two inputs.
pub trait InputPort {
    /// Raw (undebounced) presence reading.  `true` = object in the beam.
    fn presence_raw(&mut self) -> bool;

    /// Manual switch reading.  `true` = button held.
    fn trigger_pressed(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Valve port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the solenoid valve and the on-board status LED.
pub trait ValvePort {
    /// Drive the valve output.  `true` = open.
    fn set_valve(&mut self, open: bool);

    /// Drive the on-board status LED.  `true` = lit.
    fn set_status_led(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Light strip port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// A single strip pixel colour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const OFF: Self = Self { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Addressable light strip.  Every call to [`write`](Self::write) pushes a
/// full frame and latches it onto the LEDs.
pub trait StripPort {
    /// Number of pixels on the strip.
    fn pixel_count(&self) -> usize;

    /// Show `frame` on the strip.  Frames shorter than the strip leave the
    /// remaining pixels dark.
    fn write(&mut self, frame: &[Rgb]);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time source plus a blocking delay.
///
/// Split out so tests can drive the control loop on a virtual clock.
pub trait ClockPort {
    /// Milliseconds since boot.
    fn now_ms(&self) -> u64;

    /// Block the calling task for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Telemetry / maintenance ports (driven adapter: domain → network)
// ───────────────────────────────────────────────────────────────

/// Publishes a text payload on a topic.
pub trait TelemetryPort {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), CommsError>;
}

/// Keeps the telemetry link alive.  Called once per control-loop pass.
pub trait MaintenancePort {
    fn service(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`ConfigError::NotFound`] if nothing has been stored yet.
    fn load(&self) -> Result<DispenserConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &DispenserConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
