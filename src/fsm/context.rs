//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to.  It holds the latest input sample, the dispenser record, the
//! actuator commands to apply after the tick, the current time and the
//! configuration.  Only [`DispenserService`](crate::app::service::DispenserService)
//! owns one.

use crate::config::DispenserConfig;
use crate::drivers::fade::{IndicatorColor, LightLevel};

// ---------------------------------------------------------------------------
// Input sample (read-only to state handlers; written by the control loop)
// ---------------------------------------------------------------------------

/// One pass worth of input readings, already converted to "asserted" logic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    /// An object is breaking the infrared beam (debounced).
    pub presence: bool,
    /// The manual push-button is held.
    pub trigger: bool,
}

impl InputSnapshot {
    /// Presence and trigger are OR'd: either one holds the valve open.
    pub fn any(&self) -> bool {
        self.presence || self.trigger
    }
}

// ---------------------------------------------------------------------------
// Dispenser record
// ---------------------------------------------------------------------------

/// The central dispenser record.
///
/// Invariants:
/// - `fault_latched` implies `!valve_open`.
/// - `open_started_at_ms` is written only by the open transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispenserState {
    pub valve_open: bool,
    pub light_on: bool,
    pub fault_latched: bool,
    /// Monotonic time of the most recent open transition.
    pub open_started_at_ms: u64,
    /// A completed cycle is waiting to be reported.
    pub report_pending: bool,
    /// Duration owed in the pending report.
    pub pending_open_ms: u64,
}

impl DispenserState {
    /// Elapsed open time at `now_ms`, or `None` while closed.
    pub fn open_for_ms(&self, now_ms: u64) -> Option<u64> {
        self.valve_open
            .then(|| now_ms.saturating_sub(self.open_started_at_ms))
    }
}

// ---------------------------------------------------------------------------
// Actuator commands (written by state handlers; consumed by the service)
// ---------------------------------------------------------------------------

/// Light fade requested by a state handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeRequest {
    pub color: IndicatorColor,
    pub level: LightLevel,
}

/// Commands that state handlers write to request actuator actions.
/// The service applies these to the ports after each tick, valve first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActuatorCommands {
    /// Desired valve position.
    pub valve_open: bool,
    /// Desired on-board status LED state.
    pub status_led_on: bool,
    /// One-shot fade to run after the valve has been driven.
    pub fade: Option<FadeRequest>,
}

impl ActuatorCommands {
    /// Valve closed, LED off, no fade.
    pub fn all_off() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Timing --
    /// Monotonic time of the current pass (milliseconds).
    pub now_ms: u64,
    /// Ticks spent in the current state.
    pub ticks_in_state: u64,
    /// Monotonic total tick count.
    pub total_ticks: u64,

    // -- Inputs --
    /// Latest input sample.  Updated before each FSM tick.
    pub inputs: InputSnapshot,

    // -- Record --
    pub state: DispenserState,

    // -- Actuator outputs --
    /// Commands to be applied after the FSM tick.
    pub commands: ActuatorCommands,

    // -- Configuration --
    pub config: DispenserConfig,
}

impl FsmContext {
    /// Create a new context with the given configuration.
    pub fn new(config: DispenserConfig) -> Self {
        Self {
            now_ms: 0,
            ticks_in_state: 0,
            total_ticks: 0,
            inputs: InputSnapshot::default(),
            state: DispenserState::default(),
            commands: ActuatorCommands::all_off(),
            config,
        }
    }
}
