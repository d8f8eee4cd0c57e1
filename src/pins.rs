//! GPIO / peripheral pin assignments for the dispenser board.
//!
//! `main.rs` references this module rather than hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Solenoid valve (logic-level MOSFET)
// ---------------------------------------------------------------------------

/// Digital output: HIGH = valve open.
pub const VALVE_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Infrared beam-break sensor.  LOW = object present.
pub const PRESENCE_GPIO: i32 = 14;
/// Momentary push-button with external pull-down.  HIGH = pressed.
pub const SWITCH_GPIO: i32 = 13;

// ---------------------------------------------------------------------------
// Indicators
// ---------------------------------------------------------------------------

/// WS2812 light strip data line (driven by RMT channel 0).
pub const STRIP_DATA_GPIO: i32 = 4;
/// On-board status LED.  LOW = lit.
pub const STATUS_LED_GPIO: i32 = 2;
