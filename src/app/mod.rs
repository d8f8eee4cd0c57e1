//! Application core: pure domain logic, zero I/O.
//!
//! This module holds the control loop for the dispenser: FSM orchestration,
//! the overrun interlock, indicator fades and telemetry hand-off.  All
//! interaction with hardware happens through **port traits** defined in
//! [`ports`], keeping this layer testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
