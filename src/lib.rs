//! Water dispenser firmware library.
//!
//! A presence sensor or a manual switch opens a solenoid valve; closing it
//! publishes how long it was open.  A watchdog on the open time latches a
//! terminal fault that closes the valve and shows a red alarm until reset.
//!
//! Exposes the pure-logic modules for integration testing. All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod fsm;
pub mod pins;
pub mod safety;

pub mod adapters;
pub mod drivers;
