//! Solenoid valve and status LED drivers.
//!
//! Both are plain digital outputs behind `embedded-hal` 1.0 `OutputPin`, so
//! the same code runs against ESP-IDF `PinDriver`s and test mocks.
//!
//! ## Safety contract
//!
//! The valve must never stay open past the configured limit.  That is
//! enforced by the overrun guard; this driver is a dumb actuator.

use embedded_hal::digital::OutputPin;

use crate::error::ActuatorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValveState {
    Closed,
    Open,
}

/// Valve on an active-high output (HIGH = open).
pub struct ValveDriver<P> {
    pin: P,
    state: ValveState,
}

impl<P: OutputPin> ValveDriver<P> {
    /// Take ownership of the pin and drive it closed.
    pub fn new(mut pin: P) -> Result<Self, ActuatorError> {
        pin.set_low().map_err(|_| ActuatorError::GpioWriteFailed)?;
        Ok(Self {
            pin,
            state: ValveState::Closed,
        })
    }

    pub fn open(&mut self) -> Result<(), ActuatorError> {
        self.pin.set_high().map_err(|_| ActuatorError::GpioWriteFailed)?;
        self.state = ValveState::Open;
        Ok(())
    }

    pub fn close(&mut self) -> Result<(), ActuatorError> {
        self.pin.set_low().map_err(|_| ActuatorError::GpioWriteFailed)?;
        self.state = ValveState::Closed;
        Ok(())
    }

    pub fn set(&mut self, open: bool) -> Result<(), ActuatorError> {
        if open { self.open() } else { self.close() }
    }

    pub fn state(&self) -> ValveState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ValveState::Open
    }
}

/// On-board LED on an active-low output (LOW = lit).
pub struct StatusLed<P> {
    pin: P,
    on: bool,
}

impl<P: OutputPin> StatusLed<P> {
    /// Take ownership of the pin and switch the LED off.
    pub fn new(mut pin: P) -> Result<Self, ActuatorError> {
        pin.set_high().map_err(|_| ActuatorError::GpioWriteFailed)?;
        Ok(Self { pin, on: false })
    }

    pub fn set(&mut self, on: bool) -> Result<(), ActuatorError> {
        let res = if on { self.pin.set_low() } else { self.pin.set_high() };
        res.map_err(|_| ActuatorError::GpioWriteFailed)?;
        self.on = on;
        Ok(())
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}
