//! Digital input drivers: presence sensor and manual switch.
//!
//! Both wrap an `embedded-hal` 1.0 `InputPin` and report *asserted* logic,
//! hiding the wiring polarity from the rest of the firmware.
//!
//! - Presence (IR beam-break): active-low.
//! - Manual switch (push-button with pull-down): active-high.
//!
//! A failed read is reported as "not asserted" so a flaky line can never
//! hold the valve open.

use embedded_hal::digital::InputPin;
use log::warn;

use crate::error::ActuatorError;

/// Infrared beam-break presence sensor.
pub struct PresenceSensor<P> {
    pin: P,
}

impl<P: InputPin> PresenceSensor<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    /// `true` when an object interrupts the beam.
    pub fn is_present(&mut self) -> bool {
        match self.pin.is_low() {
            Ok(low) => low,
            Err(_) => {
                warn!("presence: {}", ActuatorError::GpioReadFailed);
                false
            }
        }
    }
}

/// Momentary manual switch.
pub struct ManualSwitch<P> {
    pin: P,
}

impl<P: InputPin> ManualSwitch<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    /// `true` while the button is held.
    pub fn is_pressed(&mut self) -> bool {
        match self.pin.is_high() {
            Ok(high) => high,
            Err(_) => {
                warn!("switch: {}", ActuatorError::GpioReadFailed);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Level(Result<bool, ()>);

    #[derive(Debug)]
    struct ReadFault;

    impl embedded_hal::digital::Error for ReadFault {
        fn kind(&self) -> embedded_hal::digital::ErrorKind {
            embedded_hal::digital::ErrorKind::Other
        }
    }

    impl embedded_hal::digital::ErrorType for Level {
        type Error = ReadFault;
    }

    impl InputPin for Level {
        fn is_high(&mut self) -> Result<bool, ReadFault> {
            self.0.map_err(|_| ReadFault)
        }
        fn is_low(&mut self) -> Result<bool, ReadFault> {
            self.0.map(|h| !h).map_err(|_| ReadFault)
        }
    }

    #[test]
    fn presence_is_active_low() {
        assert!(PresenceSensor::new(Level(Ok(false))).is_present());
        assert!(!PresenceSensor::new(Level(Ok(true))).is_present());
    }

    #[test]
    fn switch_is_active_high() {
        assert!(ManualSwitch::new(Level(Ok(true))).is_pressed());
        assert!(!ManualSwitch::new(Level(Ok(false))).is_pressed());
    }

    #[test]
    fn read_failure_is_not_asserted() {
        assert!(!PresenceSensor::new(Level(Err(()))).is_present());
        assert!(!ManualSwitch::new(Level(Err(()))).is_pressed());
    }
}
