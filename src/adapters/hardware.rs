//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the valve, the status LED, both inputs, and the light strip, and
//! exposes them through [`InputPort`], [`ValvePort`], [`StripPort`] and
//! [`ClockPort`].  This is the only module that touches the pins.
//!
//! Port methods are infallible from the domain's point of view: a failed
//! pin or strip write is logged at `error!` and the loop carries on, so
//! the next pass re-asserts the output.

use embedded_hal::digital::{InputPin, OutputPin};
use log::error;

use crate::app::ports::{ClockPort, InputPort, Rgb, StripPort, ValvePort};
use crate::drivers::inputs::{ManualSwitch, PresenceSensor};
use crate::drivers::light_strip::LightStrip;
use crate::drivers::valve::{StatusLed, ValveDriver};
use crate::error::ActuatorError;

/// Concrete adapter that combines all dispenser hardware behind port traits.
pub struct HardwareAdapter<C, V, L, P, S> {
    clock: C,
    valve: ValveDriver<V>,
    led: StatusLed<L>,
    presence: PresenceSensor<P>,
    switch: ManualSwitch<S>,
    strip: LightStrip,
}

impl<C, V, L, P, S> HardwareAdapter<C, V, L, P, S>
where
    C: ClockPort,
    V: OutputPin,
    L: OutputPin,
    P: InputPin,
    S: InputPin,
{
    /// Take ownership of the pins.  The valve is driven closed and the
    /// status LED dark before this returns.
    pub fn new(
        clock: C,
        valve_pin: V,
        led_pin: L,
        presence_pin: P,
        switch_pin: S,
        strip: LightStrip,
    ) -> Result<Self, ActuatorError> {
        Ok(Self {
            clock,
            valve: ValveDriver::new(valve_pin)?,
            led: StatusLed::new(led_pin)?,
            presence: PresenceSensor::new(presence_pin),
            switch: ManualSwitch::new(switch_pin),
            strip,
        })
    }

    pub fn valve_is_open(&self) -> bool {
        self.valve.is_open()
    }

    pub fn status_led_is_on(&self) -> bool {
        self.led.is_on()
    }

    pub fn strip(&self) -> &LightStrip {
        &self.strip
    }
}

// ── InputPort ─────────────────────────────────────────────────

impl<C, V, L, P, S> InputPort for HardwareAdapter<C, V, L, P, S>
where
    P: InputPin,
    S: InputPin,
{
    fn presence_raw(&mut self) -> bool {
        self.presence.is_present()
    }

    fn trigger_pressed(&mut self) -> bool {
        self.switch.is_pressed()
    }
}

// ── ValvePort ─────────────────────────────────────────────────

impl<C, V, L, P, S> ValvePort for HardwareAdapter<C, V, L, P, S>
where
    V: OutputPin,
    L: OutputPin,
{
    fn set_valve(&mut self, open: bool) {
        if let Err(e) = self.valve.set(open) {
            error!("HW: valve write (open={}) failed: {}", open, e);
        }
    }

    fn set_status_led(&mut self, on: bool) {
        if let Err(e) = self.led.set(on) {
            error!("HW: status LED write failed: {}", e);
        }
    }
}

// ── StripPort ─────────────────────────────────────────────────

impl<C, V, L, P, S> StripPort for HardwareAdapter<C, V, L, P, S> {
    fn pixel_count(&self) -> usize {
        self.strip.pixel_count()
    }

    fn write(&mut self, frame: &[Rgb]) {
        if let Err(e) = self.strip.show(frame) {
            error!("HW: strip write failed: {}", e);
        }
    }
}

// ── ClockPort ─────────────────────────────────────────────────

impl<C: ClockPort, V, L, P, S> ClockPort for HardwareAdapter<C, V, L, P, S> {
    fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    fn delay_ms(&mut self, ms: u32) {
        self.clock.delay_ms(ms);
    }
}
