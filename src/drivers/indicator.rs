//! Indicator driver: blocking fades on the light strip.
//!
//! The indicator owns the pixel buffer and remembers which colour is showing
//! and at what brightness.  Every fade is applied to all pixels at once and
//! runs to completion before returning; nothing else is polled meanwhile.
//!
//! ## Idempotence
//!
//! - Fading on while the same colour is already at peak does nothing.
//! - Fading off while dark does nothing.
//!
//! Each step is a whole frame, so the strip never shows a mix of two
//! colours or levels between calls.

use log::debug;

use crate::app::ports::{ClockPort, Rgb, StripPort, ValvePort};
use crate::drivers::fade::{Fade, IndicatorColor, LightLevel};

/// What the strip is showing right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorState {
    pub pixels: Vec<Rgb>,
    /// `None` while the strip is dark.
    pub color: Option<IndicatorColor>,
    pub brightness: u8,
}

/// Fade engine for the strip.
pub struct Indicator {
    state: IndicatorState,
    steps: u16,
    peak: u8,
}

impl Indicator {
    /// New indicator with every pixel off.
    pub fn new(pixel_count: usize, steps: u16, peak: u8) -> Self {
        Self {
            state: IndicatorState {
                pixels: vec![Rgb::OFF; pixel_count],
                color: None,
                brightness: 0,
            },
            steps,
            peak,
        }
    }

    /// Push an all-off frame.  Used once at boot.
    pub fn clear(&mut self, strip: &mut impl StripPort) {
        self.state.pixels.fill(Rgb::OFF);
        self.state.color = None;
        self.state.brightness = 0;
        strip.write(&self.state.pixels);
    }

    /// Fade the whole strip to `level` in `color`, sleeping `step_delay_ms`
    /// after every step.
    ///
    /// A fade off uses the colour currently showing.  Returns `false` if the
    /// call was a no-op.
    pub fn fade_to(
        &mut self,
        color: IndicatorColor,
        level: LightLevel,
        step_delay_ms: u32,
        hw: &mut (impl StripPort + ClockPort),
    ) -> bool {
        match level {
            LightLevel::On => {
                if self.state.color == Some(color) && self.state.brightness == self.peak {
                    return false;
                }
                debug!("indicator: fade in {:?}", color);
                self.run(color, Fade::rising(self.steps, self.peak), step_delay_ms, hw);
                self.state.color = Some(color);
            }
            LightLevel::Off => {
                let Some(showing) = self.state.color else {
                    return false;
                };
                debug!("indicator: fade out {:?}", showing);
                self.run(showing, Fade::falling(self.steps, self.peak), step_delay_ms, hw);
                self.state.color = None;
            }
        }
        true
    }

    /// One flash of the overrun alarm: red fade in, status LED on, red fade
    /// out, status LED off, pause.
    pub fn alarm_cycle(
        &mut self,
        step_delay_ms: u32,
        pause_ms: u32,
        hw: &mut (impl StripPort + ClockPort + ValvePort),
    ) {
        self.fade_to(IndicatorColor::Fault, LightLevel::On, step_delay_ms, hw);
        hw.set_status_led(true);
        self.fade_to(IndicatorColor::Fault, LightLevel::Off, step_delay_ms, hw);
        hw.set_status_led(false);
        hw.delay_ms(pause_ms);
    }

    /// True while any colour is showing.
    pub fn is_on(&self) -> bool {
        self.state.color.is_some()
    }

    pub fn state(&self) -> &IndicatorState {
        &self.state
    }

    fn run(
        &mut self,
        color: IndicatorColor,
        fade: Fade,
        step_delay_ms: u32,
        hw: &mut (impl StripPort + ClockPort),
    ) {
        for level in fade {
            self.state.pixels.fill(color.rgb(level));
            self.state.brightness = level;
            hw.write(&self.state.pixels);
            hw.delay_ms(step_delay_ms);
        }
    }
}
