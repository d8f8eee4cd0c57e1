//! WS2812 light strip driver.
//!
//! Frames are scaled by a global brightness ceiling and clocked out in GRB
//! order.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: bit-bangs the WS2812 waveform through an RMT TX channel.
//! On host/test: keeps the last scaled frame in memory only.

use crate::app::ports::Rgb;
use crate::error::ActuatorError;

#[cfg(target_os = "espidf")]
use core::time::Duration;
#[cfg(target_os = "espidf")]
use esp_idf_hal::rmt::{PinState, Pulse, TxRmtDriver, VariableLengthSignal};

// WS2812 bit timings.
#[cfg(target_os = "espidf")]
const T0H: Duration = Duration::from_nanos(350);
#[cfg(target_os = "espidf")]
const T0L: Duration = Duration::from_nanos(800);
#[cfg(target_os = "espidf")]
const T1H: Duration = Duration::from_nanos(700);
#[cfg(target_os = "espidf")]
const T1L: Duration = Duration::from_nanos(600);

pub struct LightStrip {
    #[cfg(target_os = "espidf")]
    tx: TxRmtDriver<'static>,
    pixel_count: usize,
    ceiling: u8,
    /// Last frame pushed, after the brightness ceiling.
    shown: Vec<Rgb>,
}

impl LightStrip {
    #[cfg(target_os = "espidf")]
    pub fn new(tx: TxRmtDriver<'static>, pixel_count: usize, ceiling: u8) -> Self {
        Self {
            tx,
            pixel_count,
            ceiling,
            shown: vec![Rgb::OFF; pixel_count],
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(pixel_count: usize, ceiling: u8) -> Self {
        Self {
            pixel_count,
            ceiling,
            shown: vec![Rgb::OFF; pixel_count],
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    /// Scale `frame` by the ceiling and push it.  Pixels past the end of
    /// `frame` are sent dark; extra entries are ignored.
    pub fn show(&mut self, frame: &[Rgb]) -> Result<(), ActuatorError> {
        for (i, slot) in self.shown.iter_mut().enumerate() {
            let px = frame.get(i).copied().unwrap_or(Rgb::OFF);
            *slot = scale(px, self.ceiling);
        }
        self.push_hw()
    }

    /// Last frame sent to the LEDs.
    pub fn shown(&self) -> &[Rgb] {
        &self.shown
    }

    #[cfg(target_os = "espidf")]
    fn push_hw(&mut self) -> Result<(), ActuatorError> {
        let ticks_hz = self
            .tx
            .counter_clock()
            .map_err(|_| ActuatorError::StripWriteFailed)?;
        let pulse = |state, d: &Duration| {
            Pulse::new_with_duration(ticks_hz, state, d)
                .map_err(|_| ActuatorError::StripWriteFailed)
        };
        let zero = [pulse(PinState::High, &T0H)?, pulse(PinState::Low, &T0L)?];
        let one = [pulse(PinState::High, &T1H)?, pulse(PinState::Low, &T1L)?];

        let mut signal = VariableLengthSignal::new();
        for px in &self.shown {
            let grb = (u32::from(px.g) << 16) | (u32::from(px.r) << 8) | u32::from(px.b);
            for bit in (0..24).rev() {
                let pair = if grb & (1 << bit) != 0 { &one } else { &zero };
                signal
                    .push(pair)
                    .map_err(|_| ActuatorError::StripWriteFailed)?;
            }
        }
        self.tx
            .start_blocking(&signal)
            .map_err(|_| ActuatorError::StripWriteFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn push_hw(&mut self) -> Result<(), ActuatorError> {
        Ok(())
    }
}

/// Apply the global brightness ceiling to one pixel.
pub fn scale(px: Rgb, ceiling: u8) -> Rgb {
    let br = u16::from(ceiling);
    // channel * ceiling / 255 never exceeds the channel.
    let ch = |c: u8| u8::try_from(u16::from(c) * br / 255).unwrap_or(u8::MAX);
    Rgb::new(ch(px.r), ch(px.g), ch(px.b))
}
