//! Perceptual fade curve for the indicator strip.
//!
//! The eye responds roughly logarithmically to brightness, so a linear ramp
//! looks like it jumps at the bottom and stalls at the top.  The fade uses
//! an exponential curve instead:
//!
//! ```text
//!   brightness(i) = 2^(i / R) - 1        i = 0 ..= steps
//!   R             = steps · log10(2) / log10(max + 1)
//! ```
//!
//! which hits exactly 0 at `i = 0` and `max` at `i = steps`.
//!
//! A [`Fade`] is a lazy, finite iterator.  Once exhausted it stays
//! exhausted; a new fade means a new iterator.

use crate::app::ports::Rgb;

/// Indicator colours.  Only two exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorColor {
    /// Blue: valve open/close feedback.
    Normal,
    /// Red: overrun alarm.
    Fault,
}

impl IndicatorColor {
    /// Pixel value for this colour at `level` (0-255).
    pub fn rgb(self, level: u8) -> Rgb {
        match self {
            Self::Normal => Rgb::new(0, 0, level),
            Self::Fault => Rgb::new(level, 0, 0),
        }
    }
}

/// Target of a fade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightLevel {
    On,
    Off,
}

/// Brightness sequence for one fade.
#[derive(Debug, Clone)]
pub struct Fade {
    steps: u16,
    peak: u8,
    r: f32,
    /// Next step index to yield, counted from the start of the fade.
    next: u16,
    rising: bool,
    done: bool,
}

impl Fade {
    /// Fade from 0 up to `peak` over `steps` intervals (`steps + 1` values).
    pub fn rising(steps: u16, peak: u8) -> Self {
        Self::new(steps, peak, true)
    }

    /// Fade from `peak` down to 0 over `steps` intervals.
    pub fn falling(steps: u16, peak: u8) -> Self {
        Self::new(steps, peak, false)
    }

    fn new(steps: u16, peak: u8, rising: bool) -> Self {
        let steps = steps.max(1);
        let r = f32::from(steps) * 2f32.log10() / (f32::from(peak) + 1.0).log10();
        Self {
            steps,
            peak,
            r,
            next: 0,
            rising,
            done: false,
        }
    }

    /// Brightness at curve index `i` (0 = dark end, `steps` = peak).
    pub fn level_at(&self, i: u16) -> u8 {
        if i == 0 || self.peak == 0 {
            return 0;
        }
        if i >= self.steps {
            return self.peak;
        }
        let v = 2f32.powf(f32::from(i) / self.r) - 1.0;
        v.round().clamp(0.0, f32::from(self.peak)) as u8
    }
}

impl Iterator for Fade {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.done {
            return None;
        }
        let i = if self.rising {
            self.next
        } else {
            self.steps - self.next
        };
        let level = self.level_at(i);
        if self.next == self.steps {
            self.done = true;
        } else {
            self.next += 1;
        }
        Some(level)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = if self.done {
            0
        } else {
            usize::from(self.steps - self.next) + 1
        };
        (left, Some(left))
    }
}

impl ExactSizeIterator for Fade {}

impl core::iter::FusedIterator for Fade {}
