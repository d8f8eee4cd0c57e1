//! `HardwareAdapter` wired to shared-state `embedded-hal` pins.
//!
//! Checks pin polarity end to end: the service talks in "open"/"present",
//! the pins see the wiring levels.

use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;

use dispenser::adapters::hardware::HardwareAdapter;
use dispenser::app::ports::{ClockPort, InputPort, Rgb, StripPort, ValvePort};
use dispenser::app::service::{DispenserService, LoopOutcome};
use dispenser::config::DispenserConfig;
use dispenser::drivers::light_strip::LightStrip;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use crate::mock_hw::{RecordingNet, RecordingSink};

// ── Shared-level pin ──────────────────────────────────────────

/// A pin whose level is visible to the test after the adapter owns it.
#[derive(Clone, Default)]
struct Line(Rc<Cell<bool>>);

impl Line {
    fn high(&self) -> bool {
        self.0.get()
    }

    fn drive(&self, high: bool) {
        self.0.set(high);
    }
}

impl ErrorType for Line {
    type Error = Infallible;
}

impl OutputPin for Line {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.set(true);
        Ok(())
    }
}

impl InputPin for Line {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.get())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.0.get())
    }
}

#[derive(Default)]
struct VirtualClock(u64);

impl ClockPort for VirtualClock {
    fn now_ms(&self) -> u64 {
        self.0
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0 += u64::from(ms);
    }
}

struct Bench {
    valve: Line,
    led: Line,
    presence: Line,
    switch: Line,
    hw: HardwareAdapter<VirtualClock, Line, Line, Line, Line>,
}

fn bench() -> Bench {
    let (valve, led, presence, switch) = (
        Line::default(),
        Line::default(),
        Line::default(),
        Line::default(),
    );
    // Beam clear: the IR sensor idles high.
    presence.drive(true);

    let hw = HardwareAdapter::new(
        VirtualClock::default(),
        valve.clone(),
        led.clone(),
        presence.clone(),
        switch.clone(),
        LightStrip::new(4, 125),
    )
    .unwrap();

    Bench {
        valve,
        led,
        presence,
        switch,
        hw,
    }
}

#[test]
fn construction_leaves_outputs_safe() {
    let b = bench();
    assert!(!b.valve.high(), "valve low = closed");
    assert!(b.led.high(), "status LED is active-low, high = dark");
    assert!(!b.hw.valve_is_open());
    assert!(!b.hw.status_led_is_on());
}

#[test]
fn input_polarity_is_hidden() {
    let mut b = bench();
    assert!(!b.hw.presence_raw());
    b.presence.drive(false);
    assert!(b.hw.presence_raw(), "beam broken pulls the line low");

    assert!(!b.hw.trigger_pressed());
    b.switch.drive(true);
    assert!(b.hw.trigger_pressed());
}

#[test]
fn valve_port_drives_pins() {
    let mut b = bench();
    b.hw.set_valve(true);
    b.hw.set_status_led(true);
    assert!(b.valve.high());
    assert!(!b.led.high());

    b.hw.set_valve(false);
    b.hw.set_status_led(false);
    assert!(!b.valve.high());
    assert!(b.led.high());
}

#[test]
fn strip_frames_are_scaled_by_ceiling() {
    let mut b = bench();
    assert_eq!(b.hw.pixel_count(), 4);
    b.hw.write(&[Rgb::new(0, 0, 255)]);
    let shown = b.hw.strip().shown();
    assert_eq!(shown.len(), 4);
    assert_eq!(shown[0], Rgb::new(0, 0, 125));
    assert_eq!(shown[1], Rgb::OFF, "short frames leave the rest dark");
}

#[test]
fn service_cycle_through_real_drivers() {
    let mut b = bench();
    let mut svc = DispenserService::new(DispenserConfig {
        strip_pixel_count: 4,
        presence_debounce_ms: 20,
        fade_step_delay_ms: 0,
        ..DispenserConfig::default()
    });
    let mut net = RecordingNet::new();
    let mut sink = RecordingSink::new();
    svc.start(&mut b.hw, &mut sink);

    b.presence.drive(false);
    // One pass opens the valve; release before the next hold poll.
    let inputs = svc.sample_inputs(&mut b.hw);
    svc.step(inputs, &mut b.hw, &mut sink);
    assert!(b.valve.high());
    assert!(!b.led.high());

    b.presence.drive(true);
    b.hw.delay_ms(480);
    let inputs = svc.sample_inputs(&mut b.hw);
    svc.step(inputs, &mut b.hw, &mut sink);
    assert!(!b.valve.high());
    assert!(b.led.high());
    assert_eq!(svc.record().pending_open_ms, 480);

    assert_eq!(
        svc.poll_once(&mut b.hw, &mut net, &mut sink),
        LoopOutcome::Idle
    );
    assert_eq!(net.payloads(), vec!["480"]);
}
