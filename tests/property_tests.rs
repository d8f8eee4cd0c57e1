//! Property tests for the dispense cycle and the overrun interlock.
//!
//! Runs on host (x86_64) only; proptest is not available for ESP32 targets.
//! On ESP32, these tests are compiled out.

#![cfg(not(target_os = "espidf"))]

use dispenser::app::events::AppEvent;
use dispenser::app::ports::{
    ClockPort, EventSink, InputPort, MaintenancePort, Rgb, StripPort, TelemetryPort, ValvePort,
};
use dispenser::app::service::{DispenserService, LoopOutcome};
use dispenser::config::DispenserConfig;
use dispenser::drivers::fade::Fade;
use dispenser::error::CommsError;
use proptest::prelude::*;

const LIMIT_MS: u32 = 60_000;
const HOLD_MS: u32 = 10;

// ── Minimal harness ───────────────────────────────────────────

/// Presence asserted on `[0, until)`.  Records valve level changes.
struct Rig {
    now: u64,
    until: u64,
    valve: bool,
    valve_edges: Vec<(u64, bool)>,
}

impl Rig {
    fn new(until: u64) -> Self {
        Self {
            now: 0,
            until,
            valve: false,
            valve_edges: Vec::new(),
        }
    }
}

impl InputPort for Rig {
    fn presence_raw(&mut self) -> bool {
        self.now < self.until
    }

    fn trigger_pressed(&mut self) -> bool {
        false
    }
}

impl ValvePort for Rig {
    fn set_valve(&mut self, open: bool) {
        if open != self.valve {
            self.valve_edges.push((self.now, open));
            self.valve = open;
        }
    }

    fn set_status_led(&mut self, _on: bool) {}
}

impl StripPort for Rig {
    fn pixel_count(&self) -> usize {
        1
    }

    fn write(&mut self, _frame: &[Rgb]) {}
}

impl ClockPort for Rig {
    fn now_ms(&self) -> u64 {
        self.now
    }

    fn delay_ms(&mut self, ms: u32) {
        self.now += u64::from(ms);
    }
}

#[derive(Default)]
struct Net(Vec<String>);

impl TelemetryPort for Net {
    fn publish(&mut self, _topic: &str, payload: &str) -> Result<(), CommsError> {
        self.0.push(payload.to_string());
        Ok(())
    }
}

impl MaintenancePort for Net {
    fn service(&mut self) {}
}

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _event: &AppEvent) {}
}

fn config() -> DispenserConfig {
    DispenserConfig {
        presence_debounce_ms: 0,
        fade_step_delay_ms: 0,
        alarm_fade_step_delay_ms: 0,
        fade_steps: 4,
        strip_pixel_count: 1,
        hold_poll_ms: HOLD_MS,
        max_open_duration_ms: LIMIT_MS,
        ..DispenserConfig::default()
    }
}

/// Run passes until the outcome is not `Idle`, then a few more.
fn run(rig: &mut Rig) -> (DispenserService, Net, LoopOutcome) {
    let mut svc = DispenserService::new(config());
    let mut net = Net::default();
    svc.start(rig, &mut Discard);
    let mut outcome = LoopOutcome::Idle;
    for _ in 0..100 {
        outcome = svc.poll_once(rig, &mut net, &mut Discard);
        if outcome != LoopOutcome::Idle {
            break;
        }
    }
    for _ in 0..3 {
        svc.poll_once(rig, &mut net, &mut Discard);
    }
    (svc, net, outcome)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A cycle shorter than the limit yields exactly one report carrying
    /// its duration, and the valve ends low.
    #[test]
    fn short_cycle_reports_its_duration(ticks in 1u64..(u64::from(LIMIT_MS / HOLD_MS))) {
        let d = ticks * u64::from(HOLD_MS);
        let mut rig = Rig::new(d);
        let (svc, net, outcome) = run(&mut rig);

        prop_assert_eq!(outcome, LoopOutcome::Dispensed { open_ms: d });
        prop_assert_eq!(net.0, vec![d.to_string()]);
        prop_assert_eq!(rig.valve_edges, vec![(0, true), (d, false)]);
        prop_assert!(!svc.is_faulted());
    }

    /// A cycle held past the limit is cut at the first pass beyond it,
    /// latches the fault and reports nothing.
    #[test]
    fn long_cycle_faults_without_report(extra in 1u64..120_000) {
        let d = u64::from(LIMIT_MS) + extra;
        let mut rig = Rig::new(d);
        let (svc, net, outcome) = run(&mut rig);

        prop_assert_eq!(outcome, LoopOutcome::Halted);
        prop_assert!(svc.is_faulted());
        prop_assert!(net.0.is_empty());
        prop_assert!(!rig.valve);
        let close_at = u64::from(LIMIT_MS) + u64::from(HOLD_MS);
        prop_assert_eq!(rig.valve_edges, vec![(0, true), (close_at, false)]);
    }

    /// Fade-in never dims and fade-out never brightens, for any geometry.
    #[test]
    fn fades_are_monotone(steps in 1u16..400, peak in 1u8..=255) {
        let up: Vec<u8> = Fade::rising(steps, peak).collect();
        prop_assert!(up.windows(2).all(|w| w[0] <= w[1]));
        prop_assert_eq!(up.last().copied(), Some(peak));

        let down: Vec<u8> = Fade::falling(steps, peak).collect();
        prop_assert!(down.windows(2).all(|w| w[0] >= w[1]));
        prop_assert_eq!(down.last().copied(), Some(0));
    }
}
